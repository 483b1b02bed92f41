use chrono::{DateTime, Utc};

/// Single-slot owner of the live session handle
#[derive(Debug)]
pub struct HandleRegistry<H> {
    slot: Option<H>,
    acquired_at: Option<DateTime<Utc>>,
}

impl<H> HandleRegistry<H> {
    pub fn new() -> Self {
        Self {
            slot: None,
            acquired_at: None,
        }
    }

    /// Store a freshly opened handle. An occupied slot refuses it and hands it back.
    pub fn acquire(&mut self, handle: H, at: DateTime<Utc>) -> Result<(), H> {
        if self.slot.is_some() {
            return Err(handle);
        }
        self.slot = Some(handle);
        self.acquired_at = Some(at);
        Ok(())
    }

    /// Take the handle out for closing
    pub fn release(&mut self) -> Option<H> {
        self.acquired_at = None;
        self.slot.take()
    }

    pub fn get(&self) -> Option<&H> {
        self.slot.as_ref()
    }

    pub fn is_held(&self) -> bool {
        self.slot.is_some()
    }

    pub fn acquired_at(&self) -> Option<DateTime<Utc>> {
        self.acquired_at
    }
}

impl<H> Default for HandleRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

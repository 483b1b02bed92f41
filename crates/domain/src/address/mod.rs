//! Addresses, variable groups and chunk planning for batched reads
mod address_set;
mod read_plan;
mod read_result;
mod variable_group;

pub use address_set::AddressSet;
pub use read_plan::{ReadChunk, ReaderSettings, plan_chunks};
pub use read_result::ReadResult;
pub use variable_group::{GroupTable, VariableGroup};

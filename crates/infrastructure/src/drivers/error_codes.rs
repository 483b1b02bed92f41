//! Built-in error classification tables of the supported controllers
use domain::classification::{ClassificationTable, ErrorCategory};
use domain::driver::ControllerKind;

/// FOCAS native library return codes
pub mod focas {
    pub const EW_PROTOCOL: i64 = -17;
    pub const EW_SOCKET: i64 = -16;
    pub const EW_NODLL: i64 = -15;
    pub const EW_BUS: i64 = -11;
    pub const EW_HSSB: i64 = -9;
    pub const EW_HANDLE: i64 = -8;
    pub const EW_VERSION: i64 = -7;
    pub const EW_UNEXP: i64 = -6;
    pub const EW_BUSY: i64 = -1;
    pub const EW_OK: i64 = 0;
    pub const EW_FUNC: i64 = 1;
    pub const EW_NUMBER: i64 = 3;
    pub const EW_DATA: i64 = 5;
    pub const EW_NOOPT: i64 = 6;
}

/// EZSocket COM error codes
pub mod mitsubishi {
    pub const NOT_CONNECTED: i64 = 0x8202_000A;
    pub const COMM_CLOSED: i64 = 0x8004_0196;
    pub const PORT_NOT_OPEN: i64 = 0x8100_8001;
    pub const COMM_TIMEOUT: i64 = 0x8005_0D04;
    pub const MEMORY_ACCESS: i64 = 0x80B0_0304;
    /// RPC_E_SERVERFAULT
    pub const SERVER_FAULT: i64 = 0x8001_0105;
}

/// DNC COM error codes, as signed 32-bit HRESULTs
pub mod heidenhain {
    /// DNC_E_NOT_POS_NOW (0x80040266)
    pub const NOT_POSSIBLE_NOW: i64 = 0x8004_0266_u32 as i32 as i64;
    /// CO_E_RUNAS_LOGON_FAILURE (0x8000401A)
    pub const SERVER_IDENTITY: i64 = 0x8000_401A_u32 as i32 as i64;
    /// The interface is not accessible anymore
    pub const INTERFACE_GONE: i64 = 1638;
}

pub fn focas_table() -> ClassificationTable {
    ClassificationTable::new("focas")
        .with(focas::EW_HANDLE, ErrorCategory::TransportBroken)
        .with(focas::EW_SOCKET, ErrorCategory::TransportBroken)
        .with(focas::EW_VERSION, ErrorCategory::Unsupported)
        .with(focas::EW_NOOPT, ErrorCategory::Unsupported)
}

pub fn mitsubishi_table() -> ClassificationTable {
    ClassificationTable::new("mitsubishi")
        .with(mitsubishi::NOT_CONNECTED, ErrorCategory::TransportBroken)
        .with(mitsubishi::COMM_CLOSED, ErrorCategory::TransportBroken)
        .with(mitsubishi::PORT_NOT_OPEN, ErrorCategory::TransportBroken)
        .with(mitsubishi::COMM_TIMEOUT, ErrorCategory::TransportBroken)
        .with(mitsubishi::MEMORY_ACCESS, ErrorCategory::Fatal)
        .with(mitsubishi::SERVER_FAULT, ErrorCategory::Fatal)
}

pub fn heidenhain_table() -> ClassificationTable {
    ClassificationTable::new("heidenhain_dnc")
        .with(heidenhain::NOT_POSSIBLE_NOW, ErrorCategory::TransportBroken)
        .with(heidenhain::SERVER_IDENTITY, ErrorCategory::TransportBroken)
        .with(heidenhain::INTERFACE_GONE, ErrorCategory::Fatal)
}

/// Built-in table of a controller kind. The simulator speaks FOCAS codes.
pub fn builtin_table(kind: ControllerKind) -> ClassificationTable {
    match kind {
        ControllerKind::Focas => focas_table(),
        ControllerKind::Mitsubishi => mitsubishi_table(),
        ControllerKind::HeidenhainDnc => heidenhain_table(),
        ControllerKind::Okuma => ClassificationTable::new("okuma"),
        ControllerKind::Simulator => {
            let mut table = focas_table();
            table.insert(focas::EW_NODLL, ErrorCategory::Fatal);
            table
        }
    }
}

/// Controllers reporting signed HRESULTs get configured hex codes folded to i32
pub fn normalize_code(kind: ControllerKind, code: i64) -> i64 {
    match kind {
        ControllerKind::HeidenhainDnc if (0x8000_0000..=0xFFFF_FFFF).contains(&code) => {
            code as u32 as i32 as i64
        }
        _ => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::classification::{ErrorAction, ErrorClassifier};

    #[test]
    fn test_focas_classification() {
        let table = focas_table();
        assert_eq!(table.classify("cnc_rdmacro", focas::EW_HANDLE), ErrorAction::ForceDisconnect);
        assert_eq!(table.classify("cnc_rdmacro", focas::EW_SOCKET), ErrorAction::ForceDisconnect);
        assert_eq!(
            table.classify("cnc_rdexecpt", focas::EW_VERSION),
            ErrorAction::MarkUnavailable("cnc_rdexecpt".to_string())
        );
        assert_eq!(table.classify("cnc_rdmacro", focas::EW_NUMBER), ErrorAction::Ignore);
        assert_eq!(table.classify("cnc_rdmacro", focas::EW_BUSY), ErrorAction::Ignore);
    }

    #[test]
    fn test_mitsubishi_classification() {
        let table = mitsubishi_table();
        assert_eq!(table.classify("GetData", 0x8202_000A), ErrorAction::ForceDisconnect);
        assert_eq!(table.classify("GetData", 0x8001_0105), ErrorAction::FatalHalt);
        assert_eq!(table.classify("GetData", 0x8003_0101), ErrorAction::Ignore);
    }

    #[test]
    fn test_heidenhain_codes_are_signed() {
        assert_eq!(heidenhain::NOT_POSSIBLE_NOW, -2_147_220_890);
        assert_eq!(heidenhain::SERVER_IDENTITY, -2_147_467_238);
        let table = heidenhain_table();
        assert_eq!(table.classify("GetState", -2_147_467_238), ErrorAction::ForceDisconnect);
        assert_eq!(table.classify("GetState", 1638), ErrorAction::FatalHalt);
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(
            normalize_code(ControllerKind::HeidenhainDnc, 0x8004_0266),
            heidenhain::NOT_POSSIBLE_NOW
        );
        assert_eq!(normalize_code(ControllerKind::HeidenhainDnc, 1638), 1638);
        assert_eq!(normalize_code(ControllerKind::Mitsubishi, 0x8202_000A), 0x8202_000A);
    }

    #[test]
    fn test_okuma_has_no_builtin_rules() {
        assert!(builtin_table(ControllerKind::Okuma).is_empty());
        assert_eq!(
            builtin_table(ControllerKind::Simulator).classify("load", focas::EW_NODLL),
            ErrorAction::FatalHalt
        );
    }
}

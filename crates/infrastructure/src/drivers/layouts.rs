//! Built-in variable layouts of the supported controllers
use domain::address::VariableGroup;
use domain::driver::{ControllerKind, MachineFamily};

/// FOCAS custom macro variables. Each range needs its own read primitive.
pub fn focas_macro_layout() -> Vec<VariableGroup> {
    vec![
        VariableGroup::new("common", 1, 999, "cnc_rdmacror", "cnc_rdmacro", 40),
        VariableGroup::new("system", 1000, 9999, "cnc_rdmacro", "cnc_rdmacro", 1),
        VariableGroup::new("system_extended", 10000, 97999, "cnc_rdmacror2", "cnc_rdmacror2", 1024),
        VariableGroup::new("common_extended", 98000, 98499, "cnc_rdmacror3", "cnc_rdmacror3", 1),
    ]
}

/// FOCAS P-code macro variables, read with a double array of 1024 entries
pub fn focas_pmacro_layout() -> Vec<VariableGroup> {
    vec![VariableGroup::new(
        "pmacro",
        1,
        99999,
        "cnc_rdpmacror2",
        "cnc_rdpmacror2",
        1024,
    )]
}

/// Okuma common variables. A range read is worth it only when few unrequested
/// variables are fetched along.
pub fn okuma_layout(family: MachineFamily) -> Vec<VariableGroup> {
    vec![
        VariableGroup::new(
            "common",
            1,
            9999,
            family.qualify("CVariables", "GetCommonVariableValues"),
            family.qualify("CVariables", "GetCommonVariableValue"),
            1000,
        )
        .with_max_padding(10),
    ]
}

pub fn simulator_layout() -> Vec<VariableGroup> {
    vec![VariableGroup::new("common", 1, 9999, "sim_read_range", "sim_read", 512)]
}

/// Default layout of a controller kind. COM controllers have none built in.
pub fn builtin_layout(kind: ControllerKind, family: Option<MachineFamily>) -> Vec<VariableGroup> {
    match kind {
        ControllerKind::Focas => focas_macro_layout(),
        ControllerKind::Okuma => okuma_layout(family.unwrap_or_default()),
        ControllerKind::Simulator => simulator_layout(),
        ControllerKind::Mitsubishi | ControllerKind::HeidenhainDnc => Vec::new(),
    }
}

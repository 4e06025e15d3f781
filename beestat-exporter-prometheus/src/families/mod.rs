//! Metric family generators.
//!
//! Each generator reads one beestat document and produces the text of one
//! metric family: a header block emitted once, followed by samples for every
//! thermostat in the document.

pub mod equipment_state;
pub mod runtime;
pub mod sensor;
pub mod thermostat;

/// Label carrying the thermostat display name on every family.
pub const ECOBEE_NAME_LABEL: &str = "ecobee_name";

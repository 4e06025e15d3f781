//! Accumulated equipment runtime (`*_equipment_runtime_hours`).
//!
//! Values are upstream's running totals republished as-is on every scrape,
//! hence the counter type.

use beestat_common::{RuntimeProfileDocument, RuntimeProfileRecord};

use super::ECOBEE_NAME_LABEL;
use crate::exposition::{ExpositionSettings, FamilyWriter};
use crate::mapping::MetricHeader;
use crate::units::{minutes_to_hours, seconds_to_hours};

pub const HEADER: MetricHeader =
    MetricHeader::counter("equipment_runtime_hours", "Accumulated equipment runtime.");

/// Runtime sources reported in a thermostat's runtime profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeSource {
    Cool1,
    Cool2,
    Heat1,
    Heat2,
    AuxiliaryHeat1,
    AuxiliaryHeat2,
    FurnaceFilter,
    HumidifierFilter,
}

impl RuntimeSource {
    pub const ALL: [RuntimeSource; 8] = [
        RuntimeSource::Cool1,
        RuntimeSource::Cool2,
        RuntimeSource::Heat1,
        RuntimeSource::Heat2,
        RuntimeSource::AuxiliaryHeat1,
        RuntimeSource::AuxiliaryHeat2,
        RuntimeSource::FurnaceFilter,
        RuntimeSource::HumidifierFilter,
    ];

    /// Value of the `equipment_name` label.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeSource::Cool1 => "cool_1",
            RuntimeSource::Cool2 => "cool_2",
            RuntimeSource::Heat1 => "heat_1",
            RuntimeSource::Heat2 => "heat_2",
            RuntimeSource::AuxiliaryHeat1 => "auxiliary_heat_1",
            RuntimeSource::AuxiliaryHeat2 => "auxiliary_heat_2",
            RuntimeSource::FurnaceFilter => "furnace_filter",
            RuntimeSource::HumidifierFilter => "humidifier_filter",
        }
    }

    /// Accumulated runtime in hours. Stage runtimes are reported in minutes,
    /// filter runtimes in seconds.
    pub fn hours(&self, record: &RuntimeProfileRecord) -> f64 {
        let stages = &record.profile.runtime;
        match self {
            RuntimeSource::Cool1 => minutes_to_hours(stages.cool_1),
            RuntimeSource::Cool2 => minutes_to_hours(stages.cool_2),
            RuntimeSource::Heat1 => minutes_to_hours(stages.heat_1),
            RuntimeSource::Heat2 => minutes_to_hours(stages.heat_2),
            RuntimeSource::AuxiliaryHeat1 => minutes_to_hours(stages.auxiliary_heat_1),
            RuntimeSource::AuxiliaryHeat2 => minutes_to_hours(stages.auxiliary_heat_2),
            RuntimeSource::FurnaceFilter => seconds_to_hours(record.filters.furnace.runtime),
            RuntimeSource::HumidifierFilter => {
                seconds_to_hours(record.filters.humidifier.runtime)
            }
        }
    }
}

/// Generate the equipment runtime family.
pub fn generate(doc: &RuntimeProfileDocument, settings: &ExpositionSettings) -> String {
    let mut writer = FamilyWriter::new(settings);
    writer.header(&HEADER);

    for record in doc.values() {
        for source in RuntimeSource::ALL {
            writer.sample(
                HEADER.metric,
                &[
                    (ECOBEE_NAME_LABEL, record.name.as_str()),
                    ("equipment_name", source.as_str()),
                ],
                source.hours(record),
            );
        }
    }

    writer.finish()
}

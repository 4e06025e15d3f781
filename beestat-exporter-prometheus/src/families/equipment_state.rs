//! Equipment component state (`*_equipment_state`).

use beestat_common::{ThermostatDocument, ThermostatRecord};
use tracing::trace;

use super::ECOBEE_NAME_LABEL;
use crate::exposition::{ExpositionSettings, FamilyWriter};
use crate::mapping::MetricHeader;

pub const HEADER: MetricHeader =
    MetricHeader::gauge("equipment_state", "Current status of equipment components");

/// Equipment components an ecobee can report as running.
///
/// Every thermostat gets one sample per component; names outside this set
/// are dropped to keep label cardinality bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Equipment {
    HeatPump,
    HeatPump2,
    HeatPump3,
    CompCool1,
    CompCool2,
    AuxHeat1,
    AuxHeat2,
    AuxHeat3,
    Fan,
    Humidifier,
    Dehumidifier,
    Ventilator,
    Economizer,
    CompHotWater,
    AuxHotWater,
}

impl Equipment {
    pub const ALL: [Equipment; 15] = [
        Equipment::HeatPump,
        Equipment::HeatPump2,
        Equipment::HeatPump3,
        Equipment::CompCool1,
        Equipment::CompCool2,
        Equipment::AuxHeat1,
        Equipment::AuxHeat2,
        Equipment::AuxHeat3,
        Equipment::Fan,
        Equipment::Humidifier,
        Equipment::Dehumidifier,
        Equipment::Ventilator,
        Equipment::Economizer,
        Equipment::CompHotWater,
        Equipment::AuxHotWater,
    ];

    /// Name as reported by the API and used as the `equipment` label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Equipment::HeatPump => "heatPump",
            Equipment::HeatPump2 => "heatPump2",
            Equipment::HeatPump3 => "heatPump3",
            Equipment::CompCool1 => "compCool1",
            Equipment::CompCool2 => "compCool2",
            Equipment::AuxHeat1 => "auxHeat1",
            Equipment::AuxHeat2 => "auxHeat2",
            Equipment::AuxHeat3 => "auxHeat3",
            Equipment::Fan => "fan",
            Equipment::Humidifier => "humidifier",
            Equipment::Dehumidifier => "dehumidifier",
            Equipment::Ventilator => "ventilator",
            Equipment::Economizer => "economizer",
            Equipment::CompHotWater => "compHotWater",
            Equipment::AuxHotWater => "auxHotWater",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == name)
    }
}

/// Running state of every catalog component for one thermostat, in catalog
/// order.
pub fn equipment_states(record: &ThermostatRecord) -> [(Equipment, bool); 15] {
    let mut states = Equipment::ALL.map(|e| (e, false));

    for name in &record.equipment_status {
        match Equipment::from_name(name) {
            Some(equipment) => {
                if let Some(state) = states.iter_mut().find(|(e, _)| *e == equipment) {
                    state.1 = true;
                }
            }
            None => {
                trace!(
                    thermostat = %record.name,
                    equipment = %name,
                    "Ignoring unknown equipment component"
                );
            }
        }
    }

    states
}

/// Generate the equipment state family.
pub fn generate(doc: &ThermostatDocument, settings: &ExpositionSettings) -> String {
    let mut writer = FamilyWriter::new(settings);
    writer.header(&HEADER);

    for record in doc.values() {
        for (equipment, running) in equipment_states(record) {
            writer.sample(
                HEADER.metric,
                &[
                    (ECOBEE_NAME_LABEL, record.name.as_str()),
                    ("equipment", equipment.as_str()),
                ],
                if running { 1.0 } else { 0.0 },
            );
        }
    }

    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use beestat_common::decode_document;
    use serde_json::{Value, json};

    fn doc_with_status(status: Value) -> ThermostatDocument {
        decode_document(json!({
            "1": {
                "name": "Hall",
                "version": { "thermostatFirmwareVersion": "4.8.7.179" },
                "runtime": {
                    "connected": true,
                    "desiredCool": 740, "desiredHeat": 680,
                    "actualTemperature": 700, "actualHumidity": 40
                },
                "extended_runtime": { "desiredHumidity": [40] },
                "equipment_status": status,
                "remote_sensors": []
            }
        }))
        .unwrap()
    }

    fn samples(body: &str) -> Vec<&str> {
        body.lines().filter(|l| !l.starts_with('#')).collect()
    }

    #[test]
    fn test_catalog_names_round_trip() {
        for equipment in Equipment::ALL {
            assert_eq!(Equipment::from_name(equipment.as_str()), Some(equipment));
        }
        assert_eq!(Equipment::from_name("HeatPump"), None);
    }

    #[test]
    fn test_all_off_still_emits_full_catalog() {
        let doc = doc_with_status(json!([]));
        let body = generate(&doc, &ExpositionSettings::default());
        let lines = samples(&body);

        assert_eq!(lines.len(), 15);
        assert!(lines.iter().all(|l| l.ends_with(" 0")));
        assert_eq!(
            lines[0],
            "beestat_equipment_state{ecobee_name=\"Hall\",equipment=\"heatPump\"} 0"
        );
        assert_eq!(
            lines[14],
            "beestat_equipment_state{ecobee_name=\"Hall\",equipment=\"auxHotWater\"} 0"
        );
    }

    #[test]
    fn test_active_components_marked() {
        let doc = doc_with_status(json!(["fan", "compCool1"]));
        let body = generate(&doc, &ExpositionSettings::default());
        let lines = samples(&body);

        assert_eq!(lines.len(), 15);
        let on: Vec<&&str> = lines.iter().filter(|l| l.ends_with(" 1")).collect();
        assert_eq!(on.len(), 2);
        assert!(body.contains("equipment=\"fan\"} 1"));
        assert!(body.contains("equipment=\"compCool1\"} 1"));
        assert!(body.contains("equipment=\"heatPump\"} 0"));
    }

    #[test]
    fn test_unknown_components_ignored() {
        let doc = doc_with_status(json!(["fan", "solarPanel", "fan"]));
        let body = generate(&doc, &ExpositionSettings::default());
        let lines = samples(&body);

        assert_eq!(lines.len(), 15);
        assert!(!body.contains("solarPanel"));
        assert_eq!(lines.iter().filter(|l| l.ends_with(" 1")).count(), 1);
    }

    #[test]
    fn test_header_emitted_once() {
        let body = generate(&doc_with_status(json!([])), &ExpositionSettings::default());
        assert_eq!(
            body.lines().take(2).collect::<Vec<_>>(),
            vec![
                "# HELP beestat_equipment_state Current status of equipment components",
                "# TYPE beestat_equipment_state gauge",
            ]
        );
        assert_eq!(body.matches("# TYPE").count(), 1);
    }
}

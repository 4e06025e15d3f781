//! Thermostat state metrics (`*_thermostat_*`).

use beestat_common::{Error, Result, ThermostatDocument, ThermostatRecord};

use super::ECOBEE_NAME_LABEL;
use crate::exposition::{ExpositionSettings, FamilyWriter};
use crate::mapping::MetricHeader;
use crate::units::tenths_fahrenheit_to_celsius;

/// Metrics emitted for every thermostat, in exposition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermostatMetric {
    ConnectedState,
    DesiredCoolCelsius,
    DesiredHeatCelsius,
    ActualHumidityPercent,
    DesiredHumidityPercent,
    ActualTemperatureCelsius,
}

impl ThermostatMetric {
    pub const ALL: [ThermostatMetric; 6] = [
        ThermostatMetric::ConnectedState,
        ThermostatMetric::DesiredCoolCelsius,
        ThermostatMetric::DesiredHeatCelsius,
        ThermostatMetric::ActualHumidityPercent,
        ThermostatMetric::DesiredHumidityPercent,
        ThermostatMetric::ActualTemperatureCelsius,
    ];

    pub fn header(self) -> MetricHeader {
        match self {
            ThermostatMetric::ConnectedState => MetricHeader::gauge(
                "thermostat_connected_state",
                "Ecobee connection status",
            ),
            ThermostatMetric::DesiredCoolCelsius => MetricHeader::gauge(
                "thermostat_desired_cool_celsius",
                "Desired cooling temperature",
            ),
            ThermostatMetric::DesiredHeatCelsius => MetricHeader::gauge(
                "thermostat_desired_heat_celsius",
                "Desired heating temperature",
            ),
            ThermostatMetric::ActualHumidityPercent => MetricHeader::gauge(
                "thermostat_actual_humidity_percent",
                "Actual humidity level",
            ),
            ThermostatMetric::DesiredHumidityPercent => MetricHeader::gauge(
                "thermostat_desired_humidity_percent",
                "Desired humidity level",
            ),
            ThermostatMetric::ActualTemperatureCelsius => MetricHeader::gauge(
                "thermostat_actual_temperature_celsius",
                "Actual temperature",
            ),
        }
    }

    /// Extract this metric's value from a record.
    ///
    /// Fails when the desired humidity history is empty.
    pub fn value(self, id: &str, record: &ThermostatRecord) -> Result<f64> {
        let runtime = &record.runtime;
        let value = match self {
            ThermostatMetric::ConnectedState => {
                if runtime.connected.is_connected() {
                    1.0
                } else {
                    0.0
                }
            }
            ThermostatMetric::DesiredCoolCelsius => {
                tenths_fahrenheit_to_celsius(runtime.desired_cool)
            }
            ThermostatMetric::DesiredHeatCelsius => {
                tenths_fahrenheit_to_celsius(runtime.desired_heat)
            }
            ThermostatMetric::ActualHumidityPercent => runtime.actual_humidity,
            ThermostatMetric::DesiredHumidityPercent => record
                .extended_runtime
                .current_desired_humidity()
                .ok_or_else(|| {
                    Error::malformed(format!(
                        "thermostat {}: extended_runtime.desiredHumidity is empty",
                        id
                    ))
                })?,
            ThermostatMetric::ActualTemperatureCelsius => {
                tenths_fahrenheit_to_celsius(runtime.actual_temperature)
            }
        };
        Ok(value)
    }
}

/// Generate the thermostat metric family.
pub fn generate(doc: &ThermostatDocument, settings: &ExpositionSettings) -> Result<String> {
    let mut writer = FamilyWriter::new(settings);

    for metric in ThermostatMetric::ALL {
        writer.header(&metric.header());
    }

    for (id, record) in doc {
        let labels = [
            (ECOBEE_NAME_LABEL, record.name.as_str()),
            (
                "thermostat_firmware_version",
                record.version.thermostat_firmware_version.as_str(),
            ),
        ];

        for metric in ThermostatMetric::ALL {
            let value = metric.value(id, record)?;
            writer.sample(metric.header().metric, &labels, value);
        }
    }

    Ok(writer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beestat_common::decode_document;
    use serde_json::{Value, json};

    fn record(name: &str, connected: Value, desired_humidity: Value) -> Value {
        json!({
            "name": name,
            "version": { "thermostatFirmwareVersion": "4.8.7.179" },
            "runtime": {
                "connected": connected,
                "desiredCool": 680,
                "desiredHeat": 500,
                "actualTemperature": 725,
                "actualHumidity": 43
            },
            "extended_runtime": { "desiredHumidity": desired_humidity },
            "equipment_status": [],
            "remote_sensors": []
        })
    }

    fn sample_lines(body: &str) -> Vec<&str> {
        body.lines().filter(|l| !l.starts_with('#')).collect()
    }

    #[test]
    fn test_header_block_in_declared_order() {
        let body = generate(&ThermostatDocument::new(), &ExpositionSettings::default()).unwrap();
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines.len(), 12);
        assert_eq!(
            lines[0],
            "# HELP beestat_thermostat_connected_state Ecobee connection status"
        );
        assert_eq!(lines[1], "# TYPE beestat_thermostat_connected_state gauge");
        assert_eq!(
            lines[11],
            "# TYPE beestat_thermostat_actual_temperature_celsius gauge"
        );
    }

    #[test]
    fn test_single_thermostat_values() {
        let doc: ThermostatDocument = decode_document(json!({
            "1": record("Main Floor", json!("true"), json!([35, 40]))
        }))
        .unwrap();

        let body = generate(&doc, &ExpositionSettings::default()).unwrap();
        let samples = sample_lines(&body);
        let labels = "{ecobee_name=\"Main Floor\",thermostat_firmware_version=\"4.8.7.179\"}";

        assert_eq!(
            samples,
            vec![
                format!("beestat_thermostat_connected_state{} 1", labels),
                format!("beestat_thermostat_desired_cool_celsius{} 20", labels),
                format!("beestat_thermostat_desired_heat_celsius{} 10", labels),
                format!("beestat_thermostat_actual_humidity_percent{} 43", labels),
                format!("beestat_thermostat_desired_humidity_percent{} 40", labels),
                format!("beestat_thermostat_actual_temperature_celsius{} 22.5", labels),
            ]
        );
    }

    #[test]
    fn test_connected_variants() {
        for (raw, expected) in [
            (json!(true), 1.0),
            (json!("TRUE"), 1.0),
            (json!("false"), 0.0),
            (json!("True "), 0.0),
        ] {
            let doc: ThermostatDocument =
                decode_document(json!({ "1": record("x", raw.clone(), json!([1])) })).unwrap();
            let value = ThermostatMetric::ConnectedState
                .value("1", &doc["1"])
                .unwrap();
            assert_eq!(value, expected, "connected = {}", raw);
        }
    }

    #[test]
    fn test_empty_desired_humidity_is_malformed() {
        let doc: ThermostatDocument = decode_document(json!({
            "99": record("Attic", json!(true), json!([]))
        }))
        .unwrap();

        let err = generate(&doc, &ExpositionSettings::default()).unwrap_err();
        assert!(err.is_malformed_payload());
        assert!(err.to_string().contains("thermostat 99"));
    }

    #[test]
    fn test_two_thermostats_each_complete() {
        let doc: ThermostatDocument = decode_document(json!({
            "1": record("Upstairs", json!(true), json!([40])),
            "2": record("Downstairs", json!(false), json!([45]))
        }))
        .unwrap();

        let body = generate(&doc, &ExpositionSettings::default()).unwrap();
        let samples = sample_lines(&body);
        assert_eq!(samples.len(), 12);

        for name in ["Upstairs", "Downstairs"] {
            let count = samples
                .iter()
                .filter(|l| l.contains(&format!("ecobee_name=\"{}\"", name)))
                .count();
            assert_eq!(count, 6);
        }
    }
}

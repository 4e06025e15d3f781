//! Remote sensor readings (`*_sensor_*`).

use beestat_common::{Capability, Error, Result, ThermostatDocument};
use tracing::trace;

use super::ECOBEE_NAME_LABEL;
use crate::exposition::{ExpositionSettings, FamilyWriter};
use crate::mapping::MetricHeader;
use crate::units::tenths_fahrenheit_to_celsius;

/// Metric produced by a remote sensor capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorMetric {
    TemperatureCelsius,
    HumidityPercent,
    OccupancyState,
}

impl SensorMetric {
    pub const ALL: [SensorMetric; 3] = [
        SensorMetric::TemperatureCelsius,
        SensorMetric::HumidityPercent,
        SensorMetric::OccupancyState,
    ];

    /// Map a capability type to its metric. Unmodeled types yield `None`.
    pub fn for_capability(kind: &str) -> Option<Self> {
        match kind {
            "temperature" => Some(SensorMetric::TemperatureCelsius),
            "humidity" => Some(SensorMetric::HumidityPercent),
            "occupancy" => Some(SensorMetric::OccupancyState),
            _ => None,
        }
    }

    pub fn header(self) -> MetricHeader {
        match self {
            SensorMetric::TemperatureCelsius => MetricHeader::gauge(
                "sensor_temperature_celsius",
                "Temperature from remote sensors (in Celsius)",
            ),
            SensorMetric::HumidityPercent => MetricHeader::gauge(
                "sensor_humidity_percent",
                "Humidity from remote sensors",
            ),
            SensorMetric::OccupancyState => MetricHeader::gauge(
                "sensor_occupancy_state",
                "Occupancy from remote sensors",
            ),
        }
    }

    /// Convert a capability reading. `None` if the reading has the wrong shape.
    pub fn value(self, capability: &Capability) -> Option<f64> {
        match self {
            SensorMetric::TemperatureCelsius => capability
                .numeric_value()
                .map(tenths_fahrenheit_to_celsius),
            SensorMetric::HumidityPercent => capability.numeric_value(),
            SensorMetric::OccupancyState => capability
                .flag_value()
                .map(|occupied| if occupied { 1.0 } else { 0.0 }),
        }
    }
}

/// Generate the remote sensor family.
pub fn generate(doc: &ThermostatDocument, settings: &ExpositionSettings) -> Result<String> {
    let mut writer = FamilyWriter::new(settings);

    for metric in SensorMetric::ALL {
        writer.header(&metric.header());
    }

    for (id, record) in doc {
        for sensor in &record.remote_sensors {
            for capability in &sensor.capability {
                let Some(metric) = SensorMetric::for_capability(&capability.kind) else {
                    trace!(
                        thermostat = %record.name,
                        sensor = %sensor.name,
                        capability = %capability.kind,
                        "Skipping unmodeled capability"
                    );
                    continue;
                };

                let value = metric.value(capability).ok_or_else(|| {
                    Error::malformed(format!(
                        "thermostat {}: sensor '{}' has invalid {} value {}",
                        id, sensor.name, capability.kind, capability.value
                    ))
                })?;

                writer.sample(
                    metric.header().metric,
                    &[
                        (ECOBEE_NAME_LABEL, record.name.as_str()),
                        ("sensor_name", sensor.name.as_str()),
                    ],
                    value,
                );
            }
        }
    }

    Ok(writer.finish())
}

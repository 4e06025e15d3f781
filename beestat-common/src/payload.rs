//! Payload model for the beestat API.
//!
//! Two resources feed the exporter:
//!
//! - `ecobee_thermostat` (`read_id`): live thermostat state, decoded into
//!   [`ThermostatDocument`].
//! - `thermostat` (`read_id`): runtime profile and filter counters, decoded into
//!   [`RuntimeProfileDocument`].
//!
//! Both are mappings keyed by thermostat id. Records are decoded one id at a
//! time so that a malformed record is reported together with its id.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};

/// Response envelope shared by every beestat API method.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    /// Whether the API call succeeded.
    pub success: bool,

    /// Method-specific payload; an error description when `success` is false.
    #[serde(default)]
    pub data: Value,
}

impl ApiResponse {
    /// Parse a response envelope from raw response bytes.
    ///
    /// Not a [`Error::MalformedPayload`]: a body that is not an envelope is an
    /// upstream failure, classified by the caller.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Decode `data` as a document keyed by thermostat id.
    pub fn into_document<T: DeserializeOwned>(self) -> Result<Document<T>> {
        decode_document(self.data)
    }
}

/// Records keyed by thermostat id. Iteration order is unspecified.
pub type Document<T> = HashMap<String, T>;

/// Input A: `ecobee_thermostat` records.
pub type ThermostatDocument = Document<ThermostatRecord>;

/// Input B: `thermostat` records carrying runtime profiles.
pub type RuntimeProfileDocument = Document<RuntimeProfileRecord>;

/// Decode a `data` value into a document keyed by thermostat id.
///
/// An empty JSON array is accepted as an empty mapping, since the API
/// serializes an empty keyed collection that way.
pub fn decode_document<T: DeserializeOwned>(data: Value) -> Result<Document<T>> {
    let entries = match data {
        Value::Object(entries) => entries,
        Value::Array(items) if items.is_empty() => return Ok(HashMap::new()),
        other => {
            return Err(Error::malformed(format!(
                "expected records keyed by thermostat id, found {}",
                json_kind(&other)
            )));
        }
    };

    let document = entries
        .into_iter()
        .map(|(id, record)| {
            let record = serde_json::from_value(record)
                .map_err(|e| Error::malformed(format!("thermostat {}: {}", id, e)))?;
            Ok((id, record))
        })
        .collect::<Result<Document<T>>>()?;

    trace!(thermostats = document.len(), "Decoded document");
    Ok(document)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a non-empty array",
        Value::Object(_) => "an object",
    }
}

/// Live state of one ecobee thermostat.
#[derive(Debug, Clone, Deserialize)]
pub struct ThermostatRecord {
    /// Display name, used verbatim as a label value.
    pub name: String,

    pub version: VersionInfo,

    pub runtime: ThermostatRuntime,

    pub extended_runtime: ExtendedRuntime,

    /// Names of equipment components currently running.
    pub equipment_status: Vec<String>,

    pub remote_sensors: Vec<RemoteSensor>,
}

/// Firmware information.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    #[serde(rename = "thermostatFirmwareVersion")]
    pub thermostat_firmware_version: String,
}

/// Current runtime readings. Temperatures are tenths of a degree Fahrenheit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatRuntime {
    pub connected: Connected,
    pub desired_cool: f64,
    pub desired_heat: f64,
    pub actual_temperature: f64,
    /// Percent.
    pub actual_humidity: f64,
}

/// Extended runtime readings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedRuntime {
    /// Recent desired humidity values; the last one is current.
    pub desired_humidity: Vec<f64>,
}

impl ExtendedRuntime {
    /// The current desired humidity, if any value was reported.
    pub fn current_desired_humidity(&self) -> Option<f64> {
        self.desired_humidity.last().copied()
    }
}

/// Connection flag, normalized from the API's mixed boolean/string encoding.
///
/// Only a boolean `true` or a string equal to `"true"` ignoring ASCII case
/// counts as connected. `"True "` with trailing whitespace does not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Connected(bool);

impl Connected {
    /// Normalize a raw JSON value.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(b) => Self(*b),
            Value::String(s) => Self(s.eq_ignore_ascii_case("true")),
            _ => Self(false),
        }
    }

    pub fn is_connected(self) -> bool {
        self.0
    }
}

impl<'de> Deserialize<'de> for Connected {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// A remote sensor paired with a thermostat.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSensor {
    pub name: String,
    pub capability: Vec<Capability>,
}

/// One reading exposed by a remote sensor.
#[derive(Debug, Clone, Deserialize)]
pub struct Capability {
    /// Capability type, e.g. "temperature", "humidity" or "occupancy".
    #[serde(rename = "type")]
    pub kind: String,

    /// Raw reading. The API sends strings; numbers are tolerated.
    #[serde(default)]
    pub value: Value,
}

impl Capability {
    /// Parse the reading as a number.
    pub fn numeric_value(&self) -> Option<f64> {
        match &self.value {
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Interpret the reading as a "true"/"false" flag.
    pub fn flag_value(&self) -> Option<bool> {
        match &self.value {
            Value::String(s) => Some(s == "true"),
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Runtime profile of one thermostat (`thermostat` resource).
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeProfileRecord {
    pub name: String,
    pub profile: Profile,
    pub filters: Filters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub runtime: EquipmentRuntime,
}

/// Accumulated stage runtimes, in minutes.
#[derive(Debug, Clone, Deserialize)]
pub struct EquipmentRuntime {
    pub cool_1: f64,
    pub cool_2: f64,
    pub heat_1: f64,
    pub heat_2: f64,
    pub auxiliary_heat_1: f64,
    pub auxiliary_heat_2: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Filters {
    pub furnace: FilterRuntime,
    pub humidifier: FilterRuntime,
}

/// Filter usage since last replacement.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterRuntime {
    /// Seconds.
    pub runtime: f64,
}

//! Client for the beestat API.

use std::time::Instant;

use beestat_common::{ApiResponse, RuntimeProfileDocument, ThermostatDocument};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::BeestatConfig;

/// Errors raised while fetching a snapshot from beestat.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to beestat {resource}.{method} failed: {source}")]
    Request {
        resource: &'static str,
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("beestat {resource}.{method} returned HTTP {status}")]
    Status {
        resource: &'static str,
        method: &'static str,
        status: StatusCode,
    },

    #[error("beestat {resource}.{method} returned an invalid response: {source}")]
    InvalidResponse {
        resource: &'static str,
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("beestat {resource}.{method} reported failure: {message}")]
    Unsuccessful {
        resource: &'static str,
        method: &'static str,
        message: String,
    },

    #[error(transparent)]
    Payload(#[from] beestat_common::Error),
}

impl FetchError {
    /// True if the upstream answered but its data violated the expected shape.
    pub fn is_malformed_payload(&self) -> bool {
        matches!(self, FetchError::Payload(e) if e.is_malformed_payload())
    }
}

/// Both documents of one poll cycle.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// `ecobee_thermostat` records.
    pub thermostats: ThermostatDocument,
    /// `thermostat` records carrying runtime profiles.
    pub runtime_profiles: RuntimeProfileDocument,
}

/// Stateless beestat API client.
pub struct BeestatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    sync: bool,
}

impl BeestatClient {
    /// Create a new client from configuration.
    pub fn new(config: &BeestatConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            sync: config.sync,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch both documents for one poll cycle.
    ///
    /// A failed sync is logged and does not abort the poll; beestat still
    /// serves its last synced state.
    pub async fn poll(&self) -> Result<Snapshot, FetchError> {
        let started = Instant::now();

        if self.sync
            && let Err(e) = self.sync_thermostats().await
        {
            warn!(error = %e, "Thermostat sync failed, reading last synced state");
        }

        let thermostats = self.read_document("ecobee_thermostat").await?;
        let runtime_profiles = self.read_document("thermostat").await?;

        debug!(
            thermostats = thermostats.len(),
            runtime_profiles = runtime_profiles.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched beestat snapshot"
        );

        Ok(Snapshot {
            thermostats,
            runtime_profiles,
        })
    }

    /// Ask beestat to pull fresh data from ecobee.
    pub async fn sync_thermostats(&self) -> Result<(), FetchError> {
        self.call("thermostat", "sync").await.map(|_| ())
    }

    /// Read all records of `resource`, keyed by thermostat id.
    pub async fn read_document<T: DeserializeOwned>(
        &self,
        resource: &'static str,
    ) -> Result<beestat_common::Document<T>, FetchError> {
        let data = self.call(resource, "read_id").await?;
        Ok(beestat_common::decode_document(data)?)
    }

    /// Issue one API call and return its `data` on success.
    async fn call(&self, resource: &'static str, method: &'static str) -> Result<Value, FetchError> {
        let request_error = |source: reqwest::Error| FetchError::Request {
            resource,
            method,
            // The URL carries the API key
            source: source.without_url(),
        };

        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("resource", resource),
                ("method", method),
            ])
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                resource,
                method,
                status,
            });
        }

        let body = response.bytes().await.map_err(request_error)?;
        let envelope =
            ApiResponse::from_slice(&body).map_err(|source| FetchError::InvalidResponse {
                resource,
                method,
                source,
            })?;

        if !envelope.success {
            return Err(FetchError::Unsuccessful {
                resource,
                method,
                message: error_message(&envelope.data),
            });
        }

        debug!(resource, method, bytes = body.len(), "beestat call succeeded");
        Ok(envelope.data)
    }
}

fn error_message(data: &Value) -> String {
    data.get("error_message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| data.to_string())
}

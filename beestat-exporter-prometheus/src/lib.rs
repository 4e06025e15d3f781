//! Prometheus metrics exporter for ecobee thermostats.
//!
//! This crate polls the beestat API for the state of every ecobee thermostat
//! on an account and exposes it via an HTTP `/metrics` endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   beestat API   │────>│   Exposition    │────>│   HTTP Server   │
//! │ (2 documents)   │     │ (4 families)    │     │   (/metrics)    │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! Every scrape fetches a fresh snapshot and transforms it; nothing is
//! cached between scrapes.
//!
//! # Usage
//!
//! ```bash
//! BEESTAT_API_KEY=... beestat-exporter-prometheus --config config.json5
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod client;
pub mod config;
pub mod exposition;
pub mod families;
pub mod http;
pub mod mapping;
pub mod units;

pub use client::{BeestatClient, FetchError, Snapshot};
pub use config::ExporterConfig;
pub use exposition::{Exposition, ExpositionSettings};
pub use http::HttpServer;

//! Assembles the Prometheus exposition body from the two beestat documents.

use std::collections::HashMap;

use beestat_common::{Result, RuntimeProfileDocument, ThermostatDocument};
use tracing::debug;

use crate::config::PrometheusConfig;
use crate::families::{equipment_state, runtime, sensor, thermostat};
use crate::mapping::{
    MetricHeader, build_metric_name, escape_help, format_labels, format_value,
    sanitize_label_name, sanitize_metric_name,
};

/// Naming and labeling rules shared by every metric family.
#[derive(Debug, Clone)]
pub struct ExpositionSettings {
    prefix: String,
    default_labels: Vec<(String, String)>,
}

impl ExpositionSettings {
    /// Create settings with a metric name prefix and extra labels added to
    /// every sample.
    pub fn new(prefix: &str, default_labels: &HashMap<String, String>) -> Self {
        let mut labels: Vec<(String, String)> = default_labels
            .iter()
            .map(|(k, v)| (sanitize_label_name(k), v.clone()))
            .collect();
        // Keys that sanitize to the same name keep the smallest value.
        labels.sort();
        labels.dedup_by(|a, b| a.0 == b.0);

        Self {
            prefix: sanitize_metric_name(prefix),
            default_labels: labels,
        }
    }

    pub fn from_config(config: &PrometheusConfig) -> Self {
        Self::new(&config.prefix, &config.default_labels)
    }

    /// Full metric name including the prefix.
    pub fn metric_name(&self, metric: &str) -> String {
        build_metric_name(&self.prefix, metric)
    }
}

impl Default for ExpositionSettings {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_PREFIX, &HashMap::new())
    }
}

/// Line buffer for one metric family.
///
/// Header lines come first, followed by samples. Lines are joined with a
/// single newline and no trailing newline.
pub struct FamilyWriter<'a> {
    settings: &'a ExpositionSettings,
    lines: Vec<String>,
}

impl<'a> FamilyWriter<'a> {
    pub fn new(settings: &'a ExpositionSettings) -> Self {
        Self {
            settings,
            lines: Vec::new(),
        }
    }

    /// Write the `# HELP` and `# TYPE` lines for a metric.
    pub fn header(&mut self, header: &MetricHeader) {
        let name = self.settings.metric_name(header.metric);
        self.lines
            .push(format!("# HELP {} {}", name, escape_help(header.help)));
        self.lines
            .push(format!("# TYPE {} {}", name, header.kind.as_str()));
    }

    /// Write one sample line. Default labels are appended after `labels`
    /// unless their name is already present.
    pub fn sample(&mut self, metric: &str, labels: &[(&str, &str)], value: f64) {
        let mut all: Vec<(&str, &str)> = labels.to_vec();
        for (k, v) in &self.settings.default_labels {
            if !labels.iter().any(|(lk, _)| *lk == k.as_str()) {
                all.push((k.as_str(), v.as_str()));
            }
        }

        self.lines.push(format!(
            "{}{} {}",
            self.settings.metric_name(metric),
            format_labels(&all),
            format_value(value)
        ));
    }

    pub fn finish(self) -> String {
        self.lines.join("\n")
    }
}

/// Stateless transformation of one poll cycle's documents into an
/// exposition body.
#[derive(Debug, Clone, Default)]
pub struct Exposition {
    settings: ExpositionSettings,
}

impl Exposition {
    pub fn new(settings: ExpositionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExpositionSettings {
        &self.settings
    }

    /// Render all metric families.
    ///
    /// Thermostat, equipment state and sensor families are generated from
    /// `thermostats`; the runtime family from `runtime_profiles`. Families
    /// are separated by one blank line. Any malformed record fails the whole
    /// render.
    pub fn render(
        &self,
        thermostats: &ThermostatDocument,
        runtime_profiles: &RuntimeProfileDocument,
    ) -> Result<String> {
        let families = [
            thermostat::generate(thermostats, &self.settings)?,
            equipment_state::generate(thermostats, &self.settings),
            sensor::generate(thermostats, &self.settings)?,
            runtime::generate(runtime_profiles, &self.settings),
        ];

        debug!(
            thermostats = thermostats.len(),
            runtime_profiles = runtime_profiles.len(),
            "Rendered exposition"
        );

        Ok(families.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::PrometheusType;

    const HEADER: MetricHeader = MetricHeader {
        metric: "test_metric",
        help: "A test metric",
        kind: PrometheusType::Gauge,
    };

    #[test]
    fn test_writer_header_and_sample() {
        let settings = ExpositionSettings::default();
        let mut writer = FamilyWriter::new(&settings);
        writer.header(&HEADER);
        writer.sample("test_metric", &[("ecobee_name", "Den")], 1.5);

        assert_eq!(
            writer.finish(),
            "# HELP beestat_test_metric A test metric\n\
             # TYPE beestat_test_metric gauge\n\
             beestat_test_metric{ecobee_name=\"Den\"} 1.5"
        );
    }

    #[test]
    fn test_empty_prefix() {
        let settings = ExpositionSettings::new("", &HashMap::new());
        assert_eq!(settings.metric_name("equipment_state"), "equipment_state");
    }

    #[test]
    fn test_prefix_is_sanitized() {
        let settings = ExpositionSettings::new("my-home", &HashMap::new());
        assert_eq!(
            settings.metric_name("equipment_state"),
            "my_home_equipment_state"
        );
    }

    #[test]
    fn test_default_labels_appended_without_override() {
        let defaults = HashMap::from([
            ("site".to_string(), "cabin".to_string()),
            ("ecobee_name".to_string(), "ignored".to_string()),
        ]);
        let settings = ExpositionSettings::new("beestat", &defaults);
        let mut writer = FamilyWriter::new(&settings);
        writer.sample("equipment_state", &[("ecobee_name", "Den")], 0.0);

        assert_eq!(
            writer.finish(),
            "beestat_equipment_state{ecobee_name=\"Den\",site=\"cabin\"} 0"
        );
    }

    #[test]
    fn test_colliding_default_label_names_are_deterministic() {
        // Each map gets its own hasher seed, so iteration order varies.
        for _ in 0..16 {
            let defaults = HashMap::from([
                ("site-name".to_string(), "lake".to_string()),
                ("site.name".to_string(), "cabin".to_string()),
                ("site_name".to_string(), "home".to_string()),
            ]);
            let settings = ExpositionSettings::new("beestat", &defaults);
            let mut writer = FamilyWriter::new(&settings);
            writer.sample("m", &[], 1.0);
            assert_eq!(writer.finish(), "beestat_m{site_name=\"cabin\"} 1");
        }
    }

    #[test]
    fn test_label_values_escaped() {
        let settings = ExpositionSettings::default();
        let mut writer = FamilyWriter::new(&settings);
        writer.sample("m", &[("ecobee_name", "Kid\"s \\ Room")], 1.0);

        assert_eq!(
            writer.finish(),
            "beestat_m{ecobee_name=\"Kid\\\"s \\\\ Room\"} 1"
        );
    }

    #[test]
    fn test_render_empty_documents() {
        let exposition = Exposition::default();
        let body = exposition
            .render(&ThermostatDocument::new(), &RuntimeProfileDocument::new())
            .unwrap();

        let families: Vec<&str> = body.split("\n\n").collect();
        assert_eq!(families.len(), 4);
        assert!(families.iter().all(|f| f.lines().all(|l| l.starts_with('#'))));
        assert!(families[3].contains("# TYPE beestat_equipment_runtime_hours counter"));
        assert!(!body.ends_with('\n'));
    }
}

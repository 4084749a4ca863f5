//! RTT Collector - Main application use case
//!
//! Orchestrates one collection cycle: fetch the kernel's TCP metrics, parse
//! them, resolve both endpoints and emit the `tcprtt` / `tcprttvar` gauges.
//! This is what the metrics endpoint drives on every scrape.

use crate::domain::entities::{GaugeSample, RttRecord};
use crate::domain::ports::{IpResolver, StatSource};
use crate::domain::services::record_parser;
use crate::error::{ExecutionError, RegistrationError};
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts};
use std::collections::HashMap;
use std::sync::Arc;

pub const RTT_METRIC: &str = "tcprtt";
pub const RTT_HELP: &str = "tcp rtt in microsecond";
pub const RTT_VAR_METRIC: &str = "tcprttvar";
pub const RTT_VAR_HELP: &str = "tcp rtt variation in microsecond";
pub const LABELS: [&str; 3] = ["src", "dst", "host"];

/// Sentinel host label when the hostname cannot be read.
pub const UNKNOWN_HOST: &str = "unknown";

/// Hostname of this machine, or `"unknown"`.
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| UNKNOWN_HOST.to_string())
}

/// Pull collector for TCP RTT gauges.
///
/// Nothing is cached between scrapes: every `collect` runs the external
/// command and reports exactly what it printed.
pub struct RttCollector {
    source: Arc<dyn StatSource>,
    resolver: Option<Arc<dyn IpResolver>>,
    hostname: String,
    descs: Vec<Desc>,
}

impl RttCollector {
    /// Create a collector without identity resolution.
    pub fn new(source: Arc<dyn StatSource>, hostname: String) -> Result<Self, RegistrationError> {
        let descs = vec![
            Desc::new(
                RTT_METRIC.to_string(),
                RTT_HELP.to_string(),
                label_names(),
                HashMap::new(),
            )?,
            Desc::new(
                RTT_VAR_METRIC.to_string(),
                RTT_VAR_HELP.to_string(),
                label_names(),
                HashMap::new(),
            )?,
        ];

        Ok(Self {
            source,
            resolver: None,
            hostname,
            descs,
        })
    }

    /// Resolve `src` / `dst` labels through `resolver`.
    pub fn with_resolver(mut self, resolver: Arc<dyn IpResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Run one cycle and return the samples it produced.
    ///
    /// A failed fetch is logged and yields no samples.
    pub fn samples(&self) -> Vec<GaugeSample> {
        self.try_samples().unwrap_or_else(|e| {
            tracing::error!("get stat failed: {}", e);
            Vec::new()
        })
    }

    /// Like [`samples`](Self::samples), but hands a failed fetch back to the caller.
    pub fn try_samples(&self) -> Result<Vec<GaugeSample>, ExecutionError> {
        let text = self.source.fetch()?;

        let mut samples = Vec::new();
        for record in record_parser::parse(&text) {
            let (src, dst) = self.endpoints(&record);
            samples.push(GaugeSample {
                metric: RTT_METRIC,
                src: src.clone(),
                dst: dst.clone(),
                host: self.hostname.clone(),
                value: record.rtt_micros as f64,
            });
            samples.push(GaugeSample {
                metric: RTT_VAR_METRIC,
                src,
                dst,
                host: self.hostname.clone(),
                value: record.rtt_var_micros as f64,
            });
        }

        tracing::debug!("collected {} tcp rtt samples", samples.len());
        Ok(samples)
    }

    /// Labels for both ends of a record; raw IPs when no resolver is set.
    fn endpoints(&self, record: &RttRecord) -> (String, String) {
        match &self.resolver {
            Some(resolver) => (
                resolver.resolve(&record.source),
                resolver.resolve(&record.destination),
            ),
            None => (record.source.clone(), record.destination.clone()),
        }
    }
}

impl Collector for RttCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let samples = self.samples();
        if samples.is_empty() {
            return Vec::new();
        }

        let (rtt, rtt_var) = match (
            new_gauge_vec(RTT_METRIC, RTT_HELP),
            new_gauge_vec(RTT_VAR_METRIC, RTT_VAR_HELP),
        ) {
            (Ok(rtt), Ok(rtt_var)) => (rtt, rtt_var),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!("building gauge families failed: {}", e);
                return Vec::new();
            }
        };

        apply_samples(&samples, &rtt, &rtt_var);

        let mut families = rtt.collect();
        families.extend(rtt_var.collect());
        families
    }
}

/// Gauge vector with the exporter's label set.
pub fn new_gauge_vec(name: &str, help: &str) -> prometheus::Result<GaugeVec> {
    GaugeVec::new(Opts::new(name, help), &LABELS)
}

/// Write samples into their gauge vectors. Later duplicates overwrite earlier ones.
pub fn apply_samples(samples: &[GaugeSample], rtt: &GaugeVec, rtt_var: &GaugeVec) {
    for sample in samples {
        let vec = if sample.metric == RTT_METRIC { rtt } else { rtt_var };
        vec.with_label_values(&[sample.src.as_str(), sample.dst.as_str(), sample.host.as_str()])
            .set(sample.value);
    }
}

fn label_names() -> Vec<String> {
    LABELS.iter().map(|l| l.to_string()).collect()
}

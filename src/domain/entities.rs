//! Domain Entities - Core exporter objects
//!
//! These entities represent the core concepts of the exporter domain.
//! They have no external dependencies.

use std::fmt;

/// One `ip tcp_metrics` entry.
///
/// Transient: built by the record parser and consumed immediately by the
/// collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RttRecord {
    /// First address on the line (the peer the kernel keeps metrics for)
    pub source: String,
    /// Address following the `source` keyword
    pub destination: String,
    /// Smoothed round-trip time in microseconds
    pub rtt_micros: u64,
    /// Round-trip time variance in microseconds
    pub rtt_var_micros: u64,
}

/// A single gauge value ready for exposition.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeSample {
    /// Metric family name (`tcprtt` or `tcprttvar`)
    pub metric: &'static str,
    pub src: String,
    pub dst: String,
    pub host: String,
    pub value: f64,
}

/// Which index an identity lives in.
///
/// Workload instances win over stable endpoints when both claim an IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKind {
    /// An individual running workload (a pod)
    WorkloadInstance,
    /// A stable virtual address in front of workloads (a service)
    StableEndpoint,
}

impl IdentityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityKind::WorkloadInstance => "workload",
            IdentityKind::StableEndpoint => "endpoint",
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An IP-addressable object known to the orchestration platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub kind: IdentityKind,
    pub namespace: String,
    pub name: String,
    /// Empty when the object has no address yet
    pub ip: String,
}

impl IdentityRecord {
    pub fn new(
        kind: IdentityKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
        ip: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
            ip: ip.into(),
        }
    }

    /// Stable key of the underlying object, independent of its IP.
    pub fn object_key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Human-readable identity used as a metric label.
    pub fn display_name(&self) -> String {
        self.object_key()
    }

    /// Whether the record carries an address that can be indexed.
    ///
    /// Headless services report the literal `None` as their cluster IP.
    pub fn has_ip(&self) -> bool {
        !self.ip.is_empty() && self.ip != "None"
    }
}

/// One change notification from an identity source.
///
/// `Init` .. `InitDone` bracket a full relist; objects not re-announced
/// through `InitApply` in between no longer exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    Apply(IdentityRecord),
    Delete(IdentityRecord),
    Init,
    InitApply(IdentityRecord),
    InitDone,
}

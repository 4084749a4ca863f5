//! Error Types
//!
//! Per-cycle and per-record errors are recovered where they occur (logged,
//! skipped). Only `ConfigurationError` and `RegistrationError` are fatal, and
//! only at startup.

use std::num::ParseIntError;
use std::process::ExitStatus;

/// The statistics command could not produce output for this cycle.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}")]
    NonZeroExit { command: String, status: ExitStatus },
    #[error("`{command}` wrote non-UTF-8 output")]
    InvalidOutput { command: String },
}

/// A single matched line carried a field that is not a valid `u64`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid {field} value {value:?}: {source}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// An identity event stream yielded an error instead of an event.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdentitySourceError {
    #[error("watch stream error: {0}")]
    Watch(String),
}

/// The identity directory could not be built.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("loading kubeconfig {path}: {source}")]
    Kubeconfig {
        path: String,
        #[source]
        source: kube::config::KubeconfigError,
    },
    #[error("inferring cluster configuration: {0}")]
    Infer(#[from] kube::config::InferConfigError),
    #[error("building API client: {0}")]
    Client(#[source] kube::Error),
    #[error("API server unreachable: {0}")]
    Unreachable(#[source] kube::Error),
}

/// A collector could not be described or registered.
#[derive(Debug, thiserror::Error)]
#[error("metric registration failed: {0}")]
pub struct RegistrationError(#[from] pub prometheus::Error);

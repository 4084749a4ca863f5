//! tcprtt-exporter Library
//!
//! This module exposes the exporter components for use in integration tests
//! and as a library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

// Re-export commonly used types
pub use adapters::inbound::{MetricsServer, MetricsState};
pub use adapters::outbound::{IdentityDirectory, IpCommandStatSource};
pub use application::{RttCollector, RttTicker};
pub use config::{load_config, CollectMode, Config};
pub use domain::entities::{GaugeSample, IdentityEvent, IdentityKind, IdentityRecord, RttRecord};
pub use domain::ports::{IdentitySource, IpResolver, StatSource};
pub use error::{ConfigurationError, ExecutionError, ParseError, RegistrationError};

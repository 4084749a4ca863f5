//! Adapters Layer
//!
//! Inbound adapters drive the application (HTTP); outbound adapters
//! implement the domain ports (child process, Kubernetes).

pub mod inbound;
pub mod outbound;

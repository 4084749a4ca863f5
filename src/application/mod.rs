//! Application Layer
//!
//! Use cases that wire domain services to ports.

pub mod rtt_collector;
pub mod rtt_ticker;

pub use rtt_collector::{local_hostname, RttCollector};
pub use rtt_ticker::RttTicker;

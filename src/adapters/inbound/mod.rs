mod metrics_server;

pub use metrics_server::{HealthResponse, MetricsServer, MetricsState, SyncProbe};

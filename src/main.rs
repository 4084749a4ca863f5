//! tcprtt-exporter - TCP RTT Prometheus exporter
//!
//! This is the composition root that wires together all the components.

use anyhow::Context;
use prometheus::Registry;
use std::sync::Arc;
use tcprtt_exporter::adapters::inbound::{MetricsServer, MetricsState};
use tcprtt_exporter::adapters::outbound::{IdentityDirectory, IpCommandStatSource};
use tcprtt_exporter::application::{local_hostname, RttCollector, RttTicker};
use tcprtt_exporter::config::{load_config, CollectMode};
use tcprtt_exporter::domain::ports::{IpResolver, StatSource};
use tcprtt_exporter::infrastructure::shutdown_signal;
use tcprtt_exporter::RegistrationError;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(
        "starting tcprtt-exporter version={} listen={} mode={:?} resolve={}",
        env!("CARGO_PKG_VERSION"),
        cfg.listen_addr,
        cfg.mode,
        cfg.resolve_enabled
    );

    // ===== COMPOSITION ROOT =====

    // 1. Outbound adapters
    let source: Arc<dyn StatSource> = Arc::new(IpCommandStatSource::new());

    let directory = if cfg.resolve_enabled {
        let directory = IdentityDirectory::connect(cfg.kubeconfig.as_deref())
            .await
            .context("creating identity directory")?;
        Some(Arc::new(directory))
    } else {
        None
    };

    // 2. Application
    let hostname = local_hostname();
    tracing::info!("host label {}", hostname);

    let mut collector = RttCollector::new(source, hostname)?;
    if let Some(directory) = &directory {
        collector = collector.with_resolver(directory.clone() as Arc<dyn IpResolver>);
    }

    let registry = match cfg.mode {
        CollectMode::Pull => {
            let registry = Registry::new();
            registry
                .register(Box::new(collector))
                .map_err(RegistrationError::from)?;
            registry
        }
        CollectMode::Ticker => {
            let ticker = Arc::new(RttTicker::new(Arc::new(collector))?);
            let registry = ticker.registry();
            ticker.start(cfg.tick_interval());
            registry
        }
    };

    // 3. Inbound adapter
    let mut state = MetricsState::new(registry);
    if let Some(directory) = &directory {
        let directory = directory.clone();
        state = state.with_sync_probe(Arc::new(move || directory.is_synced()));
    }
    let server = MetricsServer::new(cfg.listen_addr.clone(), state);

    tokio::select! {
        result = server.run() => result.context("metrics endpoint failed"),
        signal = shutdown_signal() => {
            tracing::info!("got signal {}, exiting", signal?);
            Ok(())
        }
    }
}

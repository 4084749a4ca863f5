//! RTT Ticker
//!
//! Self-driven alternative to the pull collector: runs the collection cycle
//! on a fixed interval and pushes the results into gauges registered in a
//! registry of its own.

use super::rtt_collector::{
    apply_samples, new_gauge_vec, RttCollector, RTT_HELP, RTT_METRIC, RTT_VAR_HELP, RTT_VAR_METRIC,
};
use crate::error::RegistrationError;
use prometheus::{GaugeVec, Registry};
use std::sync::Arc;
use std::time::Duration;

/// Periodic driver for an [`RttCollector`].
///
/// Each successful tick replaces the previous snapshot, so peers that left
/// the kernel cache disappear. A failed tick leaves the last snapshot as is.
pub struct RttTicker {
    collector: Arc<RttCollector>,
    registry: Registry,
    rtt: GaugeVec,
    rtt_var: GaugeVec,
}

impl RttTicker {
    pub fn new(collector: Arc<RttCollector>) -> Result<Self, RegistrationError> {
        let registry = Registry::new();

        let rtt = new_gauge_vec(RTT_METRIC, RTT_HELP)?;
        registry.register(Box::new(rtt.clone()))?;

        let rtt_var = new_gauge_vec(RTT_VAR_METRIC, RTT_VAR_HELP)?;
        registry.register(Box::new(rtt_var.clone()))?;

        Ok(Self {
            collector,
            registry,
            rtt,
            rtt_var,
        })
    }

    /// Registry holding the ticker's gauges.
    pub fn registry(&self) -> Registry {
        self.registry.clone()
    }

    /// Run one collection cycle. Returns the number of samples written.
    pub fn tick(&self) -> usize {
        let samples = match self.collector.try_samples() {
            Ok(samples) => samples,
            Err(e) => {
                tracing::error!("get stat failed: {}", e);
                return 0;
            }
        };

        self.rtt.reset();
        self.rtt_var.reset();
        apply_samples(&samples, &self.rtt, &self.rtt_var);
        samples.len()
    }

    /// Start the background tick loop. The first tick runs immediately.
    pub fn start(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let this = self.clone();
                match tokio::task::spawn_blocking(move || this.tick()).await {
                    Ok(count) => tracing::debug!("tick wrote {} samples", count),
                    Err(e) => tracing::error!("spawn_blocking error: {:?}", e),
                }
            }
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::domain::ports::StatSource;
    use crate::error::ExecutionError;
    use std::sync::Mutex;

    /// Replays queued outputs, then fails.
    struct ScriptedStatSource(Mutex<Vec<Result<String, ()>>>);

    impl StatSource for ScriptedStatSource {
        fn fetch(&self) -> Result<String, ExecutionError> {
            let mut script = self.0.lock().unwrap();
            let next = if script.is_empty() { Err(()) } else { script.remove(0) };
            next.map_err(|_| ExecutionError::InvalidOutput {
                command: "ip tcp_metrics".to_string(),
            })
        }
    }

    fn ticker(script: Vec<Result<&str, ()>>) -> RttTicker {
        let script = script.into_iter().map(|r| r.map(str::to_string)).collect();
        let source = Arc::new(ScriptedStatSource(Mutex::new(script)));
        let collector = RttCollector::new(source, "test-host".to_string()).unwrap();
        RttTicker::new(Arc::new(collector)).unwrap()
    }

    fn gauge(ticker: &RttTicker, src: &str, dst: &str) -> Option<f64> {
        ticker
            .rtt
            .get_metric_with_label_values(&[src, dst, "test-host"])
            .ok()
            .map(|g| g.get())
    }

    fn series_count(ticker: &RttTicker) -> usize {
        let mut buffer = Vec::new();
        prometheus::Encoder::encode(
            &prometheus::TextEncoder::new(),
            &ticker.registry().gather(),
            &mut buffer,
        )
        .unwrap();
        String::from_utf8(buffer)
            .unwrap()
            .lines()
            .filter(|l| l.starts_with("tcprtt{"))
            .count()
    }

    #[test]
    fn test_tick_writes_gauges() {
        let ticker = ticker(vec![Ok(
            "10.0.0.1 age 5.0sec cwnd 10 rtt 1000us rttvar 50us source 10.0.0.2",
        )]);

        assert_eq!(ticker.tick(), 2);
        assert_eq!(gauge(&ticker, "10.0.0.1", "10.0.0.2"), Some(1000.0));
        assert_eq!(series_count(&ticker), 1);
    }

    #[test]
    fn test_tick_replaces_previous_snapshot() {
        let ticker = ticker(vec![
            Ok("10.0.0.1 age 1sec rtt 10us rttvar 1us source 10.0.0.2"),
            Ok("10.0.0.3 age 1sec rtt 30us rttvar 3us source 10.0.0.2"),
        ]);

        ticker.tick();
        ticker.tick();

        assert_eq!(series_count(&ticker), 1);
        assert_eq!(gauge(&ticker, "10.0.0.3", "10.0.0.2"), Some(30.0));
    }

    #[test]
    fn test_failed_tick_keeps_previous_snapshot() {
        let ticker = ticker(vec![
            Ok("10.0.0.1 age 1sec rtt 10us rttvar 1us source 10.0.0.2"),
            Err(()),
        ]);

        ticker.tick();
        assert_eq!(ticker.tick(), 0);

        assert_eq!(series_count(&ticker), 1);
        assert_eq!(gauge(&ticker, "10.0.0.1", "10.0.0.2"), Some(10.0));
    }

    #[test]
    fn test_empty_tick_clears_snapshot() {
        let ticker = ticker(vec![
            Ok("10.0.0.1 age 1sec rtt 10us rttvar 1us source 10.0.0.2"),
            Ok(""),
        ]);

        ticker.tick();
        assert_eq!(ticker.tick(), 0);

        assert_eq!(series_count(&ticker), 0);
    }

    #[tokio::test]
    async fn test_start_runs_first_tick() {
        let ticker = Arc::new(ticker(vec![Ok(
            "10.0.0.1 age 1sec rtt 10us rttvar 1us source 10.0.0.2",
        )]));

        let handle = ticker.clone().start(Duration::from_secs(3600));
        for _ in 0..200 {
            if series_count(&ticker) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        handle.abort();

        assert_eq!(series_count(&ticker), 1);
    }
}

use std::str::FromStr;
use std::time::Duration;

/// How samples reach the metrics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectMode {
    /// Run the stat command on every scrape
    Pull,
    /// Run it on a fixed interval and serve the last snapshot
    Ticker,
}

impl FromStr for CollectMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pull" => Ok(CollectMode::Pull),
            "ticker" => Ok(CollectMode::Ticker),
            other => Err(format!("unknown collect mode {:?}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub resolve_enabled: bool,
    pub kubeconfig: Option<String>,
    pub mode: CollectMode,
    pub tick_interval_secs: u64,
    pub debug: bool,
}

impl Config {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8090".to_string(),
            resolve_enabled: false,
            kubeconfig: None,
            mode: CollectMode::Pull,
            tick_interval_secs: 5,
            debug: false,
        }
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    Ok(config_from(|key| std::env::var(key).ok()))
}

/// Build the configuration from a variable lookup.
pub fn config_from<F>(var: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let listen_addr = var("TCPRTT_LISTEN_ADDR").unwrap_or(defaults.listen_addr);

    let resolve_enabled = var("TCPRTT_RESOLVE_ENABLED")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false);

    let kubeconfig = var("TCPRTT_KUBECONFIG").filter(|v| !v.is_empty());

    let mode = match var("TCPRTT_MODE") {
        Some(v) => v.parse().unwrap_or_else(|e| {
            tracing::warn!("TCPRTT_MODE: {}, using pull", e);
            CollectMode::Pull
        }),
        None => defaults.mode,
    };

    let tick_interval_secs = var("TCPRTT_TICK_INTERVAL_SECS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.tick_interval_secs);

    let debug = var("DEBUG").is_some();

    Config {
        listen_addr,
        resolve_enabled,
        kubeconfig,
        mode,
        tick_interval_secs,
        debug,
    }
}

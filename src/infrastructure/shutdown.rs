//! Shutdown Signals
//!
//! The exporter holds no state worth draining, so a termination signal
//! simply ends the process.

/// Wait for a termination signal.
///
/// Returns the name of the signal that arrived. Fails only if a handler
/// cannot be installed.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(unix)]
pub async fn shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut quit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
        _ = hangup.recv() => "SIGHUP",
        _ = quit.recv() => "SIGQUIT",
    };

    Ok(name)
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(not(unix))]
pub async fn shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}

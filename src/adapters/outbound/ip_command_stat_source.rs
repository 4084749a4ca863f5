//! `ip tcp_metrics` Stat Source
//!
//! Implements StatSource by running the iproute2 `ip` command.

use crate::domain::ports::StatSource;
use crate::error::ExecutionError;
use std::process::{Command, Stdio};

const DEFAULT_PROGRAM: &str = "ip";
const DEFAULT_SUBCOMMAND: &str = "tcp_metrics";

/// Stat source backed by a short-lived child process.
///
/// Stdout is captured in full; stderr is inherited so the command's own
/// diagnostics land on the exporter's stderr.
pub struct IpCommandStatSource {
    program: String,
    subcommand: String,
}

impl IpCommandStatSource {
    /// Run `ip tcp_metrics`.
    pub fn new() -> Self {
        Self::with_command(DEFAULT_PROGRAM, DEFAULT_SUBCOMMAND)
    }

    /// Run `program` with a single argument instead of `ip tcp_metrics`.
    ///
    /// Lets tests substitute a harmless command; production wiring only
    /// uses [`new`](Self::new).
    #[doc(hidden)]
    pub fn with_command(program: impl Into<String>, subcommand: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            subcommand: subcommand.into(),
        }
    }

    fn command_line(&self) -> String {
        format!("{} {}", self.program, self.subcommand)
    }
}

impl Default for IpCommandStatSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StatSource for IpCommandStatSource {
    fn fetch(&self) -> Result<String, ExecutionError> {
        let output = Command::new(&self.program)
            .arg(&self.subcommand)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| ExecutionError::Spawn {
                command: self.command_line(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExecutionError::NonZeroExit {
                command: self.command_line(),
                status: output.status,
            });
        }

        String::from_utf8(output.stdout).map_err(|_| ExecutionError::InvalidOutput {
            command: self.command_line(),
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let source = IpCommandStatSource::default();
        assert_eq!(source.command_line(), "ip tcp_metrics");
    }

    #[test]
    fn test_fetch_captures_stdout() {
        let line = "10.0.0.1 age 5.0sec cwnd 10 rtt 1000us rttvar 50us source 10.0.0.2";
        let source = IpCommandStatSource::with_command("echo", line);

        let text = source.fetch().unwrap();
        assert_eq!(text.trim_end(), line);
    }

    #[test]
    fn test_fetch_nonzero_exit() {
        let source = IpCommandStatSource::with_command("false", "tcp_metrics");

        let result = source.fetch();
        assert!(matches!(result, Err(ExecutionError::NonZeroExit { .. })));
    }

    #[test]
    fn test_fetch_missing_program() {
        let source =
            IpCommandStatSource::with_command("/nonexistent/bin/ip-does-not-exist", "tcp_metrics");

        let result = source.fetch();
        assert!(matches!(result, Err(ExecutionError::Spawn { .. })));
    }

    #[test]
    fn test_stat_source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IpCommandStatSource>();
    }
}

//! Record Parser Service
//!
//! Extracts RTT records from `ip tcp_metrics` output.
//! Pure domain logic: the only side effect is a warning per dropped match.

use crate::domain::entities::RttRecord;
use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// "127.0.0.1 age 1748496.418sec cwnd 10 rtt 210409us rttvar 210409us source 10.233.75.119"
static RTT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\S+) age .* rtt (\d+)us rttvar (\d+)us source (\S+)")
        .expect("Invalid tcp_metrics regex")
});

const SRC_GROUP: usize = 1;
const RTT_GROUP: usize = 2;
const RTT_VAR_GROUP: usize = 3;
const DST_GROUP: usize = 4;

/// Parse a full `ip tcp_metrics` dump.
///
/// Yields one record per match, lazily. Lines that do not match are ignored.
/// A match whose numbers do not fit a `u64` is logged and dropped; the rest
/// of the batch continues.
pub fn parse(text: &str) -> impl Iterator<Item = RttRecord> + '_ {
    RTT_PATTERN
        .captures_iter(text)
        .filter_map(|caps| match parse_captures(&caps) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("skipping tcp_metrics entry {:?}: {}", &caps[0], e);
                None
            }
        })
}

/// Convert one regex match into a record.
fn parse_captures(caps: &Captures<'_>) -> Result<RttRecord, ParseError> {
    Ok(RttRecord {
        source: caps[SRC_GROUP].to_string(),
        destination: caps[DST_GROUP].to_string(),
        rtt_micros: parse_micros("rtt", &caps[RTT_GROUP])?,
        rtt_var_micros: parse_micros("rttvar", &caps[RTT_VAR_GROUP])?,
    })
}

fn parse_micros(field: &'static str, value: &str) -> Result<u64, ParseError> {
    value.parse().map_err(|source| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    // ===== Well-formed Input =====

    #[test]
    fn test_parse_single_line() {
        let text = "10.0.0.1 age 5.0sec cwnd 10 rtt 1000us rttvar 50us source 10.0.0.2";
        let records: Vec<_> = parse(text).collect();

        assert_eq!(
            records,
            vec![RttRecord {
                source: "10.0.0.1".to_string(),
                destination: "10.0.0.2".to_string(),
                rtt_micros: 1000,
                rtt_var_micros: 50,
            }]
        );
    }

    #[test]
    fn test_parse_keeps_roles() {
        let text = "127.0.0.1 age 1748496.418sec cwnd 10 rtt 210409us rttvar 210409us source 10.233.75.119";
        let record = parse(text).next().unwrap();

        assert_eq!(record.source, "127.0.0.1");
        assert_eq!(record.destination, "10.233.75.119");
        assert_eq!(record.rtt_micros, 210409);
        assert_eq!(record.rtt_var_micros, 210409);
    }

    #[test]
    fn test_parse_multiple_lines() {
        let text = "\
10.0.0.1 age 5.0sec cwnd 10 rtt 1000us rttvar 50us source 10.0.0.2
10.0.0.3 age 12.3sec ssthresh 7 cwnd 10 rtt 250us rttvar 125us source 10.0.0.2
fe80::1 age 0.5sec rtt 42us rttvar 21us source fe80::2
";
        let records: Vec<_> = parse(text).collect();

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].source, "10.0.0.3");
        assert_eq!(records[1].rtt_micros, 250);
        assert_eq!(records[1].rtt_var_micros, 125);
        assert_eq!(records[2].source, "fe80::1");
        assert_eq!(records[2].destination, "fe80::2");
    }

    #[test]
    fn test_parse_ignores_age_payload() {
        // Fields between age and rtt vary by kernel; none are validated
        let text = "10.0.0.1 age garbage!! tcpm_whatever 1 rtt 7us rttvar 3us source 10.0.0.9";
        let record = parse(text).next().unwrap();

        assert_eq!(record.rtt_micros, 7);
        assert_eq!(record.rtt_var_micros, 3);
    }

    #[test]
    fn test_parse_max_u64() {
        let text = format!(
            "10.0.0.1 age 1sec rtt {}us rttvar 0us source 10.0.0.2",
            u64::MAX
        );
        let record = parse(&text).next().unwrap();

        assert_eq!(record.rtt_micros, u64::MAX);
        assert_eq!(record.rtt_var_micros, 0);
    }

    // ===== Non-matching Input =====

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse("").count(), 0);
    }

    #[test]
    fn test_parse_ignores_unrelated_lines() {
        let text = "\
Error: something unexpected
10.0.0.1 age 5.0sec cwnd 10 source 10.0.0.2
10.0.0.1 age 5.0sec rtt 1000ms rttvar 50ms source 10.0.0.2
";
        assert_eq!(parse(text).count(), 0);
    }

    // ===== Malformed Numbers =====

    #[test]
    #[traced_test]
    fn test_parse_skips_overflow_and_continues() {
        let text = "\
10.0.0.1 age 1sec rtt 99999999999999999999999us rttvar 1us source 10.0.0.2
10.0.0.3 age 1sec rtt 10us rttvar 5us source 10.0.0.4
";
        let records: Vec<_> = parse(text).collect();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "10.0.0.3");
        assert!(logs_contain("skipping tcp_metrics entry"));
        assert!(logs_contain("invalid rtt value"));
    }

    #[test]
    #[traced_test]
    fn test_parse_logs_each_skip() {
        // \d accepts non-ASCII digits that u64 parsing rejects
        let text = "\
10.0.0.1 age 1sec rtt 10us rttvar ١٢us source 10.0.0.2
10.0.0.3 age 1sec rtt 10us rttvar 5us source 10.0.0.4
10.0.0.5 age 1sec rtt 99999999999999999999999us rttvar 5us source 10.0.0.6
10.0.0.7 age 1sec rtt 20us rttvar 6us source 10.0.0.8
";
        let records: Vec<_> = parse(text).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].destination, "10.0.0.4");
        assert_eq!(records[1].destination, "10.0.0.8");
        logs_assert(|lines: &[&str]| {
            let skipped = lines
                .iter()
                .filter(|line| line.contains("skipping tcp_metrics entry"))
                .count();
            if skipped == 2 {
                Ok(())
            } else {
                Err(format!("expected 2 skip warnings, got {}", skipped))
            }
        });
    }

    #[test]
    fn test_parse_micros_error_fields() {
        let err = parse_micros("rttvar", "12x").unwrap_err();
        match err {
            ParseError::InvalidNumber { field, value, .. } => {
                assert_eq!(field, "rttvar");
                assert_eq!(value, "12x");
            }
        }
    }
}

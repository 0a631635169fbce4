//! Flags Normalizer
//!
//! Parses the VictoriaMetrics `/flags` plaintext body (one `key="value"` per
//! line) into the same map shape the Prometheus JSON flags endpoint yields.
//! A malformed line fails the whole parse; partial flag sets are never
//! returned.

use crate::domain::entities::OperationalFlags;
use crate::domain::errors::FlagsParseError;

/// Parse `key="value"` lines. Blank lines are ignored.
pub fn parse_flags(text: &str) -> Result<OperationalFlags, FlagsParseError> {
    let mut flags = OperationalFlags::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let (key, value) = split_line(line).map_err(|reason| FlagsParseError {
            line_number: idx + 1,
            line: line.to_string(),
            reason,
        })?;

        flags.insert(key.to_string(), value.trim_matches('"').to_string());
    }

    Ok(flags)
}

fn split_line(line: &str) -> Result<(&str, &str), &'static str> {
    let mut parts = line.split('=');
    let key = parts.next().unwrap_or_default().trim();
    let value = parts.next().ok_or("missing '='")?.trim();
    if parts.next().is_some() {
        return Err("more than one '='");
    }
    if key.is_empty() {
        return Err("empty key");
    }
    Ok((key, value))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_parse_two_flags() {
        let flags = parse_flags("key1=\"value1\"\nkey2=\"value2\"").unwrap();
        assert_eq!(flags.len(), 2);
        assert_eq!(flags.get("key1").unwrap(), "value1");
        assert_eq!(flags.get("key2").unwrap(), "value2");
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(assert_ok!(parse_flags("")).is_empty());
        assert!(assert_ok!(parse_flags("\n  \n")).is_empty());
    }

    #[test]
    fn test_parse_victoria_metrics_body() {
        let body = concat!(
            "-retentionPeriod=\"1\"\n",
            "-search.maxQueryDuration=\"30s\"\n",
            "-httpListenAddr=\":8428\"\n",
        );
        let flags = parse_flags(body).unwrap();
        assert_eq!(flags.get("-retentionPeriod").unwrap(), "1");
        assert_eq!(flags.get("-search.maxQueryDuration").unwrap(), "30s");
        assert_eq!(flags.get("-httpListenAddr").unwrap(), ":8428");
    }

    #[test]
    fn test_parse_empty_value() {
        let flags = parse_flags("-tls=\"\"").unwrap();
        assert_eq!(flags.get("-tls").unwrap(), "");
    }

    #[test]
    fn test_parse_trims_whitespace_and_crlf() {
        let flags = parse_flags("  a=\"1\"  \r\nb=\"2\"\r\n").unwrap();
        assert_eq!(flags.get("a").unwrap(), "1");
        assert_eq!(flags.get("b").unwrap(), "2");
    }

    #[test]
    fn test_missing_equals_fails() {
        let err = parse_flags("key1=\"value1\"\nbroken line").unwrap_err();
        assert_eq!(err.line_number, 2);
        assert_eq!(err.line, "broken line");
        assert_eq!(err.reason, "missing '='");
    }

    #[test]
    fn test_multiple_equals_fails() {
        let err = parse_flags("-opts=\"a=b\"").unwrap_err();
        assert_eq!(err.line_number, 1);
        assert_eq!(err.reason, "more than one '='");
    }

    #[test]
    fn test_empty_key_fails() {
        let err = parse_flags("=\"v\"").unwrap_err();
        assert_eq!(err.reason, "empty key");
    }

    #[test]
    fn test_failure_returns_no_partial_map() {
        let err = assert_err!(parse_flags("a=\"1\"\nb=\"2\"\nc"));
        assert_eq!(err.line_number, 3);
    }
}

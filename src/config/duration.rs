//! Duration strings such as `"30m"`, `"1h30m"` or `"1.5s"`.
//!
//! Parsing is delegated to [`humantime`], so everything it understands
//! (`"2 days"`, `"1h 30m"`) works. On top of that, components may carry a
//! decimal fraction (`"1.5h"`, `"1m0.5s"`) and a bare `"0"` means zero.

use regex::{Captures, Regex};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

/// A duration string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration '{input}': {reason}")]
pub struct DurationError {
    /// The rejected input
    pub input: String,
    /// Why it was rejected
    pub reason: String,
}

static FRACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d*\.\d+)([a-zµμ]+)").expect("fraction pattern is valid"));

/// Nanoseconds per unit, for the units a fraction may be attached to.
fn nanos_per(unit: &str) -> Option<f64> {
    match unit {
        "ns" => Some(1.0),
        "us" | "µs" | "μs" => Some(1e3),
        "ms" => Some(1e6),
        "s" => Some(1e9),
        "m" => Some(60e9),
        "h" => Some(3600e9),
        _ => None,
    }
}

/// Rewrite fractional components as whole nanoseconds: `1.5h` becomes
/// `5400000000000ns`. Anything else is left for humantime to judge.
fn expand_fractions(text: &str) -> String {
    FRACTION
        .replace_all(text, |caps: &Captures| {
            let value = caps[1].parse::<f64>().ok();
            match (value, nanos_per(&caps[2])) {
                (Some(value), Some(scale)) => format!("{}ns", (value * scale).round() as u64),
                _ => caps[0].to_string(),
            }
        })
        .replace(['µ', 'μ'], "u")
}

/// Parse a duration string.
///
/// # Examples
///
/// ```rust
/// use pagesmith::config::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
/// assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
/// assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
/// assert!(parse_duration("soon").is_err());
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let text = input.trim();
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    humantime::parse_duration(&expand_fractions(text)).map_err(|e| DurationError {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

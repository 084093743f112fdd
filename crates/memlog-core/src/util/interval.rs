//! Interval parser for CLI arguments.
//!
//! Supports:
//! - Bare seconds: `5`
//! - Single unit: `500ms`, `5s`, `2m`, `1h`
//! - Compound: `1m30s`, `1h15m`

use std::time::Duration;

/// Error type for interval parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalParseError {
    pub input: String,
    pub message: String,
}

impl IntervalParseError {
    fn new(input: &str, message: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for IntervalParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse interval '{}': {}", self.input, self.message)
    }
}

impl std::error::Error for IntervalParseError {}

/// Parse an interval string into a `Duration`.
///
/// # Supported formats
///
/// | Format | Example | Meaning |
/// |--------|---------|---------|
/// | Seconds | `5` | 5 seconds |
/// | Milliseconds | `250ms` | 250 milliseconds |
/// | Unit | `5s`, `2m`, `1h` | seconds, minutes, hours |
/// | Compound | `1m30s` | sum of the parts |
///
/// Zero-length intervals are rejected.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use memlog_core::util::parse_interval;
///
/// assert_eq!(parse_interval("5s").unwrap(), Duration::from_secs(5));
/// assert_eq!(parse_interval("1m30s").unwrap(), Duration::from_secs(90));
/// ```
pub fn parse_interval(input: &str) -> Result<Duration, IntervalParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(IntervalParseError::new(input, "empty interval"));
    }

    let total = if trimmed.chars().all(|c| c.is_ascii_digit()) {
        let secs = trimmed
            .parse::<u64>()
            .map_err(|e| IntervalParseError::new(input, e.to_string()))?;
        Duration::from_secs(secs)
    } else {
        parse_compound(trimmed)?
    };

    if total.is_zero() {
        return Err(IntervalParseError::new(
            input,
            "interval must be greater than zero",
        ));
    }
    Ok(total)
}

fn parse_compound(input: &str) -> Result<Duration, IntervalParseError> {
    let mut total = Duration::ZERO;
    let mut rest = input;

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(IntervalParseError::new(
                input,
                "expected a number. Use: 5, 500ms, 5s, 2m, 1h or 1m30s",
            ));
        }
        let value: u64 = rest[..digits_end]
            .parse()
            .map_err(|e: std::num::ParseIntError| IntervalParseError::new(input, e.to_string()))?;
        rest = &rest[digits_end..];

        let unit_end = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let multiplier_ms: u64 = match unit {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            "" => return Err(IntervalParseError::new(input, "missing unit after number")),
            other => {
                return Err(IntervalParseError::new(
                    input,
                    format!("unknown unit '{}'. Use: ms, s, m, h", other),
                ));
            }
        };

        let part = value
            .checked_mul(multiplier_ms)
            .map(Duration::from_millis)
            .ok_or_else(|| IntervalParseError::new(input, "interval overflow"))?;
        total = total
            .checked_add(part)
            .ok_or_else(|| IntervalParseError::new(input, "interval overflow"))?;
    }

    Ok(total)
}

/// Formats a duration compactly: `250ms`, `5s`, `1m30s`, `2h`.
pub fn format_interval(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms == 0 {
        return "0s".to_string();
    }

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1_000) % 60;
    let millis = total_ms % 1_000;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds > 0 {
        out.push_str(&format!("{}s", seconds));
    }
    if millis > 0 {
        out.push_str(&format!("{}ms", millis));
    }
    out
}

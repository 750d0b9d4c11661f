//! # Duration Parsing
//!
//! Parses human-readable duration strings used by the controller flags.

use crate::config::ConfigError;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static DURATION_COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<number>\d+)(?P<unit>ms|s|m|h|d)")
        .unwrap_or_else(|e| panic!("invalid duration component regex: {e}"))
});

/// Parse a duration string into a `std::time::Duration`.
///
/// Accepts a bare `0` (meaning "disabled") or one or more `<number><unit>`
/// components, where unit is one of `ms`, `s`, `m`, `h`, `d`. Components may be
/// combined in the style of Go durations, e.g. `1h30m` or `2d12h`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDuration`] when the string is empty, contains
/// anything other than well-formed components, or overflows.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let trimmed = input.trim();
    let invalid = |detail: &str| ConfigError::InvalidDuration {
        value: input.to_string(),
        detail: detail.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("duration string cannot be empty"));
    }
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }

    let lower = trimmed.to_lowercase();
    let mut consumed = 0;
    let mut total = Duration::ZERO;

    for captures in DURATION_COMPONENT.captures_iter(&lower) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        // Components must be contiguous; anything in between is garbage
        if whole.start() != consumed {
            return Err(invalid("expected <number><unit> components, e.g. '1h30m'"));
        }
        consumed = whole.end();

        let number: u64 = captures["number"]
            .parse()
            .map_err(|e| invalid(&format!("invalid number: {e}")))?;
        let component = match &captures["unit"] {
            "ms" => Duration::from_millis(number),
            "s" => Duration::from_secs(number),
            "m" => Duration::from_secs(number.saturating_mul(60)),
            "h" => Duration::from_secs(number.saturating_mul(3600)),
            "d" => Duration::from_secs(number.saturating_mul(86_400)),
            unit => return Err(invalid(&format!("unknown unit '{unit}'"))),
        };
        total = total
            .checked_add(component)
            .ok_or_else(|| invalid("duration overflows"))?;
    }

    if consumed != lower.len() {
        return Err(invalid("expected <number><unit> components, e.g. '1h30m'"));
    }

    Ok(total)
}

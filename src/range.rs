//! Query window parsing for the command line.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use meshgraph_types::TimeRange;

/// Suffix to seconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, u64)] = &[
    ("ms", 0),
    ("s", 1),
    ("m", 60),
    ("h", 60 * 60),
    ("d", 24 * 60 * 60),
    ("w", 7 * 24 * 60 * 60),
];

/// Parse window lengths like "30s", "15m", "1h" or "2d".
///
/// Sub-second windows are rejected; rates are normalised per whole second.
pub fn parse_window(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            if *multiplier == 0 {
                bail!("Window must be at least one second: {}", s);
            }
            let val: u64 = val_str
                .parse()
                .with_context(|| format!("Invalid window: {}", s))?;
            if val == 0 {
                bail!("Window must not be empty: {}", s);
            }
            return Ok(Duration::from_secs(val.saturating_mul(*multiplier)));
        }
    }

    bail!("Unknown window format: {}", s)
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_ms() -> Result<u64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock is before the Unix epoch")?;
    Ok(elapsed.as_millis() as u64)
}

/// Resolve the query window from either explicit bounds or a trailing length.
///
/// Explicit `from`/`to` (epoch milliseconds) win over `window`; a missing
/// `to` means now.
pub fn resolve(
    window: &str,
    from_ms: Option<u64>,
    to_ms: Option<u64>,
    now_ms: u64,
) -> Result<TimeRange> {
    let to_ms = to_ms.unwrap_or(now_ms);
    let range = match from_ms {
        Some(from_ms) => TimeRange::new(from_ms, to_ms),
        None => TimeRange::ending_at(to_ms, parse_window(window)?.as_secs()),
    };
    if range.interval_secs() == 0 {
        bail!(
            "Time range {}..{} is shorter than one second",
            range.from_ms,
            range.to_ms
        );
    }
    Ok(range)
}

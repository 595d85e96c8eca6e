//! Display formatting for graph statistics.

/// Placeholder shown when an edge has no duration.
pub const NO_DATA: &str = "-";

/// Requests per second, e.g. `"1.20rps"`.
pub fn format_rate(count: f64, interval_secs: f64) -> String {
    format!("{:.2}rps", count / interval_secs)
}

/// Error percentage, e.g. `"16.67%"`.
pub fn format_percent(percent: f64) -> String {
    format!("{:.2}%", percent)
}

/// Duration in milliseconds, or [`NO_DATA`] when not positive.
pub fn format_duration_ms(ms: f64) -> String {
    if ms > 0.0 {
        format!("{:.2}ms", ms)
    } else {
        NO_DATA.to_string()
    }
}

/// Messages per second, e.g. `"0.50mps"`.
pub fn format_messages(count: f64, interval_secs: f64) -> String {
    format!("{:.2}mps", count / interval_secs)
}

/// Bytes per second, e.g. `"102.40bps"`.
pub fn format_bytes(bytes: f64, interval_secs: f64) -> String {
    format!("{:.2}bps", bytes / interval_secs)
}

/// Error share of a request total in percent; zero when there is no traffic.
pub fn error_percent(errors: f64, total: f64) -> f64 {
    if total > 0.0 && errors > 0.0 {
        errors / total * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(12.0, 10.0), "1.20rps");
        assert_eq!(format_rate(0.0, 60.0), "0.00rps");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(error_percent(2.0, 12.0)), "16.67%");
        assert_eq!(format_percent(0.0), "0.00%");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_ms(12.5), "12.50ms");
        assert_eq!(format_duration_ms(0.0), "-");
        assert_eq!(format_duration_ms(-3.0), "-");
    }

    #[test]
    fn test_format_throughput() {
        assert_eq!(format_messages(30.0, 60.0), "0.50mps");
        assert_eq!(format_bytes(1024.0, 10.0), "102.40bps");
    }

    #[test]
    fn test_error_percent_without_traffic() {
        assert_eq!(error_percent(0.0, 0.0), 0.0);
        assert_eq!(error_percent(5.0, 0.0), 0.0);
    }
}

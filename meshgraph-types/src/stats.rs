//! Traffic counters accumulated per edge and per node side.

use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Request counts keyed by response code.
pub type ResponseCodes = BTreeMap<String, f64>;

/// gRPC status codes counted as errors.
///
/// UNKNOWN(2), DEADLINE_EXCEEDED(4), UNIMPLEMENTED(12), INTERNAL(13),
/// UNAVAILABLE(14) and DATA_LOSS(15) are the statuses that gateways map to
/// HTTP 5xx.
pub const GRPC_ERROR_CODES: [&str; 6] = ["2", "4", "12", "13", "14", "15"];

/// Whether a `grpc_response_status` value is an error.
pub fn is_grpc_error(code: &str) -> bool {
    GRPC_ERROR_CODES.contains(&code)
}

/// Whether an HTTP `response_code` value is an error (5xx).
pub fn is_http_error(code: &str) -> bool {
    code.starts_with('5')
}

/// Summed traffic counters.
///
/// Every field is a plain running sum, so merging two blocks is field-wise
/// addition. Durations are deliberately absent: they stay on edges.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrafficStats {
    pub grpc_response_codes: ResponseCodes,
    pub grpc_requests_success: f64,
    pub grpc_requests_error: f64,
    pub grpc_sent_messages: f64,
    pub grpc_received_messages: f64,
    pub http_response_codes: ResponseCodes,
    pub http_requests_success: f64,
    pub http_requests_error: f64,
    pub tcp_sent_bytes: f64,
    pub tcp_received_bytes: f64,
}

impl TrafficStats {
    /// Create empty counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record gRPC requests with the given status code.
    pub fn record_grpc(&mut self, code: &str, value: f64) {
        *self
            .grpc_response_codes
            .entry(code.to_string())
            .or_insert(0.0) += value;
        if is_grpc_error(code) {
            self.grpc_requests_error += value;
        } else {
            self.grpc_requests_success += value;
        }
    }

    /// Record HTTP requests with the given response code.
    pub fn record_http(&mut self, code: &str, value: f64) {
        *self
            .http_response_codes
            .entry(code.to_string())
            .or_insert(0.0) += value;
        if is_http_error(code) {
            self.http_requests_error += value;
        } else {
            self.http_requests_success += value;
        }
    }

    /// Total gRPC requests.
    pub fn grpc_requests(&self) -> f64 {
        self.grpc_requests_success + self.grpc_requests_error
    }

    /// Total HTTP requests.
    pub fn http_requests(&self) -> f64 {
        self.http_requests_success + self.http_requests_error
    }

    /// Total requests over both protocols.
    pub fn total_requests(&self) -> f64 {
        self.grpc_requests() + self.http_requests()
    }

    /// TCP bytes in both directions.
    pub fn tcp_bytes(&self) -> f64 {
        self.tcp_sent_bytes + self.tcp_received_bytes
    }

    /// No requests and no TCP bytes.
    pub fn is_idle(&self) -> bool {
        self.total_requests() <= 0.0 && self.tcp_bytes() <= 0.0
    }
}

impl AddAssign<&TrafficStats> for TrafficStats {
    fn add_assign(&mut self, other: &TrafficStats) {
        for (code, count) in &other.grpc_response_codes {
            *self.grpc_response_codes.entry(code.clone()).or_insert(0.0) += count;
        }
        self.grpc_requests_success += other.grpc_requests_success;
        self.grpc_requests_error += other.grpc_requests_error;
        self.grpc_sent_messages += other.grpc_sent_messages;
        self.grpc_received_messages += other.grpc_received_messages;
        for (code, count) in &other.http_response_codes {
            *self.http_response_codes.entry(code.clone()).or_insert(0.0) += count;
        }
        self.http_requests_success += other.http_requests_success;
        self.http_requests_error += other.http_requests_error;
        self.tcp_sent_bytes += other.tcp_sent_bytes;
        self.tcp_received_bytes += other.tcp_received_bytes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grpc_error_classification() {
        for code in ["2", "4", "12", "13", "14", "15"] {
            assert!(is_grpc_error(code), "{code} should be an error");
        }
        for code in ["0", "1", "3", "5", "16", ""] {
            assert!(!is_grpc_error(code), "{code} should be a success");
        }
    }

    #[test]
    fn test_http_error_classification() {
        assert!(is_http_error("500"));
        assert!(is_http_error("503"));
        assert!(!is_http_error("404"));
        assert!(!is_http_error("200"));
        assert!(!is_http_error(""));
    }

    #[test]
    fn test_record_builds_histogram() {
        let mut stats = TrafficStats::new();
        stats.record_http("200", 10.0);
        stats.record_http("200", 5.0);
        stats.record_http("503", 2.0);

        assert_eq!(stats.http_response_codes["200"], 15.0);
        assert_eq!(stats.http_response_codes["503"], 2.0);
        assert_eq!(stats.http_requests_success, 15.0);
        assert_eq!(stats.http_requests_error, 2.0);
        assert_eq!(stats.http_requests(), 17.0);
    }

    #[test]
    fn test_add_assign_sums_every_field() {
        let mut a = TrafficStats::new();
        a.record_grpc("0", 4.0);
        a.tcp_sent_bytes = 100.0;

        let mut b = TrafficStats::new();
        b.record_grpc("0", 1.0);
        b.record_grpc("14", 1.0);
        b.grpc_sent_messages = 3.0;
        b.tcp_received_bytes = 50.0;

        a += &b;

        assert_eq!(a.grpc_response_codes["0"], 5.0);
        assert_eq!(a.grpc_response_codes["14"], 1.0);
        assert_eq!(a.grpc_requests_success, 5.0);
        assert_eq!(a.grpc_requests_error, 1.0);
        assert_eq!(a.grpc_sent_messages, 3.0);
        assert_eq!(a.tcp_bytes(), 150.0);
    }

    #[test]
    fn test_idle() {
        let mut stats = TrafficStats::new();
        assert!(stats.is_idle());
        stats.tcp_sent_bytes = 1.0;
        assert!(!stats.is_idle());
    }
}

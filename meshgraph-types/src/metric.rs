//! Metric kinds understood by the graph engine.

use std::fmt;
use std::str::FromStr;

/// One of the eight traffic measures a sample can belong to.
///
/// The kind travels with every sample as the synthetic `metric` label, so a
/// flat list of samples from many queries can be folded into one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum MetricKind {
    /// gRPC request counts, labelled with `grpc_response_status`.
    GrpcRequests,
    /// p99 gRPC request duration in milliseconds.
    GrpcRequestDuration,
    /// gRPC request messages sent by the client.
    GrpcSentMessages,
    /// gRPC response messages received by the client.
    GrpcReceivedMessages,
    /// HTTP request counts, labelled with `response_code`.
    HttpRequests,
    /// p99 HTTP request duration in milliseconds.
    HttpRequestDuration,
    /// TCP bytes sent.
    TcpSentBytes,
    /// TCP bytes received.
    TcpReceivedBytes,
}

impl MetricKind {
    /// All metric kinds, in display order.
    pub const ALL: [MetricKind; 8] = [
        MetricKind::GrpcRequests,
        MetricKind::GrpcRequestDuration,
        MetricKind::GrpcSentMessages,
        MetricKind::GrpcReceivedMessages,
        MetricKind::HttpRequests,
        MetricKind::HttpRequestDuration,
        MetricKind::TcpSentBytes,
        MetricKind::TcpReceivedBytes,
    ];

    /// The wire name used in query models and in the `metric` label.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::GrpcRequests => "grpcRequests",
            MetricKind::GrpcRequestDuration => "grpcRequestDuration",
            MetricKind::GrpcSentMessages => "grpcSentMessages",
            MetricKind::GrpcReceivedMessages => "grpcReceivedMessages",
            MetricKind::HttpRequests => "httpRequests",
            MetricKind::HttpRequestDuration => "httpRequestDuration",
            MetricKind::TcpSentBytes => "tcpSentBytes",
            MetricKind::TcpReceivedBytes => "tcpReceivedBytes",
        }
    }

    /// Whether samples of this kind carry a latency rather than a count.
    pub fn is_duration(&self) -> bool {
        matches!(
            self,
            MetricKind::GrpcRequestDuration | MetricKind::HttpRequestDuration
        )
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown metric kind name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMetricKind(pub String);

impl fmt::Display for UnknownMetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown metric kind: {}", self.0)
    }
}

impl std::error::Error for UnknownMetricKind {}

impl FromStr for MetricKind {
    type Err = UnknownMetricKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownMetricKind(s.to_string()))
    }
}

/// Traffic families used by catalog queries (namespaces, workloads, filters).
///
/// Catalog lookups only care whether two entities talk at all, so they look
/// at request counts and raw TCP byte counters rather than all eight kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrafficFamily {
    /// HTTP and gRPC requests.
    Requests,
    /// TCP bytes sent.
    TcpSentBytes,
    /// TCP bytes received.
    TcpReceivedBytes,
}

impl TrafficFamily {
    /// All traffic families.
    pub const ALL: [TrafficFamily; 3] = [
        TrafficFamily::Requests,
        TrafficFamily::TcpSentBytes,
        TrafficFamily::TcpReceivedBytes,
    ];
}

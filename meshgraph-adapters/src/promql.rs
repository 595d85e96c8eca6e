//! Rendering of structured queries to Istio PromQL.
//!
//! Request metrics become `sum(increase(...[Ns])) by (...)`, durations the
//! p99 of the request duration histogram. Unless idle edges are requested
//! every query ends in `> 0`, so zero-traffic series never leave Prometheus.

use meshgraph_types::{
    Direction, FilterType, LabelValuesQuery, MetricKind, MetricQuery, PeerQuery, Scope,
    TrafficFamily,
};

const REQUESTS: &str = "istio_requests_total";
const REQUEST_DURATION: &str = "istio_request_duration_milliseconds_bucket";
const REQUEST_MESSAGES: &str = "istio_request_messages_total";
const RESPONSE_MESSAGES: &str = "istio_response_messages_total";
const TCP_SENT: &str = "istio_tcp_sent_bytes_total";
const TCP_RECEIVED: &str = "istio_tcp_received_bytes_total";

/// Series every catalog lookup matches against.
const TRAFFIC_SERIES: [&str; 3] = [REQUESTS, TCP_SENT, TCP_RECEIVED];

const EDGE_LABELS: &str = "destination_service, destination_service_namespace, \
     destination_service_name, destination_workload_namespace, destination_workload, \
     destination_version, source_workload_namespace, source_workload";

fn series(metric: MetricKind) -> (&'static str, Option<&'static str>) {
    match metric {
        MetricKind::GrpcRequests => (REQUESTS, Some("grpc")),
        MetricKind::GrpcRequestDuration => (REQUEST_DURATION, Some("grpc")),
        MetricKind::GrpcSentMessages => (REQUEST_MESSAGES, None),
        MetricKind::GrpcReceivedMessages => (RESPONSE_MESSAGES, None),
        MetricKind::HttpRequests => (REQUESTS, Some("http")),
        MetricKind::HttpRequestDuration => (REQUEST_DURATION, Some("http")),
        MetricKind::TcpSentBytes => (TCP_SENT, None),
        MetricKind::TcpReceivedBytes => (TCP_RECEIVED, None),
    }
}

fn family_series(family: TrafficFamily) -> &'static str {
    match family {
        TrafficFamily::Requests => REQUESTS,
        TrafficFamily::TcpSentBytes => TCP_SENT,
        TrafficFamily::TcpReceivedBytes => TCP_RECEIVED,
    }
}

/// `label="value"` with quotes and backslashes escaped.
fn matcher(label: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{label}=\"{escaped}\"")
}

fn selector(direction: Direction, namespace: &str, scope: &Scope, protocol: Option<&str>) -> String {
    let mut matchers = vec![matcher(direction.namespace_label(), namespace)];
    if let Some(protocol) = protocol {
        matchers.push(matcher("request_protocol", protocol));
    }
    if let Some((label, value)) = scope.selector(direction) {
        matchers.push(matcher(label, value));
    }
    matchers.join(", ")
}

/// Render the instant query for one metric kind and direction.
pub fn metric_query(query: &MetricQuery) -> String {
    let (name, protocol) = series(query.metric);
    let selector = selector(query.direction, &query.namespace, &query.scope, protocol);
    let window = query.interval_secs;
    let operator = if query.idle_edges { "" } else { " > 0" };

    if query.metric.is_duration() {
        return format!(
            "histogram_quantile(0.99, sum(increase({name}{{{selector}}}[{window}s])) by (le, {EDGE_LABELS})){operator}"
        );
    }

    match query.metric {
        MetricKind::GrpcRequests => format!(
            "sum(increase({name}{{{selector}}}[{window}s])) by ({EDGE_LABELS}, grpc_response_status){operator}"
        ),
        MetricKind::HttpRequests => format!(
            "sum(increase({name}{{{selector}}}[{window}s])) by ({EDGE_LABELS}, response_code){operator}"
        ),
        _ => format!("sum(increase({name}{{{selector}}}[{window}s])) by ({EDGE_LABELS}){operator}"),
    }
}

/// Render the query listing a scope's peers for one traffic family.
pub fn peer_query(query: &PeerQuery) -> String {
    let direction = query.filter.scope_direction();
    let selector = selector(direction, &query.namespace, &query.scope, None);
    let (namespace_label, workload_label) = query.filter.peer_labels();
    format!(
        "sum({}{{{selector}}}) by ({namespace_label}, {workload_label})",
        family_series(query.family)
    )
}

/// Series selectors (`match[]`) for a label-values lookup.
pub fn label_matches(query: &LabelValuesQuery) -> Vec<String> {
    TRAFFIC_SERIES
        .iter()
        .map(|series| match &query.namespace {
            Some((direction, namespace)) => {
                format!("{series}{{{}}}", matcher(direction.namespace_label(), namespace))
            }
            None => series.to_string(),
        })
        .collect()
}

/// Whether a filter type lists sources or destinations, for logs.
pub fn filter_name(filter: FilterType) -> &'static str {
    match filter {
        FilterType::Source => "source",
        FilterType::Destination => "destination",
    }
}

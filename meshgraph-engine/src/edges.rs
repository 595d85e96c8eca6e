//! Edge synthesis from deduplicated samples.
//!
//! Every accepted sample becomes either two edges (workload → service and
//! service → workload) or, when a waypoint proxy is involved, one direct
//! workload → workload edge. Counters for the same [`EdgeKey`] accumulate
//! across samples.

use std::collections::{HashMap, HashSet};

use meshgraph_types::{labels, EdgeKey, EntityId, MetricKind, Sample, TrafficStats};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Workload name of the ambient-mesh waypoint proxy.
pub const WAYPOINT: &str = "waypoint";

/// How repeated duration samples for one edge combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationMerge {
    /// The latest positive sample wins.
    #[default]
    Last,
    /// The largest sample wins.
    Max,
    /// Arithmetic mean of all positive samples.
    Mean,
}

/// A latency figure on an edge, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DurationValue {
    value: f64,
    samples: u32,
}

impl DurationValue {
    /// Fold a new positive sample in. Non-positive values are ignored.
    pub fn record(&mut self, value: f64, merge: DurationMerge) {
        if value <= 0.0 {
            return;
        }
        self.value = match merge {
            DurationMerge::Last => value,
            DurationMerge::Max => self.value.max(value),
            DurationMerge::Mean => {
                (self.value * f64::from(self.samples) + value) / f64::from(self.samples + 1)
            }
        };
        self.samples += 1;
    }

    /// Current value, `0.0` when no sample was recorded.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Whether any sample was recorded.
    pub fn is_set(&self) -> bool {
        self.samples > 0
    }
}

/// Accumulated counters for one directed edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub key: EdgeKey,
    /// Fully qualified name of the destination service (may be empty).
    pub destination_service: String,
    pub stats: TrafficStats,
    pub grpc_duration: DurationValue,
    pub http_duration: DurationValue,
}

impl EdgeRecord {
    /// Create an edge with zeroed counters.
    pub fn new(key: EdgeKey, destination_service: impl Into<String>) -> Self {
        Self {
            key,
            destination_service: destination_service.into(),
            stats: TrafficStats::new(),
            grpc_duration: DurationValue::default(),
            http_duration: DurationValue::default(),
        }
    }

    /// Stable string id of the edge.
    pub fn id(&self) -> String {
        self.key.id()
    }

    /// Durations are only tracked on hops into a service.
    fn takes_duration(&self) -> bool {
        self.key.destination.is_service()
    }

    /// Fold one sample's value into this edge.
    ///
    /// Returns `false` when the sample's metric kind is not recognised.
    pub fn apply(&mut self, sample: &Sample, merge: DurationMerge) -> bool {
        let Some(metric) = sample.metric() else {
            return false;
        };
        let value = sample.value;

        match metric {
            MetricKind::GrpcRequests => self
                .stats
                .record_grpc(sample.label(labels::GRPC_RESPONSE_STATUS), value),
            MetricKind::GrpcRequestDuration => {
                if self.takes_duration() {
                    self.grpc_duration.record(value, merge);
                }
            }
            MetricKind::GrpcSentMessages => self.stats.grpc_sent_messages += value,
            MetricKind::GrpcReceivedMessages => self.stats.grpc_received_messages += value,
            MetricKind::HttpRequests => self
                .stats
                .record_http(sample.label(labels::RESPONSE_CODE), value),
            MetricKind::HttpRequestDuration => {
                if self.takes_duration() {
                    self.http_duration.record(value, merge);
                }
            }
            MetricKind::TcpSentBytes => self.stats.tcp_sent_bytes += value,
            MetricKind::TcpReceivedBytes => self.stats.tcp_received_bytes += value,
        }

        true
    }
}

/// Source and destination exclusion lists, as `"<namespace>/<workload>"`.
#[derive(Debug, Clone, Default)]
pub struct EdgeFilters {
    sources: HashSet<String>,
    destinations: HashSet<String>,
}

impl EdgeFilters {
    /// Build filters from identity lists.
    pub fn new<S, D>(sources: S, destinations: D) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            destinations: destinations.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a sample must be dropped before producing any edge.
    pub fn excludes(&self, sample: &Sample) -> bool {
        (!self.sources.is_empty() && self.sources.contains(&sample.source_identity()))
            || (!self.destinations.is_empty()
                && self.destinations.contains(&sample.destination_identity()))
    }
}

/// The keys a sample contributes to, in synthesis order.
pub fn edge_keys(sample: &Sample) -> Vec<EdgeKey> {
    let source = EntityId::workload(
        sample.label(labels::SOURCE_WORKLOAD),
        sample.label(labels::SOURCE_WORKLOAD_NAMESPACE),
    );
    let destination = EntityId::workload(
        sample.label(labels::DESTINATION_WORKLOAD),
        sample.label(labels::DESTINATION_WORKLOAD_NAMESPACE),
    );

    if source.name == WAYPOINT || destination.name == WAYPOINT {
        return vec![EdgeKey::new(source, destination)];
    }

    let service = EntityId::service(
        sample.label(labels::DESTINATION_SERVICE_NAME),
        sample.label(labels::DESTINATION_SERVICE_NAMESPACE),
    );
    vec![
        EdgeKey::new(source, service.clone()),
        EdgeKey::new(service, destination),
    ]
}

/// The set of edges built from one batch of samples.
#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    edges: HashMap<EdgeKey, EdgeRecord>,
    merge: DurationMerge,
}

impl EdgeSet {
    /// Create an empty edge set using the given duration merge policy.
    pub fn new(merge: DurationMerge) -> Self {
        Self {
            edges: HashMap::new(),
            merge,
        }
    }

    /// Build edges from samples, skipping those the filters exclude.
    pub fn build(samples: &[Sample], filters: &EdgeFilters, merge: DurationMerge) -> Self {
        let mut set = Self::new(merge);
        for sample in samples {
            if filters.excludes(sample) {
                trace!(
                    source = %sample.source_identity(),
                    destination = %sample.destination_identity(),
                    "Sample excluded by filter"
                );
                continue;
            }
            set.add(sample);
        }
        set
    }

    /// Fold one sample into the set. Unknown metric kinds create no edges.
    pub fn add(&mut self, sample: &Sample) {
        if sample.metric().is_none() {
            return;
        }

        let service = sample.label(labels::DESTINATION_SERVICE);
        for key in edge_keys(sample) {
            self.edges
                .entry(key.clone())
                .or_insert_with(|| EdgeRecord::new(key, service))
                .apply(sample, self.merge);
        }
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Look up an edge.
    pub fn get(&self, key: &EdgeKey) -> Option<&EdgeRecord> {
        self.edges.get(key)
    }

    /// Iterate over edges in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &EdgeRecord> {
        self.edges.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshgraph_types::SampleBuilder;

    fn sample(metric: MetricKind, value: f64) -> SampleBuilder {
        Sample::builder(metric, value)
            .source("web", "shop")
            .service("api", "shop")
            .destination("api-v1", "shop")
    }

    fn waypoint_sample(metric: MetricKind, value: f64) -> SampleBuilder {
        Sample::builder(metric, value)
            .source("web", "shop")
            .service("api", "shop")
            .destination(WAYPOINT, "shop")
    }

    fn to_service() -> EdgeKey {
        EdgeKey::new(
            EntityId::workload("web", "shop"),
            EntityId::service("api", "shop"),
        )
    }

    fn to_workload() -> EdgeKey {
        EdgeKey::new(
            EntityId::service("api", "shop"),
            EntityId::workload("api-v1", "shop"),
        )
    }

    fn build(samples: &[Sample]) -> EdgeSet {
        EdgeSet::build(samples, &EdgeFilters::default(), DurationMerge::Last)
    }

    #[test]
    fn test_regular_sample_creates_two_edges_with_same_counters() {
        let samples = [sample(MetricKind::HttpRequests, 10.0)
            .label(labels::RESPONSE_CODE, "200")
            .build()];
        let set = build(&samples);

        assert_eq!(set.len(), 2);
        let first = set.get(&to_service()).unwrap();
        let second = set.get(&to_workload()).unwrap();
        assert_eq!(first.stats, second.stats);
        assert_eq!(first.stats.http_requests_success, 10.0);
        assert_eq!(first.destination_service, "api.shop.svc.cluster.local");
    }

    #[test]
    fn test_waypoint_sample_creates_single_edge() {
        let samples = [waypoint_sample(MetricKind::TcpSentBytes, 128.0).build()];
        let set = build(&samples);

        assert_eq!(set.len(), 1);
        let key = EdgeKey::new(
            EntityId::workload("web", "shop"),
            EntityId::workload(WAYPOINT, "shop"),
        );
        assert_eq!(set.get(&key).unwrap().stats.tcp_sent_bytes, 128.0);
    }

    #[test]
    fn test_waypoint_as_source() {
        let samples = [Sample::builder(MetricKind::TcpSentBytes, 1.0)
            .source(WAYPOINT, "shop")
            .service("api", "shop")
            .destination("api-v1", "shop")
            .build()];
        let set = build(&samples);
        assert_eq!(set.len(), 1);
        assert!(set.iter().all(|e| !e.key.destination.is_service()));
    }

    #[test]
    fn test_grpc_codes_classified() {
        let samples = [
            sample(MetricKind::GrpcRequests, 8.0)
                .label(labels::GRPC_RESPONSE_STATUS, "0")
                .build(),
            sample(MetricKind::GrpcRequests, 1.0)
                .label(labels::GRPC_RESPONSE_STATUS, "14")
                .build(),
            sample(MetricKind::GrpcRequests, 1.0)
                .label(labels::GRPC_RESPONSE_STATUS, "5")
                .build(),
        ];
        let set = build(&samples);
        let edge = set.get(&to_service()).unwrap();

        assert_eq!(edge.stats.grpc_requests_success, 9.0);
        assert_eq!(edge.stats.grpc_requests_error, 1.0);
        assert_eq!(edge.stats.grpc_response_codes.len(), 3);
    }

    #[test]
    fn test_http_codes_accumulate() {
        let samples = [
            sample(MetricKind::HttpRequests, 10.0)
                .label(labels::RESPONSE_CODE, "200")
                .build(),
            sample(MetricKind::HttpRequests, 2.0)
                .label(labels::RESPONSE_CODE, "503")
                .build(),
            sample(MetricKind::HttpRequests, 3.0)
                .label(labels::RESPONSE_CODE, "404")
                .build(),
        ];
        let set = build(&samples);
        let edge = set.get(&to_workload()).unwrap();

        assert_eq!(edge.stats.http_requests_success, 13.0);
        assert_eq!(edge.stats.http_requests_error, 2.0);
        assert_eq!(edge.stats.http_response_codes["503"], 2.0);
    }

    #[test]
    fn test_duration_only_on_service_leg() {
        let samples = [
            sample(MetricKind::HttpRequestDuration, 42.0).build(),
            sample(MetricKind::GrpcRequestDuration, 7.0).build(),
        ];
        let set = build(&samples);

        let into_service = set.get(&to_service()).unwrap();
        assert_eq!(into_service.http_duration.value(), 42.0);
        assert_eq!(into_service.grpc_duration.value(), 7.0);

        let into_workload = set.get(&to_workload()).unwrap();
        assert!(!into_workload.http_duration.is_set());
        assert!(!into_workload.grpc_duration.is_set());
    }

    #[test]
    fn test_waypoint_edge_gets_no_duration() {
        let samples = [waypoint_sample(MetricKind::HttpRequestDuration, 42.0).build()];
        let set = build(&samples);
        assert!(set.iter().all(|e| !e.http_duration.is_set()));
    }

    #[test]
    fn test_duration_last_write_wins_and_ignores_zero() {
        let samples = [
            sample(MetricKind::HttpRequestDuration, 42.0)
                .label(labels::SOURCE_APP, "a")
                .build(),
            sample(MetricKind::HttpRequestDuration, 12.0)
                .label(labels::SOURCE_APP, "b")
                .build(),
            sample(MetricKind::HttpRequestDuration, 0.0)
                .label(labels::SOURCE_APP, "c")
                .build(),
        ];
        let set = build(&samples);
        assert_eq!(set.get(&to_service()).unwrap().http_duration.value(), 12.0);
    }

    #[test]
    fn test_duration_merge_policies() {
        let mut max = DurationValue::default();
        let mut mean = DurationValue::default();
        for value in [10.0, 30.0, 20.0, -1.0] {
            max.record(value, DurationMerge::Max);
            mean.record(value, DurationMerge::Mean);
        }
        assert_eq!(max.value(), 30.0);
        assert_eq!(mean.value(), 20.0);
    }

    #[test]
    fn test_messages_and_bytes_are_summed() {
        let samples = [
            sample(MetricKind::GrpcSentMessages, 3.0).build(),
            sample(MetricKind::GrpcReceivedMessages, 4.0).build(),
            sample(MetricKind::TcpSentBytes, 100.0).build(),
            sample(MetricKind::TcpReceivedBytes, 50.0).build(),
            sample(MetricKind::TcpReceivedBytes, 25.0)
                .label(labels::SOURCE_APP, "other")
                .build(),
        ];
        let set = build(&samples);
        let edge = set.get(&to_service()).unwrap();

        assert_eq!(edge.stats.grpc_sent_messages, 3.0);
        assert_eq!(edge.stats.grpc_received_messages, 4.0);
        assert_eq!(edge.stats.tcp_sent_bytes, 100.0);
        assert_eq!(edge.stats.tcp_received_bytes, 75.0);
    }

    #[test]
    fn test_source_filter_excludes_sample() {
        let samples = [sample(MetricKind::TcpSentBytes, 1.0).build()];
        let filters = EdgeFilters::new(["shop/web"], Vec::<String>::new());
        let set = EdgeSet::build(&samples, &filters, DurationMerge::Last);
        assert!(set.is_empty());
    }

    #[test]
    fn test_destination_filter_excludes_sample() {
        let samples = [sample(MetricKind::TcpSentBytes, 1.0).build()];
        let filters = EdgeFilters::new(Vec::<String>::new(), ["shop/api-v1"]);
        let set = EdgeSet::build(&samples, &filters, DurationMerge::Last);
        assert!(set.is_empty());

        let filters = EdgeFilters::new(Vec::<String>::new(), ["other/api-v1"]);
        let set = EdgeSet::build(&samples, &filters, DurationMerge::Last);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_unknown_metric_is_ignored() {
        let samples = [SampleBuilder::new(5.0)
            .label(labels::METRIC, "udpPackets")
            .source("web", "shop")
            .build()];
        assert!(build(&samples).is_empty());
    }

    #[test]
    fn test_edge_id() {
        let samples = [sample(MetricKind::TcpSentBytes, 1.0).build()];
        let set = build(&samples);
        assert_eq!(
            set.get(&to_service()).unwrap().id(),
            "Workload: web (shop) -> Service: api (shop)"
        );
    }
}

//! Sample source abstraction.
//!
//! The engine never talks to a time-series store directly. Everything it
//! needs is expressed through the [`SampleSource`] trait, so the same graph
//! logic runs against Prometheus, a JSON dump on disk or an in-memory list.

use std::collections::BTreeSet;
use std::fmt::Debug;

use async_trait::async_trait;
use meshgraph_types::{
    Direction, LabelValuesQuery, MetricKind, MetricQuery, PeerQuery, Sample, Scope, TimeRange,
    TrafficFamily,
};

use crate::SourceError;

/// Asynchronous provider of samples.
///
/// Implementations own retries, authentication and query-language rendering.
/// Every sample returned from [`fetch_samples`](SampleSource::fetch_samples)
/// must carry the synthetic `metric` label of the query's metric kind.
#[async_trait]
pub trait SampleSource: Send + Sync + Debug {
    /// Fetch samples of one metric kind for one direction of a scope.
    async fn fetch_samples(
        &self,
        query: &MetricQuery,
        range: &TimeRange,
    ) -> Result<Vec<Sample>, SourceError>;

    /// Fetch one sample per peer workload of a scope.
    async fn fetch_peers(
        &self,
        query: &PeerQuery,
        range: &TimeRange,
    ) -> Result<Vec<Sample>, SourceError>;

    /// List the values of a label across mesh traffic.
    async fn label_values(
        &self,
        query: &LabelValuesQuery,
        range: &TimeRange,
    ) -> Result<Vec<String>, SourceError>;

    /// Check the backend is reachable.
    async fn check_health(&self) -> Result<(), SourceError>;

    /// Human-readable description, used in logs.
    fn description(&self) -> &str;
}

/// A sample source answering from an in-memory list of samples.
///
/// Queries are evaluated by label matching: a sample answers a metric query
/// when its `metric` label, scoped namespace and scope selector match. The
/// time range is ignored; the list is taken to already cover the window.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    samples: Vec<Sample>,
    description: String,
}

impl StaticSource {
    /// Create a source serving the given samples.
    pub fn new(samples: Vec<Sample>) -> Self {
        Self::with_description(samples, "static")
    }

    /// Create a source with a custom description.
    pub fn with_description(samples: Vec<Sample>, description: impl Into<String>) -> Self {
        Self {
            samples,
            description: description.into(),
        }
    }

    /// Samples served by this source.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    fn in_scope(sample: &Sample, direction: Direction, namespace: &str, scope: &Scope) -> bool {
        if sample.label(direction.namespace_label()) != namespace {
            return false;
        }
        match scope.selector(direction) {
            Some((label, value)) => sample.label(label) == value,
            None => true,
        }
    }

    fn in_family(sample: &Sample, family: TrafficFamily) -> bool {
        match (family, sample.metric()) {
            (
                TrafficFamily::Requests,
                Some(MetricKind::HttpRequests | MetricKind::GrpcRequests),
            ) => true,
            (TrafficFamily::TcpSentBytes, Some(MetricKind::TcpSentBytes)) => true,
            (TrafficFamily::TcpReceivedBytes, Some(MetricKind::TcpReceivedBytes)) => true,
            _ => false,
        }
    }
}

#[async_trait]
impl SampleSource for StaticSource {
    async fn fetch_samples(
        &self,
        query: &MetricQuery,
        _range: &TimeRange,
    ) -> Result<Vec<Sample>, SourceError> {
        Ok(self
            .samples
            .iter()
            .filter(|s| s.metric() == Some(query.metric))
            .filter(|s| Self::in_scope(s, query.direction, &query.namespace, &query.scope))
            .filter(|s| query.idle_edges || s.value > 0.0)
            .cloned()
            .collect())
    }

    async fn fetch_peers(
        &self,
        query: &PeerQuery,
        _range: &TimeRange,
    ) -> Result<Vec<Sample>, SourceError> {
        let direction = query.filter.scope_direction();
        Ok(self
            .samples
            .iter()
            .filter(|s| Self::in_family(s, query.family))
            .filter(|s| Self::in_scope(s, direction, &query.namespace, &query.scope))
            .cloned()
            .collect())
    }

    async fn label_values(
        &self,
        query: &LabelValuesQuery,
        _range: &TimeRange,
    ) -> Result<Vec<String>, SourceError> {
        let values: BTreeSet<String> = self
            .samples
            .iter()
            .filter(|s| match &query.namespace {
                Some((direction, namespace)) => {
                    s.label(direction.namespace_label()) == namespace.as_str()
                }
                None => true,
            })
            .filter_map(|s| s.labels.get(query.label).cloned())
            .collect();
        Ok(values.into_iter().collect())
    }

    async fn check_health(&self) -> Result<(), SourceError> {
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Whether a sample mentions the given label with a non-empty value.
pub(crate) fn has_label(sample: &Sample, name: &str) -> bool {
    sample.labels.get(name).is_some_and(|v| !v.is_empty())
}

/// `"<namespace>/<workload>"` read from the given labels, if both are set.
pub(crate) fn identity_from(
    sample: &Sample,
    namespace_label: &str,
    workload_label: &str,
) -> Option<String> {
    if has_label(sample, namespace_label) && has_label(sample, workload_label) {
        Some(format!(
            "{}/{}",
            sample.label(namespace_label),
            sample.label(workload_label)
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshgraph_types::{labels, FilterType};

    fn samples() -> Vec<Sample> {
        vec![
            Sample::builder(MetricKind::HttpRequests, 10.0)
                .source("web", "shop")
                .service("api", "shop")
                .destination("api", "shop")
                .label(labels::RESPONSE_CODE, "200")
                .build(),
            Sample::builder(MetricKind::HttpRequests, 0.0)
                .source("cron", "ops")
                .service("api", "shop")
                .destination("api", "shop")
                .label(labels::RESPONSE_CODE, "200")
                .build(),
            Sample::builder(MetricKind::TcpSentBytes, 64.0)
                .source("api", "shop")
                .service("db", "data")
                .destination("db", "data")
                .build(),
        ]
    }

    fn range() -> TimeRange {
        TimeRange::new(0, 60_000)
    }

    #[tokio::test]
    async fn test_fetch_filters_by_metric_and_scope() {
        let source = StaticSource::new(samples());
        let query = MetricQuery {
            metric: MetricKind::HttpRequests,
            direction: Direction::Inbound,
            namespace: "shop".to_string(),
            scope: Scope::Workload("api".to_string()),
            idle_edges: false,
            interval_secs: 60,
        };

        let result = source.fetch_samples(&query, &range()).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].label(labels::SOURCE_WORKLOAD), "web");

        let idle = MetricQuery {
            idle_edges: true,
            ..query
        };
        let result = source.fetch_samples(&idle, &range()).await.unwrap();
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_label_values_are_distinct_and_sorted() {
        let source = StaticSource::new(samples());
        let query = LabelValuesQuery {
            label: labels::SOURCE_WORKLOAD,
            namespace: None,
        };
        let values = source.label_values(&query, &range()).await.unwrap();
        assert_eq!(values, vec!["api", "cron", "web"]);

        let query = LabelValuesQuery {
            label: labels::SOURCE_WORKLOAD,
            namespace: Some((Direction::Outbound, "shop".to_string())),
        };
        let values = source.label_values(&query, &range()).await.unwrap();
        assert_eq!(values, vec!["api", "web"]);
    }

    #[tokio::test]
    async fn test_fetch_peers_by_family() {
        let source = StaticSource::new(samples());
        let query = PeerQuery {
            family: TrafficFamily::TcpSentBytes,
            filter: FilterType::Destination,
            namespace: "shop".to_string(),
            scope: Scope::Namespace,
        };
        let peers = source.fetch_peers(&query, &range()).await.unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].destination_identity(), "data/db");
    }

    #[test]
    fn test_identity_from_requires_both_labels() {
        let sample = Sample::builder(MetricKind::TcpSentBytes, 1.0)
            .label(labels::SOURCE_WORKLOAD, "web")
            .build();
        assert_eq!(
            identity_from(
                &sample,
                labels::SOURCE_WORKLOAD_NAMESPACE,
                labels::SOURCE_WORKLOAD
            ),
            None
        );
    }
}

//! Label-value lookups: namespaces, applications, workloads and filters.
//!
//! Every lookup fans out one task per label (or per traffic family), joins
//! them, then returns the merged values sorted and de-duplicated.

use std::sync::Arc;

use meshgraph_types::{
    labels, Direction, FilterType, LabelValuesQuery, PeerQuery, Scope, TimeRange, TrafficFamily,
};
use tracing::{debug, debug_span};

use crate::fanout::FanOut;
use crate::source::identity_from;
use crate::{EngineError, SampleSource};

/// Answers catalog queries against a sample source.
#[derive(Debug, Clone)]
pub struct Catalog {
    source: Arc<dyn SampleSource>,
}

impl Catalog {
    pub fn new(source: Arc<dyn SampleSource>) -> Self {
        Self { source }
    }

    /// Namespaces with workloads on either side of mesh traffic.
    pub async fn namespaces(&self, range: &TimeRange) -> Result<Vec<String>, EngineError> {
        self.label_values(
            [
                LabelValuesQuery {
                    label: labels::DESTINATION_WORKLOAD_NAMESPACE,
                    namespace: None,
                },
                LabelValuesQuery {
                    label: labels::SOURCE_WORKLOAD_NAMESPACE,
                    namespace: None,
                },
            ],
            range,
        )
        .await
    }

    /// Applications sending or receiving traffic in a namespace.
    pub async fn applications(
        &self,
        namespace: &str,
        range: &TimeRange,
    ) -> Result<Vec<String>, EngineError> {
        self.scoped_values(namespace, labels::DESTINATION_APP, labels::SOURCE_APP, range)
            .await
    }

    /// Workloads sending or receiving traffic in a namespace.
    pub async fn workloads(
        &self,
        namespace: &str,
        range: &TimeRange,
    ) -> Result<Vec<String>, EngineError> {
        self.scoped_values(
            namespace,
            labels::DESTINATION_WORKLOAD,
            labels::SOURCE_WORKLOAD,
            range,
        )
        .await
    }

    /// `"<namespace>/<workload>"` identities of the scope's peers.
    ///
    /// For [`FilterType::Source`] these are the workloads sending traffic
    /// into the scope, for [`FilterType::Destination`] the workloads the
    /// scope sends traffic to. The result is directly usable as a graph
    /// source or destination filter list.
    pub async fn filters(
        &self,
        namespace: &str,
        scope: &Scope,
        filter: FilterType,
        range: &TimeRange,
    ) -> Result<Vec<String>, EngineError> {
        let (namespace_label, workload_label) = filter.peer_labels();
        let range = *range;

        let mut fan_out = FanOut::new();
        for family in TrafficFamily::ALL {
            let query = PeerQuery {
                family,
                filter,
                namespace: namespace.to_string(),
                scope: scope.clone(),
            };
            let source = Arc::clone(&self.source);
            let span = debug_span!("fetch_peers", family = ?family, filter = ?filter);
            fan_out.spawn(span, async move {
                let peers = source.fetch_peers(&query, &range).await?;
                debug!(count = peers.len(), "Fetched peers");
                Ok(peers
                    .iter()
                    .filter_map(|peer| identity_from(peer, namespace_label, workload_label))
                    .collect::<Vec<_>>())
            });
        }

        Ok(sorted(fan_out.join().await?))
    }

    async fn scoped_values(
        &self,
        namespace: &str,
        inbound_label: &'static str,
        outbound_label: &'static str,
        range: &TimeRange,
    ) -> Result<Vec<String>, EngineError> {
        self.label_values(
            [
                LabelValuesQuery {
                    label: inbound_label,
                    namespace: Some((Direction::Inbound, namespace.to_string())),
                },
                LabelValuesQuery {
                    label: outbound_label,
                    namespace: Some((Direction::Outbound, namespace.to_string())),
                },
            ],
            range,
        )
        .await
    }

    async fn label_values(
        &self,
        queries: impl IntoIterator<Item = LabelValuesQuery>,
        range: &TimeRange,
    ) -> Result<Vec<String>, EngineError> {
        let range = *range;
        let mut fan_out = FanOut::new();
        for query in queries {
            let source = Arc::clone(&self.source);
            let span = debug_span!("label_values", label = query.label);
            fan_out.spawn(span, async move {
                let values = source.label_values(&query, &range).await?;
                debug!(count = values.len(), "Fetched label values");
                Ok(values)
            });
        }

        Ok(sorted(fan_out.join().await?))
    }
}

fn sorted(groups: Vec<Vec<String>>) -> Vec<String> {
    let mut values: Vec<String> = groups.into_iter().flatten().collect();
    values.sort();
    values.dedup();
    values
}

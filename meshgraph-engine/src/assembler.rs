//! Graph assembly.
//!
//! ```text
//! metrics × {inbound, outbound}
//!        │  fan-out against the SampleSource
//!        ▼
//!   join barrier ── any error ──▶ Err(first error)
//!        │
//!        ▼
//!   deduplicate ─▶ edges ─▶ nodes ─▶ project ─▶ Graph
//! ```

use std::sync::Arc;

use meshgraph_types::{Direction, MetricKind, MetricQuery, Sample, Scope, TimeRange};
use tracing::{debug, debug_span, info};

use crate::dedup::deduplicate;
use crate::edges::{DurationMerge, EdgeFilters, EdgeSet};
use crate::fanout::FanOut;
use crate::frame::{DashboardLinks, EdgeRow, Graph, NodeRow};
use crate::nodes::aggregate_nodes;
use crate::projection::Projector;
use crate::{EngineError, SampleSource};

/// A resolved graph request.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRequest {
    pub namespace: String,
    pub scope: Scope,
    pub metrics: Vec<MetricKind>,
    /// Ask the source for zero-traffic series too.
    pub idle_edges: bool,
    /// `"<namespace>/<workload>"` identities whose outgoing samples are dropped.
    pub source_filters: Vec<String>,
    /// `"<namespace>/<workload>"` identities whose incoming samples are dropped.
    pub destination_filters: Vec<String>,
    pub time_range: TimeRange,
}

impl GraphRequest {
    /// A request for every metric kind, without filters.
    pub fn new(namespace: impl Into<String>, scope: Scope, time_range: TimeRange) -> Self {
        Self {
            namespace: namespace.into(),
            scope,
            metrics: MetricKind::ALL.to_vec(),
            idle_edges: false,
            source_filters: Vec::new(),
            destination_filters: Vec::new(),
            time_range,
        }
    }

    /// Restrict the request to the given metric kinds.
    pub fn with_metrics(mut self, metrics: impl IntoIterator<Item = MetricKind>) -> Self {
        self.metrics = metrics.into_iter().collect();
        self
    }

    /// Include zero-traffic series.
    pub fn with_idle_edges(mut self, idle_edges: bool) -> Self {
        self.idle_edges = idle_edges;
        self
    }

    /// Drop samples from these source identities.
    pub fn with_source_filters(mut self, filters: impl IntoIterator<Item = String>) -> Self {
        self.source_filters = filters.into_iter().collect();
        self
    }

    /// Drop samples to these destination identities.
    pub fn with_destination_filters(mut self, filters: impl IntoIterator<Item = String>) -> Self {
        self.destination_filters = filters.into_iter().collect();
        self
    }

    /// Window length in seconds, rejecting windows shorter than one second.
    pub fn interval_secs(&self) -> Result<u64, EngineError> {
        match self.time_range.interval_secs() {
            0 => Err(EngineError::InvalidTimeRange(
                self.time_range.to_ms.saturating_sub(self.time_range.from_ms),
            )),
            secs => Ok(secs),
        }
    }
}

/// Builds graphs from a sample source.
#[derive(Debug, Clone)]
pub struct GraphAssembler {
    source: Arc<dyn SampleSource>,
    projector: Projector,
    links: DashboardLinks,
    merge: DurationMerge,
}

impl GraphAssembler {
    /// Create an assembler with default thresholds, colors and no links.
    pub fn new(source: Arc<dyn SampleSource>) -> Self {
        Self {
            source,
            projector: Projector::default(),
            links: DashboardLinks::default(),
            merge: DurationMerge::default(),
        }
    }

    /// Use the given thresholds and palette.
    pub fn with_projector(mut self, projector: Projector) -> Self {
        self.projector = projector;
        self
    }

    /// Attach dashboard deep links to node rows.
    pub fn with_links(mut self, links: DashboardLinks) -> Self {
        self.links = links;
        self
    }

    /// How repeated duration samples for one edge combine.
    pub fn with_duration_merge(mut self, merge: DurationMerge) -> Self {
        self.merge = merge;
        self
    }

    /// The underlying sample source.
    pub fn source(&self) -> &Arc<dyn SampleSource> {
        &self.source
    }

    /// Fetch, aggregate and project one graph.
    ///
    /// Any fetch failure aborts the build; no partial graph is returned.
    pub async fn build(&self, request: &GraphRequest) -> Result<Graph, EngineError> {
        let samples = self.fetch_samples(request).await?;
        self.assemble(samples, request)
    }

    /// Fetch every requested metric kind for both directions of the scope.
    ///
    /// Samples come back grouped by metric kind in request order, inbound
    /// before outbound.
    pub async fn fetch_samples(&self, request: &GraphRequest) -> Result<Vec<Sample>, EngineError> {
        let interval_secs = request.interval_secs()?;
        let range = request.time_range;

        let mut fan_out = FanOut::new();
        for &metric in &request.metrics {
            for direction in Direction::BOTH {
                let query = MetricQuery {
                    metric,
                    direction,
                    namespace: request.namespace.clone(),
                    scope: request.scope.clone(),
                    idle_edges: request.idle_edges,
                    interval_secs,
                };
                let source = Arc::clone(&self.source);
                let span = debug_span!(
                    "fetch_samples",
                    metric = %metric,
                    direction = direction.as_str(),
                );
                fan_out.spawn(span, async move {
                    debug!(
                        namespace = %query.namespace,
                        scope = ?query.scope,
                        interval_secs,
                        "Fetching samples"
                    );
                    let samples = source.fetch_samples(&query, &range).await?;
                    debug!(count = samples.len(), "Fetched samples");
                    Ok(samples)
                });
            }
        }

        Ok(fan_out.join().await?.into_iter().flatten().collect())
    }

    /// Turn already-fetched samples into a graph.
    ///
    /// Rows are sorted by id so identical input yields identical output.
    pub fn assemble(&self, samples: Vec<Sample>, request: &GraphRequest) -> Result<Graph, EngineError> {
        let interval = request.interval_secs()? as f64;
        let fetched = samples.len();

        let samples = deduplicate(samples);
        let filters = EdgeFilters::new(
            request.source_filters.iter().cloned(),
            request.destination_filters.iter().cloned(),
        );
        let edges = EdgeSet::build(&samples, &filters, self.merge);
        let nodes = aggregate_nodes(edges.iter());

        let mut edge_rows: Vec<EdgeRow> = edges
            .iter()
            .map(|edge| EdgeRow::new(edge, &self.projector.project_edge(edge, interval)))
            .collect();
        edge_rows.sort_by(|a, b| a.id.cmp(&b.id));

        let mut nodes: Vec<_> = nodes.into_values().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        let node_rows = nodes
            .iter()
            .map(|node| {
                NodeRow::new(
                    node,
                    &self.projector.project_node(node, interval),
                    self.links.link(node, &request.time_range),
                )
            })
            .collect();

        let graph = Graph {
            edges: edge_rows,
            nodes: node_rows,
        };

        info!(
            namespace = %request.namespace,
            samples = fetched,
            unique = samples.len(),
            edges = graph.edges.len(),
            nodes = graph.nodes.len(),
            "Built graph"
        );

        Ok(graph)
    }
}

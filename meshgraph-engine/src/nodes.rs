//! Node aggregation from edges.

use std::collections::HashMap;

use meshgraph_types::{EntityId, TrafficStats};

use crate::edges::EdgeRecord;

/// Aggregated traffic for one mesh entity.
///
/// `server` sums every edge terminating at the entity, `client` every edge
/// originating from it. Durations are not aggregated; they stay on edges.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub id: EntityId,
    /// Fully qualified service name, for service nodes.
    pub service: Option<String>,
    pub server: TrafficStats,
    pub client: TrafficStats,
}

impl NodeRecord {
    /// Create a node with empty statistics.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            service: None,
            server: TrafficStats::new(),
            client: TrafficStats::new(),
        }
    }
}

/// Build one node per distinct edge endpoint.
pub fn aggregate_nodes<'a, I>(edges: I) -> HashMap<EntityId, NodeRecord>
where
    I: IntoIterator<Item = &'a EdgeRecord>,
{
    let mut nodes: HashMap<EntityId, NodeRecord> = HashMap::new();

    for edge in edges {
        let source = &edge.key.source;
        nodes
            .entry(source.clone())
            .or_insert_with(|| NodeRecord::new(source.clone()))
            .client += &edge.stats;

        let destination = &edge.key.destination;
        let node = nodes
            .entry(destination.clone())
            .or_insert_with(|| NodeRecord::new(destination.clone()));
        node.server += &edge.stats;
        if destination.is_service() && node.service.is_none() && !edge.destination_service.is_empty()
        {
            node.service = Some(edge.destination_service.clone());
        }
    }

    nodes
}

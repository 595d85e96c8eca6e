//! Edge and node tables.
//!
//! A built graph is two flat tables of display strings. Field names follow
//! the node-graph column convention (`id`, `source`, `target`, `mainstat`,
//! `detail__*`) so the JSON export can be fed straight into a node-graph
//! panel.

use meshgraph_types::{EntityKind, TimeRange};
use serde::{Deserialize, Serialize};

use crate::edges::EdgeRecord;
use crate::nodes::NodeRecord;
use crate::projection::Projection;

/// Separator between entries of a stat list or a server/client pair.
pub const STAT_SEPARATOR: &str = " | ";

/// Edge table columns as `(field, display name)`.
pub const EDGE_COLUMNS: &[(&str, &str)] = &[
    ("id", "id"),
    ("source", "source"),
    ("target", "target"),
    ("mainstat", "Main Stats"),
    ("secondarystat", "Secondary Stats"),
    ("color", "Health"),
    ("detail__grpcrate", "gRPC Rate"),
    ("detail__grpcperr", "gRPC Error"),
    ("detail__grpcduration", "gRPC Duration"),
    ("detail__grpcsentmessages", "gRPC Sent Messages"),
    ("detail__grpcreceivedmessages", "gRPC Received Messages"),
    ("detail__httprate", "HTTP Rate"),
    ("detail__httperr", "HTTP Error"),
    ("detail__httpduration", "HTTP Duration"),
    ("detail__tcpsentbytes", "TCP Sent"),
    ("detail__tcpreceivedbytes", "TCP Received"),
];

/// Node table columns as `(field, display name)`.
pub const NODE_COLUMNS: &[(&str, &str)] = &[
    ("id", "id"),
    ("title", "Type"),
    ("subtitle", "Name (Namespace)"),
    ("mainstat", "Main Stats"),
    ("secondarystat", "Secondary Stats"),
    ("color", "Health"),
    ("detail__grpcrate", "gRPC Rate"),
    ("detail__grpcperr", "gRPC Error"),
    ("detail__grpcsentmessages", "gRPC Sent Messages"),
    ("detail__grpcreceivedmessages", "gRPC Received Messages"),
    ("detail__httprate", "HTTP Rate"),
    ("detail__httperr", "HTTP Error"),
    ("detail__tcpsentbytes", "TCP Sent"),
    ("detail__tcpreceivedbytes", "TCP Received"),
    ("link", "link"),
];

fn join(values: &[String]) -> String {
    values.join(STAT_SEPARATOR)
}

/// One row of the edge table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRow {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "mainstat")]
    pub main_stat: String,
    #[serde(rename = "secondarystat")]
    pub secondary_stat: String,
    pub color: String,
    #[serde(rename = "detail__grpcrate")]
    pub grpc_rate: String,
    #[serde(rename = "detail__grpcperr")]
    pub grpc_error: String,
    #[serde(rename = "detail__grpcduration")]
    pub grpc_duration: String,
    #[serde(rename = "detail__grpcsentmessages")]
    pub grpc_sent_messages: String,
    #[serde(rename = "detail__grpcreceivedmessages")]
    pub grpc_received_messages: String,
    #[serde(rename = "detail__httprate")]
    pub http_rate: String,
    #[serde(rename = "detail__httperr")]
    pub http_error: String,
    #[serde(rename = "detail__httpduration")]
    pub http_duration: String,
    #[serde(rename = "detail__tcpsentbytes")]
    pub tcp_sent_bytes: String,
    #[serde(rename = "detail__tcpreceivedbytes")]
    pub tcp_received_bytes: String,
}

impl EdgeRow {
    /// Flatten a projected edge into a row.
    pub fn new(edge: &EdgeRecord, projection: &Projection) -> Self {
        let details = &projection.details;
        Self {
            id: edge.id(),
            source: edge.key.source.id(),
            target: edge.key.destination.id(),
            main_stat: join(&projection.main_stat),
            secondary_stat: join(&projection.secondary_stat),
            color: projection.color.clone(),
            grpc_rate: join(&details.grpc_rate),
            grpc_error: join(&details.grpc_error),
            grpc_duration: join(&details.grpc_duration),
            grpc_sent_messages: join(&details.grpc_sent_messages),
            grpc_received_messages: join(&details.grpc_received_messages),
            http_rate: join(&details.http_rate),
            http_error: join(&details.http_error),
            http_duration: join(&details.http_duration),
            tcp_sent_bytes: join(&details.tcp_sent_bytes),
            tcp_received_bytes: join(&details.tcp_received_bytes),
        }
    }
}

/// One row of the node table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRow {
    pub id: String,
    /// Entity kind, `Workload` or `Service`.
    pub title: String,
    /// `"name (namespace)"`.
    pub subtitle: String,
    #[serde(rename = "mainstat")]
    pub main_stat: String,
    #[serde(rename = "secondarystat")]
    pub secondary_stat: String,
    pub color: String,
    #[serde(rename = "detail__grpcrate")]
    pub grpc_rate: String,
    #[serde(rename = "detail__grpcperr")]
    pub grpc_error: String,
    #[serde(rename = "detail__grpcsentmessages")]
    pub grpc_sent_messages: String,
    #[serde(rename = "detail__grpcreceivedmessages")]
    pub grpc_received_messages: String,
    #[serde(rename = "detail__httprate")]
    pub http_rate: String,
    #[serde(rename = "detail__httperr")]
    pub http_error: String,
    #[serde(rename = "detail__tcpsentbytes")]
    pub tcp_sent_bytes: String,
    #[serde(rename = "detail__tcpreceivedbytes")]
    pub tcp_received_bytes: String,
    /// Dashboard deep link, empty when none is configured.
    pub link: String,
}

impl NodeRow {
    /// Flatten a projected node into a row.
    pub fn new(node: &NodeRecord, projection: &Projection, link: String) -> Self {
        let details = &projection.details;
        Self {
            id: node.id.id(),
            title: node.id.kind.as_str().to_string(),
            subtitle: node.id.subtitle(),
            main_stat: join(&projection.main_stat),
            secondary_stat: join(&projection.secondary_stat),
            color: projection.color.clone(),
            grpc_rate: join(&details.grpc_rate),
            grpc_error: join(&details.grpc_error),
            grpc_sent_messages: join(&details.grpc_sent_messages),
            grpc_received_messages: join(&details.grpc_received_messages),
            http_rate: join(&details.http_rate),
            http_error: join(&details.http_error),
            tcp_sent_bytes: join(&details.tcp_sent_bytes),
            tcp_received_bytes: join(&details.tcp_received_bytes),
            link,
        }
    }
}

/// A finished graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    pub edges: Vec<EdgeRow>,
    pub nodes: Vec<NodeRow>,
}

impl Graph {
    /// Look up an edge row by id.
    pub fn edge(&self, id: &str) -> Option<&EdgeRow> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Look up a node row by id.
    pub fn node(&self, id: &str) -> Option<&NodeRow> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty() && self.nodes.is_empty()
    }
}

/// Base URLs of the dashboards node rows link to.
///
/// Each base URL is expected to already carry a query string, the link
/// variables are appended with `&`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardLinks {
    pub workload: Option<String>,
    pub service: Option<String>,
}

impl DashboardLinks {
    /// Deep link for a node over a time range, or an empty string.
    pub fn link(&self, node: &NodeRecord, range: &TimeRange) -> String {
        let id = &node.id;
        match id.kind {
            EntityKind::Service => match non_empty(&self.service) {
                Some(base) => format!(
                    "{base}&var-service={}&from={}&to={}",
                    node.service.as_deref().unwrap_or(&id.name),
                    range.from_ms,
                    range.to_ms
                ),
                None => String::new(),
            },
            EntityKind::Workload => match non_empty(&self.workload) {
                Some(base) => format!(
                    "{base}&var-namespace={}&var-workload={}&from={}&to={}",
                    id.namespace, id.name, range.from_ms, range.to_ms
                ),
                None => String::new(),
            },
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

//! JSON query models.
//!
//! The wire format uses camelCase keys and a `queryType` tag:
//!
//! ```json
//! { "queryType": "workloadgraph", "namespace": "shop", "workload": "web",
//!   "metrics": ["httpRequests"], "idleEdges": false }
//! ```

use serde::{Deserialize, Serialize};

use crate::FilterType;

/// A query model, tagged by `queryType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "queryType", rename_all = "lowercase")]
pub enum QueryModel {
    /// List namespaces with mesh traffic.
    Namespaces,
    /// List applications in a namespace.
    Applications(NamespaceModel),
    /// List workloads in a namespace.
    Workloads(NamespaceModel),
    /// List peer workloads usable as graph filters.
    Filters(FiltersModel),
    /// Graph around an application.
    ApplicationGraph(GraphModel),
    /// Graph around a workload.
    WorkloadGraph(GraphModel),
    /// Graph of a whole namespace.
    NamespaceGraph(GraphModel),
}

/// Model carrying only a namespace.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceModel {
    #[serde(default)]
    pub namespace: String,
}

/// Model for filter lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltersModel {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub application: String,
    #[serde(default)]
    pub workload: String,
    pub filter_type: FilterType,
}

/// Model for graph queries.
///
/// Metric names are kept as strings so unknown kinds can be skipped instead
/// of failing the whole request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphModel {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub application: String,
    #[serde(default)]
    pub workload: String,
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub idle_edges: bool,
    #[serde(default)]
    pub source_filters: Vec<String>,
    #[serde(default)]
    pub destination_filters: Vec<String>,
}

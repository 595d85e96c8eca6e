//! Query model dispatch.
//!
//! Parses a JSON [`QueryModel`] into a [`Request`] and answers it with the
//! assembler or the catalog.

use std::sync::Arc;

use meshgraph_types::{FilterType, GraphModel, MetricKind, QueryModel, Scope, TimeRange};
use serde::Serialize;
use tracing::{debug, warn};

use crate::assembler::{GraphAssembler, GraphRequest};
use crate::catalog::Catalog;
use crate::edges::DurationMerge;
use crate::frame::{DashboardLinks, Graph};
use crate::projection::Projector;
use crate::{EngineError, SampleSource};

/// A validated request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Namespaces {
        time_range: TimeRange,
    },
    Applications {
        namespace: String,
        time_range: TimeRange,
    },
    Workloads {
        namespace: String,
        time_range: TimeRange,
    },
    Filters {
        namespace: String,
        scope: Scope,
        filter: FilterType,
        time_range: TimeRange,
    },
    Graph(GraphRequest),
}

impl Request {
    /// Parse a JSON query model.
    pub fn parse(json: &str, time_range: TimeRange) -> Result<Self, EngineError> {
        let model: QueryModel = serde_json::from_str(json)?;
        Self::from_model(model, time_range)
    }

    /// Validate a query model.
    pub fn from_model(model: QueryModel, time_range: TimeRange) -> Result<Self, EngineError> {
        let request = match model {
            QueryModel::Namespaces => Request::Namespaces { time_range },
            QueryModel::Applications(m) => Request::Applications {
                namespace: required("namespace", m.namespace)?,
                time_range,
            },
            QueryModel::Workloads(m) => Request::Workloads {
                namespace: required("namespace", m.namespace)?,
                time_range,
            },
            QueryModel::Filters(m) => Request::Filters {
                scope: scope(&m.application, &m.workload)?,
                namespace: required("namespace", m.namespace)?,
                filter: m.filter_type,
                time_range,
            },
            QueryModel::ApplicationGraph(m) => {
                scope(&m.application, &m.workload)?;
                let application = required("application", m.application.clone())?;
                graph(m, Scope::Application(application), time_range)?
            }
            QueryModel::WorkloadGraph(m) => {
                scope(&m.application, &m.workload)?;
                let workload = required("workload", m.workload.clone())?;
                graph(m, Scope::Workload(workload), time_range)?
            }
            QueryModel::NamespaceGraph(m) => {
                scope(&m.application, &m.workload)?;
                graph(m, Scope::Namespace, time_range)?
            }
        };
        Ok(request)
    }

    /// Window the request covers.
    pub fn time_range(&self) -> &TimeRange {
        match self {
            Request::Namespaces { time_range }
            | Request::Applications { time_range, .. }
            | Request::Workloads { time_range, .. }
            | Request::Filters { time_range, .. } => time_range,
            Request::Graph(request) => &request.time_range,
        }
    }
}

fn required(field: &str, value: String) -> Result<String, EngineError> {
    if value.is_empty() {
        Err(EngineError::InvalidQuery(format!("{field} is required")))
    } else {
        Ok(value)
    }
}

fn scope(application: &str, workload: &str) -> Result<Scope, EngineError> {
    Scope::from_selectors(Some(application), Some(workload)).ok_or_else(|| {
        EngineError::InvalidQuery("application and workload are mutually exclusive".to_string())
    })
}

fn graph(model: GraphModel, scope: Scope, time_range: TimeRange) -> Result<Request, EngineError> {
    let metrics: Vec<MetricKind> = model
        .metrics
        .iter()
        .filter_map(|name| match name.parse() {
            Ok(kind) => Some(kind),
            Err(err) => {
                warn!(metric = %name, error = %err, "Ignoring metric");
                None
            }
        })
        .collect();

    Ok(Request::Graph(
        GraphRequest::new(required("namespace", model.namespace)?, scope, time_range)
            .with_metrics(metrics)
            .with_idle_edges(model.idle_edges)
            .with_source_filters(model.source_filters)
            .with_destination_filters(model.destination_filters),
    ))
}

/// Answer to a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    /// Sorted, distinct label values.
    Values(Vec<String>),
    Graph(Graph),
}

/// Entry point tying the assembler and the catalog to one sample source.
#[derive(Debug, Clone)]
pub struct Engine {
    assembler: GraphAssembler,
    catalog: Catalog,
}

impl Engine {
    /// An engine over one sample source, with default projection settings.
    pub fn new(source: Arc<dyn SampleSource>) -> Self {
        Self {
            catalog: Catalog::new(Arc::clone(&source)),
            assembler: GraphAssembler::new(source),
        }
    }

    /// See [`GraphAssembler::with_projector`].
    pub fn with_projector(mut self, projector: Projector) -> Self {
        self.assembler = self.assembler.with_projector(projector);
        self
    }

    /// See [`GraphAssembler::with_links`].
    pub fn with_links(mut self, links: DashboardLinks) -> Self {
        self.assembler = self.assembler.with_links(links);
        self
    }

    /// See [`GraphAssembler::with_duration_merge`].
    pub fn with_duration_merge(mut self, merge: DurationMerge) -> Self {
        self.assembler = self.assembler.with_duration_merge(merge);
        self
    }

    /// The graph assembler answering graph requests.
    pub fn assembler(&self) -> &GraphAssembler {
        &self.assembler
    }

    /// The catalog answering label-value lookups.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Parse and answer a JSON query model.
    pub async fn query(&self, json: &str, time_range: TimeRange) -> Result<Response, EngineError> {
        let request = Request::parse(json, time_range)?;
        self.handle(&request).await
    }

    /// Answer a validated request.
    pub async fn handle(&self, request: &Request) -> Result<Response, EngineError> {
        debug!(
            request = ?request,
            source = self.assembler.source().description(),
            "Handling request"
        );
        match request {
            Request::Namespaces { time_range } => {
                self.catalog.namespaces(time_range).await.map(Response::Values)
            }
            Request::Applications {
                namespace,
                time_range,
            } => self
                .catalog
                .applications(namespace, time_range)
                .await
                .map(Response::Values),
            Request::Workloads {
                namespace,
                time_range,
            } => self
                .catalog
                .workloads(namespace, time_range)
                .await
                .map(Response::Values),
            Request::Filters {
                namespace,
                scope,
                filter,
                time_range,
            } => self
                .catalog
                .filters(namespace, scope, *filter, time_range)
                .await
                .map(Response::Values),
            Request::Graph(request) => self.assembler.build(request).await.map(Response::Graph),
        }
    }

    /// Check the sample source is reachable.
    pub async fn check_health(&self) -> Result<(), EngineError> {
        Ok(self.assembler.source().check_health().await?)
    }
}

//! # meshgraph-engine
//!
//! Turns mesh traffic samples into an annotated topology graph.
//!
//! The engine owns no I/O. Samples come from a [`SampleSource`], which the
//! [`GraphAssembler`] queries in parallel (one task per metric kind and
//! direction). Once every task has finished the samples are deduplicated,
//! folded into edges, aggregated into nodes and projected into display rows.
//!
//! ## Pipeline
//!
//! | Stage        | Module                | Output                         |
//! |--------------|-----------------------|--------------------------------|
//! | Fetch        | [`assembler`]         | `Vec<Sample>`                  |
//! | Deduplicate  | [`dedup`]             | `Vec<Sample>`                  |
//! | Edges        | [`edges`]             | [`EdgeSet`]                    |
//! | Nodes        | [`nodes`]             | [`NodeRecord`] per entity      |
//! | Projection   | [`projection`]        | [`Projection`] per element     |
//! | Tables       | [`frame`]             | [`Graph`]                      |
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use meshgraph_engine::{GraphAssembler, GraphRequest, StaticSource};
//! use meshgraph_types::{labels, MetricKind, Sample, Scope, TimeRange};
//!
//! let samples = vec![
//!     Sample::builder(MetricKind::HttpRequests, 10.0)
//!         .source("web", "shop")
//!         .service("api", "shop")
//!         .destination("api-v1", "shop")
//!         .label(labels::RESPONSE_CODE, "200")
//!         .build(),
//! ];
//!
//! let assembler = GraphAssembler::new(Arc::new(StaticSource::new(samples)));
//! let request = GraphRequest::new("shop", Scope::Namespace, TimeRange::new(0, 10_000));
//!
//! let graph = tokio_test::block_on(assembler.build(&request)).unwrap();
//! assert_eq!(graph.edges.len(), 2);
//! assert_eq!(graph.nodes.len(), 3);
//! ```

pub mod assembler;
pub mod catalog;
pub mod dedup;
pub mod edges;
mod error;
mod fanout;
pub mod format;
pub mod frame;
pub mod nodes;
pub mod projection;
pub mod query;
pub mod source;

pub use assembler::{GraphAssembler, GraphRequest};
pub use catalog::Catalog;
pub use dedup::deduplicate;
pub use edges::{DurationMerge, EdgeFilters, EdgeRecord, EdgeSet};
pub use error::{EngineError, SourceError, SourceErrorKind};
pub use frame::{DashboardLinks, EdgeRow, Graph, NodeRow, EDGE_COLUMNS, NODE_COLUMNS};
pub use nodes::{aggregate_nodes, NodeRecord};
pub use projection::{Health, Palette, Projection, Projector, ProjectorConfig, Thresholds};
pub use query::{Engine, Request, Response};
pub use source::{SampleSource, StaticSource};

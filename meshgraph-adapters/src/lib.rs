//! # meshgraph-adapters
//!
//! Sample sources for reading mesh telemetry from time-series backends.
//!
//! Each adapter implements [`meshgraph_engine::SampleSource`], so it can be
//! plugged straight into a graph assembler.
//!
//! ## Supported Backends
//!
//! - **Prometheus** (`prometheus` feature) - Reads Istio standard metrics via
//!   the Prometheus HTTP API, with optional basic or bearer-token auth
//!
//! ## Quick Start (Prometheus)
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use meshgraph_adapters::prometheus::PrometheusSource;
//! use meshgraph_engine::{GraphAssembler, GraphRequest};
//! use meshgraph_types::{Scope, TimeRange};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = PrometheusSource::builder()
//!         .endpoint("http://localhost:9090")
//!         .build();
//!
//!     let assembler = GraphAssembler::new(Arc::new(source));
//!     let request = GraphRequest::new(
//!         "bookinfo",
//!         Scope::Namespace,
//!         TimeRange::new(1_700_000_000_000, 1_700_000_900_000),
//!     );
//!
//!     let graph = assembler.build(&request).await?;
//!     println!("{} edges, {} nodes", graph.edges.len(), graph.nodes.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod promql;

#[cfg(feature = "prometheus")]
pub mod prometheus;

pub use error::AdapterError;

//! # meshgraph-types
//!
//! Core types for mesh telemetry graphs. This crate defines the shared
//! vocabulary used by the graph engine, the sample source adapters and the
//! CLI: raw time-series samples, the metric kinds they belong to, the mesh
//! entities they describe and the traffic counters accumulated per edge.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature for JSON query models and exports
//! - **Structural identity**: Entities are value types with derived equality and hashing,
//!   never formatted strings
//!
//! ## Features
//!
//! - `serde`: JSON serialization via serde (required for [`QueryModel`])
//!
//! ## Example
//!
//! ```rust
//! use meshgraph_types::{labels, MetricKind, Sample};
//!
//! let sample = Sample::builder(MetricKind::HttpRequests, 10.0)
//!     .label(labels::SOURCE_WORKLOAD, "web")
//!     .label(labels::SOURCE_WORKLOAD_NAMESPACE, "shop")
//!     .label(labels::DESTINATION_SERVICE_NAME, "api")
//!     .label(labels::RESPONSE_CODE, "200")
//!     .build();
//!
//! assert_eq!(sample.metric(), Some(MetricKind::HttpRequests));
//! assert_eq!(sample.label(labels::SOURCE_WORKLOAD), "web");
//! ```

mod entity;
mod metric;
#[cfg(feature = "serde")]
mod model;
mod query;
mod sample;
mod stats;

pub use entity::*;
pub use metric::*;
#[cfg(feature = "serde")]
pub use model::*;
pub use query::*;
pub use sample::*;
pub use stats::*;

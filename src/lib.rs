//! # meshgraph
//!
//! Command-line front end for the mesh graph engine: layered settings,
//! sample sources, time windows and JSON export.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           meshgraph                          │
//! │  ┌──────────┐    ┌──────────────┐    ┌─────────┐             │
//! │  │ settings │───▶│    Engine    │───▶│ export  │───▶ JSON    │
//! │  │  range   │    │ (assembler,  │    │         │             │
//! │  └──────────┘    │   catalog)   │    └─────────┘             │
//! │                  └──────┬───────┘                            │
//! │                         ▼                                    │
//! │                  ┌──────────────┐                            │
//! │                  │ SampleSource │◀── Prometheus | FileSource │
//! │                  └──────────────┘                            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`settings`]**: defaults, config file and `MESHGRAPH_*` environment
//! - **[`source`]**: [`FileSource`] replaying a JSON sample dump
//! - **[`range`]**: `15m`-style windows and explicit bounds
//! - **[`export`]**: graph frames and value lists as JSON
//! - **[`logging`]**: `tracing` subscriber on stderr
//!
//! ## Usage
//!
//! ```bash
//! # Graph a namespace from Prometheus over the last 15 minutes
//! meshgraph graph --namespace bookinfo
//!
//! # Graph one workload from a recorded dump
//! meshgraph graph --namespace bookinfo --workload reviews-v1 --samples dump.json
//!
//! # List namespaces with mesh traffic
//! meshgraph namespaces --range 1h
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use meshgraph::{range, FileSource};
//! use meshgraph_engine::Engine;
//!
//! # tokio_test::block_on(async {
//! let source = FileSource::open("dump.json").unwrap();
//! let engine = Engine::new(Arc::new(source));
//!
//! let window = range::resolve("15m", None, None, range::now_ms().unwrap()).unwrap();
//! let response = engine
//!     .query(r#"{"queryType": "namespacegraph", "namespace": "bookinfo"}"#, window)
//!     .await
//!     .unwrap();
//! # });
//! ```

pub mod export;
pub mod logging;
pub mod range;
pub mod settings;
pub mod source;

pub use settings::Settings;
pub use source::FileSource;

//! Sample sources owned by the command-line tool.
//!
//! Prometheus lives in `meshgraph-adapters`; this module adds the sources
//! that only make sense for a local tool, such as replaying a dump from disk.

mod file;

pub use file::FileSource;

//! JSON export of query responses.
//!
//! Graphs are written as two frames (`edges`, `nodes`) carrying their column
//! metadata next to the rows, plus a summary of node health. Label-value
//! lookups are written as a plain list.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use meshgraph_engine::{Graph, Palette, Response, EDGE_COLUMNS, NODE_COLUMNS};
use serde_json::{json, Map, Value};

fn fields(columns: &[(&str, &str)]) -> Value {
    Value::Array(
        columns
            .iter()
            .map(|(name, display_name)| json!({ "name": name, "displayName": display_name }))
            .collect(),
    )
}

fn summary(graph: &Graph, palette: &Palette) -> Value {
    let count = |color: &str| graph.nodes.iter().filter(|n| n.color == color).count();

    let mut summary = Map::new();
    summary.insert("edges".to_string(), json!(graph.edges.len()));
    summary.insert("nodes".to_string(), json!(graph.nodes.len()));
    summary.insert("critical".to_string(), json!(count(&palette.critical)));
    summary.insert("warning".to_string(), json!(count(&palette.warning)));
    summary.insert("healthy".to_string(), json!(count(&palette.healthy)));
    summary.insert("tcp".to_string(), json!(count(&palette.tcp)));
    summary.insert("idle".to_string(), json!(count(&palette.idle)));
    Value::Object(summary)
}

/// Build the export document for a response.
pub fn to_value(response: &Response, palette: &Palette) -> Result<Value> {
    let value = match response {
        Response::Values(values) => json!({ "values": values }),
        Response::Graph(graph) => {
            let edges = serde_json::to_value(&graph.edges)?;
            let nodes = serde_json::to_value(&graph.nodes)?;
            json!({
                "summary": summary(graph, palette),
                "edges": { "fields": fields(EDGE_COLUMNS), "rows": edges },
                "nodes": { "fields": fields(NODE_COLUMNS), "rows": nodes },
            })
        }
    };
    Ok(value)
}

/// Write a response as pretty JSON to a file, or stdout when no path is given.
pub fn write(response: &Response, palette: &Palette, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(&to_value(response, palette)?)?;

    match output {
        Some(path) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            tracing::info!(path = %path.display(), "Exported response");
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(json.as_bytes())?;
            handle.write_all(b"\n")?;
        }
    }
    Ok(())
}

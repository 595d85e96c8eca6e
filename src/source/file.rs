//! Sample dump loaded from a JSON file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use meshgraph_engine::{SampleSource, SourceError, StaticSource};
use meshgraph_types::{labels, LabelValuesQuery, MetricQuery, PeerQuery, Sample, TimeRange};
use serde::Deserialize;

/// Accepted dump layouts.
///
/// Either a flat list of samples that already carry their `metric` label, or
/// an object keyed by metric kind whose samples get the label attached.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Dump {
    Flat(Vec<Sample>),
    ByMetric(BTreeMap<String, Vec<Sample>>),
}

impl Dump {
    fn into_samples(self) -> Vec<Sample> {
        match self {
            Dump::Flat(samples) => samples,
            Dump::ByMetric(by_metric) => by_metric
                .into_iter()
                .flat_map(|(metric, samples)| {
                    samples.into_iter().map(move |mut sample| {
                        sample
                            .labels
                            .insert(labels::METRIC.to_string(), metric.clone());
                        sample
                    })
                })
                .collect(),
        }
    }
}

/// A sample source replaying a JSON dump.
///
/// The file is read once at construction; queries are answered in memory by
/// label matching, ignoring the time range.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    inner: StaticSource,
}

impl FileSource {
    /// Load a dump from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read samples from {}", path.display()))?;
        let dump: Dump = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse samples in {}", path.display()))?;

        let samples = dump.into_samples();
        tracing::debug!(path = %path.display(), count = samples.len(), "Loaded sample dump");

        let description = format!("file: {}", path.display());
        Ok(Self {
            inner: StaticSource::with_description(samples, description),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn samples(&self) -> &[Sample] {
        self.inner.samples()
    }
}

#[async_trait]
impl SampleSource for FileSource {
    async fn fetch_samples(
        &self,
        query: &MetricQuery,
        range: &TimeRange,
    ) -> Result<Vec<Sample>, SourceError> {
        self.inner.fetch_samples(query, range).await
    }

    async fn fetch_peers(
        &self,
        query: &PeerQuery,
        range: &TimeRange,
    ) -> Result<Vec<Sample>, SourceError> {
        self.inner.fetch_peers(query, range).await
    }

    async fn label_values(
        &self,
        query: &LabelValuesQuery,
        range: &TimeRange,
    ) -> Result<Vec<String>, SourceError> {
        self.inner.label_values(query, range).await
    }

    async fn check_health(&self) -> Result<(), SourceError> {
        Ok(())
    }

    fn description(&self) -> &str {
        self.inner.description()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshgraph_types::{Direction, MetricKind, Scope};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn range() -> TimeRange {
        TimeRange::new(0, 60_000)
    }

    fn http_query() -> MetricQuery {
        MetricQuery {
            metric: MetricKind::HttpRequests,
            direction: Direction::Inbound,
            namespace: "shop".to_string(),
            scope: Scope::Namespace,
            idle_edges: false,
            interval_secs: 60,
        }
    }

    #[test]
    fn test_flat_dump() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"[{{"value": 12.0, "labels": {{
                "metric": "httpRequests",
                "source_workload": "web", "source_workload_namespace": "shop",
                "destination_workload": "api", "destination_workload_namespace": "shop",
                "response_code": "200"
            }}}}]"#
        )
        .unwrap();

        let source = FileSource::open(file.path()).unwrap();
        assert_eq!(source.samples().len(), 1);
        assert_eq!(source.samples()[0].metric(), Some(MetricKind::HttpRequests));
        assert_eq!(source.description(), format!("file: {}", file.path().display()));
    }

    #[tokio::test]
    async fn test_dump_keyed_by_metric() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
                "httpRequests": [{{"value": 4.0, "labels": {{
                    "destination_workload": "api", "destination_workload_namespace": "shop"
                }}}}],
                "tcpSentBytes": [{{"value": 9.0, "labels": {{
                    "destination_workload": "db", "destination_workload_namespace": "shop"
                }}}}]
            }}"#
        )
        .unwrap();

        let source = FileSource::open(file.path()).unwrap();
        assert_eq!(source.samples().len(), 2);

        let samples = source.fetch_samples(&http_query(), &range()).await.unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].label(labels::DESTINATION_WORKLOAD), "api");
        assert!(source.check_health().await.is_ok());
    }

    #[test]
    fn test_missing_file() {
        let err = FileSource::open("/nonexistent/samples.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read samples"));
    }

    #[test]
    fn test_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let err = FileSource::open(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse samples"));
    }
}

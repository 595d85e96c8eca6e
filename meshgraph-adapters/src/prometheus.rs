//! Prometheus adapter using the HTTP query API.
//!
//! Istio telemetry is read with instant queries evaluated at the end of the
//! requested window. The adapter renders the structured queries handed in
//! by the engine to PromQL (see [`crate::promql`]) and tags every returned
//! series with the synthetic `metric` label.
//!
//! ## Endpoints Used
//!
//! - `GET /api/v1/query`: metric and peer queries
//! - `GET /api/v1/label/<name>/values`: catalog lookups
//! - `GET /api/v1/status/buildinfo`: health check
//!
//! ## Example
//!
//! ```rust,no_run
//! use meshgraph_adapters::prometheus::PrometheusSource;
//! use meshgraph_engine::SampleSource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = PrometheusSource::builder()
//!         .endpoint("http://prometheus.istio-system:9090")
//!         .token("secret")
//!         .build();
//!
//!     source.check_health().await?;
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use meshgraph_engine::{SampleSource, SourceError};
use meshgraph_types::{
    labels, LabelValuesQuery, MetricQuery, PeerQuery, Sample, TimeRange,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::promql;
use crate::AdapterError;

/// How requests to Prometheus are authenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Auth {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    /// Bearer token.
    Token(String),
}

/// Prometheus-backed sample source.
#[derive(Debug, Clone)]
pub struct PrometheusSource {
    client: Client,
    endpoint: String,
    auth: Auth,
    description: String,
}

impl PrometheusSource {
    /// Create a new builder for configuring the source.
    pub fn builder() -> PrometheusSourceBuilder {
        PrometheusSourceBuilder::default()
    }

    /// Base URL of the Prometheus server.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run an instant query evaluated at `time_ms`.
    pub async fn query(&self, query: &str, time_ms: u64) -> Result<Vec<VectorSample>, AdapterError> {
        let url = format!("{}/api/v1/query", self.endpoint);
        let time = format_seconds(time_ms);
        let request = self
            .client
            .get(&url)
            .query(&[("query", query), ("time", time.as_str())]);

        let data: QueryData = self.send(request).await?;
        if data.result_type != "vector" {
            return Err(AdapterError::Unsupported(format!(
                "expected a vector result, got {}",
                data.result_type
            )));
        }
        Ok(data.result)
    }

    /// List the values of a label over a time range.
    pub async fn label_values_matching(
        &self,
        label: &str,
        matches: &[String],
        range: &TimeRange,
    ) -> Result<Vec<String>, AdapterError> {
        let url = format!("{}/api/v1/label/{}/values", self.endpoint, label);
        let mut params: Vec<(&str, String)> = matches
            .iter()
            .map(|m| ("match[]", m.clone()))
            .collect();
        params.push(("start", format_seconds(range.from_ms)));
        params.push(("end", format_seconds(range.to_ms)));

        self.send(self.client.get(&url).query(&params)).await
    }

    /// Fetch the server's build information.
    pub async fn build_info(&self) -> Result<BuildInfo, AdapterError> {
        let url = format!("{}/api/v1/status/buildinfo", self.endpoint);
        self.send(self.client.get(&url)).await
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::None => request,
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
            Auth::Token(token) => request.bearer_auth(token),
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AdapterError> {
        let response = self.authenticate(request).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AdapterError::Auth(format!("API returned status {}", status)));
        }

        // Prometheus reports query errors in the body with a 4xx/5xx status.
        let body = response.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                AdapterError::Parse(e.to_string())
            } else {
                AdapterError::Http(format!("API returned status {}", status))
            }
        })?;
        envelope.into_result()
    }
}

#[async_trait]
impl SampleSource for PrometheusSource {
    async fn fetch_samples(
        &self,
        query: &MetricQuery,
        range: &TimeRange,
    ) -> Result<Vec<Sample>, SourceError> {
        let promql = promql::metric_query(query);
        debug!(metric = %query.metric, query = %promql, "Querying Prometheus");

        let series = self.query(&promql, range.to_ms).await?;
        Ok(series
            .into_iter()
            .filter_map(|s| s.into_sample(Some(query.metric.as_str())))
            .collect())
    }

    async fn fetch_peers(
        &self,
        query: &PeerQuery,
        range: &TimeRange,
    ) -> Result<Vec<Sample>, SourceError> {
        let promql = promql::peer_query(query);
        debug!(
            filter = promql::filter_name(query.filter),
            query = %promql,
            "Querying Prometheus for peers"
        );

        let series = self.query(&promql, range.to_ms).await?;
        Ok(series
            .into_iter()
            .filter_map(|s| s.into_sample(None))
            .collect())
    }

    async fn label_values(
        &self,
        query: &LabelValuesQuery,
        range: &TimeRange,
    ) -> Result<Vec<String>, SourceError> {
        let matches = promql::label_matches(query);
        debug!(label = query.label, matches = ?matches, "Fetching label values");
        Ok(self
            .label_values_matching(query.label, &matches, range)
            .await?)
    }

    async fn check_health(&self) -> Result<(), SourceError> {
        let info = self.build_info().await?;
        debug!(version = %info.version, "Prometheus is reachable");
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for PrometheusSource.
#[derive(Debug, Default)]
pub struct PrometheusSourceBuilder {
    endpoint: Option<String>,
    auth: Auth,
    timeout: Option<Duration>,
}

impl PrometheusSourceBuilder {
    /// Set the Prometheus base URL (e.g., "http://localhost:9090").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Authenticate with a username and password.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Auth::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Authenticate with a bearer token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.auth = Auth::Token(token.into());
        self
    }

    /// Set the authentication method directly.
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the source.
    pub fn build(self) -> PrometheusSource {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:9090".to_string())
            .trim_end_matches('/')
            .to_string();

        PrometheusSource {
            client,
            description: format!("prometheus ({})", endpoint),
            endpoint,
            auth: self.auth,
        }
    }
}

// Milliseconds to the fractional seconds Prometheus expects
fn format_seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}

/// Response envelope shared by every Prometheus API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    status: String,
    data: Option<T>,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<T, AdapterError> {
        if self.status != "success" {
            return Err(AdapterError::Query {
                error_type: self.error_type.unwrap_or_else(|| "unknown".to_string()),
                message: self.error.unwrap_or_default(),
            });
        }
        self.data
            .ok_or_else(|| AdapterError::Parse("response has no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryData {
    result_type: String,
    #[serde(default)]
    result: Vec<VectorSample>,
}

/// One series of an instant vector.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorSample {
    pub metric: BTreeMap<String, String>,
    /// `[timestamp, "value"]`.
    pub value: (f64, String),
}

impl VectorSample {
    /// Convert to a sample, tagging it with a metric kind.
    ///
    /// Non-finite values (an empty histogram yields `NaN`) are dropped.
    fn into_sample(self, metric: Option<&str>) -> Option<Sample> {
        let value: f64 = self.value.1.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        let mut labels = self.metric;
        if let Some(metric) = metric {
            labels.insert(labels::METRIC.to_string(), metric.to_string());
        }
        Some(Sample::new(value, labels))
    }
}

/// Subset of `/api/v1/status/buildinfo`.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildInfo {
    pub version: String,
    #[serde(default)]
    pub revision: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshgraph_types::MetricKind;

    #[test]
    fn test_builder_defaults() {
        let source = PrometheusSource::builder().build();
        assert_eq!(source.endpoint, "http://localhost:9090");
        assert_eq!(source.auth, Auth::None);
        assert_eq!(source.description(), "prometheus (http://localhost:9090)");
    }

    #[test]
    fn test_builder_custom() {
        let source = PrometheusSource::builder()
            .endpoint("http://prom.local:9090/")
            .credentials("admin", "secret")
            .timeout(Duration::from_secs(3))
            .build();

        assert_eq!(source.endpoint, "http://prom.local:9090");
        assert_eq!(
            source.auth,
            Auth::Basic {
                username: "admin".to_string(),
                password: "secret".to_string()
            }
        );
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(1_700_000_000_123), "1700000000.123");
        assert_eq!(format_seconds(5), "0.005");
    }

    #[test]
    fn test_parse_vector_response() {
        let body = r#"{
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {"metric": {"source_workload": "web", "response_code": "200"}, "value": [1700000000.5, "12.5"]},
                    {"metric": {"source_workload": "cron"}, "value": [1700000000.5, "NaN"]}
                ]
            }
        }"#;

        let envelope: Envelope<QueryData> = serde_json::from_str(body).unwrap();
        let data = envelope.into_result().unwrap();
        assert_eq!(data.result_type, "vector");

        let samples: Vec<Sample> = data
            .result
            .into_iter()
            .filter_map(|s| s.into_sample(Some(MetricKind::HttpRequests.as_str())))
            .collect();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 12.5);
        assert_eq!(samples[0].metric(), Some(MetricKind::HttpRequests));
        assert_eq!(samples[0].label(labels::SOURCE_WORKLOAD), "web");
    }

    #[test]
    fn test_parse_error_response() {
        let body = r#"{"status": "error", "errorType": "bad_data", "error": "parse error"}"#;
        let envelope: Envelope<QueryData> = serde_json::from_str(body).unwrap();
        match envelope.into_result() {
            Err(AdapterError::Query {
                error_type,
                message,
            }) => {
                assert_eq!(error_type, "bad_data");
                assert_eq!(message, "parse error");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_parse_label_values() {
        let body = r#"{"status": "success", "data": ["bookinfo", "istio-system"]}"#;
        let envelope: Envelope<Vec<String>> = serde_json::from_str(body).unwrap();
        assert_eq!(
            envelope.into_result().unwrap(),
            vec!["bookinfo", "istio-system"]
        );
    }

    #[test]
    fn test_parse_build_info() {
        let body = r#"{"status": "success", "data": {"version": "2.53.0", "revision": "abc", "branch": "HEAD"}}"#;
        let envelope: Envelope<BuildInfo> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.into_result().unwrap().version, "2.53.0");
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let source = PrometheusSource::builder()
            .endpoint("http://127.0.0.1:1")
            .timeout(Duration::from_millis(500))
            .build();

        let err = source.check_health().await.unwrap_err();
        assert!(matches!(
            err.kind(),
            meshgraph_engine::SourceErrorKind::Connection | meshgraph_engine::SourceErrorKind::Timeout
        ));
    }
}

//! Raw samples returned by a time-series backend.

use std::collections::BTreeMap;

use crate::MetricKind;

/// Label names the engine reads from samples.
///
/// These mirror Istio's standard metric labels. The `metric` label is
/// synthetic: sample sources attach it so samples remember which query
/// produced them.
pub mod labels {
    /// Synthetic label carrying the [`MetricKind`](crate::MetricKind) wire name.
    pub const METRIC: &str = "metric";
    pub const SOURCE_WORKLOAD: &str = "source_workload";
    pub const SOURCE_WORKLOAD_NAMESPACE: &str = "source_workload_namespace";
    pub const SOURCE_APP: &str = "source_app";
    pub const DESTINATION_WORKLOAD: &str = "destination_workload";
    pub const DESTINATION_WORKLOAD_NAMESPACE: &str = "destination_workload_namespace";
    pub const DESTINATION_APP: &str = "destination_app";
    /// Fully qualified service name, e.g. `api.shop.svc.cluster.local`.
    pub const DESTINATION_SERVICE: &str = "destination_service";
    pub const DESTINATION_SERVICE_NAME: &str = "destination_service_name";
    pub const DESTINATION_SERVICE_NAMESPACE: &str = "destination_service_namespace";
    pub const RESPONSE_CODE: &str = "response_code";
    pub const GRPC_RESPONSE_STATUS: &str = "grpc_response_status";
}

/// Label set of a sample. Ordered so equality and hashing ignore insertion order.
pub type Labels = BTreeMap<String, String>;

/// A single time-series sample: a value plus its label set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Sample value (request count, byte count or duration in ms).
    pub value: f64,
    /// Label name to label value.
    #[cfg_attr(feature = "serde", serde(default))]
    pub labels: Labels,
}

impl Sample {
    /// Create a sample from a value and labels.
    pub fn new(value: f64, labels: Labels) -> Self {
        Self { value, labels }
    }

    /// Start building a sample tagged with the given metric kind.
    pub fn builder(metric: MetricKind, value: f64) -> SampleBuilder {
        SampleBuilder::new(value).label(labels::METRIC, metric.as_str())
    }

    /// Label value, or the empty string when the label is absent.
    pub fn label(&self, name: &str) -> &str {
        self.labels.get(name).map(String::as_str).unwrap_or("")
    }

    /// The metric kind from the synthetic `metric` label, if recognised.
    pub fn metric(&self) -> Option<MetricKind> {
        self.labels.get(labels::METRIC)?.parse().ok()
    }

    /// `"<namespace>/<workload>"` of the sample's source.
    pub fn source_identity(&self) -> String {
        format!(
            "{}/{}",
            self.label(labels::SOURCE_WORKLOAD_NAMESPACE),
            self.label(labels::SOURCE_WORKLOAD)
        )
    }

    /// `"<namespace>/<workload>"` of the sample's destination.
    pub fn destination_identity(&self) -> String {
        format!(
            "{}/{}",
            self.label(labels::DESTINATION_WORKLOAD_NAMESPACE),
            self.label(labels::DESTINATION_WORKLOAD)
        )
    }
}

/// Builder for [`Sample`].
#[derive(Debug, Default)]
pub struct SampleBuilder {
    value: f64,
    labels: Labels,
}

impl SampleBuilder {
    /// Create a builder with the given value and no labels.
    pub fn new(value: f64) -> Self {
        Self {
            value,
            labels: Labels::new(),
        }
    }

    /// Set a label.
    pub fn label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), value.into());
        self
    }

    /// Set source workload and namespace.
    pub fn source(self, workload: &str, namespace: &str) -> Self {
        self.label(labels::SOURCE_WORKLOAD, workload)
            .label(labels::SOURCE_WORKLOAD_NAMESPACE, namespace)
    }

    /// Set destination service name and namespace, plus the derived FQDN.
    pub fn service(self, name: &str, namespace: &str) -> Self {
        self.label(labels::DESTINATION_SERVICE_NAME, name)
            .label(labels::DESTINATION_SERVICE_NAMESPACE, namespace)
            .label(
                labels::DESTINATION_SERVICE,
                format!("{}.{}.svc.cluster.local", name, namespace),
            )
    }

    /// Set destination workload and namespace.
    pub fn destination(self, workload: &str, namespace: &str) -> Self {
        self.label(labels::DESTINATION_WORKLOAD, workload)
            .label(labels::DESTINATION_WORKLOAD_NAMESPACE, namespace)
    }

    /// Build the sample.
    pub fn build(self) -> Sample {
        Sample {
            value: self.value,
            labels: self.labels,
        }
    }
}

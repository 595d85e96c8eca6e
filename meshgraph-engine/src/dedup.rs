//! Sample deduplication.
//!
//! The same series is usually fetched twice per metric kind: once by the
//! query where the scope is the destination and once where it is the source.
//! Folding both copies into the graph would double every counter.

use std::collections::HashSet;

use meshgraph_types::Sample;

/// Remove samples whose label set equals that of an earlier sample.
///
/// The first occurrence is kept and relative order is preserved. Values are
/// not compared: two samples with identical labels describe the same series.
pub fn deduplicate(samples: Vec<Sample>) -> Vec<Sample> {
    let mut seen = HashSet::with_capacity(samples.len());
    let mut result = Vec::with_capacity(samples.len());

    for sample in samples {
        if seen.insert(sample.labels.clone()) {
            result.push(sample);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshgraph_types::{labels, MetricKind, SampleBuilder};

    fn http(value: f64, code: &str) -> Sample {
        Sample::builder(MetricKind::HttpRequests, value)
            .source("web", "shop")
            .service("api", "shop")
            .destination("api", "shop")
            .label(labels::RESPONSE_CODE, code)
            .build()
    }

    #[test]
    fn test_keeps_first_occurrence() {
        let samples = vec![http(10.0, "200"), http(99.0, "200"), http(2.0, "503")];
        let result = deduplicate(samples);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].value, 10.0);
        assert_eq!(result[0].label(labels::RESPONSE_CODE), "200");
        assert_eq!(result[1].label(labels::RESPONSE_CODE), "503");
    }

    #[test]
    fn test_is_idempotent() {
        let samples = vec![http(1.0, "200"), http(1.0, "200"), http(1.0, "404")];
        let once = deduplicate(samples);
        let twice = deduplicate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_label_insertion_order_is_irrelevant() {
        let a = SampleBuilder::new(1.0).label("x", "1").label("y", "2").build();
        let b = SampleBuilder::new(1.0).label("y", "2").label("x", "1").build();
        assert_eq!(deduplicate(vec![a, b]).len(), 1);
    }

    #[test]
    fn test_metric_label_distinguishes_series() {
        let sent = Sample::builder(MetricKind::TcpSentBytes, 5.0)
            .source("web", "shop")
            .build();
        let received = Sample::builder(MetricKind::TcpReceivedBytes, 5.0)
            .source("web", "shop")
            .build();
        assert_eq!(deduplicate(vec![sent, received]).len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(deduplicate(Vec::new()).is_empty());
    }
}

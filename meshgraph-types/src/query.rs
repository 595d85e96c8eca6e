//! Structured queries handed to sample sources.
//!
//! These describe *what* to fetch. Turning them into a concrete query
//! language is the sample source's business.

use crate::{labels, MetricKind, TrafficFamily};

/// Which entities a graph is built around.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Scope {
    /// Every entity in the namespace.
    Namespace,
    /// Entities carrying the given `app` label.
    Application(String),
    /// A single workload.
    Workload(String),
}

impl Scope {
    /// Build a scope from optional application/workload selectors.
    ///
    /// Empty strings count as absent. Returns `None` when both are set.
    pub fn from_selectors(application: Option<&str>, workload: Option<&str>) -> Option<Self> {
        let application = application.filter(|a| !a.is_empty());
        let workload = workload.filter(|w| !w.is_empty());
        match (application, workload) {
            (Some(_), Some(_)) => None,
            (Some(app), None) => Some(Scope::Application(app.to_string())),
            (None, Some(workload)) => Some(Scope::Workload(workload.to_string())),
            (None, None) => Some(Scope::Namespace),
        }
    }

    /// Label and value restricting the scoped side of a query, if any.
    pub fn selector(&self, direction: Direction) -> Option<(&'static str, &str)> {
        match (self, direction) {
            (Scope::Namespace, _) => None,
            (Scope::Application(app), Direction::Inbound) => Some((labels::DESTINATION_APP, app)),
            (Scope::Application(app), Direction::Outbound) => Some((labels::SOURCE_APP, app)),
            (Scope::Workload(w), Direction::Inbound) => Some((labels::DESTINATION_WORKLOAD, w)),
            (Scope::Workload(w), Direction::Outbound) => Some((labels::SOURCE_WORKLOAD, w)),
        }
    }
}

/// Which side of the traffic the scoped entities sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Scoped entities are the destination.
    Inbound,
    /// Scoped entities are the source.
    Outbound,
}

impl Direction {
    /// Both directions, inbound first.
    pub const BOTH: [Direction; 2] = [Direction::Inbound, Direction::Outbound];

    /// Namespace label for the scoped side.
    pub fn namespace_label(&self) -> &'static str {
        match self {
            Direction::Inbound => labels::DESTINATION_WORKLOAD_NAMESPACE,
            Direction::Outbound => labels::SOURCE_WORKLOAD_NAMESPACE,
        }
    }

    /// Short name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Absolute query window, in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeRange {
    pub from_ms: u64,
    pub to_ms: u64,
}

impl TimeRange {
    /// Create a time range.
    pub fn new(from_ms: u64, to_ms: u64) -> Self {
        Self { from_ms, to_ms }
    }

    /// The window of the given length ending at `to_ms`.
    pub fn ending_at(to_ms: u64, length_secs: u64) -> Self {
        Self {
            from_ms: to_ms.saturating_sub(length_secs.saturating_mul(1000)),
            to_ms,
        }
    }

    /// Window length in whole seconds, used for all rate normalisation.
    pub fn interval_secs(&self) -> u64 {
        self.to_ms.saturating_sub(self.from_ms) / 1000
    }
}

/// Fetch one metric kind for one direction of a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub metric: MetricKind,
    pub direction: Direction,
    pub namespace: String,
    pub scope: Scope,
    /// Include edges with zero traffic.
    pub idle_edges: bool,
    /// Window length the backend should aggregate over.
    pub interval_secs: u64,
}

/// Which peer identities a filter lookup lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum FilterType {
    /// Workloads sending traffic into the scope.
    Source,
    /// Workloads the scope sends traffic to.
    Destination,
}

impl FilterType {
    /// Direction of the scope relative to the listed peers.
    pub fn scope_direction(&self) -> Direction {
        match self {
            FilterType::Source => Direction::Inbound,
            FilterType::Destination => Direction::Outbound,
        }
    }

    /// Labels holding the peer's namespace and workload.
    pub fn peer_labels(&self) -> (&'static str, &'static str) {
        match self {
            FilterType::Source => (labels::SOURCE_WORKLOAD_NAMESPACE, labels::SOURCE_WORKLOAD),
            FilterType::Destination => (
                labels::DESTINATION_WORKLOAD_NAMESPACE,
                labels::DESTINATION_WORKLOAD,
            ),
        }
    }
}

/// List the workloads on the other side of a scope's traffic.
///
/// Sources answer with one sample per peer carrying the labels from
/// [`FilterType::peer_labels`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerQuery {
    pub family: TrafficFamily,
    pub filter: FilterType,
    pub namespace: String,
    pub scope: Scope,
}

/// List the distinct values of one label across mesh traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelValuesQuery {
    pub label: &'static str,
    /// Restrict to traffic whose scoped side is in this namespace.
    pub namespace: Option<(Direction, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_selectors() {
        assert_eq!(Scope::from_selectors(None, None), Some(Scope::Namespace));
        assert_eq!(
            Scope::from_selectors(Some(""), Some("")),
            Some(Scope::Namespace)
        );
        assert_eq!(
            Scope::from_selectors(Some("shop"), None),
            Some(Scope::Application("shop".to_string()))
        );
        assert_eq!(
            Scope::from_selectors(None, Some("web")),
            Some(Scope::Workload("web".to_string()))
        );
        assert_eq!(Scope::from_selectors(Some("shop"), Some("web")), None);
    }

    #[test]
    fn test_scope_selector() {
        let scope = Scope::Workload("web".to_string());
        assert_eq!(
            scope.selector(Direction::Inbound),
            Some((labels::DESTINATION_WORKLOAD, "web"))
        );
        assert_eq!(
            scope.selector(Direction::Outbound),
            Some((labels::SOURCE_WORKLOAD, "web"))
        );
        assert_eq!(Scope::Namespace.selector(Direction::Inbound), None);
    }

    #[test]
    fn test_interval() {
        let range = TimeRange::new(1_000, 11_500);
        assert_eq!(range.interval_secs(), 10);

        let range = TimeRange::ending_at(900_000, 300);
        assert_eq!(range.from_ms, 600_000);
        assert_eq!(range.interval_secs(), 300);

        assert_eq!(TimeRange::new(5_000, 1_000).interval_secs(), 0);
    }
}

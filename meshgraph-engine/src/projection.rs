//! Stat projection: display strings, dominant protocol and health color.
//!
//! The projector is pure. Thresholds and colors come in through
//! [`ProjectorConfig`]; nothing is read from globals.
//!
//! ## Dominant protocol
//!
//! ```text
//! http requests > grpc requests  ──▶ HTTP   [rate, err%]  [duration, tcp rate]
//! grpc requests > 0              ──▶ gRPC   [rate, err%]  [duration, tcp rate]
//! tcp bytes > 0                  ──▶ TCP    [tcp rate]    []
//! otherwise                      ──▶ idle   []            []
//! ```
//!
//! Workload nodes apply the rule to their server side first and fall back
//! to the client side only when the server side is idle. Service nodes are
//! projected from their server side alone.

use meshgraph_types::TrafficStats;
use serde::{Deserialize, Serialize};

use crate::edges::EdgeRecord;
use crate::format::{
    error_percent, format_bytes, format_duration_ms, format_messages, format_percent, format_rate,
};
use crate::nodes::NodeRecord;

/// Health classification of a graph element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Health {
    /// Error rate at or above the error threshold.
    Critical,
    /// Error rate above the warning threshold.
    Warning,
    /// Request traffic within thresholds.
    Healthy,
    /// Only TCP traffic; thresholds do not apply.
    Tcp,
    /// No traffic at all.
    Idle,
}

/// Error-rate thresholds, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Error rates strictly above this are a warning.
    pub warning: f64,
    /// Error rates at or above this are critical.
    pub error: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning: 0.0,
            error: 5.0,
        }
    }
}

impl Thresholds {
    /// Classify an error rate of request traffic.
    pub fn classify(&self, error_percent: f64) -> Health {
        if error_percent >= self.error {
            Health::Critical
        } else if error_percent > self.warning {
            Health::Warning
        } else {
            Health::Healthy
        }
    }
}

/// Colors per health state, as CSS hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub critical: String,
    pub warning: String,
    pub healthy: String,
    pub tcp: String,
    pub idle: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            critical: "#f2495c".to_string(),
            warning: "#fade2a".to_string(),
            healthy: "#73bf69".to_string(),
            tcp: "#5794f2".to_string(),
            idle: "#ccccdc".to_string(),
        }
    }
}

impl Palette {
    /// Color for a health state.
    pub fn color(&self, health: Health) -> &str {
        match health {
            Health::Critical => &self.critical,
            Health::Warning => &self.warning,
            Health::Healthy => &self.healthy,
            Health::Tcp => &self.tcp,
            Health::Idle => &self.idle,
        }
    }
}

/// Everything the projector needs to know.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    pub thresholds: Thresholds,
    pub palette: Palette,
}

/// Protocol whose figures a graph element surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominant {
    Http,
    Grpc,
    Tcp,
    Idle,
}

impl Dominant {
    /// Pick the protocol to surface for a block of counters.
    pub fn of(stats: &TrafficStats) -> Self {
        if stats.http_requests() > stats.grpc_requests() {
            Dominant::Http
        } else if stats.grpc_requests() > 0.0 {
            Dominant::Grpc
        } else if stats.tcp_bytes() > 0.0 {
            Dominant::Tcp
        } else {
            Dominant::Idle
        }
    }
}

/// Latencies attached to a block of counters, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Durations {
    pub grpc: f64,
    pub http: f64,
}

/// Main/secondary stats and health for one block of counters.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub dominant: Dominant,
    pub main_stat: Vec<String>,
    pub secondary_stat: Vec<String>,
    pub health: Health,
}

/// Per-kind detail values.
///
/// Edges and service nodes carry one value per column; workload nodes carry
/// a server value followed by a client value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Details {
    pub grpc_rate: Vec<String>,
    pub grpc_error: Vec<String>,
    pub grpc_duration: Vec<String>,
    pub grpc_sent_messages: Vec<String>,
    pub grpc_received_messages: Vec<String>,
    pub http_rate: Vec<String>,
    pub http_error: Vec<String>,
    pub http_duration: Vec<String>,
    pub tcp_sent_bytes: Vec<String>,
    pub tcp_received_bytes: Vec<String>,
}

impl Details {
    fn of(stats: &TrafficStats, durations: Durations, interval: f64) -> Self {
        Self {
            grpc_rate: vec![format_rate(stats.grpc_requests(), interval)],
            grpc_error: vec![format_percent(error_percent(
                stats.grpc_requests_error,
                stats.grpc_requests(),
            ))],
            grpc_duration: vec![format_duration_ms(durations.grpc)],
            grpc_sent_messages: vec![format_messages(stats.grpc_sent_messages, interval)],
            grpc_received_messages: vec![format_messages(stats.grpc_received_messages, interval)],
            http_rate: vec![format_rate(stats.http_requests(), interval)],
            http_error: vec![format_percent(error_percent(
                stats.http_requests_error,
                stats.http_requests(),
            ))],
            http_duration: vec![format_duration_ms(durations.http)],
            tcp_sent_bytes: vec![format_bytes(stats.tcp_sent_bytes, interval)],
            tcp_received_bytes: vec![format_bytes(stats.tcp_received_bytes, interval)],
        }
    }

    fn followed_by(mut self, other: Details) -> Self {
        self.grpc_rate.extend(other.grpc_rate);
        self.grpc_error.extend(other.grpc_error);
        self.grpc_duration.extend(other.grpc_duration);
        self.grpc_sent_messages.extend(other.grpc_sent_messages);
        self.grpc_received_messages.extend(other.grpc_received_messages);
        self.http_rate.extend(other.http_rate);
        self.http_error.extend(other.http_error);
        self.http_duration.extend(other.http_duration);
        self.tcp_sent_bytes.extend(other.tcp_sent_bytes);
        self.tcp_received_bytes.extend(other.tcp_received_bytes);
        self
    }
}

/// Derived display record for an edge or a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub main_stat: Vec<String>,
    pub secondary_stat: Vec<String>,
    pub health: Health,
    pub color: String,
    pub details: Details,
}

/// Turns counters into display records.
#[derive(Debug, Clone, Default)]
pub struct Projector {
    config: ProjectorConfig,
}

impl Projector {
    /// Create a projector.
    pub fn new(config: ProjectorConfig) -> Self {
        Self { config }
    }

    /// The projector's configuration.
    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    /// Apply the dominant-protocol rule to one block of counters.
    pub fn summarize(&self, stats: &TrafficStats, durations: Durations, interval: f64) -> Summary {
        let dominant = Dominant::of(stats);
        let tcp_bytes = stats.tcp_bytes();

        let (requests, errors, duration) = match dominant {
            Dominant::Http => (
                stats.http_requests(),
                stats.http_requests_error,
                durations.http,
            ),
            Dominant::Grpc => (
                stats.grpc_requests(),
                stats.grpc_requests_error,
                durations.grpc,
            ),
            Dominant::Tcp => {
                return Summary {
                    dominant,
                    main_stat: vec![format_bytes(tcp_bytes, interval)],
                    secondary_stat: Vec::new(),
                    health: Health::Tcp,
                };
            }
            Dominant::Idle => {
                return Summary {
                    dominant,
                    main_stat: Vec::new(),
                    secondary_stat: Vec::new(),
                    health: Health::Idle,
                };
            }
        };

        let percent = error_percent(errors, requests);

        let mut main_stat = vec![format_rate(requests, interval)];
        if percent > 0.0 {
            main_stat.push(format_percent(percent));
        }

        let mut secondary_stat = Vec::new();
        if duration > 0.0 {
            secondary_stat.push(format_duration_ms(duration));
        }
        if tcp_bytes > 0.0 {
            secondary_stat.push(format_bytes(tcp_bytes, interval));
        }

        Summary {
            dominant,
            main_stat,
            secondary_stat,
            health: self.config.thresholds.classify(percent),
        }
    }

    /// Project an edge over a window of `interval` seconds.
    pub fn project_edge(&self, edge: &EdgeRecord, interval: f64) -> Projection {
        let durations = Durations {
            grpc: edge.grpc_duration.value(),
            http: edge.http_duration.value(),
        };
        self.project_side(&edge.stats, durations, interval)
    }

    /// Project a node over a window of `interval` seconds.
    pub fn project_node(&self, node: &NodeRecord, interval: f64) -> Projection {
        if node.id.is_service() {
            return self.project_side(&node.server, Durations::default(), interval);
        }

        let server = self.summarize(&node.server, Durations::default(), interval);
        let summary = if server.dominant == Dominant::Idle {
            self.summarize(&node.client, Durations::default(), interval)
        } else {
            server
        };

        let details = Details::of(&node.server, Durations::default(), interval).followed_by(
            Details::of(&node.client, Durations::default(), interval),
        );

        self.finish(summary, details)
    }

    fn project_side(&self, stats: &TrafficStats, durations: Durations, interval: f64) -> Projection {
        let summary = self.summarize(stats, durations, interval);
        let details = Details::of(stats, durations, interval);
        self.finish(summary, details)
    }

    fn finish(&self, summary: Summary, details: Details) -> Projection {
        Projection {
            color: self.config.palette.color(summary.health).to_string(),
            main_stat: summary.main_stat,
            secondary_stat: summary.secondary_stat,
            health: summary.health,
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::DurationMerge;
    use meshgraph_types::{EdgeKey, EntityId};

    fn projector(warning: f64, error: f64) -> Projector {
        Projector::new(ProjectorConfig {
            thresholds: Thresholds { warning, error },
            palette: Palette::default(),
        })
    }

    fn http_stats(success: f64, errors: f64) -> TrafficStats {
        let mut stats = TrafficStats::new();
        stats.record_http("200", success);
        stats.record_http("500", errors);
        stats
    }

    fn to_service_edge(stats: TrafficStats) -> EdgeRecord {
        let mut edge = EdgeRecord::new(
            EdgeKey::new(
                EntityId::workload("web", "shop"),
                EntityId::service("api", "shop"),
            ),
            "api.shop.svc.cluster.local",
        );
        edge.stats = stats;
        edge
    }

    #[test]
    fn test_http_dominates_when_larger() {
        let mut stats = http_stats(100.0, 0.0);
        stats.record_grpc("0", 50.0);

        let summary = projector(1.0, 5.0).summarize(&stats, Durations::default(), 10.0);
        assert_eq!(summary.dominant, Dominant::Http);
        assert_eq!(summary.main_stat, vec!["10.00rps"]);
    }

    #[test]
    fn test_grpc_dominates_when_swapped() {
        let mut stats = http_stats(50.0, 0.0);
        stats.record_grpc("0", 100.0);

        let summary = projector(1.0, 5.0).summarize(&stats, Durations::default(), 10.0);
        assert_eq!(summary.dominant, Dominant::Grpc);
        assert_eq!(summary.main_stat, vec!["10.00rps"]);
    }

    #[test]
    fn test_equal_volumes_pick_grpc() {
        let mut stats = http_stats(10.0, 0.0);
        stats.record_grpc("0", 10.0);
        assert_eq!(Dominant::of(&stats), Dominant::Grpc);
    }

    #[test]
    fn test_color_thresholds() {
        let p = projector(1.0, 5.0);
        let cases = [
            (100.0, 0.0, Health::Healthy),
            (98.0, 2.0, Health::Warning),
            (94.0, 6.0, Health::Critical),
            (95.0, 5.0, Health::Critical),
            (99.0, 1.0, Health::Healthy),
        ];
        for (success, errors, expected) in cases {
            let summary = p.summarize(&http_stats(success, errors), Durations::default(), 1.0);
            assert_eq!(summary.health, expected, "{errors} errors of {}", success + errors);
        }
    }

    #[test]
    fn test_tcp_only_ignores_thresholds() {
        let mut stats = TrafficStats::new();
        stats.tcp_received_bytes = 2048.0;

        let p = projector(0.0, 0.0);
        let summary = p.summarize(&stats, Durations::default(), 2.0);
        assert_eq!(summary.dominant, Dominant::Tcp);
        assert_eq!(summary.health, Health::Tcp);
        assert_eq!(summary.main_stat, vec!["1024.00bps"]);
        assert!(summary.secondary_stat.is_empty());
    }

    #[test]
    fn test_no_traffic_is_idle() {
        let projection =
            projector(1.0, 5.0).project_edge(&to_service_edge(TrafficStats::new()), 60.0);
        assert_eq!(projection.health, Health::Idle);
        assert_eq!(projection.color, "#ccccdc");
        assert!(projection.main_stat.is_empty());
        assert!(projection.secondary_stat.is_empty());
    }

    #[test]
    fn test_edge_secondary_stats() {
        let mut stats = http_stats(10.0, 0.0);
        stats.tcp_sent_bytes = 100.0;
        let mut edge = to_service_edge(stats);
        edge.http_duration.record(25.0, DurationMerge::Last);

        let projection = projector(1.0, 5.0).project_edge(&edge, 10.0);
        assert_eq!(projection.main_stat, vec!["1.00rps"]);
        assert_eq!(projection.secondary_stat, vec!["25.00ms", "10.00bps"]);
        assert_eq!(projection.color, "#73bf69");
        assert_eq!(projection.details.http_duration, vec!["25.00ms"]);
        assert_eq!(projection.details.grpc_duration, vec!["-"]);
    }

    #[test]
    fn test_error_rate_in_main_stat() {
        let projection = projector(1.0, 20.0).project_edge(&to_service_edge(http_stats(10.0, 2.0)), 10.0);
        assert_eq!(projection.main_stat, vec!["1.20rps", "16.67%"]);
        assert_eq!(projection.health, Health::Warning);
        assert_eq!(projection.details.http_error, vec!["16.67%"]);

        let projection = projector(1.0, 10.0).project_edge(&to_service_edge(http_stats(10.0, 2.0)), 10.0);
        assert_eq!(projection.health, Health::Critical);
        assert_eq!(projection.color, "#f2495c");
    }

    #[test]
    fn test_workload_node_prefers_server_side() {
        let mut node = NodeRecord::new(EntityId::workload("api-v1", "shop"));
        node.server = http_stats(100.0, 0.0);
        node.client = http_stats(0.0, 50.0);

        let projection = projector(1.0, 5.0).project_node(&node, 10.0);
        assert_eq!(projection.health, Health::Healthy);
        assert_eq!(projection.main_stat, vec!["10.00rps"]);
        assert_eq!(projection.details.http_rate, vec!["10.00rps", "5.00rps"]);
        assert_eq!(projection.details.http_error, vec!["0.00%", "100.00%"]);
    }

    #[test]
    fn test_workload_node_falls_back_to_client_side() {
        let mut node = NodeRecord::new(EntityId::workload("web", "shop"));
        node.client = http_stats(0.0, 50.0);

        let projection = projector(1.0, 5.0).project_node(&node, 10.0);
        assert_eq!(projection.health, Health::Critical);
        assert_eq!(projection.main_stat, vec!["5.00rps", "100.00%"]);
    }

    #[test]
    fn test_server_tcp_beats_client_requests() {
        let mut node = NodeRecord::new(EntityId::workload("db", "data"));
        node.server.tcp_received_bytes = 10.0;
        node.client = http_stats(0.0, 50.0);

        let projection = projector(1.0, 5.0).project_node(&node, 10.0);
        assert_eq!(projection.health, Health::Tcp);
        assert_eq!(projection.main_stat, vec!["1.00bps"]);
    }

    #[test]
    fn test_service_node_ignores_client_side() {
        let mut node = NodeRecord::new(EntityId::service("api", "shop"));
        node.client = http_stats(100.0, 0.0);

        let projection = projector(1.0, 5.0).project_node(&node, 10.0);
        assert_eq!(projection.health, Health::Idle);
        assert_eq!(projection.details.http_rate, vec!["0.00rps"]);
    }
}

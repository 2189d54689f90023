//! Query surface (spec §4.7): the read-only API an external host process
//! polls to enumerate, describe, and fetch metric values. Consumes the
//! [`Registry`] and [`Stats`] directly under their own locks; this module
//! adds no locking of its own beyond what those two already provide.

use crate::config::Config;
use crate::registry::{DurationStat, Registry};
use crate::stats::Stats;
use crate::wire::Kind;

/// Cluster holding the agent's own self-metrics (spec §4.7, §6).
pub const SELF_METRIC_CLUSTER: u64 = 0;

/// Number of fixed self-metric ids (0..=13, spec §6).
pub const SELF_METRIC_COUNT: u64 = 14;

fn self_opaque_id(item: u64) -> u64 {
    (SELF_METRIC_CLUSTER << 32) | item
}

const SELF_METRIC_NAMES: [&str; 14] = [
    "pmda.received",
    "pmda.parsed",
    "pmda.dropped",
    "pmda.aggregated",
    "pmda.metrics_tracked",
    "pmda.time_spent_parsing",
    "pmda.time_spent_aggregating",
    "pmda.settings.max_udp_packet_size",
    "pmda.settings.max_unprocessed_packets",
    "pmda.settings.verbose",
    "pmda.settings.debug_output_filename",
    "pmda.settings.port",
    "pmda.settings.parser_type",
    "pmda.settings.duration_aggregation_type",
];

/// One committed metric or self-metric's identity, as returned by
/// [`Query::enumerate`] and [`Query::describe`].
#[derive(Debug, Clone)]
pub struct MetricDescriptor {
    /// Stable opaque id (cluster+item encoded).
    pub opaque_id: u64,
    /// Metric name.
    pub name: String,
    /// Metric kind.
    pub kind: Kind,
    /// Instance family id (see [`Query::enumerate_instances`]).
    pub instance_family_id: u64,
}

/// One instance within a metric's instance family.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Instance id, stable within the family.
    pub instance_id: u64,
    /// Human-readable label: a duration statistic suffix, a tag canonical
    /// string, or `"default"` for an untagged root value.
    pub label: String,
}

/// A value read back from [`Query::fetch`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchValue {
    /// A numeric reading (counter/gauge totals, duration statistics,
    /// self-metric counters).
    Scalar(f64),
    /// A textual reading (string-valued settings).
    Text(String),
}

/// The Query surface (spec §4.7): borrows the registry, stats and config
/// it reads from; holds no state of its own.
pub struct Query<'a> {
    registry: &'a Registry,
    stats: &'a Stats,
    config: &'a Config,
}

impl<'a> Query<'a> {
    /// Builds a Query surface over the given registry, stats and config.
    #[must_use]
    pub const fn new(registry: &'a Registry, stats: &'a Stats, config: &'a Config) -> Self {
        Self {
            registry,
            stats,
            config,
        }
    }

    /// Current registry generation (spec §4.7 `snapshot_generation`).
    #[must_use]
    pub fn snapshot_generation(&self) -> u64 {
        self.registry.snapshot_generation()
    }

    /// Every committed user metric plus the fourteen self-metric ids
    /// (spec §4.7 `enumerate`).
    #[must_use]
    pub fn enumerate(&self) -> Vec<MetricDescriptor> {
        let mut out: Vec<MetricDescriptor> = (0..SELF_METRIC_COUNT)
            .map(|item| MetricDescriptor {
                opaque_id: self_opaque_id(item),
                name: SELF_METRIC_NAMES[item as usize].to_string(),
                kind: self_metric_kind(item),
                instance_family_id: self_opaque_id(item),
            })
            .collect();

        for (name, info) in self.registry.enumerate() {
            out.push(MetricDescriptor {
                opaque_id: info.opaque_id,
                name,
                kind: info.kind,
                instance_family_id: info.instance_family_id,
            });
        }
        out
    }

    /// Resolves one metric by name, user or self (spec §4.7 `describe`).
    #[must_use]
    pub fn describe(&self, name: &str) -> Option<MetricDescriptor> {
        if let Some(item) = SELF_METRIC_NAMES.iter().position(|n| *n == name) {
            let item = item as u64;
            return Some(MetricDescriptor {
                opaque_id: self_opaque_id(item),
                name: name.to_string(),
                kind: self_metric_kind(item),
                instance_family_id: self_opaque_id(item),
            });
        }
        let info = self.registry.describe(name)?;
        Some(MetricDescriptor {
            opaque_id: info.opaque_id,
            name: name.to_string(),
            kind: info.kind,
            instance_family_id: info.instance_family_id,
        })
    }

    /// Lists the instances within `name`'s family (spec §4.7
    /// `enumerate_instances`): the nine duration-statistic suffixes for a
    /// Duration metric, or one `"default"` instance plus one per Label
    /// for Counter/Gauge metrics. `metrics_tracked` exposes four named
    /// instances (counter, gauge, duration, total).
    #[must_use]
    pub fn enumerate_instances(&self, name: &str) -> Vec<Instance> {
        if name == "pmda.metrics_tracked" {
            return ["counter", "gauge", "duration", "total"]
                .iter()
                .enumerate()
                .map(|(i, label)| Instance {
                    instance_id: i as u64,
                    label: (*label).to_string(),
                })
                .collect();
        }
        if SELF_METRIC_NAMES.contains(&name) {
            return vec![Instance {
                instance_id: 0,
                label: "default".to_string(),
            }];
        }

        let Some(info) = self.registry.describe(name) else {
            return Vec::new();
        };

        if info.kind == Kind::Duration {
            return DurationStat::ALL
                .iter()
                .enumerate()
                .map(|(i, stat)| Instance {
                    instance_id: i as u64,
                    label: stat.label().to_string(),
                })
                .collect();
        }

        let mut instances = Vec::new();
        let mut next_id = 0_u64;
        if info.has_root {
            instances.push(Instance {
                instance_id: next_id,
                label: "default".to_string(),
            });
            next_id += 1;
        }
        for tags in self.registry.child_tags(name) {
            instances.push(Instance {
                instance_id: next_id,
                label: tags.to_string(),
            });
            next_id += 1;
        }
        instances
    }

    /// Reads one scalar or text value (spec §4.7 `fetch`).
    ///
    /// `instance_label` selects which instance within the metric's family
    /// to read: a duration-statistic suffix, a tag canonical string, or
    /// `"default"`/`None` for the root value.
    #[must_use]
    pub fn fetch(&self, name: &str, instance_label: Option<&str>) -> Option<FetchValue> {
        if let Some(v) = self.fetch_self_metric(name, instance_label) {
            return Some(v);
        }

        let info = self.registry.describe(name)?;
        let stat = instance_label
            .and_then(|l| DurationStat::ALL.iter().find(|s| s.label() == l))
            .copied()
            .unwrap_or(DurationStat::Count);

        let tags = instance_label.filter(|l| *l != "default" && info.kind != Kind::Duration);
        self.registry.fetch(name, tags, stat).map(FetchValue::Scalar)
    }

    fn fetch_self_metric(&self, name: &str, instance_label: Option<&str>) -> Option<FetchValue> {
        let snap = self.stats.snapshot();
        match name {
            "pmda.received" => Some(FetchValue::Scalar(snap.received as f64)),
            "pmda.parsed" => Some(FetchValue::Scalar(snap.parsed as f64)),
            "pmda.dropped" => Some(FetchValue::Scalar(snap.dropped as f64)),
            "pmda.aggregated" => Some(FetchValue::Scalar(snap.aggregated as f64)),
            "pmda.time_spent_parsing" => Some(FetchValue::Scalar(snap.time_spent_parsing_ns as f64)),
            "pmda.time_spent_aggregating" => {
                Some(FetchValue::Scalar(snap.time_spent_aggregating_ns as f64))
            }
            "pmda.metrics_tracked" => Some(FetchValue::Scalar(match instance_label {
                Some("counter") => snap.tracked.counters as f64,
                Some("gauge") => snap.tracked.gauges as f64,
                Some("duration") => snap.tracked.durations as f64,
                _ => snap.tracked.total() as f64,
            })),
            "pmda.settings.max_udp_packet_size" => {
                Some(FetchValue::Scalar(f64::from(self.config.max_udp_packet_size)))
            }
            "pmda.settings.max_unprocessed_packets" => {
                Some(FetchValue::Scalar(self.config.max_unprocessed_packets as f64))
            }
            "pmda.settings.verbose" => Some(FetchValue::Scalar(f64::from(self.config.verbose))),
            "pmda.settings.debug_output_filename" => {
                Some(FetchValue::Text(self.config.debug_output_filename.clone()))
            }
            "pmda.settings.port" => Some(FetchValue::Scalar(f64::from(self.config.port))),
            "pmda.settings.parser_type" => Some(FetchValue::Scalar(match self.config.parser_kind {
                crate::config::ParserKind::StateMachine => 0.0,
                crate::config::ParserKind::Table => 1.0,
            })),
            "pmda.settings.duration_aggregation_type" => {
                Some(FetchValue::Scalar(match self.config.duration_aggregation {
                    crate::config::DurationAggregationKind::Exact => 0.0,
                    crate::config::DurationAggregationKind::Hdr => 1.0,
                }))
            }
            _ => None,
        }
    }
}

fn self_metric_kind(item: u64) -> Kind {
    // Self-metrics are all simple read-only counters from Query's point
    // of view; there is no Gauge/Duration self-metric.
    let _ = item;
    Kind::Counter
}

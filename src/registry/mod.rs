//! The concurrent metric registry (spec §4.4): one mutex guards the whole
//! map, every Metric's children map, and all per-metric value state, so
//! that I1 (atomic mutation) and I2 (monotonic generation) hold without
//! needing a lock-free or sharded structure. The teacher's `DashMap`-based
//! sharded aggregator assumed many independent writers and no shared
//! generation counter; this spec's single-consumer aggregator and
//! poll-based Query surface need neither, so a plain map behind one
//! `Mutex` is both simpler and correct here.

pub mod duration;
pub mod metric;
pub mod value;

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::config::DurationAggregationKind;
use crate::wire::{is_blocked, Kind, Sample, Sign};

pub use metric::{Label, Metric};
pub use value::{DurationStat, Value};

/// Per-line rejection reasons that originate inside the registry (spec
/// §4.8). Distinct from [`crate::wire::RejectReason`], which covers
/// grammar failures before a sample ever reaches here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitReject {
    /// `sample.name` is in the reserved block-list.
    Blocked,
    /// The value engine rejected the write (e.g. a negative counter delta).
    BadValue,
    /// `sample.name` exists with a different `kind`.
    KindMismatch,
}

/// A read-only view of one committed metric, for Query.
#[derive(Debug, Clone, Copy)]
pub struct MetricInfo {
    /// Stable opaque id.
    pub opaque_id: u64,
    /// Family id used by `enumerate_instances`.
    pub instance_family_id: u64,
    /// Metric kind.
    pub kind: Kind,
    /// True if the metric has a tag-less root value.
    pub has_root: bool,
    /// Number of labelled children.
    pub children_len: usize,
}

struct RegistryInner {
    metrics: BTreeMap<String, Metric>,
    generation: u64,
    next_item: u64,
}

/// Cluster assigned to user-created metrics; self-metrics live in cluster
/// 0 (spec §4.7).
pub const USER_METRIC_CLUSTER: u64 = 1;

fn make_opaque_id(cluster: u64, item: u64) -> u64 {
    (cluster << 32) | item
}

/// The Registry (spec §3, §4.4): a name-keyed map of metrics behind one
/// lock, plus a strictly-increasing generation counter.
pub struct Registry {
    inner: Mutex<RegistryInner>,
    duration_kind: DurationAggregationKind,
}

impl Registry {
    /// Creates an empty registry using `duration_kind` for every Duration
    /// metric created from now on.
    #[must_use]
    pub fn new(duration_kind: DurationAggregationKind) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                metrics: BTreeMap::new(),
                generation: 0,
                next_item: 0,
            }),
            duration_kind,
        }
    }

    /// Current generation (spec §4.7 `snapshot_generation`).
    ///
    /// # Panics
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn snapshot_generation(&self) -> u64 {
        #[allow(clippy::unwrap_used)]
        let guard = self.inner.lock().unwrap();
        guard.generation
    }

    /// Submits one sample (spec §4.4). Acquires the registry lock for the
    /// entire operation, so the case dispatch below is atomic with
    /// respect to every other reader and writer (I1).
    ///
    /// # Panics
    /// Panics if the registry lock is poisoned.
    ///
    /// # Errors
    /// Returns [`SubmitReject`] if the sample is blocked, fails the value
    /// engine's invariant, or disagrees with an existing metric's kind.
    pub fn submit(&self, sample: &Sample) -> Result<(), SubmitReject> {
        if is_blocked(&sample.name) {
            return Err(SubmitReject::Blocked); // Case A
        }

        #[allow(clippy::unwrap_used)]
        let mut guard = self.inner.lock().unwrap();

        if !guard.metrics.contains_key(&sample.name) {
            return Self::submit_new(&mut guard, sample, self.duration_kind); // Cases B, C
        }

        Self::submit_existing(&mut guard, sample, self.duration_kind) // Cases D, E, F
    }

    fn submit_new(
        guard: &mut RegistryInner,
        sample: &Sample,
        duration_kind: DurationAggregationKind,
    ) -> Result<(), SubmitReject> {
        let item = guard.next_item;
        guard.next_item += 1;
        let opaque_id = make_opaque_id(USER_METRIC_CLUSTER, item);
        let mut metric = Metric::new(sample.name.clone(), sample.kind, opaque_id, opaque_id);

        let result = match &sample.tags {
            None => Self::create_root(&mut metric, sample, duration_kind), // Case B
            Some(tags) => {
                Self::label_insert(&mut metric, tags, sample, duration_kind) // Case C
            }
        };

        match result {
            Ok(()) => {
                metric.committed = true;
                guard.generation += 1;
                metric.generation_at_last_mutation = guard.generation;
                guard.metrics.insert(sample.name.clone(), metric);
                Ok(())
            }
            Err(e) => Err(e), // metric is dropped, never inserted
        }
    }

    fn submit_existing(
        guard: &mut RegistryInner,
        sample: &Sample,
        duration_kind: DurationAggregationKind,
    ) -> Result<(), SubmitReject> {
        #[allow(clippy::unwrap_used)]
        let metric = guard.metrics.get_mut(&sample.name).unwrap();
        if metric.kind != sample.kind {
            return Err(SubmitReject::KindMismatch); // Case D
        }

        let result = match &sample.tags {
            None => Self::update_root(metric, sample, duration_kind), // Case E
            Some(tags) => Self::label_insert(metric, tags, sample, duration_kind), // Case F
        };

        result.map(|()| {
            guard.generation += 1;
            metric.generation_at_last_mutation = guard.generation;
        })
    }

    fn create_root(
        metric: &mut Metric,
        sample: &Sample,
        duration_kind: DurationAggregationKind,
    ) -> Result<(), SubmitReject> {
        let mut value = Value::new(sample.kind, duration_kind).map_err(|_| SubmitReject::BadValue)?;
        value
            .apply(sample.value, sample.sign)
            .map_err(|_| SubmitReject::BadValue)?;
        metric.root_value = Some(value);
        Ok(())
    }

    fn update_root(
        metric: &mut Metric,
        sample: &Sample,
        duration_kind: DurationAggregationKind,
    ) -> Result<(), SubmitReject> {
        match &mut metric.root_value {
            Some(value) => value
                .apply(sample.value, sample.sign)
                .map_err(|_| SubmitReject::BadValue),
            None => Self::create_root(metric, sample, duration_kind),
        }
    }

    fn label_insert(
        metric: &mut Metric,
        tags: &std::sync::Arc<str>,
        sample: &Sample,
        duration_kind: DurationAggregationKind,
    ) -> Result<(), SubmitReject> {
        if let Some(label) = metric.children.get_mut(tags) {
            return label
                .value
                .apply(sample.value, sample.sign)
                .map_err(|_| SubmitReject::BadValue);
        }

        let mut value = Value::new(metric.kind, duration_kind).map_err(|_| SubmitReject::BadValue)?;
        value
            .apply(sample.value, sample.sign)
            .map_err(|_| SubmitReject::BadValue)?;

        let pair_count = u32::try_from(tags.matches(':').count()).unwrap_or(u32::MAX);
        metric.children.insert(
            tags.clone(),
            Label {
                tags_canonical: tags.clone(),
                value,
                pair_count,
            },
        );
        Ok(())
    }

    /// Reads metadata for every committed metric (spec §4.7 `enumerate`),
    /// in registry-map order (stable within a generation).
    ///
    /// # Panics
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn enumerate(&self) -> Vec<(String, MetricInfo)> {
        #[allow(clippy::unwrap_used)]
        let guard = self.inner.lock().unwrap();
        guard
            .metrics
            .iter()
            .filter(|(_, m)| m.committed)
            .map(|(name, m)| {
                (
                    name.clone(),
                    MetricInfo {
                        opaque_id: m.opaque_id,
                        instance_family_id: m.instance_family_id,
                        kind: m.kind,
                        has_root: m.root_value.is_some(),
                        children_len: m.children.len(),
                    },
                )
            })
            .collect()
    }

    /// Looks up one committed metric by name.
    ///
    /// # Panics
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn describe(&self, name: &str) -> Option<MetricInfo> {
        #[allow(clippy::unwrap_used)]
        let guard = self.inner.lock().unwrap();
        guard.metrics.get(name).filter(|m| m.committed).map(|m| MetricInfo {
            opaque_id: m.opaque_id,
            instance_family_id: m.instance_family_id,
            kind: m.kind,
            has_root: m.root_value.is_some(),
            children_len: m.children.len(),
        })
    }

    /// Labelled children's canonical tags strings, in map order.
    ///
    /// # Panics
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn child_tags(&self, name: &str) -> Vec<std::sync::Arc<str>> {
        #[allow(clippy::unwrap_used)]
        let guard = self.inner.lock().unwrap();
        guard
            .metrics
            .get(name)
            .map(|m| m.children.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Reads a scalar off a metric's root value, or one of its children
    /// (spec §4.7 `fetch`). `stat` is ignored for Counter/Gauge.
    ///
    /// # Panics
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn fetch(&self, name: &str, tags: Option<&str>, stat: DurationStat) -> Option<f64> {
        #[allow(clippy::unwrap_used)]
        let guard = self.inner.lock().unwrap();
        let metric = guard.metrics.get(name)?;
        match tags {
            None => metric.root_value.as_ref().map(|v| v.read(stat)),
            Some(t) => metric.children.get(t).map(|l| l.value.read(stat)),
        }
    }

    /// Renders every committed metric as the debug-dump text format
    /// (spec §6): one block per metric, separated by a dashed rule.
    ///
    /// # Panics
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn render_debug_dump(&self) -> String {
        #[allow(clippy::unwrap_used)]
        let guard = self.inner.lock().unwrap();
        let mut out = String::new();
        for (name, m) in guard.metrics.iter().filter(|(_, m)| m.committed) {
            out.push_str(&format!("name: {name}\n"));
            out.push_str(&format!("type: {:?}\n", m.kind));
            if let Some(root) = &m.root_value {
                render_value_block(&mut out, root);
            }
            for (tags, label) in &m.children {
                out.push_str(&format!("label: {tags}\n"));
                render_value_block(&mut out, &label.value);
            }
            out.push_str("----------------\n");
        }
        out
    }
}

fn render_value_block(out: &mut String, value: &Value) {
    match value {
        Value::Counter(_) | Value::Gauge(_) => {
            out.push_str(&format!("value: {}\n", value.read(DurationStat::Count)));
        }
        Value::Duration(_) => {
            for stat in DurationStat::ALL {
                out.push_str(&format!("{}: {}\n", stat.label(), value.read(stat)));
            }
        }
    }
}

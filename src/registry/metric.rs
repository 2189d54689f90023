//! `Metric` and `Label`: the long-lived state a [`super::Registry`] holds
//! per metric name (spec §3).

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::wire::Kind;

use super::value::Value;

/// A tag-specialised sibling of a Metric's root value (spec §3).
#[derive(Debug)]
pub struct Label {
    /// Shared with the owning `children` map's key (an `Arc` clone, not a
    /// copy — spec §9's "Label holds a view into the map key", expressed
    /// in safe Rust as a cheap refcount bump).
    pub tags_canonical: Arc<str>,
    /// This label's value, same kind as the parent Metric.
    pub value: Value,
    /// Number of `key=value` pairs the canonical string encodes.
    pub pair_count: u32,
}

/// A named, typed aggregate with an optional root value and zero or more
/// labelled children (spec §3).
#[derive(Debug)]
pub struct Metric {
    /// Metric name; also the registry map's key.
    pub name: String,
    /// Immutable after creation (invariant I3).
    pub kind: Kind,
    /// Stable opaque id for the lifetime of the agent (spec §9).
    pub opaque_id: u64,
    /// Instance family id; may be reissued once children grow from empty
    /// (spec §4.7).
    pub instance_family_id: u64,
    /// Present iff at least one tag-less sample has been admitted.
    pub root_value: Option<Value>,
    /// Canonical-tags-string → Label, empty unless a tagged sample arrived.
    pub children: BTreeMap<Arc<str>, Label>,
    /// False until the first successful value write; invisible to Query
    /// while false.
    pub committed: bool,
    /// Registry generation captured on the metric's most recent mutation.
    pub generation_at_last_mutation: u64,
}

impl Metric {
    /// Creates an uncommitted metric with no root value and no children.
    pub(super) fn new(name: String, kind: Kind, opaque_id: u64, instance_family_id: u64) -> Self {
        Self {
            name,
            kind,
            opaque_id,
            instance_family_id,
            root_value: None,
            children: BTreeMap::new(),
            committed: false,
            generation_at_last_mutation: 0,
        }
    }
}

//! Drives the registry and wire parser together the way the aggregator
//! loop does, checking the P1-P9 invariants as a black box (no access to
//! registry internals beyond its public API).

use statsd_agent::config::DurationAggregationKind;
use statsd_agent::registry::{DurationStat, Registry, SubmitReject};
use statsd_agent::wire::{is_valid_name, LineParser, StateMachineParser, TableParser};

fn parse(line: &str) -> statsd_agent::wire::Sample {
    StateMachineParser::new().parse_line(line).expect("line should parse")
}

#[test]
fn p1_canonical_round_trip_is_stable() {
    // Same tag set, spelled out via the `,k=v` and `|#k:v` grammars
    // respectively; both must canonicalize to the same form.
    let a = parse("foo,tagY=20,tagX=10:10|c");
    let b = parse("foo:10|c|#tagX:10,tagY:20");
    assert_eq!(a.name, b.name);
    assert_eq!(a.tags, b.tags);

    // Re-emitting the hashtag form of the canonical tags and re-parsing
    // yields an equal sample (spec's P1).
    let again = parse("foo:10|c|#tagX:10,tagY:20");
    assert_eq!(b.tags, again.tags);
}

#[test]
fn p2_canonical_tags_independent_of_input_order_and_dedups() {
    let a = parse("m,b=2,a=1:1|c");
    let b = parse("m,a=1,b=2:1|c");
    assert_eq!(a.tags, b.tags);

    let dup = parse("m,a=first,a=second:1|c");
    assert_eq!(dup.tags.unwrap().as_ref(), r#"{"a":"second"}"#);
}

#[test]
fn p3_counter_accumulates_sum_of_magnitudes() {
    let registry = Registry::new(DurationAggregationKind::Exact);
    let magnitudes = [1.0, 2.5, 0.0, 10.0];
    for m in magnitudes {
        registry.submit(&parse(&format!("c:{m}|c"))).unwrap();
    }
    assert_eq!(
        registry.fetch("c", None, DurationStat::Count),
        Some(magnitudes.iter().sum())
    );
}

#[test]
fn p4_gauge_follows_unsigned_then_signed_deltas() {
    let registry = Registry::new(DurationAggregationKind::Exact);
    for line in ["g:1|g", "g:2|g", "g:3|g", "g:+4|g", "g:-1|g"] {
        registry.submit(&parse(line)).unwrap();
    }
    // c=3, then +4, then -1 => 6
    assert_eq!(registry.fetch("g", None, DurationStat::Count), Some(6.0));
}

#[test]
fn p5_duration_stats_are_internally_consistent_for_both_engines() {
    for kind in [DurationAggregationKind::Exact, DurationAggregationKind::Hdr] {
        let registry = Registry::new(kind);
        for v in [100.0, 250.0, 50.0, 400.0, 300.0] {
            registry.submit(&parse(&format!("d:{v}|ms"))).unwrap();
        }
        let min = registry.fetch("d", None, DurationStat::Min).unwrap();
        let median = registry.fetch("d", None, DurationStat::Median).unwrap();
        let max = registry.fetch("d", None, DurationStat::Max).unwrap();
        let p90 = registry.fetch("d", None, DurationStat::P90).unwrap();
        let p95 = registry.fetch("d", None, DurationStat::P95).unwrap();
        let p99 = registry.fetch("d", None, DurationStat::P99).unwrap();
        let stddev = registry.fetch("d", None, DurationStat::Stddev).unwrap();
        let count = registry.fetch("d", None, DurationStat::Count).unwrap();

        assert!(min <= median, "{kind:?}: min {min} <= median {median}");
        assert!(median <= max, "{kind:?}: median {median} <= max {max}");
        assert!(p90 <= p95, "{kind:?}: p90 {p90} <= p95 {p95}");
        assert!(p95 <= p99, "{kind:?}: p95 {p95} <= p99 {p99}");
        assert!(p99 <= max, "{kind:?}: p99 {p99} <= max {max}");
        assert!(stddev >= 0.0, "{kind:?}: stddev {stddev} >= 0");
        assert_eq!(count, 5.0, "{kind:?}: count");
    }
}

#[test]
fn p6_generation_advances_only_on_accepted_samples() {
    let registry = Registry::new(DurationAggregationKind::Exact);
    let g0 = registry.snapshot_generation();

    registry.submit(&parse("a:1|c")).unwrap();
    let g1 = registry.snapshot_generation();
    assert!(g1 > g0);

    let rejected = registry.submit(&parse("a:-1|c"));
    assert_eq!(rejected, Err(SubmitReject::BadValue));
    assert_eq!(registry.snapshot_generation(), g1);
}

#[test]
fn p7_kind_mismatch_rejects_without_mutating_generation() {
    let registry = Registry::new(DurationAggregationKind::Exact);
    registry.submit(&parse("a:1|c")).unwrap();
    let g1 = registry.snapshot_generation();

    let err = registry.submit(&parse("a:1|g"));
    assert_eq!(err, Err(SubmitReject::KindMismatch));
    assert_eq!(registry.snapshot_generation(), g1);
}

#[test]
fn p8_block_listed_names_always_reject() {
    let registry = Registry::new(DurationAggregationKind::Exact);
    for name in statsd_agent::wire::RESERVED_NAMES {
        assert!(is_valid_name(name));
        let err = registry.submit(&parse(&format!("{name}:1|c")));
        assert_eq!(err, Err(SubmitReject::Blocked));
    }
    let err = registry.submit(&parse("pmda.settings.anything:1|c"));
    assert_eq!(err, Err(SubmitReject::Blocked));
    assert!(registry.enumerate().is_empty());
}

#[test]
fn p9_tags_only_creation_is_invisible_until_the_label_commits() {
    let registry = Registry::new(DurationAggregationKind::Exact);
    registry
        .submit(&parse("foo,tagX=10:10|c"))
        .unwrap();
    assert!(registry.enumerate().iter().any(|(n, _)| n == "foo"));
    assert_eq!(registry.child_tags("foo").len(), 1);
}

#[test]
fn both_parsers_agree_across_a_representative_corpus() {
    let lines = [
        "example:1|c",
        "foo,tagY=20,tagX=10:10|c",
        "bar:100|ms",
        "example:-2|g",
        "baz:250|ms|#host:a,env:prod",
        "not a line",
        "missing_colon|c",
        "name:1|badtype",
    ];
    let sm = StateMachineParser::new();
    let tb = TableParser::new();
    for line in lines {
        let a = sm.parse_line(line);
        let b = tb.parse_line(line);
        assert_eq!(a.is_ok(), b.is_ok(), "disagreement on {line:?}");
    }
}

//! Exercises `Query` as an embedding host would: enumerate the metric
//! space, describe individual metrics, and fetch their values, without
//! reaching into `Registry`/`Stats` internals.

use statsd_agent::config::{Config, DurationAggregationKind};
use statsd_agent::query::{FetchValue, Query};
use statsd_agent::registry::Registry;
use statsd_agent::stats::Stats;
use statsd_agent::wire::{Kind, LineParser, StateMachineParser};

fn submit(registry: &Registry, line: &str) {
    let sample = StateMachineParser::new().parse_line(line).expect("line should parse");
    registry.submit(&sample).expect("sample should be accepted");
}

#[test]
fn enumerate_exposes_self_metrics_even_on_an_empty_registry() {
    let registry = Registry::new(DurationAggregationKind::Exact);
    let stats = Stats::new();
    let config = Config::default();
    let q = Query::new(&registry, &stats, &config);

    let all = q.enumerate();
    assert_eq!(all.len(), 14);
    assert!(all.iter().all(|d| d.kind == Kind::Counter));
}

#[test]
fn settings_self_metrics_reflect_the_running_config() {
    let registry = Registry::new(DurationAggregationKind::Hdr);
    let stats = Stats::new();
    let mut config = Config::default();
    config.port = 9125;
    config.verbose = 2;
    let q = Query::new(&registry, &stats, &config);

    assert_eq!(
        q.fetch("pmda.settings.port", None),
        Some(FetchValue::Scalar(9125.0))
    );
    assert_eq!(
        q.fetch("pmda.settings.verbose", None),
        Some(FetchValue::Scalar(2.0))
    );
    assert_eq!(
        q.fetch("pmda.settings.duration_aggregation_type", None),
        Some(FetchValue::Scalar(1.0))
    );
    assert_eq!(
        q.fetch("pmda.settings.debug_output_filename", None),
        Some(FetchValue::Text(config.debug_output_filename.clone()))
    );
}

#[test]
fn metrics_tracked_counts_by_kind_after_a_mixed_workload() {
    let registry = Registry::new(DurationAggregationKind::Exact);
    let stats = Stats::new();
    let config = Config::default();

    submit(&registry, "a:1|c");
    submit(&registry, "b:1|g");
    submit(&registry, "c:1|ms");
    submit(&registry, "d:1|ms");

    // Stats' own tracked counters are normally refreshed by the
    // aggregator loop after each successful submit; this test wires that
    // up directly to stay independent of the pipeline threads.
    let mut counts = statsd_agent::stats::TrackedCounts::default();
    for (_, info) in registry.enumerate() {
        match info.kind {
            Kind::Counter => counts.counters += 1,
            Kind::Gauge => counts.gauges += 1,
            Kind::Duration => counts.durations += 1,
        }
    }
    stats.reset_tracked(counts);

    let q = Query::new(&registry, &stats, &config);
    assert_eq!(
        q.fetch("pmda.metrics_tracked", Some("counter")),
        Some(FetchValue::Scalar(1.0))
    );
    assert_eq!(
        q.fetch("pmda.metrics_tracked", Some("gauge")),
        Some(FetchValue::Scalar(1.0))
    );
    assert_eq!(
        q.fetch("pmda.metrics_tracked", Some("duration")),
        Some(FetchValue::Scalar(2.0))
    );
    assert_eq!(
        q.fetch("pmda.metrics_tracked", Some("total")),
        Some(FetchValue::Scalar(4.0))
    );
}

#[test]
fn labelled_instances_enumerate_default_plus_each_tag_set() {
    let registry = Registry::new(DurationAggregationKind::Exact);
    let stats = Stats::new();
    let config = Config::default();

    submit(&registry, "requests:1|c");
    submit(&registry, "requests,region=us:1|c");
    submit(&registry, "requests,region=eu:1|c");

    let q = Query::new(&registry, &stats, &config);
    let instances = q.enumerate_instances("requests");
    assert_eq!(instances.len(), 3);
    assert!(instances.iter().any(|i| i.label == "default"));
    assert!(instances.iter().any(|i| i.label == r#"{"region":"eu"}"#));
    assert!(instances.iter().any(|i| i.label == r#"{"region":"us"}"#));
}

#[test]
fn fetch_of_unknown_metric_or_instance_is_none() {
    let registry = Registry::new(DurationAggregationKind::Exact);
    let stats = Stats::new();
    let config = Config::default();
    let q = Query::new(&registry, &stats, &config);

    assert!(q.fetch("no.such.metric", None).is_none());
    assert!(q.describe("no.such.metric").is_none());

    submit(&registry, "known:1|c");
    assert!(q.fetch("known", Some("not-a-real-tag-set")).is_none());
    assert_eq!(q.fetch("known", None), Some(FetchValue::Scalar(1.0)));
}

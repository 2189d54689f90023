//! Exercises the full three-stage pipeline (Listener, Parser, Aggregator)
//! over a real loopback UDP socket, wired up exactly as
//! `statsd_agent::pipeline::spawn` does internally but against an
//! OS-assigned port so tests never collide on a fixed one.

use std::net::UdpSocket;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::bounded;

use statsd_agent::config::{Config, DurationAggregationKind};
use statsd_agent::pipeline::{aggregator_loop, listener, parser_task, SHUTDOWN_SENTINEL};
use statsd_agent::query::{FetchValue, Query};
use statsd_agent::registry::Registry;
use statsd_agent::stats::Stats;
use statsd_agent::wire::StateMachineParser;

struct Harness {
    addr: std::net::SocketAddr,
    registry: Arc<Registry>,
    stats: Arc<Stats>,
    config: Config,
    listener: thread::JoinHandle<()>,
    parser: thread::JoinHandle<()>,
    aggregator: thread::JoinHandle<()>,
}

impl Harness {
    fn spawn() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("bind");
        let addr = socket.local_addr().expect("local_addr");

        let (raw_tx, raw_rx) = bounded(64);
        let (parsed_tx, parsed_rx) = bounded(64);

        let registry = Arc::new(Registry::new(DurationAggregationKind::Exact));
        let stats = Arc::new(Stats::new());
        let config = Config::default();

        let listener = thread::spawn(move || {
            let _ = listener::run(&socket, &raw_tx, 1472);
        });
        let parser = thread::spawn(move || {
            parser_task::run(&raw_rx, &parsed_tx, &StateMachineParser::new());
        });
        let registry_for_loop = registry.clone();
        let stats_for_loop = stats.clone();
        let aggregator = thread::spawn(move || {
            let flag = Arc::new(AtomicBool::new(false));
            aggregator_loop::run(
                &parsed_rx,
                &registry_for_loop,
                &stats_for_loop,
                0,
                std::path::Path::new("/tmp/statsd-agent-test-dump"),
                &flag,
            );
        });

        Self {
            addr,
            registry,
            stats,
            config,
            listener,
            parser,
            aggregator,
        }
    }

    fn send(&self, line: &str) {
        let sock = UdpSocket::bind("127.0.0.1:0").expect("bind sender");
        sock.send_to(line.as_bytes(), self.addr).expect("send");
    }

    fn shutdown(self) {
        let sock = UdpSocket::bind("127.0.0.1:0").expect("bind sender");
        sock.send_to(SHUTDOWN_SENTINEL, self.addr).expect("send sentinel");
        self.listener.join().expect("listener thread panicked");
        self.parser.join().expect("parser thread panicked");
        self.aggregator.join().expect("aggregator thread panicked");
    }

    fn settle(&self) {
        // The pipeline has no explicit barrier; give the three stages a
        // moment to drain before asserting against shared state.
        thread::sleep(Duration::from_millis(50));
    }
}

#[test]
fn s1_counter_round_trips_through_the_whole_pipeline() {
    let h = Harness::spawn();
    h.send("example:1|c");
    h.settle();

    let q = Query::new(&h.registry, &h.stats, &h.config);
    assert_eq!(q.fetch("example", None), Some(FetchValue::Scalar(1.0)));

    h.shutdown();
}

#[test]
fn s3_tagged_only_metric_appears_once_label_inserts() {
    let h = Harness::spawn();
    h.send("foo,tagY=20,tagX=10:10|c");
    h.settle();

    let q = Query::new(&h.registry, &h.stats, &h.config);
    assert!(q.describe("foo").is_some());
    let instances = q.enumerate_instances("foo");
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].label, r#"{"tagX":"10","tagY":"20"}"#);

    h.shutdown();
}

#[test]
fn s4_duration_stats_over_three_samples() {
    let h = Harness::spawn();
    for line in ["bar:100|ms", "bar:200|ms", "bar:300|ms"] {
        h.send(line);
    }
    h.settle();

    let q = Query::new(&h.registry, &h.stats, &h.config);
    assert_eq!(q.fetch("bar", Some("min")), Some(FetchValue::Scalar(100.0)));
    assert_eq!(q.fetch("bar", Some("max")), Some(FetchValue::Scalar(300.0)));
    assert_eq!(q.fetch("bar", Some("median")), Some(FetchValue::Scalar(200.0)));
    assert_eq!(q.fetch("bar", Some("mean")), Some(FetchValue::Scalar(200.0)));
    assert_eq!(q.fetch("bar", Some("count")), Some(FetchValue::Scalar(3.0)));

    h.shutdown();
}

#[test]
fn s5_kind_mismatch_is_dropped_and_first_value_sticks() {
    let h = Harness::spawn();
    h.send("q:1|c");
    h.settle();
    h.send("q:1|g");
    h.settle();

    let q = Query::new(&h.registry, &h.stats, &h.config);
    assert_eq!(q.fetch("q", None), Some(FetchValue::Scalar(1.0)));
    assert_eq!(q.fetch("pmda.dropped", None), Some(FetchValue::Scalar(1.0)));

    h.shutdown();
}

#[test]
fn s6_blocked_name_never_reaches_the_registry() {
    let h = Harness::spawn();
    h.send("pmda.received:1|c");
    h.settle();

    let q = Query::new(&h.registry, &h.stats, &h.config);
    assert!(q.describe("pmda.received").is_some()); // the self-metric, not a user metric
    assert_eq!(h.registry.enumerate().len(), 0);

    h.shutdown();
}

#[test]
fn s7_shutdown_sentinel_stops_all_three_stages() {
    let h = Harness::spawn();
    h.send("example:1|c");
    h.settle();
    // `shutdown` itself asserts every stage's JoinHandle completes.
    h.shutdown();
}

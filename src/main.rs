use std::sync::Arc;

use statsd_agent::config::Config;
use statsd_agent::error::AgentResult;
use statsd_agent::query::Query;
use statsd_agent::registry::Registry;
use statsd_agent::stats::Stats;
use tracing::info;

fn main() -> AgentResult<()> {
    init_logging();

    let config = Config::default();
    let registry = Arc::new(Registry::new(config.duration_aggregation));
    let stats = Arc::new(Stats::new());

    info!(port = config.port, "starting statsd agent");
    let pipeline = statsd_agent::pipeline::spawn(&config, registry.clone(), stats.clone())?;

    let query = Query::new(&registry, &stats, &config);
    info!(generation = query.snapshot_generation(), "pipeline running");

    pipeline.join()
}

/// Minimal `tracing` wiring; a host embedding this crate as a library
/// normally owns log configuration (spec §1) and would not call this.
fn init_logging() {
    use tracing::Level;
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::FmtSubscriber;

    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    let _ = set_global_default(subscriber);
}

//! # statsd-agent
//!
//! A UDP statsd-line-protocol ingest agent: parses datagrams into typed
//! samples, aggregates them in a concurrent in-memory registry with
//! counter/gauge/duration semantics and label families, and exposes the
//! result to a polling host through a read-only query surface.
//!
//! ## Quick start
//!
//! ```no_run
//! use statsd_agent::config::Config;
//! use statsd_agent::registry::Registry;
//! use statsd_agent::stats::Stats;
//! use statsd_agent::query::Query;
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let registry = Arc::new(Registry::new(config.duration_aggregation));
//! let stats = Arc::new(Stats::new());
//!
//! let pipeline = statsd_agent::pipeline::spawn(&config, registry.clone(), stats.clone())
//!     .expect("bind UDP listener");
//!
//! let query = Query::new(&registry, &stats, &config);
//! println!("generation: {}", query.snapshot_generation());
//! # let _ = pipeline;
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![warn(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

// https://docs.datadoghq.com/developers/dogstatsd/datagram_shell/?tab=metrics
pub mod config;
pub mod error;
pub mod pipeline;
pub mod query;
pub mod registry;
pub mod stats;
pub mod wire;

pub use config::Config;
pub use error::{AgentError, AgentResult};
pub use query::Query;
pub use registry::Registry;
pub use stats::Stats;

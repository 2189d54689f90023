//! Per-kind value engines (spec §4.4 "Value engine rules by kind", §4.5).
//!
//! Dispatch on kind is a tagged variant, not an inheritance hierarchy
//! (spec §9): [`Value`] wraps exactly one of [`Counter`], [`Gauge`] or
//! [`DurationEngine`](super::duration::DurationEngine), chosen once at
//! metric-creation time and immutable thereafter (invariant I3).

use crate::config::DurationAggregationKind;
use crate::wire::{Kind, Sign};

use super::duration::DurationEngine;

/// Why a value-engine update was rejected (subset of spec §4.8 taxonomy
/// relevant at this layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadValue;

/// A monotonically accumulating total. Rejects `Minus` writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counter {
    acc: f64,
}

impl Counter {
    fn apply(&mut self, value: f64, sign: Sign) -> Result<(), BadValue> {
        match sign {
            Sign::None | Sign::Plus => {
                self.acc += value.abs();
                Ok(())
            }
            Sign::Minus => Err(BadValue),
        }
    }

    /// Current accumulated total.
    #[must_use]
    pub const fn read(&self) -> f64 {
        self.acc
    }
}

/// A point-in-time value: absolute set on `None`, signed adjustment on
/// `Plus`/`Minus`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gauge {
    acc: f64,
}

impl Gauge {
    fn apply(&mut self, value: f64, sign: Sign) -> Result<(), BadValue> {
        match sign {
            Sign::None => self.acc = value,
            Sign::Plus => self.acc += value,
            Sign::Minus => self.acc -= value,
        }
        Ok(())
    }

    /// Current value.
    #[must_use]
    pub const fn read(&self) -> f64 {
        self.acc
    }
}

/// Tagged union over the three kind-specific engines (spec §9 design note).
#[derive(Debug)]
pub enum Value {
    /// Counter engine.
    Counter(Counter),
    /// Gauge engine.
    Gauge(Gauge),
    /// Duration engine (exact or HDR, per the agent's configured kind).
    Duration(DurationEngine),
}

impl Value {
    /// Builds a fresh, zeroed engine for `kind`.
    #[must_use]
    pub fn new(kind: Kind, duration_kind: DurationAggregationKind) -> Result<Self, BadValue> {
        Ok(match kind {
            Kind::Counter => Self::Counter(Counter::default()),
            Kind::Gauge => Self::Gauge(Gauge::default()),
            Kind::Duration => {
                Self::Duration(DurationEngine::new(duration_kind).map_err(|_| BadValue)?)
            }
        })
    }

    /// The kind this engine backs.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Counter(_) => Kind::Counter,
            Self::Gauge(_) => Kind::Gauge,
            Self::Duration(_) => Kind::Duration,
        }
    }

    /// Applies one sample's `(value, sign)` to this engine (spec §4.4).
    ///
    /// # Errors
    /// Returns [`BadValue`] if the engine's invariant rejects the write
    /// (e.g. a `Minus` counter increment, or a negative duration).
    pub fn apply(&mut self, value: f64, sign: Sign) -> Result<(), BadValue> {
        match self {
            Self::Counter(c) => c.apply(value, sign),
            Self::Gauge(g) => g.apply(value, sign),
            Self::Duration(d) => d.apply(value, sign),
        }
    }

    /// Reads a single scalar statistic. For Counter/Gauge, `stat` is
    /// ignored; for Duration, see [`DurationEngine::read`].
    #[must_use]
    pub fn read(&self, stat: DurationStat) -> f64 {
        match self {
            Self::Counter(c) => c.read(),
            Self::Gauge(g) => g.read(),
            Self::Duration(d) => d.read(stat),
        }
    }
}

/// The nine duration statistics exposed by Query (spec §4.5, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationStat {
    /// Minimum observed value.
    Min,
    /// Maximum observed value.
    Max,
    /// 50th percentile.
    Median,
    /// Arithmetic mean.
    Mean,
    /// 90th percentile.
    P90,
    /// 95th percentile.
    P95,
    /// 99th percentile.
    P99,
    /// Number of accepted samples.
    Count,
    /// Population standard deviation.
    Stddev,
}

impl DurationStat {
    /// All nine statistics, in the fixed instance order Query exposes
    /// (spec §4.7 `enumerate_instances`).
    pub const ALL: [Self; 9] = [
        Self::Min,
        Self::Max,
        Self::Median,
        Self::Mean,
        Self::P90,
        Self::P95,
        Self::P99,
        Self::Count,
        Self::Stddev,
    ];

    /// The instance label suffix used by Query (e.g. `"p99"`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Median => "median",
            Self::Mean => "mean",
            Self::P90 => "p90",
            Self::P95 => "p95",
            Self::P99 => "p99",
            Self::Count => "count",
            Self::Stddev => "stddev",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_rejects_minus() {
        let mut c = Counter::default();
        assert!(c.apply(1.0, Sign::Minus).is_err());
        assert_eq!(c.read(), 0.0);
    }

    #[test]
    fn counter_accumulates_absolute_values() {
        let mut c = Counter::default();
        c.apply(3.0, Sign::None).unwrap();
        c.apply(2.0, Sign::Plus).unwrap();
        assert_eq!(c.read(), 5.0);
    }

    #[test]
    fn gauge_unsigned_overwrites_signed_adjusts() {
        let mut g = Gauge::default();
        g.apply(1.0, Sign::Plus).unwrap();
        g.apply(2.0, Sign::Minus).unwrap();
        g.apply(5.0, Sign::None).unwrap();
        assert_eq!(g.read(), 5.0);
    }
}

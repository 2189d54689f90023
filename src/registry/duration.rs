//! Duration value engine: an unordered multiset sorted lazily on read, or
//! an HDR histogram, selected at startup by [`DurationAggregationKind`]
//! (spec §3, §4.4, §4.5, §9). The source's exact-duration removal routine
//! is buggy and this spec has no remove operation, so none is implemented.

use hdrhistogram::Histogram;

use crate::config::DurationAggregationKind;
use crate::wire::Sign;

use super::value::{BadValue, DurationStat};

/// Lowest value (in microseconds) the HDR histogram can record.
const HDR_MIN_US: u64 = 1;
/// Highest value (in microseconds) the HDR histogram can record: 3600 s.
const HDR_MAX_US: u64 = 3_600 * 1_000_000;
/// Significant decimal digits of precision retained by the HDR histogram.
const HDR_SIGFIGS: u8 = 3;

/// Either representation of a Duration metric's accumulated observations.
#[derive(Debug)]
pub enum DurationEngine {
    /// Unordered multiset of doubles, sorted lazily when queried.
    Exact(Vec<f64>),
    /// HDR histogram over microsecond ticks.
    Hdr(Box<Histogram<u64>>),
}

impl DurationEngine {
    /// Builds an empty engine of the requested kind.
    ///
    /// # Errors
    /// Returns `BadValue` if the HDR histogram cannot be constructed with
    /// the configured bounds (should not happen with fixed constants, but
    /// the constructor is fallible).
    pub fn new(kind: DurationAggregationKind) -> Result<Self, BadValue> {
        match kind {
            DurationAggregationKind::Exact => Ok(Self::Exact(Vec::new())),
            DurationAggregationKind::Hdr => {
                let hist = Histogram::new_with_bounds(HDR_MIN_US, HDR_MAX_US, HDR_SIGFIGS)
                    .map_err(|_| BadValue)?;
                Ok(Self::Hdr(Box::new(hist)))
            }
        }
    }

    /// Applies one sample (spec §4.4 Duration rule): the value after
    /// applying `sign` must be non-negative; a `Minus` sign with nonzero
    /// magnitude always rejects.
    pub fn apply(&mut self, value: f64, sign: Sign) -> Result<(), BadValue> {
        let signed = match sign {
            Sign::None | Sign::Plus => value,
            Sign::Minus if value == 0.0 => 0.0,
            Sign::Minus => return Err(BadValue),
        };
        if signed < 0.0 || !signed.is_finite() {
            return Err(BadValue);
        }

        match self {
            Self::Exact(samples) => {
                samples.push(signed);
                Ok(())
            }
            Self::Hdr(hist) => {
                let ticks = signed.round().clamp(HDR_MIN_US as f64, HDR_MAX_US as f64) as u64;
                hist.record(ticks).map_err(|_| BadValue)
            }
        }
    }

    /// Reads one of the nine statistics (spec §4.5). `count` for a
    /// never-written engine is 0 and every other statistic reads 0.
    #[must_use]
    pub fn read(&self, stat: DurationStat) -> f64 {
        match self {
            Self::Exact(samples) => Self::read_exact(samples, stat),
            Self::Hdr(hist) => Self::read_hdr(hist, stat),
        }
    }

    fn read_exact(samples: &[f64], stat: DurationStat) -> f64 {
        let count = samples.len();
        if count == 0 {
            return 0.0;
        }
        if stat == DurationStat::Count {
            return count as f64;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let percentile = |p: f64| -> f64 {
            let rank = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
            sorted[rank.min(sorted.len() - 1)]
        };

        let mean = sorted.iter().sum::<f64>() / count as f64;

        match stat {
            DurationStat::Count => unreachable!("handled above"),
            DurationStat::Min => sorted[0],
            DurationStat::Max => sorted[sorted.len() - 1],
            DurationStat::Median => percentile(50.0),
            DurationStat::Mean => mean,
            DurationStat::P90 => percentile(90.0),
            DurationStat::P95 => percentile(95.0),
            DurationStat::P99 => percentile(99.0),
            DurationStat::Stddev => {
                let variance =
                    sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
                variance.sqrt()
            }
        }
    }

    fn read_hdr(hist: &Histogram<u64>, stat: DurationStat) -> f64 {
        if hist.len() == 0 {
            return 0.0;
        }
        match stat {
            DurationStat::Count => hist.len() as f64,
            DurationStat::Min => hist.min() as f64,
            DurationStat::Max => hist.max() as f64,
            DurationStat::Median => hist.value_at_percentile(50.0) as f64,
            DurationStat::Mean => hist.mean(),
            DurationStat::P90 => hist.value_at_percentile(90.0) as f64,
            DurationStat::P95 => hist.value_at_percentile(95.0) as f64,
            DurationStat::P99 => hist.value_at_percentile(99.0) as f64,
            DurationStat::Stddev => hist.stdev(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_basic_stats() {
        let mut e = DurationEngine::new(DurationAggregationKind::Exact).unwrap();
        for v in [100.0, 200.0, 300.0] {
            e.apply(v, Sign::None).unwrap();
        }
        assert_eq!(e.read(DurationStat::Count), 3.0);
        assert_eq!(e.read(DurationStat::Min), 100.0);
        assert_eq!(e.read(DurationStat::Max), 300.0);
        assert_eq!(e.read(DurationStat::Median), 200.0);
        assert_eq!(e.read(DurationStat::Mean), 200.0);
    }

    #[test]
    fn exact_percentiles_monotone() {
        let mut e = DurationEngine::new(DurationAggregationKind::Exact).unwrap();
        for v in 1..=100 {
            e.apply(f64::from(v), Sign::None).unwrap();
        }
        let p90 = e.read(DurationStat::P90);
        let p95 = e.read(DurationStat::P95);
        let p99 = e.read(DurationStat::P99);
        let max = e.read(DurationStat::Max);
        assert!(p90 <= p95);
        assert!(p95 <= p99);
        assert!(p99 <= max);
    }

    #[test]
    fn rejects_negative_after_sign() {
        let mut e = DurationEngine::new(DurationAggregationKind::Exact).unwrap();
        assert!(e.apply(5.0, Sign::Minus).is_err());
        assert!(e.apply(0.0, Sign::Minus).is_ok());
    }

    #[test]
    fn empty_reads_zero() {
        let e = DurationEngine::new(DurationAggregationKind::Exact).unwrap();
        assert_eq!(e.read(DurationStat::Count), 0.0);
        assert_eq!(e.read(DurationStat::Mean), 0.0);
    }

    #[test]
    fn hdr_basic_stats() {
        let mut e = DurationEngine::new(DurationAggregationKind::Hdr).unwrap();
        for v in [100.0, 200.0, 300.0] {
            e.apply(v, Sign::None).unwrap();
        }
        assert_eq!(e.read(DurationStat::Count), 3.0);
        assert!(e.read(DurationStat::Min) <= 100.0 * 1.01);
        assert!(e.read(DurationStat::Max) >= 300.0 * 0.99);
    }
}

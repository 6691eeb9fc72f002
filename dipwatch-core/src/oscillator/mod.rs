//! Multi-source RSI reconciliation.
//!
//! The oscillator for a ticker can come from the local bar series and from
//! any number of external indicator APIs. Every source is queried
//! independently; a source that errors, times out, or answers with garbage
//! reports `Unavailable` and simply drops out of the mean.

use crate::domain::Bar;
use crate::indicators::{round2, Rsi};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Outcome of querying one oscillator source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OscillatorReading {
    Value(f64),
    Unavailable(String),
}

impl OscillatorReading {
    /// Accept a raw provider number only if it is a plausible RSI.
    pub fn from_raw(value: f64) -> Self {
        if value.is_finite() && (0.0..=100.0).contains(&value) {
            OscillatorReading::Value(value)
        } else {
            OscillatorReading::Unavailable(format!("out of range: {value}"))
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            OscillatorReading::Value(v) => Some(*v),
            OscillatorReading::Unavailable(_) => None,
        }
    }
}

/// A place an RSI value can come from.
///
/// Implementations must never panic or block without bound; network sources
/// carry their own per-call timeout.
pub trait OscillatorSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Produce the latest RSI for `symbol`. `bars` is the locally fetched
    /// history (possibly empty) for sources that compute rather than fetch.
    fn fetch(&self, symbol: &str, bars: &[Bar], period: usize) -> OscillatorReading;
}

/// Computes RSI from the bar series already in hand.
#[derive(Debug, Clone, Default)]
pub struct LocalOscillator;

impl OscillatorSource for LocalOscillator {
    fn name(&self) -> &str {
        "local"
    }

    fn fetch(&self, _symbol: &str, bars: &[Bar], period: usize) -> OscillatorReading {
        match Rsi::new(period).compute(bars) {
            Some(v) => OscillatorReading::Value(v),
            None => OscillatorReading::Unavailable(format!(
                "need {} bars, have {}",
                period + 1,
                bars.len()
            )),
        }
    }
}

/// Result of reconciling all readings for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledOscillator {
    /// Mean of successful readings, rounded to 2 decimals.
    pub value: Option<f64>,
    pub used: usize,
    pub failed: usize,
}

/// Average every usable reading. `value` is `None` iff none succeeded.
pub fn reconcile(readings: &[OscillatorReading]) -> ReconciledOscillator {
    let values: Vec<f64> = readings
        .iter()
        .filter_map(OscillatorReading::value)
        .filter(|v| v.is_finite())
        .collect();
    let used = values.len();
    let value = if used == 0 {
        None
    } else {
        Some(round2(values.iter().sum::<f64>() / used as f64))
    };
    ReconciledOscillator {
        value,
        used,
        failed: readings.len() - used,
    }
}

/// The configured set of oscillator sources for a run.
#[derive(Clone)]
pub struct OscillatorPanel {
    sources: Vec<Arc<dyn OscillatorSource>>,
    period: usize,
}

impl OscillatorPanel {
    pub fn new(sources: Vec<Arc<dyn OscillatorSource>>, period: usize) -> Self {
        Self { sources, period }
    }

    /// Panel with only the local calculator.
    pub fn local_only(period: usize) -> Self {
        Self::new(vec![Arc::new(LocalOscillator)], period)
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Query every source concurrently, then reconcile.
    pub fn read(&self, symbol: &str, bars: &[Bar]) -> ReconciledOscillator {
        let readings: Vec<OscillatorReading> = self
            .sources
            .par_iter()
            .map(|source| {
                let reading = source.fetch(symbol, bars, self.period);
                debug!(symbol, source = source.name(), ?reading, "oscillator reading");
                reading
            })
            .collect();
        reconcile(&readings)
    }
}

//! Relative Strength Index (RSI), simple-average variant.
//!
//! Gains and losses are averaged with a plain rolling mean over the last
//! `period` close-to-close deltas (no Wilder smoothing).
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period + 1 bars.
//! Edge cases: avg_loss == 0 -> 100 (also for a flat window).

use crate::domain::Bar;

/// Period used throughout the pipeline.
pub const RSI_PERIOD: usize = 14;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Minimum number of bars needed for a value.
    pub fn lookback(&self) -> usize {
        self.period + 1
    }

    /// RSI as of the latest bar, or `None` with insufficient or void history.
    pub fn compute(&self, bars: &[Bar]) -> Option<f64> {
        let n = bars.len();
        if n < self.lookback() {
            return None;
        }

        let window = &bars[n - self.lookback()..];
        let mut gain_sum = 0.0;
        let mut loss_sum = 0.0;
        for pair in window.windows(2) {
            let delta = pair[1].close - pair[0].close;
            if !delta.is_finite() {
                return None;
            }
            if delta > 0.0 {
                gain_sum += delta;
            } else {
                loss_sum -= delta;
            }
        }

        let avg_gain = gain_sum / self.period as f64;
        let avg_loss = loss_sum / self.period as f64;
        Some(compute_rsi(avg_gain, avg_loss))
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(RSI_PERIOD)
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn rsi_all_gains_saturates() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        assert_eq!(Rsi::default().compute(&make_bars(&closes)), Some(100.0));
    }

    #[test]
    fn rsi_flat_window_saturates() {
        let closes = vec![50.0; 20];
        assert_eq!(Rsi::default().compute(&make_bars(&closes)), Some(100.0));
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        assert_approx(Rsi::default().compute(&make_bars(&closes)).unwrap(), 0.0, 1e-9);
    }

    #[test]
    fn rsi_mixed_hand_computed() {
        // Changes: +0.34, -0.25, -0.48, +0.72 (period 4)
        // avg_gain = 1.06/4, avg_loss = 0.73/4, rs = 1.06/0.73
        let bars = make_bars(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        let value = Rsi::new(4).compute(&bars).unwrap();
        let rs = 1.06 / 0.73;
        assert_approx(value, 100.0 - 100.0 / (1.0 + rs), 1e-9);
    }

    #[test]
    fn rsi_uses_only_trailing_window() {
        // A huge early loss must not affect the value once outside the window.
        let mut closes = vec![1000.0, 100.0];
        closes.extend((1..=3).map(|i| 100.0 + i as f64));
        let value = Rsi::new(3).compute(&make_bars(&closes)).unwrap();
        assert_eq!(value, 100.0);
    }

    #[test]
    fn rsi_unavailable_below_fifteen_bars() {
        let closes: Vec<f64> = (0..14).map(|i| 100.0 + (i % 3) as f64).collect();
        assert_eq!(Rsi::default().compute(&make_bars(&closes)), None);
    }

    #[test]
    fn rsi_nan_in_window_is_unavailable() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let mut bars = make_bars(&closes);
        bars[10].close = f64::NAN;
        assert_eq!(Rsi::default().compute(&bars), None);
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::default().lookback(), 15);
        assert_eq!(Rsi::default().name(), "rsi_14");
    }
}

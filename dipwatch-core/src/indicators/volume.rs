//! Relative volume.
//!
//! ratio = latest volume / mean(volume of the 4 bars before the latest).
//! Zero trailing volume yields `None` rather than infinity.

use super::round2;
use crate::domain::Bar;

/// Number of trailing sessions averaged for the baseline.
pub const VOLUME_LOOKBACK: usize = 4;

pub fn volume_ratio(bars: &[Bar]) -> Option<f64> {
    let n = bars.len();
    if n < VOLUME_LOOKBACK + 1 {
        return None;
    }
    let current = bars[n - 1].volume as f64;
    let baseline: f64 = bars[n - 1 - VOLUME_LOOKBACK..n - 1]
        .iter()
        .map(|b| b.volume as f64)
        .sum::<f64>()
        / VOLUME_LOOKBACK as f64;

    if baseline == 0.0 {
        return None;
    }
    Some(round2(current / baseline))
}

//! Day-over-day price change.
//!
//! change_pct = (latest_close - previous_close) / previous_close * 100,
//! rounded to 2 decimals. Needs at least 2 bars.

use super::round2;
use crate::domain::Bar;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub previous_close: f64,
    pub latest_close: f64,
    pub change_pct: f64,
}

pub fn price_change(bars: &[Bar]) -> Option<PriceChange> {
    let [.., previous, latest] = bars else {
        return None;
    };
    let (prev, last) = (previous.close, latest.close);
    if !prev.is_finite() || !last.is_finite() || prev == 0.0 {
        return None;
    }
    Some(PriceChange {
        previous_close: prev,
        latest_close: last,
        change_pct: round2((last - prev) / prev * 100.0),
    })
}

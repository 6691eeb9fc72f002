//! Assemble a `SignalBundle` from fetched inputs.

use crate::domain::{Bar, SignalBundle};
use crate::indicators::{price_change, volume_ratio};
use crate::oscillator::ReconciledOscillator;

/// Combine the bar-derived indicators with the reconciled oscillator and
/// sentiment. `None` when the price change cannot be computed, since no
/// decision or alert is possible without it.
pub fn assemble(
    symbol: &str,
    bars: &[Bar],
    oscillator: &ReconciledOscillator,
    sentiment: f64,
) -> Option<SignalBundle> {
    let change = price_change(bars)?;
    Some(SignalBundle {
        symbol: symbol.to_string(),
        change_pct: change.change_pct,
        previous_close: change.previous_close,
        latest_close: change.latest_close,
        volume_ratio: volume_ratio(bars),
        oscillator: oscillator.value,
        oscillator_sources: oscillator.used,
        sentiment,
    })
}

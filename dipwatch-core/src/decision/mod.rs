//! Decision rules: signal bundle -> recommendation + narrative.
//!
//! Rules are evaluated in a fixed order and the first match wins:
//!
//! | # | condition                                                     | result          |
//! |---|---------------------------------------------------------------|-----------------|
//! | 1 | change < -2, sentiment > 0.3, oscillator < 35, volume > 1     | Buy Opportunity |
//! | 2 | change > 2, sentiment < -0.2, oscillator > 70, volume > 1     | Sell Alert      |
//! | 3 | abs(change) > 3, volume > 2                                   | Volatile Move   |
//! | 4 | otherwise                                                     | Hold            |
//!
//! Missing inputs are replaced by the named defaults below before any rule is
//! checked. The narrative is computed from the raw inputs and never feeds back
//! into the recommendation.

use crate::domain::{Decision, Recommendation, SignalBundle};
use serde::{Deserialize, Serialize};

/// Oscillator value assumed when no source produced one.
pub const NEUTRAL_OSCILLATOR: f64 = 50.0;
/// Sentiment assumed when there were no headlines.
pub const NEUTRAL_SENTIMENT: f64 = crate::sentiment::NEUTRAL_SENTIMENT;
/// Volume ratio assumed when it could not be computed; keeps the
/// volume-gated rules from firing.
pub const MISSING_VOLUME_RATIO: f64 = 0.0;

pub const BUY_MAX_CHANGE: f64 = -2.0;
pub const BUY_MIN_SENTIMENT: f64 = 0.3;
pub const BUY_MAX_OSCILLATOR: f64 = 35.0;
pub const SELL_MIN_CHANGE: f64 = 2.0;
pub const SELL_MAX_SENTIMENT: f64 = -0.2;
pub const SELL_MIN_OSCILLATOR: f64 = 70.0;
pub const DIRECTIONAL_MIN_VOLUME: f64 = 1.0;
pub const VOLATILE_MIN_ABS_CHANGE: f64 = 3.0;
pub const VOLATILE_MIN_VOLUME: f64 = 2.0;

/// The four signals the rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionInputs {
    pub change_pct: f64,
    pub sentiment: f64,
    pub oscillator: Option<f64>,
    pub volume_ratio: Option<f64>,
}

impl DecisionInputs {
    pub fn from_bundle(bundle: &SignalBundle) -> Self {
        Self {
            change_pct: bundle.change_pct,
            sentiment: bundle.sentiment,
            oscillator: bundle.oscillator,
            volume_ratio: bundle.volume_ratio,
        }
    }

    fn oscillator_or_neutral(&self) -> f64 {
        self.oscillator.unwrap_or(NEUTRAL_OSCILLATOR)
    }

    fn volume_or_missing(&self) -> f64 {
        self.volume_ratio.unwrap_or(MISSING_VOLUME_RATIO)
    }

    fn sentiment_or_neutral(&self) -> f64 {
        if self.sentiment.is_finite() {
            self.sentiment
        } else {
            NEUTRAL_SENTIMENT
        }
    }
}

/// Apply the rule table.
pub fn decide(inputs: &DecisionInputs) -> Recommendation {
    let change = inputs.change_pct;
    let sentiment = inputs.sentiment_or_neutral();
    let oscillator = inputs.oscillator_or_neutral();
    let volume = inputs.volume_or_missing();

    if change < BUY_MAX_CHANGE
        && sentiment > BUY_MIN_SENTIMENT
        && oscillator < BUY_MAX_OSCILLATOR
        && volume > DIRECTIONAL_MIN_VOLUME
    {
        Recommendation::BuyOpportunity
    } else if change > SELL_MIN_CHANGE
        && sentiment < SELL_MAX_SENTIMENT
        && oscillator > SELL_MIN_OSCILLATOR
        && volume > DIRECTIONAL_MIN_VOLUME
    {
        Recommendation::SellAlert
    } else if change.abs() > VOLATILE_MIN_ABS_CHANGE && volume > VOLATILE_MIN_VOLUME {
        Recommendation::VolatileMove
    } else {
        Recommendation::Hold
    }
}

fn oscillator_band(oscillator: Option<f64>) -> &'static str {
    match oscillator {
        None => "RSI: no data",
        Some(v) if v <= 30.0 => "RSI oversold",
        Some(v) if v <= 50.0 => "RSI neutral-bullish",
        Some(v) if v <= 70.0 => "RSI neutral-bearish",
        Some(_) => "RSI overbought",
    }
}

fn volume_band(volume_ratio: Option<f64>) -> &'static str {
    match volume_ratio {
        None => "volume: no data",
        Some(v) if v > 2.0 => "volume surging",
        Some(v) if v > 1.2 => "volume elevated",
        Some(_) => "volume normal",
    }
}

fn sentiment_band(sentiment: f64) -> &'static str {
    if sentiment > 0.4 {
        "news sentiment positive"
    } else if sentiment < -0.4 {
        "news sentiment negative"
    } else if sentiment.abs() <= 0.15 {
        "news sentiment neutral"
    } else {
        "news sentiment mixed"
    }
}

/// One human-readable sentence summarizing the three bands.
pub fn narrative(inputs: &DecisionInputs) -> String {
    format!(
        "{}, {}, {}.",
        oscillator_band(inputs.oscillator),
        volume_band(inputs.volume_ratio),
        sentiment_band(inputs.sentiment_or_neutral())
    )
}

/// Recommendation and narrative for a bundle.
pub fn evaluate(bundle: &SignalBundle) -> Decision {
    let inputs = DecisionInputs::from_bundle(bundle);
    Decision {
        recommendation: decide(&inputs),
        narrative: narrative(&inputs),
    }
}

//! Per-ticker signal bundle and the recommendation derived from it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A recent news headline for a ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub link: String,
}

/// Values computed for one ticker during one run.
///
/// A bundle only exists when the price change could be computed; every other
/// signal may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalBundle {
    pub symbol: String,
    pub change_pct: f64,
    pub previous_close: f64,
    pub latest_close: f64,
    pub volume_ratio: Option<f64>,
    pub oscillator: Option<f64>,
    /// Number of oscillator sources that contributed to `oscillator`.
    pub oscillator_sources: usize,
    pub sentiment: f64,
}

/// Qualitative recommendation produced by the decision rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    BuyOpportunity,
    SellAlert,
    VolatileMove,
    Hold,
}

impl Recommendation {
    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::BuyOpportunity => "Buy Opportunity",
            Recommendation::SellAlert => "Sell Alert",
            Recommendation::VolatileMove => "Volatile Move",
            Recommendation::Hold => "Hold",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Recommendation plus the presentational narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub recommendation: Recommendation,
    pub narrative: String,
}

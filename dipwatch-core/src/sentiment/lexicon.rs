//! Valence lexicon for headline scoring.
//!
//! Valences use the conventional -4..=4 scale. The table mixes general
//! opinion words with the vocabulary that actually shows up in market
//! headlines ("beats", "downgrade", "probe").

use std::collections::HashMap;

const VALENCES: &[(&str, f64)] = &[
    // general positive
    ("good", 1.9),
    ("great", 3.1),
    ("excellent", 2.7),
    ("amazing", 2.8),
    ("best", 3.2),
    ("better", 1.9),
    ("win", 2.8),
    ("wins", 2.7),
    ("winning", 2.4),
    ("success", 2.7),
    ("successful", 2.8),
    ("strong", 2.3),
    ("stronger", 2.1),
    ("positive", 2.6),
    ("optimistic", 1.3),
    ("optimism", 2.5),
    ("confident", 2.2),
    ("confidence", 2.3),
    ("hope", 1.9),
    ("happy", 2.7),
    ("love", 3.2),
    ("boost", 1.7),
    ("boosts", 1.3),
    ("improve", 1.9),
    ("improves", 1.8),
    ("improved", 2.1),
    ("benefit", 2.0),
    ("opportunity", 1.8),
    ("innovative", 1.6),
    ("breakthrough", 2.2),
    ("thrive", 2.2),
    ("upbeat", 2.0),
    ("robust", 1.6),
    ("solid", 1.3),
    ("impressive", 2.6),
    ("welcome", 2.0),
    ("favorable", 2.1),
    ("approve", 1.9),
    ("approved", 1.8),
    ("approval", 1.9),
    // market positive
    ("beat", 1.6),
    ("beats", 1.7),
    ("surge", 1.9),
    ("surges", 1.9),
    ("surged", 1.9),
    ("soar", 2.2),
    ("soars", 2.2),
    ("soared", 2.2),
    ("jump", 1.2),
    ("jumps", 1.2),
    ("rally", 1.8),
    ("rallies", 1.8),
    ("gain", 2.0),
    ("gains", 1.8),
    ("rise", 1.2),
    ("rises", 1.2),
    ("rebound", 1.5),
    ("rebounds", 1.5),
    ("recovery", 1.4),
    ("record", 1.0),
    ("profit", 1.9),
    ("profits", 1.9),
    ("profitable", 1.9),
    ("growth", 1.6),
    ("grow", 1.3),
    ("grows", 1.3),
    ("upgrade", 1.7),
    ("upgrades", 1.7),
    ("upgraded", 1.7),
    ("outperform", 1.8),
    ("outperforms", 1.8),
    ("bullish", 2.0),
    ("buy", 0.9),
    ("exceed", 1.5),
    ("exceeds", 1.5),
    ("tops", 1.2),
    ("dividend", 0.8),
    ("buyback", 1.0),
    ("expands", 1.1),
    ("partnership", 1.2),
    // general negative
    ("bad", -2.5),
    ("worse", -2.1),
    ("worst", -3.1),
    ("poor", -2.1),
    ("fail", -2.5),
    ("fails", -2.3),
    ("failed", -2.3),
    ("failure", -2.3),
    ("weak", -1.9),
    ("weaker", -1.9),
    ("negative", -2.7),
    ("fear", -2.2),
    ("fears", -1.9),
    ("worry", -1.9),
    ("worries", -1.8),
    ("concern", -1.4),
    ("concerns", -1.4),
    ("risk", -1.1),
    ("risks", -1.1),
    ("crisis", -3.1),
    ("problem", -1.7),
    ("problems", -1.7),
    ("trouble", -1.7),
    ("threat", -2.4),
    ("threatens", -2.2),
    ("warn", -1.4),
    ("warns", -1.4),
    ("warning", -1.4),
    ("angry", -2.3),
    ("hate", -2.7),
    ("scandal", -2.8),
    ("fraud", -2.8),
    ("lawsuit", -1.8),
    ("sues", -1.8),
    ("probe", -1.2),
    ("investigation", -1.2),
    ("fine", 0.8),
    ("fined", -1.6),
    ("recall", -1.6),
    ("layoffs", -2.0),
    ("cuts", -1.2),
    ("cut", -1.1),
    ("uncertain", -1.2),
    ("uncertainty", -1.4),
    ("disappoint", -2.0),
    ("disappoints", -1.9),
    ("disappointing", -2.2),
    ("disappointed", -1.9),
    ("delay", -1.3),
    ("delays", -1.3),
    ("halt", -1.2),
    ("halts", -1.2),
    ("ban", -2.6),
    ("banned", -2.0),
    ("shortage", -1.6),
    ("bankruptcy", -3.0),
    ("default", -1.6),
    // market negative
    ("miss", -1.3),
    ("misses", -1.4),
    ("missed", -1.3),
    ("plunge", -2.0),
    ("plunges", -2.0),
    ("plunged", -2.0),
    ("tumble", -1.7),
    ("tumbles", -1.7),
    ("slump", -1.9),
    ("slumps", -1.9),
    ("sink", -1.5),
    ("sinks", -1.5),
    ("drop", -1.1),
    ("drops", -1.1),
    ("fall", -1.4),
    ("falls", -1.4),
    ("fell", -1.3),
    ("decline", -1.4),
    ("declines", -1.4),
    ("crash", -2.9),
    ("crashes", -2.7),
    ("selloff", -1.8),
    ("loss", -1.3),
    ("losses", -1.7),
    ("lose", -1.6),
    ("loses", -1.6),
    ("downgrade", -1.7),
    ("downgrades", -1.7),
    ("downgraded", -1.7),
    ("underperform", -1.8),
    ("bearish", -2.0),
    ("sell", -0.6),
    ("volatile", -0.8),
    ("volatility", -0.7),
    ("bubble", -1.1),
    ("overvalued", -1.2),
    ("recession", -2.4),
    ("inflation", -0.9),
    ("tariff", -0.8),
    ("tariffs", -0.8),
    ("antitrust", -1.2),
    ("slowdown", -1.5),
];

/// Words that scale the valence of the word after them up.
const BOOSTERS_UP: &[&str] = &[
    "very",
    "extremely",
    "highly",
    "hugely",
    "massively",
    "significantly",
    "substantially",
    "sharply",
    "dramatically",
    "really",
    "incredibly",
    "most",
    "more",
    "deeply",
    "strongly",
];

/// Words that scale the valence of the word after them down.
const BOOSTERS_DOWN: &[&str] = &[
    "slightly",
    "somewhat",
    "marginally",
    "barely",
    "hardly",
    "kind",
    "partly",
    "modestly",
    "less",
    "little",
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "neither", "nor", "none", "nothing", "nobody", "cannot", "cant",
    "can't", "dont", "don't", "doesnt", "doesn't", "didnt", "didn't", "isnt", "isn't",
    "arent", "aren't", "wasnt", "wasn't", "werent", "weren't", "wont", "won't", "without",
    "shouldnt", "shouldn't", "wouldnt", "wouldn't", "couldnt", "couldn't", "despite",
];

/// Lookup tables used by the analyzer.
#[derive(Debug, Clone)]
pub struct Lexicon {
    valences: HashMap<&'static str, f64>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexicon {
    pub fn new() -> Self {
        Self {
            valences: VALENCES.iter().copied().collect(),
        }
    }

    /// Valence for an already-lowercased token.
    pub fn valence(&self, word: &str) -> Option<f64> {
        self.valences.get(word).copied()
    }

    /// +1 for an intensifier, -1 for a dampener, 0 otherwise.
    pub fn booster_direction(&self, word: &str) -> f64 {
        if BOOSTERS_UP.contains(&word) {
            1.0
        } else if BOOSTERS_DOWN.contains(&word) {
            -1.0
        } else {
            0.0
        }
    }

    pub fn is_negation(&self, word: &str) -> bool {
        NEGATIONS.contains(&word) || word.ends_with("n't")
    }

    pub fn len(&self) -> usize {
        self.valences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valences.is_empty()
    }
}

//! Headline sentiment.
//!
//! A rule-based analyzer in the VADER family: per-token lexicon valence,
//! adjusted for intensifiers, negation, shouting and a contrastive "but",
//! summed and squashed into a compound score in [-1, 1]. A ticker's sentiment
//! is the mean compound score of its most recent headlines.

pub mod lexicon;

pub use lexicon::Lexicon;

use crate::domain::Headline;
use crate::indicators::round2;

/// Headlines considered per ticker.
pub const HEADLINE_LIMIT: usize = 5;

/// Score assigned when there is nothing to score.
pub const NEUTRAL_SENTIMENT: f64 = 0.0;

const BOOSTER_INCR: f64 = 0.293;
const CAPS_INCR: f64 = 0.733;
const NEGATION_SCALAR: f64 = -0.74;
const BUT_BEFORE: f64 = 0.5;
const BUT_AFTER: f64 = 1.5;
const EXCLAMATION_INCR: f64 = 0.292;
const QUESTION_INCR: f64 = 0.18;
const NORMALIZATION_ALPHA: f64 = 15.0;
/// Booster effect for the 1st, 2nd and 3rd preceding token.
const BOOSTER_DAMPING: [f64; 3] = [1.0, 0.95, 0.9];

#[derive(Debug)]
struct Token {
    lower: String,
    shouting: bool,
}

impl Token {
    fn parse(raw: &str) -> Option<Self> {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'');
        if word.is_empty() {
            return None;
        }
        let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
        let shouting = letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase());
        Some(Self {
            lower: word.to_lowercase(),
            shouting,
        })
    }
}

/// Lexicon-driven compound scorer.
#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer {
    lexicon: Lexicon,
}

impl SentimentAnalyzer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// Compound polarity of one piece of text, in [-1, 1].
    pub fn compound(&self, text: &str) -> f64 {
        let tokens: Vec<Token> = text.split_whitespace().filter_map(Token::parse).collect();
        if tokens.is_empty() {
            return 0.0;
        }

        // Caps only count as emphasis when the rest of the text is not shouting too.
        let cap_differential =
            tokens.iter().any(|t| t.shouting) && tokens.iter().any(|t| !t.shouting);
        let but_index = tokens.iter().position(|t| t.lower == "but");

        let mut sentiments: Vec<f64> = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| self.token_valence(&tokens, i, token, cap_differential))
            .collect();

        if let Some(b) = but_index {
            for (i, s) in sentiments.iter_mut().enumerate() {
                if i < b {
                    *s *= BUT_BEFORE;
                } else if i > b {
                    *s *= BUT_AFTER;
                }
            }
        }

        let mut sum: f64 = sentiments.iter().sum();
        if sum != 0.0 {
            sum += punctuation_emphasis(text) * sum.signum();
        }
        normalize(sum)
    }

    fn token_valence(&self, tokens: &[Token], i: usize, token: &Token, cap_differential: bool) -> f64 {
        let Some(mut valence) = self.lexicon.valence(&token.lower) else {
            return 0.0;
        };
        let sign = valence.signum();

        if cap_differential && token.shouting {
            valence += CAPS_INCR * sign;
        }

        for (back, damping) in (1..=3).zip(BOOSTER_DAMPING) {
            let Some(prev) = i.checked_sub(back).map(|j| &tokens[j]) else {
                break;
            };
            let direction = self.lexicon.booster_direction(&prev.lower);
            if direction != 0.0 {
                valence += BOOSTER_INCR * direction * sign * damping;
            }
        }

        let negated = (1..=3)
            .filter_map(|back| i.checked_sub(back))
            .any(|j| self.lexicon.is_negation(&tokens[j].lower));
        if negated {
            valence *= NEGATION_SCALAR;
        }

        valence
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(4) as f64 * EXCLAMATION_INCR;
    let questions = match text.matches('?').count() {
        0 | 1 => 0.0,
        n @ 2..=3 => n as f64 * QUESTION_INCR,
        _ => 0.96,
    };
    exclamations + questions
}

fn normalize(sum: f64) -> f64 {
    (sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

/// Mean of per-headline scores, rounded to 2 decimals; empty -> neutral.
pub fn aggregate(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return NEUTRAL_SENTIMENT;
    }
    round2(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Reduces a ticker's headlines to one polarity score.
#[derive(Debug, Clone, Default)]
pub struct SentimentScorer {
    analyzer: SentimentAnalyzer,
}

impl SentimentScorer {
    pub fn new(analyzer: SentimentAnalyzer) -> Self {
        Self { analyzer }
    }

    /// Scores at most the first `HEADLINE_LIMIT` headlines.
    pub fn score_headlines(&self, headlines: &[Headline]) -> f64 {
        let scores: Vec<f64> = headlines
            .iter()
            .take(HEADLINE_LIMIT)
            .map(|h| self.analyzer.compound(&h.title))
            .collect();
        aggregate(&scores)
    }

    pub fn analyzer(&self) -> &SentimentAnalyzer {
        &self.analyzer
    }
}

//! Deterministic synthetic bars for offline dry runs.
//!
//! The random walk is seeded from the symbol and the as-of date, so a given
//! ticker produces the same series all day and a different one tomorrow.

use super::provider::{DataError, MarketDataProvider};
use crate::domain::Bar;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    as_of: NaiveDate,
    start_price: f64,
}

impl SyntheticProvider {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            start_price: 100.0,
        }
    }

    fn seed(&self, symbol: &str) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(symbol.as_bytes());
        hasher.update(self.as_of.to_string().as_bytes());
        *hasher.finalize().as_bytes()
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_bars(&self, symbol: &str, lookback_days: u32) -> Result<Vec<Bar>, DataError> {
        let mut rng = StdRng::from_seed(self.seed(symbol));

        let mut sessions = Vec::with_capacity(lookback_days as usize);
        let mut current = self.as_of;
        while sessions.len() < lookback_days as usize {
            if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                sessions.push(current);
            }
            current -= Duration::days(1);
        }
        sessions.reverse();

        let mut bars = Vec::with_capacity(sessions.len());
        let mut price = self.start_price;
        for date in sessions {
            let daily_return: f64 = rng.gen_range(-0.04..0.04);
            let open = price;
            let close = price * (1.0 + daily_return);
            bars.push(Bar {
                date,
                open,
                high: open.max(close) * (1.0 + rng.gen_range(0.0..0.01)),
                low: open.min(close) * (1.0 - rng.gen_range(0.0..0.01)),
                close,
                volume: rng.gen_range(500_000..5_000_000u64),
            });
            price = close;
        }

        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn deterministic_per_symbol_and_day() {
        let p = SyntheticProvider::new(as_of());
        let a = p.fetch_bars("NVDA", 30).unwrap();
        let b = p.fetch_bars("NVDA", 30).unwrap();
        assert_eq!(a, b);
        let other = p.fetch_bars("MSFT", 30).unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn skips_weekends_and_is_sane() {
        let bars = SyntheticProvider::new(as_of()).fetch_bars("TSLA", 30).unwrap();
        assert_eq!(bars.len(), 30);
        for bar in &bars {
            assert!(!matches!(bar.date.weekday(), Weekday::Sat | Weekday::Sun));
            assert!(bar.is_sane());
        }
        assert_eq!(bars.last().unwrap().date, as_of());
    }

    #[test]
    fn lookback_counts_trading_sessions() {
        // 2024-03-17 is a Sunday; the series still ends on Friday the 15th.
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        let bars = SyntheticProvider::new(sunday).fetch_bars("AAPL", 15).unwrap();
        assert_eq!(bars.len(), 15);
        assert_eq!(bars.last().unwrap().date, as_of());
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 2, 26).unwrap());
        assert!(SyntheticProvider::new(sunday).fetch_bars("AAPL", 0).unwrap().is_empty());
    }
}

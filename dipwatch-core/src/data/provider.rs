//! Data provider traits and structured error types.
//!
//! Market data and headlines sit behind traits so the runner can swap the
//! Yahoo implementations for synthetic or in-memory ones in tests and dry runs.

use crate::domain::{Bar, Headline};
use thiserror::Error;

/// Structured error types for provider calls.
///
/// None of these are fatal to a run: the pipeline turns every one of them
/// into "missing data" for the affected ticker.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected response: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("HTTP {status}: {context}")]
    Http { status: u16, context: String },

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Classify a transport-level reqwest failure. The URL is stripped
    /// first: query strings and paths carry API keys.
    pub fn from_transport(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            DataError::Timeout(err.to_string())
        } else if err.is_decode() {
            DataError::ResponseFormatChanged(err.to_string())
        } else {
            DataError::NetworkUnreachable(err.to_string())
        }
    }
}

/// Calendar days to request so that `trading_days` sessions come back.
///
/// Five sessions per seven days, plus a cushion for exchange holidays.
pub fn calendar_span(trading_days: u32) -> i64 {
    let trading_days = i64::from(trading_days);
    (trading_days * 7 + 4) / 5 + HOLIDAY_CUSHION_DAYS
}

const HOLIDAY_CUSHION_DAYS: i64 = 7;

/// Supplies daily OHLCV bars.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Daily bars for `symbol` covering at least the last `lookback_days`
    /// trading sessions, ordered oldest-to-newest. An empty vector is a valid
    /// answer (e.g. freshly listed symbol).
    fn fetch_bars(&self, symbol: &str, lookback_days: u32) -> Result<Vec<Bar>, DataError>;
}

/// Supplies recent headlines.
pub trait NewsProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `limit` most recent headlines, newest first.
    fn headlines(&self, symbol: &str, limit: usize) -> Result<Vec<Headline>, DataError>;
}

/// News provider that never has anything to say. Used for synthetic runs.
#[derive(Debug, Clone, Default)]
pub struct NoNews;

impl NewsProvider for NoNews {
    fn name(&self) -> &str {
        "none"
    }

    fn headlines(&self, _symbol: &str, _limit: usize) -> Result<Vec<Headline>, DataError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_span_covers_weekends_and_holidays() {
        assert_eq!(calendar_span(5), 14);
        assert_eq!(calendar_span(15), 28);
        assert_eq!(calendar_span(30), 49);
        assert!(calendar_span(0) > 0);
    }
}

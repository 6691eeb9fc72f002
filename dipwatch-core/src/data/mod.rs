//! Market data, headline, and indicator providers

pub mod circuit_breaker;
pub mod indicator_api;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use indicator_api::{AlphaVantage, Finnhub, Resolution, TwelveData};
pub use provider::{calendar_span, DataError, MarketDataProvider, NewsProvider, NoNews};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;

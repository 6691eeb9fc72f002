//! Fetch phase: per-ticker price history, headlines and oscillator readings.
//!
//! Tickers are processed in parallel with rayon; inside a ticker the bar
//! history and the headline fetch run concurrently, and the oscillator panel
//! fans out to its sources in parallel. Every failure is absorbed here and
//! turns into missing data on the report, so one bad ticker or provider never
//! affects another.

use crate::config::{AppConfig, Credentials};
use chrono::NaiveDate;
use dipwatch_core::bundle::assemble;
use dipwatch_core::data::{
    AlphaVantage, CircuitBreaker, DataError, Finnhub, MarketDataProvider, NewsProvider, NoNews,
    SyntheticProvider, TwelveData, YahooProvider,
};
use dipwatch_core::domain::{Headline, SignalBundle};
use dipwatch_core::indicators::RSI_PERIOD;
use dipwatch_core::oscillator::{LocalOscillator, OscillatorPanel, OscillatorSource};
use dipwatch_core::sentiment::{SentimentScorer, HEADLINE_LIMIT};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything the fetch phase reads from.
#[derive(Clone)]
pub struct Sources {
    pub market: Arc<dyn MarketDataProvider>,
    pub news: Arc<dyn NewsProvider>,
    pub panel: OscillatorPanel,
    pub scorer: SentimentScorer,
    pub lookback_days: u32,
}

impl Sources {
    /// Live sources: Yahoo for bars and headlines, the local RSI plus every
    /// enabled indicator API that has a key.
    pub fn live(config: &AppConfig, credentials: &Credentials) -> Result<Self, DataError> {
        let timeout = config.providers.timeout();
        let yahoo = Arc::new(YahooProvider::new(
            Arc::new(CircuitBreaker::default_provider()),
            timeout,
        )?);

        let providers = &config.providers;
        let resolution = providers.resolution;
        let mut oscillators: Vec<Arc<dyn OscillatorSource>> = vec![Arc::new(LocalOscillator)];

        match (providers.alpha_vantage, &credentials.alpha_vantage_key) {
            (true, Some(key)) => {
                oscillators.push(Arc::new(AlphaVantage::new(key.clone(), timeout, resolution)?))
            }
            (true, None) => warn!("ALPHA_VANTAGE_KEY not set; skipping alpha_vantage"),
            (false, _) => {}
        }
        match (providers.twelve_data, &credentials.twelve_data_key) {
            (true, Some(key)) => {
                oscillators.push(Arc::new(TwelveData::new(key.clone(), timeout, resolution)?))
            }
            (true, None) => warn!("TWELVE_DATA_KEY not set; skipping twelve_data"),
            (false, _) => {}
        }
        match (providers.finnhub, &credentials.finnhub_key) {
            (true, Some(key)) => {
                oscillators.push(Arc::new(Finnhub::new(key.clone(), timeout, resolution)?))
            }
            (true, None) => warn!("FINNHUB_KEY not set; skipping finnhub"),
            (false, _) => {}
        }

        let panel = OscillatorPanel::new(oscillators, RSI_PERIOD);
        info!(sources = ?panel.source_names(), "oscillator panel ready");

        Ok(Self {
            market: yahoo.clone(),
            news: yahoo,
            panel,
            scorer: SentimentScorer::default(),
            lookback_days: config.lookback_days,
        })
    }

    /// Offline sources: deterministic synthetic bars, no headlines, local RSI.
    pub fn synthetic(config: &AppConfig, as_of: NaiveDate) -> Self {
        Self {
            market: Arc::new(SyntheticProvider::new(as_of)),
            news: Arc::new(NoNews),
            panel: OscillatorPanel::local_only(RSI_PERIOD),
            scorer: SentimentScorer::default(),
            lookback_days: config.lookback_days,
        }
    }
}

/// Fetch-phase result for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerReport {
    pub symbol: String,
    /// `None` when the price change could not be computed.
    pub bundle: Option<SignalBundle>,
    pub headlines: Vec<Headline>,
}

/// Fetch and assemble one ticker.
pub fn fetch_ticker(sources: &Sources, symbol: &str) -> TickerReport {
    let (bars, headlines) = rayon::join(
        || sources.market.fetch_bars(symbol, sources.lookback_days),
        || sources.news.headlines(symbol, HEADLINE_LIMIT),
    );

    let bars = bars.unwrap_or_else(|e| {
        warn!(symbol, provider = sources.market.name(), error = %e, "price history unavailable");
        Vec::new()
    });
    let headlines = headlines.unwrap_or_else(|e| {
        warn!(symbol, provider = sources.news.name(), error = %e, "headlines unavailable");
        Vec::new()
    });

    let oscillator = sources.panel.read(symbol, &bars);
    let sentiment = sources.scorer.score_headlines(&headlines);
    let bundle = assemble(symbol, &bars, &oscillator, sentiment);

    match &bundle {
        Some(b) => debug!(
            symbol,
            change_pct = b.change_pct,
            volume_ratio = ?b.volume_ratio,
            oscillator = ?b.oscillator,
            sentiment = b.sentiment,
            "signals"
        ),
        None => warn!(symbol, bars = bars.len(), "not enough history for a price change"),
    }

    TickerReport {
        symbol: symbol.to_string(),
        bundle,
        headlines,
    }
}

/// Fetch every symbol in parallel. Output order matches `symbols`.
pub fn fetch_all(sources: &Sources, symbols: &[String]) -> Vec<TickerReport> {
    symbols
        .par_iter()
        .map(|symbol| fetch_ticker(sources, symbol))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dipwatch_core::domain::Bar;

    struct Broken;

    impl MarketDataProvider for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn fetch_bars(&self, _: &str, _: u32) -> Result<Vec<Bar>, DataError> {
            Err(DataError::NetworkUnreachable("offline".into()))
        }
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn synthetic_sources_produce_bundles_in_order() {
        let sources = Sources::synthetic(&AppConfig::default(), as_of());
        let symbols = vec!["TSLA".to_string(), "AAPL".to_string(), "NVDA".to_string()];
        let reports = fetch_all(&sources, &symbols);

        let order: Vec<&str> = reports.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["TSLA", "AAPL", "NVDA"]);
        for r in &reports {
            let bundle = r.bundle.as_ref().unwrap();
            assert!(bundle.oscillator.is_some());
            assert_eq!(bundle.sentiment, 0.0);
            assert!(r.headlines.is_empty());
        }
    }

    #[test]
    fn broken_market_data_yields_no_bundle() {
        let mut sources = Sources::synthetic(&AppConfig::default(), as_of());
        sources.market = Arc::new(Broken);
        let report = fetch_ticker(&sources, "NVDA");
        assert!(report.bundle.is_none());
    }
}

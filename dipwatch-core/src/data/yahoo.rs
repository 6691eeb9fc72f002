//! Yahoo Finance provider: daily bars (v8 chart API) and headlines (search API).
//!
//! Yahoo has no official API and changes response shapes without notice, so
//! every parse failure maps to `DataError::ResponseFormatChanged` and the
//! pipeline treats it as missing data.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{calendar_span, DataError, MarketDataProvider, NewsProvider};
use crate::domain::{normalize_series, Bar, Headline};
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    title: Option<String>,
    link: Option<String>,
}

/// Yahoo Finance provider for both bars and headlines.
pub struct YahooProvider {
    client: Client,
    base_url: String,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>, timeout: Duration) -> Result<Self, DataError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            circuit_breaker,
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Point the provider at another host (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// GET with retry, backoff, and circuit breaker bookkeeping.
    fn get_with_retry(&self, url: &str, query: &[(&str, String)]) -> Result<Response, DataError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                std::thread::sleep(self.base_delay * 2u32.pow(attempt - 1));
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(url).query(query).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    self.circuit_breaker.record_failure();
                    last_error = Some(DataError::from_transport(e));
                    continue;
                }
                Err(e) => return Err(DataError::from_transport(e)),
            };

            let status = resp.status();
            if status == StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }
            if status == StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after_secs = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited { retry_after_secs });
                continue;
            }
            if status == StatusCode::UNAUTHORIZED {
                return Err(DataError::AuthenticationRequired(
                    "Yahoo Finance requires authentication".into(),
                ));
            }
            if status == StatusCode::NOT_FOUND {
                // Chart API answers unknown symbols with 404 and an error body.
                return Ok(resp);
            }
            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Http {
                    status: status.as_u16(),
                    context: url.to_string(),
                });
                continue;
            }

            self.circuit_breaker.record_success();
            return Ok(resp);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

/// Parse a chart API body into bars.
fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<Vec<Bar>, DataError> {
    let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
        Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(err) => DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
        None => DataError::ResponseFormatChanged("empty result with no error".into()),
    })?;

    let data = result
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

    // No timestamps means no sessions in range, which is a valid empty answer.
    let Some(timestamps) = data.timestamp else {
        return Ok(Vec::new());
    };

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.naive_utc().date())
            .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;

        let close = quote.close.get(i).copied().flatten();
        // Holidays and the not-yet-printed live bar come back as nulls.
        let Some(close) = close else {
            continue;
        };

        bars.push(Bar {
            date,
            open: quote.open.get(i).copied().flatten().unwrap_or(close),
            high: quote.high.get(i).copied().flatten().unwrap_or(close),
            low: quote.low.get(i).copied().flatten().unwrap_or(close),
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }

    Ok(normalize_series(bars))
}

fn parse_news(resp: SearchResponse, limit: usize) -> Vec<Headline> {
    resp.news
        .into_iter()
        .filter_map(|item| match (item.title, item.link) {
            (Some(title), Some(link)) if !title.trim().is_empty() => Some(Headline {
                title: title.trim().to_string(),
                link,
            }),
            _ => None,
        })
        .take(limit)
        .collect()
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_bars(&self, symbol: &str, lookback_days: u32) -> Result<Vec<Bar>, DataError> {
        let end = Utc::now();
        let start = end - ChronoDuration::days(calendar_span(lookback_days));
        let url = format!("{}/v8/finance/chart/{symbol}", self.base_url);
        let query = [
            ("period1", start.timestamp().to_string()),
            ("period2", end.timestamp().to_string()),
            ("interval", "1d".to_string()),
        ];

        let resp = self.get_with_retry(&url, &query)?;
        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse chart for {symbol}: {e}"))
        })?;
        let bars = parse_chart(symbol, chart)?;
        debug!(symbol, bars = bars.len(), "yahoo bars fetched");
        Ok(bars)
    }
}

impl NewsProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_search"
    }

    fn headlines(&self, symbol: &str, limit: usize) -> Result<Vec<Headline>, DataError> {
        let url = format!("{}/v1/finance/search", self.base_url);
        let query = [
            ("q", symbol.to_string()),
            ("quotesCount", "0".to_string()),
            ("newsCount", limit.to_string()),
        ];
        let resp = self.get_with_retry(&url, &query)?;
        if !resp.status().is_success() {
            warn!(symbol, status = %resp.status(), "headline search failed");
            return Err(DataError::Http {
                status: resp.status().as_u16(),
                context: url,
            });
        }
        let body: SearchResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse news for {symbol}: {e}"))
        })?;
        Ok(parse_news(body, limit))
    }
}

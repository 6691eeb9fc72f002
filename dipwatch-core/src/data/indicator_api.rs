//! External RSI providers: Alpha Vantage, Twelve Data and Finnhub.
//!
//! Each provider is an independent `OscillatorSource` with its own token,
//! base URL and HTTP client timeout. Nothing here returns an error to the
//! caller: transport failures, non-2xx statuses, provider error bodies and
//! unparseable numbers all become `OscillatorReading::Unavailable`.

use super::provider::DataError;
use crate::domain::Bar;
use crate::oscillator::{OscillatorReading, OscillatorSource};
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;

/// Bar resolution requested from the providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    #[default]
    Daily,
    Weekly,
}

impl Resolution {
    fn alpha_vantage(self) -> &'static str {
        match self {
            Resolution::Daily => "daily",
            Resolution::Weekly => "weekly",
        }
    }

    fn twelve_data(self) -> &'static str {
        match self {
            Resolution::Daily => "1day",
            Resolution::Weekly => "1week",
        }
    }

    fn finnhub(self) -> &'static str {
        match self {
            Resolution::Daily => "D",
            Resolution::Weekly => "W",
        }
    }
}

/// Shared HTTP plumbing for a token-authenticated JSON endpoint.
#[derive(Debug, Clone)]
struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    fn new(base_url: &str, token: String, timeout: Duration) -> Result<Self, DataError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, DataError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(DataError::from_transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::Http {
                status: status.as_u16(),
                context: url,
            });
        }
        resp.json::<T>()
            .map_err(|e| DataError::ResponseFormatChanged(e.to_string()))
    }
}

/// Collapse a provider result into a reading, logging the failure once.
fn into_reading(provider: &str, symbol: &str, result: Result<f64, DataError>) -> OscillatorReading {
    match result {
        Ok(value) => OscillatorReading::from_raw(value),
        Err(e) => {
            warn!(provider, symbol, error = %e, "oscillator provider unavailable");
            OscillatorReading::Unavailable(e.to_string())
        }
    }
}

fn parse_number(raw: &str) -> Result<f64, DataError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| DataError::ResponseFormatChanged(format!("not a number: {raw:?}")))
}

// ─── Alpha Vantage ──────────────────────────────────────────────────

pub const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co";

#[derive(Debug, Deserialize)]
struct AlphaVantageResponse {
    #[serde(rename = "Technical Analysis: RSI")]
    analysis: Option<BTreeMap<String, AlphaVantagePoint>>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlphaVantagePoint {
    #[serde(rename = "RSI")]
    rsi: String,
}

impl AlphaVantageResponse {
    fn latest(self) -> Result<f64, DataError> {
        if let Some(msg) = self.error_message {
            return Err(DataError::Other(msg));
        }
        if let Some(msg) = self.note.or(self.information) {
            // Free tier throttling is reported in a 200 body.
            return Err(DataError::Other(format!("throttled: {msg}")));
        }
        let analysis = self
            .analysis
            .ok_or_else(|| DataError::ResponseFormatChanged("missing RSI series".into()))?;
        // ISO dates sort lexicographically, so the last key is the newest.
        let (_, point) = analysis
            .into_iter()
            .next_back()
            .ok_or_else(|| DataError::ResponseFormatChanged("empty RSI series".into()))?;
        parse_number(&point.rsi)
    }
}

pub struct AlphaVantage {
    api: ApiClient,
    resolution: Resolution,
}

impl AlphaVantage {
    pub fn new(token: String, timeout: Duration, resolution: Resolution) -> Result<Self, DataError> {
        Self::with_base_url(ALPHA_VANTAGE_URL, token, timeout, resolution)
    }

    pub fn with_base_url(
        base_url: &str,
        token: String,
        timeout: Duration,
        resolution: Resolution,
    ) -> Result<Self, DataError> {
        Ok(Self {
            api: ApiClient::new(base_url, token, timeout)?,
            resolution,
        })
    }

    fn latest(&self, symbol: &str, period: usize) -> Result<f64, DataError> {
        let query = [
            ("function", "RSI".to_string()),
            ("symbol", symbol.to_string()),
            ("interval", self.resolution.alpha_vantage().to_string()),
            ("time_period", period.to_string()),
            ("series_type", "close".to_string()),
            ("apikey", self.api.token.clone()),
        ];
        self.api
            .get_json::<AlphaVantageResponse>("/query", &query)?
            .latest()
    }
}

impl OscillatorSource for AlphaVantage {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn fetch(&self, symbol: &str, _bars: &[Bar], period: usize) -> OscillatorReading {
        into_reading(self.name(), symbol, self.latest(symbol, period))
    }
}

// ─── Twelve Data ────────────────────────────────────────────────────

pub const TWELVE_DATA_URL: &str = "https://api.twelvedata.com";

#[derive(Debug, Deserialize)]
struct TwelveDataResponse {
    status: Option<String>,
    message: Option<String>,
    #[serde(default)]
    values: Vec<TwelveDataPoint>,
}

#[derive(Debug, Deserialize)]
struct TwelveDataPoint {
    rsi: String,
}

impl TwelveDataResponse {
    fn latest(self) -> Result<f64, DataError> {
        if self.status.as_deref() == Some("error") {
            return Err(DataError::Other(
                self.message.unwrap_or_else(|| "provider reported an error".into()),
            ));
        }
        // Values are returned newest first.
        let point = self
            .values
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("empty values".into()))?;
        parse_number(&point.rsi)
    }
}

pub struct TwelveData {
    api: ApiClient,
    resolution: Resolution,
}

impl TwelveData {
    pub fn new(token: String, timeout: Duration, resolution: Resolution) -> Result<Self, DataError> {
        Self::with_base_url(TWELVE_DATA_URL, token, timeout, resolution)
    }

    pub fn with_base_url(
        base_url: &str,
        token: String,
        timeout: Duration,
        resolution: Resolution,
    ) -> Result<Self, DataError> {
        Ok(Self {
            api: ApiClient::new(base_url, token, timeout)?,
            resolution,
        })
    }

    fn latest(&self, symbol: &str, period: usize) -> Result<f64, DataError> {
        let query = [
            ("symbol", symbol.to_string()),
            ("interval", self.resolution.twelve_data().to_string()),
            ("time_period", period.to_string()),
            ("outputsize", "1".to_string()),
            ("apikey", self.api.token.clone()),
        ];
        self.api.get_json::<TwelveDataResponse>("/rsi", &query)?.latest()
    }
}

impl OscillatorSource for TwelveData {
    fn name(&self) -> &str {
        "twelve_data"
    }

    fn fetch(&self, symbol: &str, _bars: &[Bar], period: usize) -> OscillatorReading {
        into_reading(self.name(), symbol, self.latest(symbol, period))
    }
}

// ─── Finnhub ────────────────────────────────────────────────────────

pub const FINNHUB_URL: &str = "https://finnhub.io/api/v1";

/// Calendar days requested so the provider has enough sessions to seed RSI.
const FINNHUB_WINDOW_DAYS: i64 = 90;

#[derive(Debug, Deserialize)]
struct FinnhubResponse {
    error: Option<String>,
    s: Option<String>,
    #[serde(default)]
    rsi: Vec<Option<f64>>,
}

impl FinnhubResponse {
    fn latest(self) -> Result<f64, DataError> {
        if let Some(msg) = self.error {
            return Err(DataError::Other(msg));
        }
        if self.s.as_deref() == Some("no_data") {
            return Err(DataError::Other("no data".into()));
        }
        self.rsi
            .into_iter()
            .rev()
            .flatten()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("empty rsi array".into()))
    }
}

pub struct Finnhub {
    api: ApiClient,
    resolution: Resolution,
}

impl Finnhub {
    pub fn new(token: String, timeout: Duration, resolution: Resolution) -> Result<Self, DataError> {
        Self::with_base_url(FINNHUB_URL, token, timeout, resolution)
    }

    pub fn with_base_url(
        base_url: &str,
        token: String,
        timeout: Duration,
        resolution: Resolution,
    ) -> Result<Self, DataError> {
        Ok(Self {
            api: ApiClient::new(base_url, token, timeout)?,
            resolution,
        })
    }

    fn latest(&self, symbol: &str, period: usize) -> Result<f64, DataError> {
        let to = Utc::now();
        let from = to - ChronoDuration::days(FINNHUB_WINDOW_DAYS);
        let query = [
            ("symbol", symbol.to_string()),
            ("resolution", self.resolution.finnhub().to_string()),
            ("from", from.timestamp().to_string()),
            ("to", to.timestamp().to_string()),
            ("indicator", "rsi".to_string()),
            ("timeperiod", period.to_string()),
            ("token", self.api.token.clone()),
        ];
        self.api.get_json::<FinnhubResponse>("/indicator", &query)?.latest()
    }
}

impl OscillatorSource for Finnhub {
    fn name(&self) -> &str {
        "finnhub"
    }

    fn fetch(&self, symbol: &str, _bars: &[Bar], period: usize) -> OscillatorReading {
        into_reading(self.name(), symbol, self.latest(symbol, period))
    }
}

//! Run configuration and credentials.
//!
//! Configuration is read once from a TOML file into an immutable
//! [`AppConfig`]; credentials are read once from the environment into
//! [`Credentials`]. Both are passed explicitly into the components that need
//! them. A missing or malformed file is not fatal: [`AppConfig::load_or_empty`]
//! degrades to an empty watchlist, which makes the run a no-op.

use chrono::NaiveTime;
use chrono_tz::Tz;
use dipwatch_core::alert::DropThreshold;
use dipwatch_core::data::Resolution;
use dipwatch_core::indicators::RSI_PERIOD;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "dipwatch.toml";
pub const DEFAULT_LOG_PATH: &str = "alerts_log.csv";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;
/// Fewest sessions that still leave a full RSI window.
pub const MIN_LOOKBACK_DAYS: u32 = RSI_PERIOD as u32 + 1;
pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Starter file written by `dipwatch init-config`.
pub const CONFIG_TEMPLATE: &str = r#"# DipWatch configuration.
# Credentials are read from the environment, never from this file.

# Trading sessions of daily bars to fetch per ticker (at least 15).
lookback_days = 30

[watchlist]
# Alert when the day's drop is at least min_drop_pct and, if set,
# at most max_drop_pct. A bare number is shorthand for min_drop_pct.
NVDA = { min_drop_pct = 1.0, max_drop_pct = 3.0 }
MSFT = { min_drop_pct = 1.0, max_drop_pct = 3.0 }
TSLA = 2.0
GOOGL = 2.0

# Remove this table to run at any time. Times are local to `timezone`
# (an IANA name), so daylight saving is followed automatically.
[schedule]
timezone = "America/New_York"
open = "09:30"
close = "16:00"
weekdays_only = true

[providers]
timeout_secs = 10
resolution = "daily"
alpha_vantage = true
twelve_data = true
finnhub = true

[log]
path = "alerts_log.csv"
"#;

/// Errors loading or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("refusing to overwrite existing config {0}")]
    AlreadyExists(PathBuf),
}

/// One watchlist entry as written in TOML: either a bare minimum drop or a
/// table with an optional upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum WatchEntryToml {
    Min(f64),
    Band(DropThreshold),
}

impl WatchEntryToml {
    fn into_threshold(self) -> DropThreshold {
        match self {
            WatchEntryToml::Min(min) => DropThreshold::new(min),
            WatchEntryToml::Band(threshold) => threshold,
        }
    }
}

/// A watched ticker and its alert threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub symbol: String,
    pub threshold: DropThreshold,
}

/// Market-hours window as written in TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub open: String,
    pub close: String,
    #[serde(default = "default_true")]
    pub weekdays_only: bool,
}

impl ScheduleConfig {
    /// Resolve `timezone` in the IANA database.
    pub fn parse_timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone.trim().parse::<Tz>().map_err(|e| {
            ConfigError::InvalidSchedule(format!("timezone = {:?}: {e}", self.timezone))
        })
    }

    /// Parse `open`/`close` as `HH:MM`; `open` must come first.
    pub fn parse_times(&self) -> Result<(NaiveTime, NaiveTime), ConfigError> {
        let parse = |field: &str, value: &str| {
            NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| {
                ConfigError::InvalidSchedule(format!("{field} = {value:?}: {e}"))
            })
        };
        let open = parse("open", &self.open)?;
        let close = parse("close", &self.close)?;
        if open >= close {
            return Err(ConfigError::InvalidSchedule(format!(
                "open ({}) must be before close ({})",
                self.open, self.close
            )));
        }
        Ok((open, close))
    }
}

/// Which external oscillator providers to query, and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub timeout_secs: u64,
    pub resolution: Resolution,
    pub alpha_vantage: bool,
    pub twelve_data: bool,
    pub finnhub: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            resolution: Resolution::Daily,
            alpha_vantage: true,
            twelve_data: true,
            finnhub: true,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub path: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_lookback() -> u32 {
    DEFAULT_LOOKBACK_DAYS
}

#[derive(Debug, Deserialize)]
struct ConfigToml {
    #[serde(default = "default_lookback")]
    lookback_days: u32,
    #[serde(default)]
    watchlist: BTreeMap<String, WatchEntryToml>,
    #[serde(default)]
    schedule: Option<ScheduleConfig>,
    #[serde(default)]
    providers: ProviderConfig,
    #[serde(default)]
    log: LogConfig,
}

/// Validated, immutable run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Trading sessions of history per ticker.
    pub lookback_days: u32,
    /// Sorted by symbol.
    pub watchlist: Vec<WatchEntry>,
    pub schedule: Option<ScheduleConfig>,
    pub providers: ProviderConfig,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            watchlist: Vec::new(),
            schedule: None,
            providers: ProviderConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse and validate TOML text.
    ///
    /// Watchlist entries with unusable thresholds are dropped with a warning
    /// rather than failing the whole file. Symbols are case-insensitive; when
    /// two keys name the same ticker the first in key order wins.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: ConfigToml = toml::from_str(text)?;
        if let Some(schedule) = &raw.schedule {
            schedule.parse_timezone()?;
            schedule.parse_times()?;
        }

        let mut seen = HashSet::new();
        let mut watchlist: Vec<WatchEntry> = raw
            .watchlist
            .into_iter()
            .filter_map(|(symbol, entry)| {
                let threshold = entry.into_threshold();
                let symbol = symbol.trim().to_uppercase();
                if symbol.is_empty() {
                    warn!("dropping watchlist entry with empty symbol");
                    return None;
                }
                if !threshold.is_valid() {
                    warn!(
                        symbol = %symbol,
                        min_drop_pct = threshold.min_drop_pct,
                        max_drop_pct = ?threshold.max_drop_pct,
                        "dropping watchlist entry with invalid threshold"
                    );
                    return None;
                }
                if !seen.insert(symbol.clone()) {
                    warn!(symbol = %symbol, "dropping duplicate watchlist entry");
                    return None;
                }
                Some(WatchEntry { symbol, threshold })
            })
            .collect();
        watchlist.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let lookback_days = if raw.lookback_days < MIN_LOOKBACK_DAYS {
            warn!(
                lookback_days = raw.lookback_days,
                min = MIN_LOOKBACK_DAYS,
                "lookback too short for RSI; raising to minimum"
            );
            MIN_LOOKBACK_DAYS
        } else {
            raw.lookback_days
        };

        Ok(Self {
            lookback_days,
            watchlist,
            schedule: raw.schedule,
            providers: raw.providers,
            log: raw.log,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load `path`, falling back to an empty configuration on any error.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config unavailable; using empty watchlist");
                Self::default()
            }
        }
    }

    pub fn symbols(&self) -> Vec<String> {
        self.watchlist.iter().map(|e| e.symbol.clone()).collect()
    }

    pub fn threshold_for(&self, symbol: &str) -> Option<DropThreshold> {
        self.watchlist
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| e.threshold)
    }
}

/// Write [`CONFIG_TEMPLATE`] to `path`. Never overwrites.
pub fn write_template(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }
    std::fs::write(path, CONFIG_TEMPLATE).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Credentials ──────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq)]
pub struct EmailCredentials {
    pub from: String,
    pub to: String,
    pub password: String,
    pub smtp_host: String,
}

impl std::fmt::Debug for EmailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailCredentials")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("password", &"<redacted>")
            .field("smtp_host", &self.smtp_host)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    pub token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Secrets for every optional channel and provider. `None` means the
/// corresponding component is not constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: Option<EmailCredentials>,
    pub telegram: Option<TelegramCredentials>,
    pub alpha_vantage_key: Option<String>,
    pub twelve_data_key: Option<String>,
    pub finnhub_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let email = match (get("EMAIL_FROM"), get("EMAIL_APP_PASSWORD")) {
            (Some(from), Some(password)) => Some(EmailCredentials {
                to: get("EMAIL_TO").unwrap_or_else(|| from.clone()),
                from,
                password,
                smtp_host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            }),
            _ => None,
        };

        let telegram = match (get("TELEGRAM_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(token), Some(chat_id)) => Some(TelegramCredentials { token, chat_id }),
            _ => None,
        };

        Self {
            email,
            telegram,
            alpha_vantage_key: get("ALPHA_VANTAGE_KEY"),
            twelve_data_key: get("TWELVE_DATA_KEY"),
            finnhub_key: get("FINNHUB_KEY"),
        }
    }
}

//! DipWatch Runner: configuration, run gating, fetch phase, dispatch, alert log.
//!
//! This crate builds on `dipwatch-core` to provide:
//! - TOML configuration and environment credentials
//! - Market-hours gate in the exchange's own time zone
//! - Parallel per-ticker fetch phase with failure isolation
//! - Telegram and SMTP email delivery
//! - Append-only CSV alert log
//! - The `Runner` that sequences one pass over the watchlist

pub mod alert_log;
pub mod config;
pub mod dispatch;
pub mod fetch;
pub mod runner;
pub mod schedule;

pub use alert_log::{AlertLog, AlertLogEntry, LogError};
pub use config::{
    write_template, AppConfig, ConfigError, Credentials, EmailCredentials, ProviderConfig,
    ScheduleConfig, TelegramCredentials, WatchEntry, CONFIG_TEMPLATE, DEFAULT_CONFIG_PATH,
};
pub use dispatch::{
    dispatch_all, notifiers_from, DispatchError, DispatchReport, EmailNotifier, Notifier,
    TelegramNotifier,
};
pub use fetch::{fetch_all, fetch_ticker, Sources, TickerReport};
pub use runner::{
    evaluate_report, RunError, RunOptions, RunStatus, RunSummary, Runner, TickerOutcome,
};
pub use schedule::{MarketHours, RunGate};

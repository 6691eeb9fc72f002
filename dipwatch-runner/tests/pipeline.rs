//! Full-run integration tests with in-memory providers and channels.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use dipwatch_core::alert::AlertDigest;
use dipwatch_core::data::{DataError, MarketDataProvider, NewsProvider};
use dipwatch_core::domain::{Bar, Headline, Recommendation};
use dipwatch_core::indicators::RSI_PERIOD;
use dipwatch_core::oscillator::OscillatorPanel;
use dipwatch_core::sentiment::SentimentScorer;
use dipwatch_runner::{
    AppConfig, DispatchError, Notifier, RunOptions, RunStatus, Runner, Sources,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

// ── Fakes ────────────────────────────────────────────────────────────

/// Serves a fixed last-day change per symbol on top of a flat history.
struct FakeMarket {
    changes: HashMap<String, f64>,
}

impl FakeMarket {
    fn new(changes: &[(&str, f64)]) -> Self {
        Self {
            changes: changes.iter().map(|(s, c)| (s.to_string(), *c)).collect(),
        }
    }
}

impl MarketDataProvider for FakeMarket {
    fn name(&self) -> &str {
        "fake"
    }

    fn fetch_bars(&self, symbol: &str, _lookback_days: u32) -> Result<Vec<Bar>, DataError> {
        let change = *self
            .changes
            .get(symbol)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut closes: Vec<f64> = (0..19)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        closes.push(100.0 * (1.0 + change / 100.0));
        Ok(closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: base + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000_000,
            })
            .collect())
    }
}

struct FakeNews;

impl NewsProvider for FakeNews {
    fn name(&self) -> &str {
        "fake_news"
    }

    fn headlines(&self, symbol: &str, _limit: usize) -> Result<Vec<Headline>, DataError> {
        Ok(vec![Headline {
            title: format!("{symbol} shares slip in quiet trade"),
            link: format!("https://news.example.com/{symbol}"),
        }])
    }
}

#[derive(Clone, Default)]
struct Recorder {
    sent: Arc<Mutex<Vec<AlertDigest>>>,
}

impl Recorder {
    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Notifier for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn send(&self, digest: &AlertDigest) -> Result<(), DispatchError> {
        self.sent.lock().unwrap().push(digest.clone());
        Ok(())
    }
}

struct Failing;

impl Notifier for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn send(&self, _: &AlertDigest) -> Result<(), DispatchError> {
        Err(DispatchError::Rejected {
            status: 503,
            body: "unavailable".into(),
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

const WATCHLIST: &str = r#"
[watchlist]
NVDA = 3.0
MSFT = { min_drop_pct = 3.0 }
"#;

fn config(toml: &str, log_dir: &Path) -> AppConfig {
    let mut config = AppConfig::from_toml_str(toml).unwrap();
    config.log.path = log_dir.join("alerts_log.csv");
    config
}

fn sources(market: FakeMarket) -> Sources {
    Sources {
        market: Arc::new(market),
        news: Arc::new(FakeNews),
        panel: OscillatorPanel::local_only(RSI_PERIOD),
        scorer: SentimentScorer::default(),
        lookback_days: 30,
    }
}

fn runner(config: AppConfig, market: FakeMarket, recorder: &Recorder) -> Runner {
    Runner::new(config, sources(market), vec![Box::new(recorder.clone())]).unwrap()
}

/// Tuesday 2024-01-16 15:00 UTC.
fn weekday_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 16, 15, 0, 0).unwrap()
}

fn forced() -> RunOptions {
    RunOptions {
        force: true,
        ..RunOptions::default()
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[test]
fn only_tickers_past_threshold_alert() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let runner = runner(
        config(WATCHLIST, dir.path()),
        FakeMarket::new(&[("NVDA", -4.0), ("MSFT", -1.0)]),
        &recorder,
    );

    let summary = runner.run_once(forced(), weekday_noon());
    assert_eq!(summary.status, RunStatus::Alerted);
    assert_eq!(summary.tickers.len(), 2);
    assert_eq!(summary.eligible_count(), 1);
    assert_eq!(summary.logged, 1);

    let sent = recorder.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].count, 1);
    assert!(sent[0].text.contains("NVDA dropped"));
    assert!(!sent[0].text.contains("MSFT"));
    assert!(sent[0].html.contains("https://news.example.com/NVDA"));

    let rows = runner.log().read_all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].ticker, "NVDA");
    assert_eq!(rows[0].change_pct, -4.0);
    assert!((rows[0].price - 96.0).abs() < 1e-9);
}

#[test]
fn zero_eligible_means_no_dispatch_and_no_log() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let runner = runner(
        config(WATCHLIST, dir.path()),
        FakeMarket::new(&[("NVDA", -1.0), ("MSFT", 2.5)]),
        &recorder,
    );

    let summary = runner.run_once(forced(), weekday_noon());
    assert_eq!(summary.status, RunStatus::NoAlerts);
    assert!(summary.digest.is_none());
    assert!(summary.dispatch.is_none());
    assert_eq!(recorder.count(), 0);
    assert!(!runner.log().path().exists());
}

#[test]
fn log_header_written_once_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let runner = runner(
        config(WATCHLIST, dir.path()),
        FakeMarket::new(&[("NVDA", -4.0), ("MSFT", -5.0)]),
        &recorder,
    );

    runner.run_once(forced(), weekday_noon());
    runner.run_once(forced(), weekday_noon());

    let text = std::fs::read_to_string(runner.log().path()).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("timestamp,")).count(), 1);
    assert_eq!(runner.log().read_all().unwrap().len(), 4);
    assert_eq!(recorder.count(), 2);
}

#[test]
fn market_hours_gate_and_force() {
    let dir = tempfile::tempdir().unwrap();
    let toml = format!(
        "{WATCHLIST}\n[schedule]\ntimezone = \"America/New_York\"\nopen = \"09:30\"\nclose = \"16:00\"\n"
    );
    let recorder = Recorder::default();
    let runner = runner(
        config(&toml, dir.path()),
        FakeMarket::new(&[("NVDA", -4.0), ("MSFT", -1.0)]),
        &recorder,
    );
    let saturday = Utc.with_ymd_and_hms(2024, 1, 20, 15, 0, 0).unwrap();

    let summary = runner.run_once(RunOptions::default(), saturday);
    assert_eq!(summary.status, RunStatus::MarketClosed);
    assert!(summary.tickers.is_empty());
    assert_eq!(recorder.count(), 0);

    // force skips the hours gate but the drop gate still applies.
    let summary = runner.run_once(forced(), saturday);
    assert_eq!(summary.status, RunStatus::Alerted);
    assert_eq!(summary.eligible_count(), 1);

    // In session, no force needed.
    let summary = runner.run_once(RunOptions::default(), weekday_noon());
    assert_eq!(summary.status, RunStatus::Alerted);

    // Summer: 20:30 UTC is 16:30 EDT, after the close.
    let july_evening = Utc.with_ymd_and_hms(2024, 7, 16, 20, 30, 0).unwrap();
    let summary = runner.run_once(RunOptions::default(), july_evening);
    assert_eq!(summary.status, RunStatus::MarketClosed);
}

#[test]
fn bypass_threshold_alerts_everything_but_respects_hours() {
    let dir = tempfile::tempdir().unwrap();
    let toml = format!(
        "{WATCHLIST}\n[schedule]\ntimezone = \"America/New_York\"\nopen = \"09:30\"\nclose = \"16:00\"\n"
    );
    let recorder = Recorder::default();
    let runner = runner(
        config(&toml, dir.path()),
        FakeMarket::new(&[("NVDA", -0.5), ("MSFT", 1.0)]),
        &recorder,
    );
    let bypass = RunOptions {
        bypass_threshold: true,
        ..RunOptions::default()
    };

    let saturday = Utc.with_ymd_and_hms(2024, 1, 20, 15, 0, 0).unwrap();
    assert_eq!(runner.run_once(bypass, saturday).status, RunStatus::MarketClosed);

    let summary = runner.run_once(bypass, weekday_noon());
    assert_eq!(summary.status, RunStatus::Alerted);
    assert_eq!(summary.eligible_count(), 2);
    let digest = summary.digest.unwrap();
    assert_eq!(digest.count, 2);
    assert!(digest.text.contains("MSFT rose"));
}

#[test]
fn dry_run_composes_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let runner = runner(
        config(WATCHLIST, dir.path()),
        FakeMarket::new(&[("NVDA", -4.0), ("MSFT", -1.0)]),
        &recorder,
    );

    let options = RunOptions {
        force: true,
        dry_run: true,
        ..RunOptions::default()
    };
    let summary = runner.run_once(options, weekday_noon());
    assert_eq!(summary.status, RunStatus::DryRun);
    assert!(summary.digest.unwrap().text.starts_with("[2024-01-16 15:00] ALERT"));
    assert_eq!(recorder.count(), 0);
    assert!(!runner.log().path().exists());
}

#[test]
fn missing_config_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::load_or_empty(&dir.path().join("nope.toml"));
    let recorder = Recorder::default();
    let runner = runner(config, FakeMarket::new(&[]), &recorder);

    let summary = runner.run_once(forced(), weekday_noon());
    assert_eq!(summary.status, RunStatus::EmptyWatchlist);
    assert_eq!(recorder.count(), 0);
}

#[test]
fn unknown_symbol_does_not_affect_others() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let runner = runner(
        config(WATCHLIST, dir.path()),
        FakeMarket::new(&[("NVDA", -4.0)]),
        &recorder,
    );

    let summary = runner.run_once(forced(), weekday_noon());
    assert_eq!(summary.status, RunStatus::Alerted);
    let msft = summary.tickers.iter().find(|t| t.symbol == "MSFT").unwrap();
    assert!(msft.bundle.is_none());
    let nvda = summary.tickers.iter().find(|t| t.symbol == "NVDA").unwrap();
    assert!(nvda.eligible);
}

#[test]
fn failed_channel_still_logs() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let runner = Runner::new(
        config(WATCHLIST, dir.path()),
        sources(FakeMarket::new(&[("NVDA", -4.0), ("MSFT", -1.0)])),
        vec![Box::new(Failing), Box::new(recorder.clone())],
    )
    .unwrap();

    let summary = runner.run_once(forced(), weekday_noon());
    let dispatch = summary.dispatch.unwrap();
    assert_eq!(dispatch.failed.len(), 1);
    assert_eq!(dispatch.delivered, vec!["recorder"]);
    assert_eq!(summary.logged, 1);
}

#[test]
fn check_evaluates_unlisted_symbol() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let runner = runner(
        config(WATCHLIST, dir.path()),
        FakeMarket::new(&[("AMD", 0.5)]),
        &recorder,
    );

    let (outcome, alert) = runner.check("amd");
    assert_eq!(outcome.symbol, "AMD");
    assert!(outcome.eligible);
    assert_eq!(
        outcome.decision.unwrap().recommendation,
        Recommendation::Hold
    );
    assert!(alert.is_some());
    assert_eq!(recorder.count(), 0);
}

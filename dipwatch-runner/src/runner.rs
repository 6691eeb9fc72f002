//! Run orchestration: gate → fetch → decide → alert → dispatch and log.
//!
//! Two entry points:
//! - `Runner::run_once()`: one full pass over the watchlist. Used by `dipwatch run`.
//! - `Runner::check()`: fetch and evaluate one symbol without any delivery.
//!   Used by `dipwatch check`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use dipwatch_core::alert::{compose, Alert, AlertDigest, AlertGate, DropThreshold};
use dipwatch_core::data::DataError;
use dipwatch_core::decision::evaluate;
use dipwatch_core::domain::{Decision, SignalBundle};

use crate::alert_log::{AlertLog, AlertLogEntry};
use crate::config::{AppConfig, ConfigError};
use crate::dispatch::{dispatch_all, DispatchReport, Notifier};
use crate::fetch::{fetch_all, fetch_ticker, Sources, TickerReport};
use crate::schedule::RunGate;

/// Errors constructing a runner. A run itself never fails.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Per-invocation switches. The two overrides are independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Run even outside market hours.
    pub force: bool,
    /// Alert every ticker regardless of its drop threshold.
    pub bypass_threshold: bool,
    /// Compose the digest but do not dispatch or log it.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Outside the trading window; nothing fetched.
    MarketClosed,
    /// Empty or unusable watchlist; nothing fetched.
    EmptyWatchlist,
    /// Fetched and evaluated; no ticker crossed its threshold.
    NoAlerts,
    /// Digest composed but withheld because of `dry_run`.
    DryRun,
    /// Digest dispatched and logged.
    Alerted,
}

/// Evaluation of one ticker in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerOutcome {
    pub symbol: String,
    pub bundle: Option<SignalBundle>,
    pub decision: Option<Decision>,
    pub eligible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub status: RunStatus,
    pub tickers: Vec<TickerOutcome>,
    pub digest: Option<AlertDigest>,
    pub dispatch: Option<DispatchReport>,
    pub logged: usize,
}

impl RunSummary {
    fn skipped(status: RunStatus) -> Self {
        Self {
            status,
            tickers: Vec::new(),
            digest: None,
            dispatch: None,
            logged: 0,
        }
    }

    pub fn eligible_count(&self) -> usize {
        self.tickers.iter().filter(|t| t.eligible).count()
    }
}

/// Decide and gate one fetched ticker.
pub fn evaluate_report(
    report: TickerReport,
    threshold: &DropThreshold,
    gate: &AlertGate,
) -> (TickerOutcome, Option<Alert>) {
    let Some(bundle) = report.bundle else {
        return (
            TickerOutcome {
                symbol: report.symbol,
                bundle: None,
                decision: None,
                eligible: false,
            },
            None,
        );
    };

    let decision = evaluate(&bundle);
    let eligible = gate.is_eligible(&bundle, threshold);
    let outcome = TickerOutcome {
        symbol: report.symbol,
        bundle: Some(bundle.clone()),
        decision: Some(decision.clone()),
        eligible,
    };
    let alert = eligible.then(|| Alert {
        bundle,
        decision,
        headlines: report.headlines,
    });
    (outcome, alert)
}

pub struct Runner {
    config: AppConfig,
    gate: RunGate,
    sources: Sources,
    notifiers: Vec<Box<dyn Notifier>>,
    log: AlertLog,
}

impl Runner {
    pub fn new(
        config: AppConfig,
        sources: Sources,
        notifiers: Vec<Box<dyn Notifier>>,
    ) -> Result<Self, RunError> {
        let gate = RunGate::from_config(config.schedule.as_ref())?;
        let log = AlertLog::new(config.log.path.clone());
        Ok(Self {
            config,
            gate,
            sources,
            notifiers,
            log,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn log(&self) -> &AlertLog {
        &self.log
    }

    /// One pass over the watchlist at `now`.
    pub fn run_once(&self, options: RunOptions, now: DateTime<Utc>) -> RunSummary {
        if !options.force && !self.gate.is_open(now) {
            info!(now = %now, "outside market hours; skipping run (use --force to override)");
            return RunSummary::skipped(RunStatus::MarketClosed);
        }
        if self.config.watchlist.is_empty() {
            info!("watchlist is empty; nothing to do");
            return RunSummary::skipped(RunStatus::EmptyWatchlist);
        }

        let symbols = self.config.symbols();
        info!(tickers = symbols.len(), "fetch phase");
        let reports = fetch_all(&self.sources, &symbols);

        let alert_gate = AlertGate {
            bypass_threshold: options.bypass_threshold,
        };
        let mut tickers = Vec::with_capacity(reports.len());
        let mut alerts = Vec::new();
        for (entry, report) in self.config.watchlist.iter().zip(reports) {
            let (outcome, alert) = evaluate_report(report, &entry.threshold, &alert_gate);
            if let Some(decision) = &outcome.decision {
                info!(
                    symbol = %outcome.symbol,
                    recommendation = %decision.recommendation,
                    eligible = outcome.eligible,
                    "evaluated"
                );
            }
            tickers.push(outcome);
            alerts.extend(alert);
        }

        let local_now = self.gate.local_time(now);
        let Some(digest) = compose(&alerts, local_now) else {
            info!("no ticker crossed its threshold; nothing dispatched");
            return RunSummary {
                status: RunStatus::NoAlerts,
                tickers,
                digest: None,
                dispatch: None,
                logged: 0,
            };
        };

        if options.dry_run {
            info!(alerts = digest.count, "dry run; digest not dispatched");
            return RunSummary {
                status: RunStatus::DryRun,
                tickers,
                digest: Some(digest),
                dispatch: None,
                logged: 0,
            };
        }

        let dispatch = dispatch_all(&self.notifiers, &digest);
        let entries: Vec<AlertLogEntry> = alerts
            .iter()
            .map(|a| AlertLogEntry::from_alert(a, local_now))
            .collect();
        let logged = match self.log.append(&entries) {
            Ok(n) => n,
            Err(e) => {
                warn!(path = %self.log.path().display(), error = %e, "failed to write alert log");
                0
            }
        };

        RunSummary {
            status: RunStatus::Alerted,
            tickers,
            digest: Some(digest),
            dispatch: Some(dispatch),
            logged,
        }
    }

    /// Fetch and evaluate `symbol` as if it were on the watchlist. Symbols
    /// not on the watchlist are treated as always eligible.
    pub fn check(&self, symbol: &str) -> (TickerOutcome, Option<Alert>) {
        let symbol = symbol.trim().to_uppercase();
        let report = fetch_ticker(&self.sources, &symbol);
        match self.config.threshold_for(&symbol) {
            Some(threshold) => evaluate_report(report, &threshold, &AlertGate::default()),
            None => evaluate_report(
                report,
                &DropThreshold::new(f64::MIN_POSITIVE),
                &AlertGate {
                    bypass_threshold: true,
                },
            ),
        }
    }
}

//! DipWatch CLI: run the watchlist, inspect one ticker, write a starter config.
//!
//! Commands:
//! - `run`: one pass over the watchlist: gate, fetch, decide, alert, dispatch, log
//! - `check`: fetch and evaluate a single symbol and print the result; sends nothing
//! - `init-config`: write a commented starter `dipwatch.toml`
//!
//! Credentials come from the environment; see `dipwatch init-config` for the
//! file layout. Logs go to stderr and honor `RUST_LOG` (default `info`).

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use dipwatch_core::alert::render_text;
use dipwatch_runner::{
    notifiers_from, write_template, AppConfig, Credentials, RunOptions, RunStatus, RunSummary,
    Runner, Sources, DEFAULT_CONFIG_PATH,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dipwatch",
    version,
    about = "DipWatch: watchlist dip alerts with RSI, volume and headline sentiment"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one pass over the watchlist.
    Run {
        /// Path to the TOML config file.
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Run even outside the configured market hours.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Alert every ticker regardless of its drop threshold.
        #[arg(long, default_value_t = false)]
        bypass_threshold: bool,

        /// Print the digest instead of sending and logging it.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Use deterministic synthetic bars and no external providers.
        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
    /// Fetch and evaluate one symbol without sending anything.
    Check {
        /// Ticker symbol (e.g., NVDA).
        symbol: String,

        /// Path to the TOML config file.
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Use deterministic synthetic bars and no external providers.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Print the result as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write a starter config file. Never overwrites.
    InitConfig {
        /// Where to write the file.
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            force,
            bypass_threshold,
            dry_run,
            synthetic,
        } => run_cmd(
            config,
            RunOptions {
                force,
                bypass_threshold,
                dry_run,
            },
            synthetic,
        ),
        Commands::Check {
            symbol,
            config,
            synthetic,
            json,
        } => check_cmd(&symbol, config, synthetic, json),
        Commands::InitConfig { path } => {
            write_template(&path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn build_runner(config_path: &Path, synthetic: bool, with_channels: bool) -> Result<Runner> {
    let config = AppConfig::load_or_empty(config_path);
    let credentials = Credentials::from_env();

    let sources = if synthetic {
        info!("synthetic mode: no network providers");
        Sources::synthetic(&config, Utc::now().date_naive())
    } else {
        Sources::live(&config, &credentials).context("failed to build data providers")?
    };
    let notifiers = if with_channels {
        notifiers_from(&credentials, config.providers.timeout())
    } else {
        Vec::new()
    };

    Ok(Runner::new(config, sources, notifiers)?)
}

fn run_cmd(config_path: PathBuf, options: RunOptions, synthetic: bool) -> Result<()> {
    let runner = build_runner(&config_path, synthetic, !options.dry_run)?;
    let summary = runner.run_once(options, Utc::now());
    print_summary(&summary);
    Ok(())
}

fn check_cmd(symbol: &str, config_path: PathBuf, synthetic: bool, json: bool) -> Result<()> {
    let runner = build_runner(&config_path, synthetic, false)?;
    let (outcome, alert) = runner.check(symbol);

    if json {
        let value = serde_json::json!({
            "symbol": outcome.symbol,
            "bundle": outcome.bundle,
            "decision": outcome.decision,
            "eligible": outcome.eligible,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match (&outcome.bundle, &alert) {
        (None, _) => println!("{}: not enough price history to evaluate", outcome.symbol),
        (Some(_), Some(alert)) => {
            println!("{}", render_text(alert));
            println!("Eligible for alert: {}", outcome.eligible);
        }
        (Some(bundle), None) => {
            if let Some(decision) = &outcome.decision {
                println!(
                    "{} {:+.2}% | {} | {}",
                    bundle.symbol, bundle.change_pct, decision.recommendation, decision.narrative
                );
            }
            println!("Eligible for alert: {}", outcome.eligible);
        }
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    match summary.status {
        RunStatus::MarketClosed => {
            println!("Market closed; run skipped (use --force to override).");
            return;
        }
        RunStatus::EmptyWatchlist => {
            println!("Watchlist is empty; nothing to do.");
            return;
        }
        _ => {}
    }

    println!("=== DipWatch Run ===");
    for t in &summary.tickers {
        match (&t.bundle, &t.decision) {
            (Some(b), Some(d)) => println!(
                "  {:<6} {:+7.2}%  RSI {:>6}  {:<16} {}",
                t.symbol,
                b.change_pct,
                b.oscillator
                    .map(|v| format!("{v:.2}"))
                    .unwrap_or_else(|| "n/a".into()),
                d.recommendation.to_string(),
                if t.eligible { "ALERT" } else { "" }
            ),
            _ => println!("  {:<6} no data", t.symbol),
        }
    }
    println!("Eligible:   {}", summary.eligible_count());

    if let Some(digest) = &summary.digest {
        if summary.status == RunStatus::DryRun {
            println!();
            println!("{}", digest.subject);
            println!("{}", digest.text);
        }
    }
    if let Some(dispatch) = &summary.dispatch {
        println!("Delivered:  {}", dispatch.delivered.join(", "));
        for (channel, error) in &dispatch.failed {
            println!("Failed:     {channel}: {error}");
        }
        println!("Logged:     {} row(s)", summary.logged);
    }
}

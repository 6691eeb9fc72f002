//! DipWatch Core: signals, reconciliation, decision rules, alert formatting.
//!
//! This crate holds everything about a watchlist run that can be expressed
//! without configuration or delivery channels:
//! - Domain types (bars, headlines, signal bundles, recommendations)
//! - Indicator calculators (price change, volume ratio, RSI)
//! - Multi-source RSI reconciliation
//! - Lexicon-based headline sentiment
//! - Decision rules and narrative
//! - Alert eligibility and per-channel rendering
//! - Provider traits with Yahoo, indicator-API and synthetic implementations

pub mod alert;
pub mod bundle;
pub mod data;
pub mod decision;
pub mod domain;
pub mod indicators;
pub mod oscillator;
pub mod sentiment;

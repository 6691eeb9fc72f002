//! Append-only CSV log of dispatched alerts.
//!
//! The header row is written only when the file is new or empty, so the log
//! grows across runs as one table. Appends are serialized through a mutex.

use chrono::NaiveDateTime;
use dipwatch_core::alert::Alert;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("alert log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("alert log CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One row of the alert log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertLogEntry {
    pub timestamp: String,
    pub ticker: String,
    pub change_pct: f64,
    pub sentiment: f64,
    pub oscillator: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub recommendation: String,
    pub price: f64,
}

impl AlertLogEntry {
    pub fn from_alert(alert: &Alert, at: NaiveDateTime) -> Self {
        Self {
            timestamp: at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ticker: alert.bundle.symbol.clone(),
            change_pct: alert.bundle.change_pct,
            sentiment: alert.bundle.sentiment,
            oscillator: alert.bundle.oscillator,
            volume_ratio: alert.bundle.volume_ratio,
            recommendation: alert.decision.recommendation.label().to_string(),
            price: alert.bundle.latest_close,
        }
    }
}

#[derive(Debug)]
pub struct AlertLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AlertLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `entries`, creating the file (and its directory) if needed.
    /// Returns the number of rows written; an empty slice touches nothing.
    pub fn append(&self, entries: &[AlertLogEntry]) -> Result<usize, LogError> {
        if entries.is_empty() {
            return Ok(0);
        }
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        for entry in entries {
            writer.serialize(entry)?;
        }
        writer.flush()?;
        Ok(entries.len())
    }

    /// Read every row back. Used by tests and the `check` command.
    pub fn read_all(&self) -> Result<Vec<AlertLogEntry>, LogError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<AlertLogEntry>, csv::Error>>()?;
        Ok(rows)
    }
}

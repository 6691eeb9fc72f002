//! Alert delivery channels.
//!
//! Each channel is optional: one without credentials is never constructed,
//! and a send failure on one channel is logged without stopping the others.

pub mod email;
pub mod telegram;

pub use email::EmailNotifier;
pub use telegram::TelegramNotifier;

use crate::config::Credentials;
use dipwatch_core::alert::AlertDigest;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("HTTP transport error: {0}")]
    Transport(reqwest::Error),

    #[error("rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// The Bot API puts the token in the URL path, so it never reaches the
/// error text.
impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        DispatchError::Transport(err.without_url())
    }
}

/// A delivery channel for a composed digest.
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    fn send(&self, digest: &AlertDigest) -> Result<(), DispatchError>;
}

/// Per-channel outcome of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl DispatchReport {
    pub fn all_failed(&self) -> bool {
        self.delivered.is_empty() && !self.failed.is_empty()
    }
}

/// Send `digest` on every channel, in order.
pub fn dispatch_all(notifiers: &[Box<dyn Notifier>], digest: &AlertDigest) -> DispatchReport {
    let mut report = DispatchReport::default();
    if notifiers.is_empty() {
        warn!("no delivery channels configured; alert not sent");
    }
    for notifier in notifiers {
        match notifier.send(digest) {
            Ok(()) => {
                info!(channel = notifier.name(), alerts = digest.count, "alert sent");
                report.delivered.push(notifier.name().to_string());
            }
            Err(e) => {
                warn!(channel = notifier.name(), error = %e, "alert delivery failed");
                report.failed.push((notifier.name().to_string(), e.to_string()));
            }
        }
    }
    report
}

/// Build every channel that has credentials.
pub fn notifiers_from(credentials: &Credentials, timeout: Duration) -> Vec<Box<dyn Notifier>> {
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();

    match &credentials.telegram {
        Some(telegram) => match TelegramNotifier::new(telegram.clone(), timeout) {
            Ok(n) => notifiers.push(Box::new(n)),
            Err(e) => warn!(error = %e, "telegram channel unavailable"),
        },
        None => warn!("TELEGRAM_TOKEN or TELEGRAM_CHAT_ID not set; skipping telegram"),
    }

    match &credentials.email {
        Some(email) => notifiers.push(Box::new(EmailNotifier::new(email.clone(), timeout))),
        None => warn!("EMAIL_FROM or EMAIL_APP_PASSWORD not set; skipping email"),
    }

    notifiers
}

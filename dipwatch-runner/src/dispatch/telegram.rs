//! Telegram Bot API channel (`sendMessage`, plain text).

use super::{DispatchError, Notifier};
use crate::config::TelegramCredentials;
use dipwatch_core::alert::AlertDigest;
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";
/// Bot API limit on message text, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    credentials: TelegramCredentials,
}

impl TelegramNotifier {
    pub fn new(credentials: TelegramCredentials, timeout: Duration) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dipwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: TELEGRAM_API_URL.to_string(),
            credentials,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn post(&self, text: &str) -> Result<(), DispatchError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.base_url.trim_end_matches('/'),
            self.credentials.token
        );
        let response = self
            .client
            .post(url)
            .json(&SendMessage {
                chat_id: &self.credentials.chat_id,
                text,
                disable_web_page_preview: true,
            })
            .send()?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().unwrap_or_default();
            Err(DispatchError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    fn send(&self, digest: &AlertDigest) -> Result<(), DispatchError> {
        for chunk in split_message(&digest.text, MAX_MESSAGE_CHARS) {
            self.post(&chunk)?;
        }
        Ok(())
    }
}

/// Split on line boundaries so each chunk fits in `max_chars`. A single
/// line longer than the limit is hard-wrapped.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let mut line: Vec<char> = line.chars().collect();
        while line.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = line.split_off(max_chars);
            chunks.push(line.into_iter().collect());
            line = rest;
        }

        let needed = if current.is_empty() { line.len() } else { line.len() + 1 };
        if current_len + needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current_len += line.len();
        current.extend(line);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

//! SMTP email channel: multipart plain text + HTML over implicit TLS (465).

use super::{DispatchError, Notifier};
use crate::config::EmailCredentials;
use dipwatch_core::alert::AlertDigest;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EmailNotifier {
    credentials: EmailCredentials,
    timeout: Duration,
}

impl EmailNotifier {
    pub fn new(credentials: EmailCredentials, timeout: Duration) -> Self {
        Self {
            credentials,
            timeout,
        }
    }

    /// Build the MIME message. `EMAIL_TO` may list several comma-separated
    /// recipients.
    pub fn build_message(&self, digest: &AlertDigest) -> Result<Message, DispatchError> {
        let mut builder = Message::builder()
            .from(self.credentials.from.parse::<Mailbox>()?)
            .subject(digest.subject.clone());
        for to in self
            .credentials
            .to
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            builder = builder.to(to.parse::<Mailbox>()?);
        }
        let message = builder.multipart(MultiPart::alternative_plain_html(
            digest.text.clone(),
            digest.html.clone(),
        ))?;
        Ok(message)
    }
}

impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    fn send(&self, digest: &AlertDigest) -> Result<(), DispatchError> {
        let message = self.build_message(digest)?;
        let mailer = SmtpTransport::relay(&self.credentials.smtp_host)?
            .credentials(SmtpCredentials::new(
                self.credentials.from.clone(),
                self.credentials.password.clone(),
            ))
            .timeout(Some(self.timeout))
            .build();
        mailer.send(&message)?;
        Ok(())
    }
}

//! Alert notifications.
//!
//! The [`Notifier`] turns the qualifying messages of a cycle into a single
//! HTML [`ComposedMessage`] addressed to the admin recipients. Handing it to
//! the transport is the provider's job.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alert::{AlertLevel, ClassifiedMessage};
use crate::monitor::ValidationError;
use crate::{Error, Result};

/// A message ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedMessage {
    /// Recipient addresses.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
    /// Files to attach.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<PathBuf>,
}

impl ComposedMessage {
    /// Recipients joined the way mail clients show them.
    #[must_use]
    pub fn recipient_line(&self) -> String {
        self.to.join("; ")
    }
}

/// What the monitor does with a composed alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Hand the alert to the transport.
    #[default]
    Send,
    /// Open the alert for review without sending.
    Display,
    /// Only log the alert.
    DryRun,
}

/// Composes alert messages.
#[derive(Debug, Clone)]
pub struct Notifier {
    signature: String,
    colorize: bool,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new("MailWatch")
    }
}

impl Notifier {
    /// Creates a notifier that signs alerts with `signature`.
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            colorize: true,
        }
    }

    /// Enables or disables coloured tier labels.
    #[must_use]
    pub const fn with_colors(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    /// Signature line.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Builds a message, checking recipients and attachments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when there are no recipients or
    /// a recipient is not an address, and [`Error::AttachmentUnavailable`]
    /// when an attachment is not a file.
    pub fn compose(
        &self,
        to: &[String],
        subject: impl Into<String>,
        html_body: impl Into<String>,
        attachments: &[PathBuf],
    ) -> Result<ComposedMessage> {
        let mut errors = Vec::new();
        if to.is_empty() {
            errors.push(ValidationError::NoAdminRecipients);
        }
        errors.extend(
            to.iter()
                .filter(|addr| !is_address(addr))
                .map(|addr| ValidationError::InvalidRecipient(addr.clone())),
        );
        if !errors.is_empty() {
            return Err(Error::InvalidConfiguration(errors));
        }
        if let Some(missing) = attachments.iter().find(|path| !path.is_file()) {
            return Err(Error::AttachmentUnavailable(missing.clone()));
        }

        Ok(ComposedMessage {
            to: to.to_vec(),
            subject: subject.into(),
            html_body: html_body.into(),
            attachments: attachments.to_vec(),
        })
    }

    /// Alert body listing every message as `subject - TIER`.
    #[must_use]
    pub fn alert_body<T: AlertLevel>(
        &self,
        recipients: &[String],
        messages: &[ClassifiedMessage<T>],
    ) -> String {
        let greeting = recipients
            .iter()
            .map(|addr| addr.split('@').next().unwrap_or_default())
            .collect::<Vec<_>>()
            .join(", ");
        let listing = messages
            .iter()
            .map(|m| format!("{} - {}", escape_html(m.message.subject()), self.tier_label(m.tier)))
            .collect::<Vec<_>>()
            .join(", ");
        debug!(messages = messages.len(), colorize = self.colorize, "composed alert body");

        format!(
            "Dear {greeting},\n\nThere is an Email in the inbox that has an alert ({listing}). \
             \n\nThanks,\n{}",
            escape_html(&self.signature)
        )
        .replace('\n', "<br>")
    }

    /// Tier name, wrapped in a colour span when colours are on.
    #[must_use]
    pub fn tier_label<T: AlertLevel>(&self, tier: T) -> String {
        match tier.html_color() {
            Some(color) if self.colorize => {
                format!("<span style=\"color: {color}\">{}</span>", tier.name())
            }
            _ => tier.name().to_string(),
        }
    }
}

/// Loose address check: something on both sides of a single `@`.
pub(crate) fn is_address(addr: &str) -> bool {
    let addr = addr.trim();
    addr.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && !domain.is_empty() && !domain.contains('@')
    })
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::alert::AlertTier;
    use crate::message::Message;
    use tempfile::NamedTempFile;

    fn admins() -> Vec<String> {
        vec!["ops@example.com".into(), "pm@example.com".into()]
    }

    #[test]
    fn test_alert_body_plain() {
        let notifier = Notifier::new("Watcher").with_colors(false);
        let messages = vec![
            ClassifiedMessage::new(Message::new("1", "Invoice overdue"), AlertTier::Overdue),
            ClassifiedMessage::new(Message::new("2", "RFI 12"), AlertTier::Warning),
        ];
        assert_eq!(
            notifier.alert_body(&admins(), &messages),
            "Dear ops, pm,<br><br>There is an Email in the inbox that has an alert \
             (Invoice overdue - OVERDUE, RFI 12 - WARNING). <br><br>Thanks,<br>Watcher"
        );
    }

    #[test]
    fn test_colored_label() {
        let notifier = Notifier::default();
        assert_eq!(
            notifier.tier_label(AlertTier::Overdue),
            "<span style=\"color: #c92a2a\">OVERDUE</span>"
        );
    }

    #[test]
    fn test_compose_validates() {
        let notifier = Notifier::default();
        let missing = [PathBuf::from("/no/such/file.pdf")];
        let err = notifier.compose(&[], "Email Alert", "body", &missing).unwrap_err();
        let Error::InvalidConfiguration(errors) = err else {
            panic!("expected configuration error");
        };
        assert_eq!(errors, vec![ValidationError::NoAdminRecipients]);

        assert!(notifier.compose(&["not-an-address".into()], "s", "b", &[]).is_err());

        let err = notifier.compose(&admins(), "s", "b", &missing).unwrap_err();
        assert!(matches!(err, Error::AttachmentUnavailable(ref p) if p == &missing[0]));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_compose_with_attachment() {
        let file = NamedTempFile::new().unwrap();
        let attachment = file.path().to_path_buf();
        let composed = Notifier::default()
            .compose(&admins(), "Email Alert", "body", std::slice::from_ref(&attachment))
            .unwrap();
        assert_eq!(composed.attachments, vec![attachment]);
        assert_eq!(composed.recipient_line(), "ops@example.com; pm@example.com");
    }

    #[test]
    fn test_is_address() {
        assert!(is_address("a@b"));
        assert!(!is_address("@b"));
        assert!(!is_address("a@"));
        assert!(!is_address("a@b@c"));
    }
}

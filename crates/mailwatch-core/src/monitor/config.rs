//! Monitor configuration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::validation::ValidationError;
use crate::alert::{AlertLevel, AlertTier};
use crate::notify::{DeliveryMode, is_address};
use crate::provider::FolderSelector;
use crate::snooze::SnoozeIdentity;
use crate::{Error, Result};

/// Default alert subject.
pub const DEFAULT_SUBJECT: &str = "Email Alert";
/// Longest accepted snooze window.
pub const MAX_SNOOZE_DAYS: i64 = 36_500;
/// Default snooze file, relative to the working directory.
pub const DEFAULT_SNOOZE_FILE: &str = "snooze_tracker.json";

/// Validated monitor settings.
///
/// Only [`MonitorConfigBuilder::build`] creates one, so every instance has
/// recipients, a positive interval and a complete priority list.
#[derive(Debug, Clone)]
pub struct MonitorConfig<T: AlertLevel = AlertTier> {
    admin_recipients: Vec<String>,
    folder: FolderSelector,
    subject: String,
    signature: String,
    attachments: Vec<PathBuf>,
    sleep_interval: Duration,
    sleep_round: Duration,
    snooze_duration: chrono::Duration,
    priority: Vec<T>,
    delivery: DeliveryMode,
    colorize: bool,
    snooze_path: PathBuf,
    snooze_identity: SnoozeIdentity,
}

impl<T: AlertLevel> MonitorConfig<T> {
    /// Starts a builder with defaults.
    #[must_use]
    pub fn builder() -> MonitorConfigBuilder<T> {
        MonitorConfigBuilder::default()
    }

    /// Alert recipients.
    #[must_use]
    pub fn admin_recipients(&self) -> &[String] {
        &self.admin_recipients
    }

    /// Folder to watch.
    #[must_use]
    pub const fn folder(&self) -> &FolderSelector {
        &self.folder
    }

    /// Alert subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Signature line of alert bodies.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Files attached to every alert.
    #[must_use]
    pub fn attachments(&self) -> &[PathBuf] {
        &self.attachments
    }

    /// Time between cycles.
    #[must_use]
    pub const fn sleep_interval(&self) -> Duration {
        self.sleep_interval
    }

    /// Granularity at which the stop signal is observed while sleeping.
    #[must_use]
    pub const fn sleep_round(&self) -> Duration {
        self.sleep_round
    }

    /// How long a notified message stays snoozed.
    #[must_use]
    pub const fn snooze_duration(&self) -> chrono::Duration {
        self.snooze_duration
    }

    /// Order in which tiers are checked; the first present wins.
    #[must_use]
    pub fn priority(&self) -> &[T] {
        &self.priority
    }

    /// Delivery mode.
    #[must_use]
    pub const fn delivery(&self) -> DeliveryMode {
        self.delivery
    }

    /// Whether tier labels are coloured.
    #[must_use]
    pub const fn colorize(&self) -> bool {
        self.colorize
    }

    /// Snooze file.
    #[must_use]
    pub fn snooze_path(&self) -> &Path {
        &self.snooze_path
    }

    /// Snooze key strategy.
    #[must_use]
    pub const fn snooze_identity(&self) -> SnoozeIdentity {
        self.snooze_identity
    }
}

/// Builder for [`MonitorConfig`].
#[derive(Debug, Clone)]
pub struct MonitorConfigBuilder<T: AlertLevel = AlertTier> {
    admin_recipients: Vec<String>,
    folder: FolderSelector,
    subject: String,
    signature: String,
    attachments: Vec<PathBuf>,
    sleep_interval: Duration,
    sleep_round: Duration,
    snooze_duration: chrono::Duration,
    priority: Vec<T>,
    delivery: DeliveryMode,
    colorize: bool,
    snooze_path: PathBuf,
    snooze_identity: SnoozeIdentity,
}

impl<T: AlertLevel> Default for MonitorConfigBuilder<T> {
    fn default() -> Self {
        Self {
            admin_recipients: Vec::new(),
            folder: FolderSelector::Inbox,
            subject: DEFAULT_SUBJECT.to_string(),
            signature: "MailWatch".to_string(),
            attachments: Vec::new(),
            sleep_interval: Duration::from_secs(300),
            sleep_round: Duration::from_secs(30),
            snooze_duration: chrono::Duration::days(1),
            priority: T::default_priority(),
            delivery: DeliveryMode::Send,
            colorize: true,
            snooze_path: PathBuf::from(DEFAULT_SNOOZE_FILE),
            snooze_identity: SnoozeIdentity::Subject,
        }
    }
}

impl<T: AlertLevel> MonitorConfigBuilder<T> {
    /// Adds an alert recipient.
    #[must_use]
    pub fn admin(mut self, address: impl Into<String>) -> Self {
        self.admin_recipients.push(address.into());
        self
    }

    /// Replaces the alert recipients.
    #[must_use]
    pub fn admins<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admin_recipients = addresses.into_iter().map(Into::into).collect();
        self
    }

    /// Folder to watch.
    #[must_use]
    pub fn folder(mut self, folder: FolderSelector) -> Self {
        self.folder = folder;
        self
    }

    /// Alert subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Signature line.
    #[must_use]
    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    /// Adds a file to attach to every alert.
    #[must_use]
    pub fn attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(path.into());
        self
    }

    /// Time between cycles.
    #[must_use]
    pub const fn sleep_interval(mut self, interval: Duration) -> Self {
        self.sleep_interval = interval;
        self
    }

    /// Stop-signal granularity while sleeping.
    #[must_use]
    pub const fn sleep_round(mut self, round: Duration) -> Self {
        self.sleep_round = round;
        self
    }

    /// Snooze window.
    #[must_use]
    pub const fn snooze_duration(mut self, duration: chrono::Duration) -> Self {
        self.snooze_duration = duration;
        self
    }

    /// Tier check order.
    #[must_use]
    pub fn priority(mut self, priority: Vec<T>) -> Self {
        self.priority = priority;
        self
    }

    /// Delivery mode.
    #[must_use]
    pub const fn delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    /// Coloured tier labels.
    #[must_use]
    pub const fn colorize(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    /// Snooze file.
    #[must_use]
    pub fn snooze_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snooze_path = path.into();
        self
    }

    /// Snooze key strategy.
    #[must_use]
    pub const fn snooze_identity(mut self, identity: SnoozeIdentity) -> Self {
        self.snooze_identity = identity;
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] listing every problem found.
    pub fn build(self) -> Result<MonitorConfig<T>> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(Error::InvalidConfiguration(errors));
        }
        Ok(MonitorConfig {
            admin_recipients: self.admin_recipients,
            folder: self.folder,
            subject: self.subject,
            signature: self.signature,
            attachments: self.attachments,
            sleep_interval: self.sleep_interval,
            sleep_round: self.sleep_round,
            snooze_duration: self.snooze_duration,
            priority: self.priority,
            delivery: self.delivery,
            colorize: self.colorize,
            snooze_path: self.snooze_path,
            snooze_identity: self.snooze_identity,
        })
    }

    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.admin_recipients.is_empty() {
            errors.push(ValidationError::NoAdminRecipients);
        }
        for addr in &self.admin_recipients {
            if !is_address(addr) {
                errors.push(ValidationError::InvalidRecipient(addr.clone()));
            }
        }

        if self.subject.trim().is_empty() {
            errors.push(ValidationError::EmptySubject);
        }
        if self.sleep_interval.is_zero() {
            errors.push(ValidationError::ZeroSleepInterval);
        }
        if self.sleep_round.is_zero() {
            errors.push(ValidationError::ZeroSleepRound);
        }
        if self.snooze_duration <= chrono::Duration::zero() {
            errors.push(ValidationError::NonPositiveSnooze);
        } else if self.snooze_duration > chrono::Duration::days(MAX_SNOOZE_DAYS) {
            errors.push(ValidationError::SnoozeTooLong);
        }

        if self.priority.is_empty() {
            errors.push(ValidationError::EmptyPriority);
        } else {
            let mut seen = HashSet::new();
            for tier in &self.priority {
                if !seen.insert(*tier) {
                    errors.push(ValidationError::DuplicatePriority(tier.name().to_string()));
                }
            }
            for required in [T::OVERDUE, T::WARNING, T::CRITICAL_WARNING] {
                if !seen.contains(&required) {
                    errors.push(ValidationError::MissingPriority(required.name()));
                }
            }
        }

        for path in &self.attachments {
            if !path.is_file() {
                errors.push(ValidationError::MissingAttachment(path.clone()));
            }
        }

        errors
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid() -> MonitorConfigBuilder {
        MonitorConfig::builder().admin("ops@example.com")
    }

    #[test]
    fn test_defaults() {
        let config = valid().build().unwrap();
        assert_eq!(config.subject(), "Email Alert");
        assert_eq!(config.sleep_interval(), Duration::from_secs(300));
        assert_eq!(config.snooze_duration(), chrono::Duration::days(1));
        assert_eq!(config.priority(), AlertTier::default_priority().as_slice());
        assert_eq!(config.delivery(), DeliveryMode::Send);
        assert_eq!(config.snooze_path(), Path::new("snooze_tracker.json"));
    }

    #[test]
    fn test_build_collects_every_error() {
        let err = MonitorConfig::<AlertTier>::builder()
            .sleep_interval(Duration::ZERO)
            .snooze_duration(chrono::Duration::zero())
            .priority(vec![AlertTier::Overdue, AlertTier::Overdue])
            .attachment("/no/such/report.pdf")
            .build()
            .unwrap_err();
        let Error::InvalidConfiguration(errors) = err else {
            panic!("expected configuration error");
        };
        let fields: Vec<_> = errors.iter().map(ValidationError::field).collect();
        assert_eq!(
            fields,
            [
                "admin_recipients",
                "sleep_interval",
                "snooze_duration",
                "priority",
                "priority",
                "priority",
                "attachments"
            ]
        );
    }

    #[test]
    fn test_rejects_bad_recipient_and_empty_priority() {
        let err = MonitorConfig::<AlertTier>::builder()
            .admins(["ops"])
            .priority(Vec::new())
            .build()
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Invalid recipient address 'ops'"));
        assert!(message.contains("Priority list is empty"));
    }

    #[test]
    fn test_rejects_snooze_beyond_maximum() {
        let err = valid()
            .snooze_duration(chrono::Duration::hours(10_000_000_000))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfiguration(ref errors) if errors == &[ValidationError::SnoozeTooLong]
        ));

        let longest = chrono::Duration::days(MAX_SNOOZE_DAYS);
        assert!(valid().snooze_duration(longest).build().is_ok());
    }

    #[test]
    fn test_custom_priority_is_kept() {
        let order = vec![AlertTier::CriticalWarning, AlertTier::Overdue, AlertTier::Warning];
        let config = valid().priority(order.clone()).build().unwrap();
        assert_eq!(config.priority(), order.as_slice());
    }
}

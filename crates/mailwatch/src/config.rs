//! Configuration file handling.
//!
//! The file is plain JSON. Everything except the admin recipients and the
//! rules has a default, so a minimal file looks like:
//!
//! ```json
//! {
//!   "admin_recipients": ["ops@example.com"],
//!   "spool": "inbox.json",
//!   "rules": [
//!     { "kind": "subject_keywords", "tier": "overdue", "keywords": ["overdue"] }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use mailwatch_core::alert::{AgeRule, AlertRule, DueDateRule, SubjectKeywordRule};
use mailwatch_core::{
    AlertTier, Classifier, DeliveryMode, FieldMap, FolderSelector, MonitorConfig, Normalizer,
    SnoozeIdentity, ValidationError,
};

const APP_DIR: &str = "mailwatch";

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.json")
}

fn default_snooze_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(mailwatch_core::monitor::DEFAULT_SNOOZE_FILE)
}

/// One classification rule as written in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleConfig {
    /// Subject contains any keyword.
    SubjectKeywords {
        /// Tier name.
        tier: String,
        /// Case-insensitive keywords.
        keywords: Vec<String>,
    },
    /// Message older than `hours`.
    Age {
        /// Tier name.
        tier: String,
        /// Minimum age in hours.
        hours: i64,
    },
    /// Due date held in a provider field is within `lead_hours`.
    DueDate {
        /// Tier name.
        tier: String,
        /// Provider field holding the due date.
        field: String,
        /// Hours before the due date at which the rule fires.
        #[serde(default)]
        lead_hours: i64,
    },
}

impl RuleConfig {
    fn tier(&self) -> &str {
        match self {
            Self::SubjectKeywords { tier, .. }
            | Self::Age { tier, .. }
            | Self::DueDate { tier, .. } => tier,
        }
    }

    fn build(&self) -> Result<Box<dyn AlertRule>, ValidationError> {
        let tier = parse_tier(self.tier())?;
        let rule: Box<dyn AlertRule> = match self {
            Self::SubjectKeywords { keywords, .. } => {
                Box::new(SubjectKeywordRule::new(tier, keywords.iter()))
            }
            Self::Age { hours: age, .. } => Box::new(AgeRule::new(tier, hours(*age, "rules")?)),
            Self::DueDate {
                field, lead_hours, ..
            } => Box::new(DueDateRule::new(
                tier,
                field.as_str(),
                hours(*lead_hours, "rules")?,
            )),
        };
        Ok(rule)
    }
}

/// Configuration as stored on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Alert recipients.
    pub admin_recipients: Vec<String>,
    /// Folder to watch; `None` means the inbox.
    pub folder: Option<String>,
    /// Alert subject.
    pub subject: Option<String>,
    /// Alert signature.
    pub signature: Option<String>,
    /// Files attached to every alert.
    pub attachments: Vec<PathBuf>,
    /// Seconds between cycles.
    pub sleep_interval_secs: u64,
    /// Seconds per interruptible sleep round.
    pub sleep_round_secs: u64,
    /// Hours an alerted message stays snoozed.
    pub snooze_hours: i64,
    /// Tier names in the order they are checked.
    pub priority: Option<Vec<String>>,
    /// How alerts are delivered.
    pub delivery: DeliveryMode,
    /// Colour tier labels in alert bodies.
    pub colorize: bool,
    /// Snooze file; defaults to the user data directory.
    pub snooze_path: Option<PathBuf>,
    /// How messages map onto snooze entries.
    pub snooze_identity: SnoozeIdentity,
    /// JSON file listing the mailbox contents.
    pub spool: PathBuf,
    /// JSON-lines file receiving sent alerts.
    pub outbox: PathBuf,
    /// Provider fields copied into message metadata for due-date rules.
    pub retain_fields: Vec<String>,
    /// Classification rules, first match wins.
    pub rules: Vec<RuleConfig>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            admin_recipients: Vec::new(),
            folder: None,
            subject: None,
            signature: None,
            attachments: Vec::new(),
            sleep_interval_secs: 300,
            sleep_round_secs: 30,
            snooze_hours: 24,
            priority: None,
            delivery: DeliveryMode::Send,
            colorize: true,
            snooze_path: None,
            snooze_identity: SnoozeIdentity::Subject,
            spool: PathBuf::from("spool.json"),
            outbox: PathBuf::from("outbox.jsonl"),
            retain_fields: Vec::new(),
            rules: Vec::new(),
        }
    }
}

impl FileConfig {
    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.resolve_paths(path.parent().unwrap_or_else(|| Path::new(".")));
        Ok(config)
    }

    /// Makes relative spool, outbox and attachment paths relative to `base`.
    fn resolve_paths(&mut self, base: &Path) {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        rebase(&mut self.spool);
        rebase(&mut self.outbox);
        self.attachments.iter_mut().for_each(rebase);
        if let Some(snooze) = self.snooze_path.as_mut() {
            rebase(snooze);
        }
    }

    /// Folder selector for the configured folder name.
    pub fn folder_selector(&self) -> FolderSelector {
        match self.folder.as_deref().map(str::trim) {
            None | Some("") => FolderSelector::Inbox,
            Some(name) if name.eq_ignore_ascii_case("inbox") => FolderSelector::Inbox,
            Some(name) => FolderSelector::Named(name.to_string()),
        }
    }

    /// Builds the validated monitor configuration.
    pub fn monitor_config(&self) -> Result<MonitorConfig> {
        let snooze = hours(self.snooze_hours, "snooze_duration")
            .map_err(mailwatch_core::Error::invalid)?;
        let mut builder = MonitorConfig::builder()
            .admins(self.admin_recipients.iter().cloned())
            .folder(self.folder_selector())
            .sleep_interval(Duration::from_secs(self.sleep_interval_secs))
            .sleep_round(Duration::from_secs(self.sleep_round_secs))
            .snooze_duration(snooze)
            .delivery(self.delivery)
            .colorize(self.colorize)
            .snooze_path(self.snooze_path.clone().unwrap_or_else(default_snooze_path))
            .snooze_identity(self.snooze_identity);
        if let Some(subject) = &self.subject {
            builder = builder.subject(subject.clone());
        }
        if let Some(signature) = &self.signature {
            builder = builder.signature(signature.clone());
        }
        for attachment in &self.attachments {
            builder = builder.attachment(attachment.clone());
        }
        if let Some(names) = &self.priority {
            let tiers = names
                .iter()
                .map(|name| parse_tier(name))
                .collect::<Result<Vec<_>, _>>()
                .map_err(mailwatch_core::Error::invalid)?;
            builder = builder.priority(tiers);
        }
        Ok(builder.build()?)
    }

    /// Builds the classifier from the configured rules, in file order.
    pub fn classifier(&self) -> Result<Classifier> {
        let mut classifier = Classifier::new();
        let mut errors = Vec::new();
        for rule in &self.rules {
            match rule.build() {
                Ok(rule) => classifier.push(rule),
                Err(e) => errors.push(e),
            }
        }
        if !errors.is_empty() {
            return Err(mailwatch_core::Error::InvalidConfiguration(errors).into());
        }
        if classifier.is_empty() {
            tracing::warn!("no classification rules configured; nothing will alert");
        }
        Ok(classifier)
    }

    /// Normalizer retaining the fields due-date rules read.
    pub fn normalizer(&self) -> Normalizer {
        let mut fields = FieldMap::default();
        let due_fields = self.rules.iter().filter_map(|rule| match rule {
            RuleConfig::DueDate { field, .. } => Some(field),
            _ => None,
        });
        for field in self.retain_fields.iter().chain(due_fields) {
            let field = field.to_lowercase();
            if !fields.retained.contains(&field) {
                fields = fields.retain(field);
            }
        }
        Normalizer::new(fields)
    }
}

fn hours(value: i64, field: &'static str) -> Result<chrono::Duration, ValidationError> {
    chrono::Duration::try_hours(value).ok_or(ValidationError::DurationOutOfRange(field))
}

fn parse_tier(name: &str) -> Result<AlertTier, ValidationError> {
    AlertTier::parse(name).ok_or_else(|| ValidationError::UnknownTier(name.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "admin_recipients": ["ops@example.com"],
        "folder": "Projects/Site A",
        "sleep_interval_secs": 60,
        "priority": ["overdue", "critical-warning", "warning"],
        "snooze_identity": "subject_and_sender",
        "delivery": "dry_run",
        "rules": [
            { "kind": "subject_keywords", "tier": "overdue", "keywords": ["overdue"] },
            { "kind": "age", "tier": "warning", "hours": 72 },
            { "kind": "due_date", "tier": "critical_warning", "field": "Due", "lead_hours": 24 }
        ]
    }"#;

    fn sample() -> FileConfig {
        let mut config: FileConfig = serde_json::from_str(SAMPLE).unwrap();
        config.resolve_paths(Path::new("/srv/mailwatch"));
        config
    }

    #[test]
    fn test_monitor_config_from_file() {
        let config = sample().monitor_config().unwrap();
        assert_eq!(config.admin_recipients(), ["ops@example.com"]);
        assert_eq!(config.folder(), &FolderSelector::Named("Projects/Site A".into()));
        assert_eq!(config.sleep_interval(), Duration::from_secs(60));
        assert_eq!(config.delivery(), DeliveryMode::DryRun);
        assert_eq!(config.snooze_identity(), SnoozeIdentity::SubjectAndSender);
        assert_eq!(
            config.priority(),
            [AlertTier::Overdue, AlertTier::CriticalWarning, AlertTier::Warning]
        );
    }

    #[test]
    fn test_relative_paths_follow_config_file() {
        let config = sample();
        assert_eq!(config.spool, Path::new("/srv/mailwatch/spool.json"));
        assert_eq!(config.outbox, Path::new("/srv/mailwatch/outbox.jsonl"));
    }

    #[test]
    fn test_classifier_keeps_rule_order() {
        let classifier = sample().classifier().unwrap();
        assert_eq!(classifier.len(), 3);
    }

    #[test]
    fn test_unknown_tier_is_rejected() {
        let mut config = sample();
        config.rules.push(RuleConfig::Age {
            tier: "apocalyptic".into(),
            hours: 1,
        });
        let err = config.classifier().unwrap_err();
        assert!(err.to_string().contains("apocalyptic"));
    }

    #[test]
    fn test_out_of_range_hours_are_rejected() {
        let mut config = sample();
        config.snooze_hours = i64::MAX;
        let err = config.monitor_config().unwrap_err();
        assert!(err.to_string().contains("snooze_duration"));

        config.rules.push(RuleConfig::DueDate {
            tier: "warning".into(),
            field: "due".into(),
            lead_hours: i64::MIN,
        });
        let err = config.classifier().unwrap_err();
        assert!(err.to_string().contains("Duration for rules is out of range"));
    }

    #[test]
    fn test_empty_recipients_are_rejected() {
        let mut config = sample();
        config.admin_recipients.clear();
        assert!(config.monitor_config().is_err());
    }

    #[test]
    fn test_due_date_fields_are_retained() {
        let normalizer = sample().normalizer();
        assert_eq!(normalizer.fields().retained, ["due"]);
    }

    #[test]
    fn test_inbox_folder_spellings() {
        let mut config = FileConfig::default();
        assert_eq!(config.folder_selector(), FolderSelector::Inbox);
        config.folder = Some("INBOX".into());
        assert_eq!(config.folder_selector(), FolderSelector::Inbox);
    }
}

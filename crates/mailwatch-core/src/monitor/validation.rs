//! Configuration validation errors.

use std::fmt;
use std::path::PathBuf;

/// A single problem found while validating monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No admin recipients configured.
    NoAdminRecipients,
    /// A recipient is not an email address.
    InvalidRecipient(String),
    /// Sleep interval is zero.
    ZeroSleepInterval,
    /// Sleep round is zero.
    ZeroSleepRound,
    /// Snooze duration is zero or negative.
    NonPositiveSnooze,
    /// Snooze duration is longer than the supported maximum.
    SnoozeTooLong,
    /// A duration does not fit the supported time range.
    DurationOutOfRange(&'static str),
    /// Priority list is empty.
    EmptyPriority,
    /// A tier appears twice in the priority list.
    DuplicatePriority(String),
    /// A required tier is missing from the priority list.
    MissingPriority(&'static str),
    /// An attachment is not a readable file.
    MissingAttachment(PathBuf),
    /// Alert subject is empty.
    EmptySubject,
    /// Attribute name is not recognised.
    UnknownAttribute(String),
    /// Tier name is not recognised.
    UnknownTier(String),
    /// Search type is not registered.
    UnknownSearcher(String),
}

impl ValidationError {
    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::NoAdminRecipients | Self::InvalidRecipient(_) => "admin_recipients",
            Self::ZeroSleepInterval => "sleep_interval",
            Self::ZeroSleepRound => "sleep_round",
            Self::NonPositiveSnooze | Self::SnoozeTooLong => "snooze_duration",
            Self::DurationOutOfRange(field) => field,
            Self::EmptyPriority | Self::DuplicatePriority(_) | Self::MissingPriority(_) => {
                "priority"
            }
            Self::MissingAttachment(_) => "attachments",
            Self::EmptySubject => "subject",
            Self::UnknownAttribute(_) => "attribute",
            Self::UnknownTier(_) => "tier",
            Self::UnknownSearcher(_) => "search_type",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAdminRecipients => write!(f, "At least one admin recipient is required"),
            Self::InvalidRecipient(addr) => write!(f, "Invalid recipient address '{addr}'"),
            Self::ZeroSleepInterval => write!(f, "Sleep interval must be greater than zero"),
            Self::ZeroSleepRound => write!(f, "Sleep round must be greater than zero"),
            Self::NonPositiveSnooze => write!(f, "Snooze duration must be positive"),
            Self::SnoozeTooLong => write!(
                f,
                "Snooze duration must not exceed {} days",
                super::config::MAX_SNOOZE_DAYS
            ),
            Self::DurationOutOfRange(field) => write!(f, "Duration for {field} is out of range"),
            Self::EmptyPriority => write!(f, "Priority list is empty"),
            Self::DuplicatePriority(tier) => {
                write!(f, "Tier {tier} appears more than once in priority")
            }
            Self::MissingPriority(tier) => write!(f, "Tier {tier} is missing from priority"),
            Self::MissingAttachment(path) => {
                write!(f, "Attachment {} does not exist", path.display())
            }
            Self::EmptySubject => write!(f, "Alert subject is required"),
            Self::UnknownAttribute(name) => write!(f, "Unknown attribute '{name}'"),
            Self::UnknownTier(name) => write!(f, "Unknown alert tier '{name}'"),
            Self::UnknownSearcher(name) => write!(f, "Unknown search type '{name}'"),
        }
    }
}

impl std::error::Error for ValidationError {}

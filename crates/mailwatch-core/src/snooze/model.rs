//! Snooze keys and stored values.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{Message, strip_all_prefixes};

/// Normalized identity under which a message is snoozed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnoozeKey(String);

impl SnoozeKey {
    /// Wraps an already-normalized key, as read back from disk.
    #[must_use]
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as stored on disk.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnoozeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a message is mapped onto a [`SnoozeKey`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnoozeIdentity {
    /// Subject with reply/forward prefixes stripped. Replies share a snooze
    /// with the thread they answer.
    #[default]
    Subject,
    /// Normalized subject plus the sender, so identical subjects from
    /// different senders are snoozed separately.
    SubjectAndSender,
}

impl SnoozeIdentity {
    /// Derives the key for `message`.
    #[must_use]
    pub fn key_for(self, message: &Message) -> SnoozeKey {
        let subject = normalize_subject_key(message.subject());
        match self {
            Self::Subject => SnoozeKey(subject),
            Self::SubjectAndSender => {
                let sender = message.sender().trim().to_lowercase();
                SnoozeKey(format!("{subject}|{sender}"))
            }
        }
    }
}

/// Strips every leading `RE:`/`FW:`/`FWD:`, case-folds and trims.
#[must_use]
pub fn normalize_subject_key(subject: &str) -> String {
    strip_all_prefixes(subject).to_lowercase()
}

/// A value in the snooze file.
///
/// Anything that is not a timestamp is carried through untouched so that
/// hand-edited files survive a rewrite.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    /// Suppressed until this instant.
    Until(DateTime<Utc>),
    /// Unrecognised value; never suppresses.
    Other(Value),
}

impl StoredValue {
    /// Reads a value from its JSON form.
    #[must_use]
    pub fn decode(value: Value) -> Self {
        match value {
            Value::String(s) => match parse_timestamp(&s) {
                Some(until) => Self::Until(until),
                None => Self::Other(Value::String(s)),
            },
            other => Self::Other(other),
        }
    }

    /// JSON form of the value. Timestamps are written as RFC 3339.
    #[must_use]
    pub fn encode(&self) -> Value {
        match self {
            Self::Until(until) => Value::String(until.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Other(value) => value.clone(),
        }
    }

    /// The suppression deadline, if this is a timestamp.
    #[must_use]
    pub const fn until(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Until(until) => Some(*until),
            Self::Other(_) => None,
        }
    }
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses RFC 3339, or naive ISO-8601 which is taken as UTC.
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(s) {
        return Some(time.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

//! Provider-native mailbox items.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::message::RawHandle;

/// A field value as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Plain text.
    Text(String),
    /// A list of values (recipients, categories).
    List(Vec<String>),
    /// A point in time.
    Time(DateTime<Utc>),
}

impl FieldValue {
    /// Flattens the value to text. Lists are joined with `"; "`.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(items) => items.join("; "),
            Self::Time(time) => time.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }

    /// Interprets the value as a timestamp.
    #[must_use]
    pub fn to_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Time(time) => Some(*time),
            Self::Text(text) => crate::snooze::parse_timestamp(text),
            Self::List(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Time(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// One item as returned by a provider: a handle plus named fields.
///
/// Field names are matched case-insensitively, so `Subject` and `subject`
/// refer to the same field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Provider handle.
    pub handle: RawHandle,
    /// Provider-stable identifier, when distinct from the handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Named fields, keyed by lowercase name.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl RawMessage {
    /// Creates an item with the given handle and no fields.
    #[must_use]
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: RawHandle(handle.into()),
            id: None,
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn field_value(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_lowercase(), value.into());
        self
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(&name.to_lowercase())
    }

    /// Identifier to use for the canonical message.
    #[must_use]
    pub fn identity(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.handle.0)
    }
}

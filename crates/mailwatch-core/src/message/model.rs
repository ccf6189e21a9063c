//! Canonical message records.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::monitor::ValidationError;

/// Provider-stable identifier of a mailbox item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Create a new message ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference back into the provider (UID, entry ID, spool index...).
///
/// The engine never interprets it; the provider that issued it owns its meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawHandle(pub String);

/// Canonical message field that can be searched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Subject line.
    Subject,
    /// Sender name or address.
    Sender,
    /// Recipients.
    To,
    /// Message body.
    Body,
    /// A retained metadata field, by lowercase name.
    Field(String),
}

impl Attribute {
    /// Canonical lowercase name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Subject => "subject",
            Self::Sender => "sender",
            Self::To => "to",
            Self::Body => "body",
            Self::Field(name) => name,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = ValidationError;

    /// Accepts canonical names and the common provider spellings
    /// (`SenderName`, `From`, `HTMLBody`, ...). Anything else that looks like a
    /// field name is treated as a metadata field.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "" => Err(ValidationError::UnknownAttribute(s.to_string())),
            "subject" => Ok(Self::Subject),
            "sender" | "sendername" | "senderemailaddress" | "from" => Ok(Self::Sender),
            "to" | "recipients" => Ok(Self::To),
            "body" | "htmlbody" | "text" => Ok(Self::Body),
            other if other.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') => {
                Ok(Self::Field(other.to_string()))
            }
            _ => Err(ValidationError::UnknownAttribute(s.to_string())),
        }
    }
}

/// Read-only projection of one mailbox item.
///
/// Built by the [`Normalizer`](super::Normalizer) once per fetch and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    subject: String,
    sender: String,
    to: String,
    body: String,
    received: Option<DateTime<Utc>>,
    raw: RawHandle,
    metadata: BTreeMap<String, String>,
}

impl Message {
    /// Creates a message with the given identity and subject.
    #[must_use]
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            raw: RawHandle(id.clone()),
            id: MessageId(id),
            subject: subject.into(),
            sender: String::new(),
            to: String::new(),
            body: String::new(),
            received: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Sets the sender.
    #[must_use]
    pub fn from_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    /// Sets the recipients.
    #[must_use]
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = to.into();
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the received time.
    #[must_use]
    pub const fn received_at(mut self, received: DateTime<Utc>) -> Self {
        self.received = Some(received);
        self
    }

    /// Sets the provider handle.
    #[must_use]
    pub fn with_raw(mut self, raw: RawHandle) -> Self {
        self.raw = raw;
        self
    }

    /// Adds a metadata field. Keys are stored lowercase.
    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_lowercase(), value.into());
        self
    }

    /// Provider-stable identifier.
    #[must_use]
    pub const fn id(&self) -> &MessageId {
        &self.id
    }

    /// Subject line.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Sender.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Recipients, `; `-separated.
    #[must_use]
    pub fn recipients(&self) -> &str {
        &self.to
    }

    /// Body text (may be HTML).
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// When the message arrived, if the provider reported it.
    #[must_use]
    pub const fn received(&self) -> Option<DateTime<Utc>> {
        self.received
    }

    /// Opaque provider handle.
    #[must_use]
    pub const fn raw(&self) -> &RawHandle {
        &self.raw
    }

    /// Looks up a retained metadata field.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Capability lookup used by searchers.
    ///
    /// Returns `None` when the field is absent or empty.
    #[must_use]
    pub fn attribute(&self, attribute: &Attribute) -> Option<&str> {
        let value = match attribute {
            Attribute::Subject => self.subject.as_str(),
            Attribute::Sender => self.sender.as_str(),
            Attribute::To => self.to.as_str(),
            Attribute::Body => self.body.as_str(),
            Attribute::Field(name) => self.metadata(name)?,
        };
        (!value.is_empty()).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_aliases() {
        assert_eq!("Subject".parse::<Attribute>(), Ok(Attribute::Subject));
        assert_eq!("SenderName".parse::<Attribute>(), Ok(Attribute::Sender));
        assert_eq!("HTMLBody".parse::<Attribute>(), Ok(Attribute::Body));
        assert_eq!(
            "Categories".parse::<Attribute>(),
            Ok(Attribute::Field("categories".to_string()))
        );
        assert!("".parse::<Attribute>().is_err());
        assert!("bad field!".parse::<Attribute>().is_err());
    }

    #[test]
    fn test_attribute_lookup() {
        let msg = Message::new("1", "Invoice")
            .from_sender("billing@example.com")
            .with_metadata("Due", "2024-01-01");

        assert_eq!(msg.attribute(&Attribute::Subject), Some("Invoice"));
        assert_eq!(msg.attribute(&Attribute::Sender), Some("billing@example.com"));
        assert_eq!(msg.attribute(&Attribute::Body), None);
        assert_eq!(
            msg.attribute(&Attribute::Field("due".to_string())),
            Some("2024-01-01")
        );
        assert_eq!(msg.attribute(&Attribute::Field("missing".to_string())), None);
    }

    #[test]
    fn test_new_uses_id_as_handle() {
        let msg = Message::new("abc", "Hello");
        assert_eq!(msg.raw(), &RawHandle("abc".to_string()));
        assert_eq!(msg.id().as_str(), "abc");
    }
}

//! Conversion of provider items into canonical messages.

use tracing::trace;

use super::model::{Attribute, Message};
use crate::provider::RawMessage;

/// Maps provider field names onto canonical message fields.
///
/// Each canonical field has an ordered list of provider spellings; the first
/// one present on an item wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    /// Spellings for the subject.
    pub subject: Vec<String>,
    /// Spellings for the sender.
    pub sender: Vec<String>,
    /// Spellings for the recipients.
    pub to: Vec<String>,
    /// Spellings for the body.
    pub body: Vec<String>,
    /// Spellings for the received time.
    pub received: Vec<String>,
    /// Extra provider fields copied into [`Message::metadata`].
    pub retained: Vec<String>,
}

impl Default for FieldMap {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(ToString::to_string).collect();
        Self {
            subject: names(&["subject"]),
            sender: names(&["sender", "sendername", "from"]),
            to: names(&["to"]),
            body: names(&["body", "htmlbody"]),
            received: names(&["receivedtime", "received", "date"]),
            retained: Vec::new(),
        }
    }
}

impl FieldMap {
    /// Adds a field to retain as metadata.
    #[must_use]
    pub fn retain(mut self, field: impl Into<String>) -> Self {
        self.retained.push(field.into().to_lowercase());
        self
    }

    /// Provider spellings for a canonical attribute.
    #[must_use]
    pub fn provider_names(&self, attribute: &Attribute) -> Vec<String> {
        match attribute {
            Attribute::Subject => self.subject.clone(),
            Attribute::Sender => self.sender.clone(),
            Attribute::To => self.to.clone(),
            Attribute::Body => self.body.clone(),
            Attribute::Field(name) => vec![name.clone()],
        }
    }
}

/// Builds [`Message`] records from provider items.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    fields: FieldMap,
}

impl Normalizer {
    /// Creates a normalizer with the given field map.
    #[must_use]
    pub const fn new(fields: FieldMap) -> Self {
        Self { fields }
    }

    /// The field map in use.
    #[must_use]
    pub const fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Normalizes one item. Missing fields become empty values.
    #[must_use]
    pub fn normalize(&self, item: &RawMessage) -> Message {
        let text = |names: &[String]| {
            names
                .iter()
                .find_map(|name| item.field(name))
                .map(crate::provider::FieldValue::to_text)
                .unwrap_or_default()
        };

        let mut message = Message::new(item.identity(), text(&self.fields.subject))
            .with_raw(item.handle.clone())
            .from_sender(text(&self.fields.sender))
            .to(text(&self.fields.to))
            .with_body(text(&self.fields.body));

        if let Some(received) = self
            .fields
            .received
            .iter()
            .find_map(|name| item.field(name))
            .and_then(crate::provider::FieldValue::to_time)
        {
            message = message.received_at(received);
        }

        for name in &self.fields.retained {
            if let Some(value) = item.field(name) {
                message = message.with_metadata(name, value.to_text());
            }
        }

        trace!(id = %message.id(), subject = message.subject(), "normalized message");
        message
    }

    /// Normalizes a batch.
    #[must_use]
    pub fn normalize_all(&self, items: &[RawMessage]) -> Vec<Message> {
        items.iter().map(|item| self.normalize(item)).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::provider::FieldValue;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_normalize_maps_provider_spellings() {
        let received = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        let item = RawMessage::new("42")
            .field_value("Subject", "RE: Timecard")
            .field_value("SenderName", "Payroll")
            .field_value(
                "To",
                FieldValue::List(vec!["a@example.com".into(), "b@example.com".into()]),
            )
            .field_value("HTMLBody", "<p>hi</p>")
            .field_value("ReceivedTime", received);

        let msg = Normalizer::default().normalize(&item);
        assert_eq!(msg.id().as_str(), "42");
        assert_eq!(msg.subject(), "RE: Timecard");
        assert_eq!(msg.sender(), "Payroll");
        assert_eq!(msg.recipients(), "a@example.com; b@example.com");
        assert_eq!(msg.body(), "<p>hi</p>");
        assert_eq!(msg.received(), Some(received));
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let msg = Normalizer::default().normalize(&RawMessage::new("1"));
        assert_eq!(msg.subject(), "");
        assert_eq!(msg.sender(), "");
        assert_eq!(msg.received(), None);
    }

    #[test]
    fn test_first_spelling_wins() {
        let item = RawMessage::new("1")
            .field_value("from", "from@example.com")
            .field_value("sender", "sender@example.com");
        assert_eq!(
            Normalizer::default().normalize(&item).sender(),
            "sender@example.com"
        );
    }

    #[test]
    fn test_retained_metadata() {
        let normalizer = Normalizer::new(FieldMap::default().retain("DueDate"));
        let item = RawMessage::new("1")
            .field_value("duedate", "2024-05-01")
            .field_value("ignored", "x");
        let msg = normalizer.normalize(&item);
        assert_eq!(msg.metadata("duedate"), Some("2024-05-01"));
        assert_eq!(msg.metadata("ignored"), None);
    }
}

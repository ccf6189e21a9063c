//! Ordered, first-match message classification.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::tier::{AlertLevel, AlertTier};
use crate::message::Message;

/// Decides whether a message belongs to one tier.
///
/// Implementations must be deterministic for a fixed `(message, now)`, free of
/// side effects, and must not panic on any well-formed message.
pub trait AlertRule<T: AlertLevel = AlertTier>: Send + Sync {
    /// Tier assigned when the rule fires.
    fn tier(&self) -> T;

    /// Whether the rule fires for `message` evaluated at `now`.
    fn matches(&self, message: &Message, now: DateTime<Utc>) -> bool;

    /// Short description for logs.
    fn describe(&self) -> String {
        format!("{:?} rule", self.tier())
    }
}

/// A message with the tier it was assigned.
///
/// Messages no rule matched never become a `ClassifiedMessage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedMessage<T: AlertLevel = AlertTier> {
    /// The message.
    pub message: Message,
    /// Assigned tier.
    pub tier: T,
}

impl<T: AlertLevel> ClassifiedMessage<T> {
    /// Pairs a message with its tier.
    #[must_use]
    pub const fn new(message: Message, tier: T) -> Self {
        Self { message, tier }
    }
}

/// Runs rules in registration order; the first rule that fires wins.
///
/// Register rules in descending precedence.
pub struct Classifier<T: AlertLevel = AlertTier> {
    rules: Vec<Box<dyn AlertRule<T>>>,
}

impl<T: AlertLevel> Default for Classifier<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T: AlertLevel> std::fmt::Debug for Classifier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.describe()))
            .finish()
    }
}

impl<T: AlertLevel> Classifier<T> {
    /// Creates a classifier with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: impl AlertRule<T> + 'static) -> Self {
        self.push(Box::new(rule));
        self
    }

    /// Appends a boxed rule.
    pub fn push(&mut self, rule: Box<dyn AlertRule<T>>) {
        self.rules.push(rule);
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Tier of the first rule that fires, if any.
    #[must_use]
    pub fn classify(&self, message: &Message, now: DateTime<Utc>) -> Option<T> {
        self.rules
            .iter()
            .find(|rule| rule.matches(message, now))
            .map(|rule| rule.tier())
    }

    /// Classifies a batch, silently dropping messages without a tier.
    #[must_use]
    pub fn classify_all(
        &self,
        messages: Vec<Message>,
        now: DateTime<Utc>,
    ) -> Vec<ClassifiedMessage<T>> {
        messages
            .into_iter()
            .filter_map(|message| {
                let tier = self.classify(&message, now);
                debug!(subject = message.subject(), tier = ?tier, "classified message");
                tier.map(|tier| ClassifiedMessage::new(message, tier))
            })
            .collect()
    }
}

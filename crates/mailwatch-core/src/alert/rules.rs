//! Built-in classification rules.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::classifier::AlertRule;
use super::tier::AlertLevel;
use crate::message::Message;

/// Fires when the subject contains any keyword (case-insensitive).
#[derive(Debug, Clone)]
pub struct SubjectKeywordRule<T> {
    tier: T,
    keywords: Vec<String>,
}

impl<T: AlertLevel> SubjectKeywordRule<T> {
    /// Creates a keyword rule. Blank keywords are ignored.
    pub fn new<I, S>(tier: T, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tier,
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

impl<T: AlertLevel> AlertRule<T> for SubjectKeywordRule<T> {
    fn tier(&self) -> T {
        self.tier
    }

    fn matches(&self, message: &Message, _now: DateTime<Utc>) -> bool {
        let subject = message.subject().to_lowercase();
        self.keywords.iter().any(|k| subject.contains(k.as_str()))
    }

    fn describe(&self) -> String {
        format!("{} if subject contains {:?}", self.tier.name(), self.keywords)
    }
}

/// Fires when a message has been sitting in the folder for at least `min_age`.
#[derive(Debug, Clone)]
pub struct AgeRule<T> {
    tier: T,
    min_age: Duration,
}

impl<T: AlertLevel> AgeRule<T> {
    /// Creates an age rule.
    #[must_use]
    pub const fn new(tier: T, min_age: Duration) -> Self {
        Self { tier, min_age }
    }
}

impl<T: AlertLevel> AlertRule<T> for AgeRule<T> {
    fn tier(&self) -> T {
        self.tier
    }

    fn matches(&self, message: &Message, now: DateTime<Utc>) -> bool {
        message
            .received()
            .is_some_and(|received| now - received >= self.min_age)
    }

    fn describe(&self) -> String {
        format!("{} if older than {}", self.tier.name(), self.min_age)
    }
}

/// Fires when a due date held in message metadata is within `lead` of `now`.
///
/// With a zero lead the rule fires once the due date has passed. Values that
/// do not parse as RFC 3339 or `YYYY-MM-DD` never match.
#[derive(Debug, Clone)]
pub struct DueDateRule<T> {
    tier: T,
    field: String,
    lead: Duration,
}

impl<T: AlertLevel> DueDateRule<T> {
    /// Creates a due-date rule reading `field` from message metadata.
    pub fn new(tier: T, field: impl Into<String>, lead: Duration) -> Self {
        Self {
            tier,
            field: field.into().to_lowercase(),
            lead,
        }
    }

    fn due_date(&self, message: &Message) -> Option<DateTime<Utc>> {
        parse_due(message.metadata(&self.field)?)
    }
}

impl<T: AlertLevel> AlertRule<T> for DueDateRule<T> {
    fn tier(&self) -> T {
        self.tier
    }

    fn matches(&self, message: &Message, now: DateTime<Utc>) -> bool {
        self.due_date(message).is_some_and(|due| {
            // Out of range means the window opens before or after all time.
            due.checked_sub_signed(self.lead)
                .map_or(self.lead > Duration::zero(), |start| now >= start)
        })
    }

    fn describe(&self) -> String {
        format!(
            "{} if '{}' is due within {}",
            self.tier.name(),
            self.field,
            self.lead
        )
    }
}

fn parse_due(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Some(time.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}

/// Fires when every inner rule fires; reports its own tier.
pub struct AllOf<T> {
    tier: T,
    rules: Vec<Box<dyn AlertRule<T>>>,
}

impl<T: AlertLevel> AllOf<T> {
    /// Creates an empty conjunction. An empty conjunction never fires.
    #[must_use]
    pub const fn new(tier: T) -> Self {
        Self {
            tier,
            rules: Vec::new(),
        }
    }

    /// Adds a rule to the conjunction.
    #[must_use]
    pub fn and(mut self, rule: impl AlertRule<T> + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }
}

impl<T: AlertLevel> AlertRule<T> for AllOf<T> {
    fn tier(&self) -> T {
        self.tier
    }

    fn matches(&self, message: &Message, now: DateTime<Utc>) -> bool {
        !self.rules.is_empty() && self.rules.iter().all(|r| r.matches(message, now))
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.rules.iter().map(|r| r.describe()).collect();
        format!("{} if all of [{}]", self.tier.name(), parts.join(", "))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::alert::AlertTier;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_keyword_rule_is_case_insensitive() {
        let rule = SubjectKeywordRule::new(AlertTier::Warning, ["RFI", "  "]);
        assert!(rule.matches(&Message::new("1", "New rfi #12"), at(1, 0)));
        assert!(!rule.matches(&Message::new("2", "Lunch"), at(1, 0)));
    }

    #[test]
    fn test_age_rule() {
        let rule = AgeRule::new(AlertTier::Overdue, Duration::hours(48));
        let msg = Message::new("1", "x").received_at(at(1, 0));
        assert!(!rule.matches(&msg, at(2, 23)));
        assert!(rule.matches(&msg, at(3, 0)));
        assert!(!rule.matches(&Message::new("2", "no time"), at(9, 0)));
    }

    #[test]
    fn test_due_date_rule() {
        let overdue = DueDateRule::new(AlertTier::Overdue, "Due", Duration::zero());
        let warning = DueDateRule::new(AlertTier::Warning, "due", Duration::days(2));
        let msg = Message::new("1", "Permit").with_metadata("due", "2024-01-05");

        assert!(!warning.matches(&msg, at(2, 23)));
        assert!(warning.matches(&msg, at(3, 0)));
        assert!(!overdue.matches(&msg, at(4, 23)));
        assert!(overdue.matches(&msg, at(5, 0)));
    }

    #[test]
    fn test_due_date_rule_accepts_rfc3339_and_ignores_garbage() {
        let rule = DueDateRule::new(AlertTier::Overdue, "due", Duration::zero());
        let exact = Message::new("1", "x").with_metadata("due", "2024-01-02T12:00:00Z");
        assert!(rule.matches(&exact, at(2, 12)));
        assert!(!rule.matches(&exact, at(2, 11)));

        let garbage = Message::new("2", "x").with_metadata("due", "next tuesday");
        assert!(!rule.matches(&garbage, at(31, 0)));
    }

    #[test]
    fn test_due_date_rule_with_out_of_range_lead() {
        let msg = Message::new("1", "Permit").with_metadata("due", "2024-01-05");

        let huge = Duration::hours(10_000_000_000);
        let always = DueDateRule::new(AlertTier::CriticalWarning, "due", huge);
        assert!(always.matches(&msg, at(1, 0)));

        let far = Message::new("2", "Permit").with_metadata("due", "+262000-01-01");
        let never = DueDateRule::new(AlertTier::Overdue, "due", -huge);
        assert!(!never.matches(&far, at(31, 0)));
        assert!(!never.matches(&msg, at(31, 0)));
    }

    #[test]
    fn test_all_of() {
        let rule = AllOf::new(AlertTier::CriticalWarning)
            .and(SubjectKeywordRule::new(AlertTier::Warning, ["rfi"]))
            .and(AgeRule::new(AlertTier::Warning, Duration::hours(1)));
        let msg = Message::new("1", "RFI 3").received_at(at(1, 0));

        assert!(!rule.matches(&msg, at(1, 0)));
        assert!(rule.matches(&msg, at(1, 1)));
        assert_eq!(rule.tier(), AlertTier::CriticalWarning);
        assert!(!AllOf::new(AlertTier::Warning).matches(&msg, at(1, 1)));
    }
}

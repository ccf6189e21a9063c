//! Property-based tests for search and classification.
//!
//! - Pushdown and scanning return the same messages
//! - Subject snooze keys ignore reply/forward prefixes
//! - Classification is deterministic

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use mailwatch_core::alert::{AgeRule, SubjectKeywordRule};
use mailwatch_core::snooze::normalize_subject_key;
use mailwatch_core::{
    AlertTier, Classifier, FilterCapability, MemoryMailbox, Message, RawMessage, SearchQuery,
    Searcher,
};

fn prefixes() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["", "RE: ", "FW: ", "Fwd:", "fw:re: ", "  re:", "Re: Re: "])
}

fn bases() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "Timecard",
        "timecard ",
        "TIMECARD x",
        "time card",
        "Bob's timecard",
        "50% done",
        "card",
        "",
    ])
}

fn terms() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["timecard", "Card", "bob's timecard", "50%", "x", " TimeCard "])
}

fn mailbox(subjects: &[String]) -> MemoryMailbox {
    subjects.iter().enumerate().fold(
        MemoryMailbox::new().with_capability(FilterCapability::Full),
        |mailbox, (i, subject)| {
            let item = RawMessage::new(i.to_string()).field_value("subject", subject.as_str());
            mailbox.with_message(item)
        },
    )
}

fn ids(found: &[Message]) -> Vec<String> {
    found.iter().map(|m| m.id().to_string()).collect()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

proptest! {
    /// Property: pushdown and the fallback scan agree for every query shape.
    #[test]
    fn prop_pushdown_equals_scan(
        parts in prop::collection::vec((prefixes(), bases()), 1..12),
        term in terms(),
        partial in any::<bool>(),
        fw in any::<bool>(),
        re in any::<bool>(),
    ) {
        let subjects: Vec<String> = parts.iter().map(|(p, b)| format!("{p}{b}")).collect();
        let mailbox = mailbox(&subjects);
        let searcher = Searcher::new(&mailbox);
        let query = SearchQuery::subject(term).partial(partial).forward_prefix(fw).reply_prefix(re);

        let pushed = tokio_test::block_on(searcher.pushdown(&query)).unwrap();
        let scanned = tokio_test::block_on(searcher.scan(&query)).unwrap();
        prop_assert_eq!(ids(&pushed), ids(&scanned));

        let found = tokio_test::block_on(searcher.find(&query)).unwrap();
        prop_assert_eq!(ids(&found), ids(&scanned));
    }

    /// Property: adding reply/forward prefixes never changes the snooze key.
    #[test]
    fn prop_snooze_key_ignores_prefixes(p in prefixes(), b in "[A-Za-z0-9 ]{0,20}") {
        let stripped = normalize_subject_key(&b);
        prop_assert_eq!(normalize_subject_key(&format!("{p}{b}")), stripped.clone());
        prop_assert_eq!(normalize_subject_key(&stripped), stripped);
    }

    /// Property: classification of a fixed message at a fixed time is stable.
    #[test]
    fn prop_classification_is_deterministic(subject in ".{0,40}", age_hours in 0i64..200) {
        let classifier = Classifier::new()
            .with_rule(AgeRule::new(AlertTier::Overdue, Duration::hours(72)))
            .with_rule(SubjectKeywordRule::new(AlertTier::Warning, ["rfi", "permit"]));
        let message = Message::new("1", subject).received_at(now() - Duration::hours(age_hours));

        let first = classifier.classify(&message, now());
        for _ in 0..5 {
            prop_assert_eq!(classifier.classify(&message, now()), first);
        }
        if age_hours >= 72 {
            prop_assert_eq!(first, Some(AlertTier::Overdue));
        }
    }
}

//! In-process matching rules.

use super::query::SearchQuery;
use crate::message::{Message, SubjectPrefix};

/// Which rule accepted a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// The value itself matched.
    Direct,
    /// The value matched after stripping `FW:`/`FWD:`.
    Forward,
    /// The value matched after stripping `RE:`.
    Reply,
}

/// Case-folds and trims.
#[must_use]
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn compare(candidate: &str, term: &str, partial: bool) -> bool {
    !candidate.is_empty() && (candidate == term || (partial && candidate.contains(term)))
}

/// Tests `candidate` against `query`, trying direct, forward and reply in
/// that order. At most one prefix is stripped.
#[must_use]
pub fn match_value(candidate: &str, query: &SearchQuery) -> Option<MatchRule> {
    let term = query.normalized_term();
    if term.is_empty() {
        return None;
    }
    let candidate = normalize(candidate);
    let partial = query.partial_match_ok();

    if compare(&candidate, &term, partial) {
        return Some(MatchRule::Direct);
    }
    let stripped = |prefix: SubjectPrefix| {
        prefix
            .strip(&candidate)
            .is_some_and(|rest| compare(rest, &term, partial))
    };
    if query.include_forward_prefix() && stripped(SubjectPrefix::Forward) {
        return Some(MatchRule::Forward);
    }
    if query.include_reply_prefix() && stripped(SubjectPrefix::Reply) {
        return Some(MatchRule::Reply);
    }
    None
}

/// Tests the queried attribute of `message`. Absent or empty values never
/// match.
#[must_use]
pub fn match_message(message: &Message, query: &SearchQuery) -> Option<MatchRule> {
    message
        .attribute(query.target())
        .and_then(|value| match_value(value, query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Attribute;

    #[test]
    fn test_direct_exact_and_partial() {
        let exact = SearchQuery::subject("Timecard");
        assert_eq!(match_value("  timecard ", &exact), Some(MatchRule::Direct));
        assert_eq!(match_value("Timecardx", &exact), None);
        assert_eq!(
            match_value("Timecardx", &exact.clone().partial(true)),
            Some(MatchRule::Direct)
        );
    }

    #[test]
    fn test_prefix_gates() {
        let query = SearchQuery::subject("Timecard").reply_prefix(false);
        assert_eq!(match_value("FW: Timecard", &query), Some(MatchRule::Forward));
        assert_eq!(match_value("Fwd: Timecard", &query), Some(MatchRule::Forward));
        assert_eq!(match_value("RE: Timecard", &query), None);

        let query = SearchQuery::subject("Timecard").forward_prefix(false);
        assert_eq!(match_value("RE: Timecard", &query), Some(MatchRule::Reply));
        assert_eq!(match_value("FW: Timecard", &query), None);
    }

    #[test]
    fn test_only_one_prefix_is_stripped() {
        let query = SearchQuery::subject("Timecard");
        assert_eq!(match_value("RE: FW: Timecard", &query), None);
        assert_eq!(
            match_value("RE: FW: Timecard", &query.partial(true)),
            Some(MatchRule::Direct)
        );
    }

    #[test]
    fn test_empty_values_never_match() {
        assert_eq!(match_value("", &SearchQuery::subject("x").partial(true)), None);
        assert_eq!(match_value("RE:", &SearchQuery::subject("re:")), Some(MatchRule::Direct));
        assert_eq!(match_value("anything", &SearchQuery::subject("  ")), None);
    }

    #[test]
    fn test_prefixes_ignored_outside_subject() {
        let query = SearchQuery::attribute(Attribute::Sender, "ops@example.com");
        assert_eq!(match_value("FW: ops@example.com", &query), None);

        let msg = Message::new("1", "x").from_sender("OPS@example.com");
        assert_eq!(match_message(&msg, &query), Some(MatchRule::Direct));
        assert_eq!(match_message(&Message::new("2", "x"), &query), None);
    }
}

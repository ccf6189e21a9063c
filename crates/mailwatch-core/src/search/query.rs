//! Search queries.

use crate::message::Attribute;

/// A lookup against one message attribute.
///
/// Reply and forward prefix handling only applies to subject queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    attribute: Attribute,
    term: String,
    partial_match_ok: bool,
    include_forward_prefix: bool,
    include_reply_prefix: bool,
}

impl SearchQuery {
    /// Exact subject search that also accepts `FW:` and `RE:` variants.
    pub fn subject(term: impl Into<String>) -> Self {
        Self::attribute(Attribute::Subject, term)
    }

    /// Exact search on any attribute.
    pub fn attribute(attribute: Attribute, term: impl Into<String>) -> Self {
        Self {
            attribute,
            term: term.into(),
            partial_match_ok: false,
            include_forward_prefix: true,
            include_reply_prefix: true,
        }
    }

    /// Accept candidates that merely contain the term.
    #[must_use]
    pub const fn partial(mut self, partial_match_ok: bool) -> Self {
        self.partial_match_ok = partial_match_ok;
        self
    }

    /// Also match subjects prefixed with `FW:` or `FWD:`.
    #[must_use]
    pub const fn forward_prefix(mut self, include: bool) -> Self {
        self.include_forward_prefix = include;
        self
    }

    /// Also match subjects prefixed with `RE:`.
    #[must_use]
    pub const fn reply_prefix(mut self, include: bool) -> Self {
        self.include_reply_prefix = include;
        self
    }

    /// Attribute searched.
    #[must_use]
    pub const fn target(&self) -> &Attribute {
        &self.attribute
    }

    /// Term as given.
    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Case-folded, trimmed term.
    #[must_use]
    pub fn normalized_term(&self) -> String {
        super::matcher::normalize(&self.term)
    }

    /// Whether containment is enough.
    #[must_use]
    pub const fn partial_match_ok(&self) -> bool {
        self.partial_match_ok
    }

    /// Whether forward-prefixed subjects are tried.
    #[must_use]
    pub fn include_forward_prefix(&self) -> bool {
        self.include_forward_prefix && self.attribute == Attribute::Subject
    }

    /// Whether reply-prefixed subjects are tried.
    #[must_use]
    pub fn include_reply_prefix(&self) -> bool {
        self.include_reply_prefix && self.attribute == Attribute::Subject
    }
}

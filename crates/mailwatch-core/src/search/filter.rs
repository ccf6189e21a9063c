//! Provider-side filter expressions.
//!
//! The grammar is a disjunction of comparisons:
//!
//! ```text
//! expr  := term ( "OR" term )*
//! term  := field ( "=" | "LIKE" ) literal
//! field := '"' name '"'
//! literal := "'" ( char | "''" )* "'"
//! ```
//!
//! Comparisons are case-insensitive over trimmed values and `%` is the only
//! wildcard. A single quote inside a literal is written twice.

use std::fmt;

use super::query::SearchQuery;
use crate::message::SubjectPrefix;
use crate::provider::{ProviderError, ProviderResult, RawMessage};

/// A filter a provider can evaluate in its store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    /// Field equals value.
    Eq {
        /// Provider field name.
        field: String,
        /// Compared value.
        value: String,
    },
    /// Field matches a `%` pattern.
    Like {
        /// Provider field name.
        field: String,
        /// Pattern.
        pattern: String,
    },
    /// Any of the inner expressions.
    Or(Vec<FilterExpr>),
}

impl FilterExpr {
    /// Builds a filter that accepts at least every item `query` matches.
    ///
    /// `fields` lists the provider spellings of the queried attribute; the
    /// filter tries each of them. Callers re-check the results in process.
    #[must_use]
    pub fn for_query(query: &SearchQuery, fields: &[String]) -> Self {
        let term = query.normalized_term();
        let mut terms = Vec::new();
        for field in fields {
            if query.partial_match_ok() {
                terms.push(Self::like(field, format!("%{term}%")));
                continue;
            }
            terms.push(Self::Eq {
                field: field.clone(),
                value: term.clone(),
            });
            if query.include_forward_prefix() {
                for prefix in SubjectPrefix::Forward.spellings() {
                    terms.push(Self::like(field, format!("{prefix}%{term}")));
                }
            }
            if query.include_reply_prefix() {
                for prefix in SubjectPrefix::Reply.spellings() {
                    terms.push(Self::like(field, format!("{prefix}%{term}")));
                }
            }
        }
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            Self::Or(terms)
        }
    }

    fn like(field: &str, pattern: String) -> Self {
        Self::Like {
            field: field.to_string(),
            pattern,
        }
    }

    /// Whether evaluating the expression needs `LIKE` support.
    #[must_use]
    pub fn requires_like(&self) -> bool {
        match self {
            Self::Eq { .. } => false,
            Self::Like { .. } => true,
            Self::Or(terms) => terms.iter().any(Self::requires_like),
        }
    }

    /// Evaluates the expression against a provider item.
    ///
    /// Missing or empty fields never match.
    #[must_use]
    pub fn evaluate(&self, item: &RawMessage) -> bool {
        let value = |field: &str| {
            item.field(field)
                .map(|v| v.to_text().trim().to_lowercase())
                .filter(|v| !v.is_empty())
        };
        match self {
            Self::Eq { field, value: expected } => {
                value(field).is_some_and(|v| v == expected.trim().to_lowercase())
            }
            Self::Like { field, pattern } => {
                value(field).is_some_and(|v| like_match(&v, &pattern.to_lowercase()))
            }
            Self::Or(terms) => terms.iter().any(|t| t.evaluate(item)),
        }
    }

    /// Parses the textual form produced by `Display`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Filter`] on malformed input.
    pub fn parse(input: &str) -> ProviderResult<Self> {
        let mut parser = Parser::new(input);
        let mut terms = vec![parser.term()?];
        loop {
            parser.skip_ws();
            if parser.at_end() {
                break;
            }
            parser.keyword("OR")?;
            terms.push(parser.term()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Self::Or(terms)
        })
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq { field, value } => write!(f, "\"{field}\" = '{}'", escape(value)),
            Self::Like { field, pattern } => write!(f, "\"{field}\" LIKE '{}'", escape(pattern)),
            Self::Or(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" OR ")?;
                    }
                    write!(f, "{term}")?;
                }
                Ok(())
            }
        }
    }
}

fn escape(literal: &str) -> String {
    literal.replace('\'', "''")
}

/// `%`-only pattern match.
fn like_match(value: &str, pattern: &str) -> bool {
    let parts: Vec<&str> = pattern.split('%').collect();
    let [first, middle @ .., last] = parts.as_slice() else {
        return value == pattern;
    };
    let Some(mut rest) = value.strip_prefix(*first) else {
        return false;
    };
    for &part in middle {
        match rest.find(part) {
            Some(at) => rest = &rest[at + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(*last)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    const fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn error(&self, what: &str) -> ProviderError {
        ProviderError::Filter(format!("{what} at offset {}", self.pos))
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn expect(&mut self, c: char) -> ProviderResult<()> {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{c}'")))
        }
    }

    fn keyword(&mut self, word: &str) -> ProviderResult<()> {
        self.skip_ws();
        let rest = self.rest();
        let found = rest
            .get(..word.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(word))
            && rest[word.len()..]
                .chars()
                .next()
                .is_none_or(|c| c.is_whitespace() || c == '\'' || c == '"');
        if found {
            self.pos += word.len();
            Ok(())
        } else {
            Err(self.error(&format!("expected {word}")))
        }
    }

    fn field(&mut self) -> ProviderResult<String> {
        self.expect('"')?;
        let Some(len) = self.rest().find('"') else {
            return Err(self.error("unterminated field name"));
        };
        let name = self.rest()[..len].to_string();
        self.pos += len + 1;
        if name.is_empty() {
            return Err(self.error("empty field name"));
        }
        Ok(name)
    }

    fn literal(&mut self) -> ProviderResult<String> {
        self.expect('\'')?;
        let mut out = String::new();
        let mut chars = self.rest().char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c != '\'' {
                out.push(c);
                continue;
            }
            if chars.peek().is_some_and(|&(_, next)| next == '\'') {
                chars.next();
                out.push('\'');
            } else {
                self.pos += i + 1;
                return Ok(out);
            }
        }
        Err(self.error("unterminated literal"))
    }

    fn term(&mut self) -> ProviderResult<FilterExpr> {
        let field = self.field()?;
        self.skip_ws();
        if self.rest().starts_with('=') {
            self.pos += 1;
            let value = self.literal()?;
            Ok(FilterExpr::Eq { field, value })
        } else {
            self.keyword("LIKE")?;
            let pattern = self.literal()?;
            Ok(FilterExpr::Like { field, pattern })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_render_exact_subject_query() {
        let query = SearchQuery::subject("Timecard").reply_prefix(false);
        let expr = FilterExpr::for_query(&query, &names(&["subject"]));
        assert_eq!(
            expr.to_string(),
            "\"subject\" = 'timecard' OR \"subject\" LIKE 'fw:%timecard' \
             OR \"subject\" LIKE 'fwd:%timecard'"
        );
        assert!(expr.requires_like());
    }

    #[test]
    fn test_plain_equality_needs_no_like() {
        let query = SearchQuery::subject("x").forward_prefix(false).reply_prefix(false);
        let expr = FilterExpr::for_query(&query, &names(&["subject"]));
        assert_eq!(
            expr,
            FilterExpr::Eq {
                field: "subject".into(),
                value: "x".into()
            }
        );
        assert!(!expr.requires_like());
    }

    #[test]
    fn test_quotes_are_doubled_and_parsed_back() {
        let query = SearchQuery::subject("Bob's timecard").partial(true);
        let expr = FilterExpr::for_query(&query, &names(&["subject", "topic"]));
        let text = expr.to_string();
        assert!(text.contains("'%bob''s timecard%'"));
        assert_eq!(FilterExpr::parse(&text).unwrap(), expr);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in [
            "",
            "subject = 'x'",
            "\"subject\" = 'x",
            "\"subject\" ~ 'x'",
            "\"subject\" = 'x' AND \"to\" = 'y'",
            "\"\" = 'x'",
        ] {
            assert!(FilterExpr::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_evaluate() {
        let item = RawMessage::new("1").field_value("Subject", "  FW: Timecard ");
        let parse = |s: &str| FilterExpr::parse(s).unwrap();
        assert!(parse("\"subject\" LIKE 'fw:%timecard'").evaluate(&item));
        assert!(parse("\"SUBJECT\" = 'fw: timecard'").evaluate(&item));
        assert!(!parse("\"subject\" = 'timecard'").evaluate(&item));
        assert!(!parse("\"sender\" LIKE '%'").evaluate(&item));
    }

    #[test]
    fn test_like_match() {
        assert!(like_match("abc", "abc"));
        assert!(like_match("abc", "%"));
        assert!(like_match("abc", "a%c"));
        assert!(like_match("abcbc", "%bc%bc"));
        assert!(!like_match("abc", "a%b"));
        assert!(!like_match("ab", "ab%b"));
    }
}

//! Message search.
//!
//! A [`SearchQuery`] names an attribute, a term and how loosely to match.
//! The [`Searcher`] resolves it against a provider, pushing a
//! [`FilterExpr`] down to the store when it can and scanning every item when
//! it cannot. Subject searches also accept `FW:`/`FWD:` and `RE:` variants
//! of the term.

mod filter;
mod matcher;
mod query;
mod registry;
mod searcher;

pub use filter::FilterExpr;
pub use matcher::{MatchRule, match_message, match_value, normalize};
pub use query::SearchQuery;
pub use registry::SearcherRegistry;
pub use searcher::Searcher;

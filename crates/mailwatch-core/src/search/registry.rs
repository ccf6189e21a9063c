//! Named search types.

use std::collections::BTreeMap;

use super::query::SearchQuery;
use crate::message::Attribute;
use crate::monitor::ValidationError;
use crate::{Error, Result};

/// Maps search type names (`"subject"`, `"sender"`, ...) to the attribute
/// they search.
///
/// Built once at startup and passed by reference; names are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct SearcherRegistry {
    kinds: BTreeMap<String, Attribute>,
}

impl SearcherRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `subject`, `sender`, `to` and `body`.
    #[must_use]
    pub fn standard() -> Self {
        [Attribute::Subject, Attribute::Sender, Attribute::To, Attribute::Body]
            .into_iter()
            .fold(Self::new(), |registry, attribute| {
                let name = attribute.name().to_string();
                registry.register(name, attribute)
            })
    }

    /// Adds or replaces a search type.
    #[must_use]
    pub fn register(mut self, name: impl AsRef<str>, attribute: Attribute) -> Self {
        self.kinds.insert(name.as_ref().trim().to_lowercase(), attribute);
        self
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Attribute searched by `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for unknown names.
    pub fn resolve(&self, name: &str) -> Result<&Attribute> {
        self.kinds
            .get(&name.trim().to_lowercase())
            .ok_or_else(|| Error::invalid(ValidationError::UnknownSearcher(name.to_string())))
    }

    /// Builds a query of type `name` for `term`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for unknown names.
    pub fn query_for(&self, name: &str, term: impl Into<String>) -> Result<SearchQuery> {
        self.resolve(name)
            .map(|attribute| SearchQuery::attribute(attribute.clone(), term))
    }
}

//! Dual-path message lookup.

use std::collections::HashSet;

use tracing::{debug, info};

use super::filter::FilterExpr;
use super::matcher::match_message;
use super::query::SearchQuery;
use crate::message::{Message, Normalizer};
use crate::provider::{FilterCapability, FolderSelector, MailProvider, RawMessage};
use crate::{Error, Result};

/// Finds messages in one folder.
///
/// When the provider can filter in its store, a [`FilterExpr`] is pushed down
/// and the results are checked again in process. Otherwise, or if pushdown
/// fails for any reason, every item is scanned. Both paths return the same
/// messages.
#[derive(Debug)]
pub struct Searcher<'a, P> {
    provider: &'a P,
    normalizer: Normalizer,
    folder: FolderSelector,
}

impl<'a, P: MailProvider> Searcher<'a, P> {
    /// Searches the inbox of `provider` with the default field map.
    #[must_use]
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            normalizer: Normalizer::default(),
            folder: FolderSelector::Inbox,
        }
    }

    /// Uses a custom normalizer.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Searches another folder.
    #[must_use]
    pub fn in_folder(mut self, folder: FolderSelector) -> Self {
        self.folder = folder;
        self
    }

    /// Finds every message matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderUnavailable`] if the folder cannot be listed.
    /// Pushdown failures are never returned.
    pub async fn find(&self, query: &SearchQuery) -> Result<Vec<Message>> {
        if query.normalized_term().is_empty() {
            debug!("empty search term");
            return Ok(Vec::new());
        }

        if self.provider.supports_pushdown_filter() {
            match self.pushdown(query).await {
                Ok(found) => {
                    info!(
                        attribute = %query.target(),
                        term = query.term(),
                        found = found.len(),
                        "pushdown search"
                    );
                    return Ok(found);
                }
                Err(e) => debug!(error = %e, "pushdown search failed, scanning folder"),
            }
        }

        let found = self.scan(query).await?;
        info!(
            attribute = %query.target(),
            term = query.term(),
            found = found.len(),
            "scanned folder"
        );
        Ok(found)
    }

    /// Subject search with explicit flags.
    ///
    /// # Errors
    ///
    /// See [`find`](Self::find).
    pub async fn find_by_subject(
        &self,
        term: &str,
        partial_match_ok: bool,
        include_forward_prefix: bool,
        include_reply_prefix: bool,
    ) -> Result<Vec<Message>> {
        let query = SearchQuery::subject(term)
            .partial(partial_match_ok)
            .forward_prefix(include_forward_prefix)
            .reply_prefix(include_reply_prefix);
        self.find(&query).await
    }

    /// Runs only the pushdown path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FilterUnsupported`] if the provider cannot evaluate
    /// the filter and [`Error::FilterExecutionFailed`] if evaluating it fails.
    pub async fn pushdown(&self, query: &SearchQuery) -> Result<Vec<Message>> {
        let fields = self.normalizer.fields().provider_names(query.target());
        let filter = FilterExpr::for_query(query, &fields);

        match self.provider.filter_capability() {
            FilterCapability::None => {
                return Err(Error::FilterUnsupported("no store-side filtering".into()));
            }
            FilterCapability::EqualityOnly if filter.requires_like() => {
                return Err(Error::FilterUnsupported(format!(
                    "LIKE needed for {filter}"
                )));
            }
            FilterCapability::EqualityOnly | FilterCapability::Full => {}
        }

        let filter = filter.to_string();
        debug!(filter, folder = %self.folder, "pushing filter down");
        let items = self
            .provider
            .restrict_and_fetch(&self.folder, &filter)
            .await
            .map_err(|e| Error::FilterExecutionFailed(e.to_string()))?;
        Ok(self.select(&items, query))
    }

    /// Runs only the fallback scan.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderUnavailable`] if the folder cannot be listed.
    pub async fn scan(&self, query: &SearchQuery) -> Result<Vec<Message>> {
        let items = self.provider.fetch_messages(&self.folder).await?;
        Ok(self.select(&items, query))
    }

    fn select(&self, items: &[RawMessage], query: &SearchQuery) -> Vec<Message> {
        let mut seen = HashSet::new();
        self.normalizer
            .normalize_all(items)
            .into_iter()
            .filter(|message| match_message(message, query).is_some())
            .filter(|message| seen.insert(message.id().clone()))
            .collect()
    }
}

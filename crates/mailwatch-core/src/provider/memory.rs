//! In-process mailbox.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::{
    FilterCapability, FolderSelector, MailProvider, ProviderError, ProviderResult, RawMessage,
};
use crate::notify::ComposedMessage;
use crate::search::FilterExpr;

#[derive(Debug, Default)]
struct State {
    folders: HashMap<FolderSelector, Vec<RawMessage>>,
    sent: Vec<ComposedMessage>,
    displayed: Vec<ComposedMessage>,
    unavailable: bool,
    filter_failure: bool,
    delivery_failure: bool,
}

/// Mailbox held in memory.
///
/// Evaluates the filter grammar it advertises, records what it was asked to
/// send or display, and can be told to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryMailbox {
    capability: FilterCapability,
    state: Mutex<State>,
    restrict_calls: AtomicUsize,
}

impl MemoryMailbox {
    /// Creates an empty mailbox without filter support.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the advertised filter capability.
    #[must_use]
    pub fn with_capability(mut self, capability: FilterCapability) -> Self {
        self.capability = capability;
        self
    }

    /// Adds an item to the inbox.
    #[must_use]
    pub fn with_message(self, message: RawMessage) -> Self {
        self.push(&FolderSelector::Inbox, message);
        self
    }

    /// Adds an item to `folder`, creating the folder if needed.
    pub fn push(&self, folder: &FolderSelector, message: RawMessage) {
        self.state()
            .folders
            .entry(folder.clone())
            .or_default()
            .push(message);
    }

    /// Replaces the inbox contents.
    pub fn replace_inbox(&self, messages: Vec<RawMessage>) {
        self.state().folders.insert(FolderSelector::Inbox, messages);
    }

    /// Makes every call fail with a connection error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Makes `restrict_and_fetch` fail.
    pub fn set_filter_failure(&self, fail: bool) {
        self.state().filter_failure = fail;
    }

    /// Makes `send` and `display` fail.
    pub fn set_delivery_failure(&self, fail: bool) {
        self.state().delivery_failure = fail;
    }

    /// Messages handed to `send`.
    #[must_use]
    pub fn sent(&self) -> Vec<ComposedMessage> {
        self.state().sent.clone()
    }

    /// Messages handed to `display`.
    #[must_use]
    pub fn displayed(&self) -> Vec<ComposedMessage> {
        self.state().displayed.clone()
    }

    /// Number of `restrict_and_fetch` calls so far.
    #[must_use]
    pub fn restrict_calls(&self) -> usize {
        self.restrict_calls.load(Ordering::Relaxed)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn folder(state: &State, folder: &FolderSelector) -> ProviderResult<Vec<RawMessage>> {
        if state.unavailable {
            return Err(ProviderError::Connection("mailbox offline".into()));
        }
        match state.folders.get(folder) {
            Some(items) => Ok(items.clone()),
            None if *folder == FolderSelector::Inbox => Ok(Vec::new()),
            None => Err(ProviderError::FolderNotFound(folder.to_string())),
        }
    }

    fn restrict(&self, folder: &FolderSelector, filter: &str) -> ProviderResult<Vec<RawMessage>> {
        self.restrict_calls.fetch_add(1, Ordering::Relaxed);
        let state = self.state();
        if state.filter_failure {
            return Err(ProviderError::Filter("store rejected filter".into()));
        }
        if self.capability == FilterCapability::None {
            return Err(ProviderError::Unsupported("filtering".into()));
        }

        let expr = FilterExpr::parse(filter)?;
        if self.capability == FilterCapability::EqualityOnly && expr.requires_like() {
            return Err(ProviderError::Unsupported("LIKE".into()));
        }

        let items: Vec<_> = Self::folder(&state, folder)?
            .into_iter()
            .filter(|item| expr.evaluate(item))
            .collect();
        debug!(filter, matched = items.len(), "evaluated filter");
        Ok(items)
    }

    fn deliver(&self, message: &ComposedMessage, display: bool) -> ProviderResult<()> {
        let mut state = self.state();
        if state.unavailable || state.delivery_failure {
            return Err(ProviderError::Delivery("transport rejected message".into()));
        }
        let log = if display {
            &mut state.displayed
        } else {
            &mut state.sent
        };
        log.push(message.clone());
        Ok(())
    }
}

impl MailProvider for MemoryMailbox {
    async fn fetch_messages(&self, folder: &FolderSelector) -> ProviderResult<Vec<RawMessage>> {
        Self::folder(&self.state(), folder)
    }

    fn filter_capability(&self) -> FilterCapability {
        self.capability
    }

    async fn restrict_and_fetch(
        &self,
        folder: &FolderSelector,
        filter: &str,
    ) -> ProviderResult<Vec<RawMessage>> {
        self.restrict(folder, filter)
    }

    async fn send(&self, message: &ComposedMessage) -> ProviderResult<()> {
        self.deliver(message, false)
    }

    async fn display(&self, message: &ComposedMessage) -> ProviderResult<()> {
        self.deliver(message, true)
    }
}

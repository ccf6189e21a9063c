//! Mail provider abstraction.
//!
//! The engine never speaks a mail protocol itself. Anything that can list
//! the items of a folder, optionally evaluate a filter expression, and hand a
//! composed message to its transport can drive the monitor and the searcher.

mod item;
mod memory;

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

pub use item::{FieldValue, RawMessage};
pub use memory::MemoryMailbox;

use crate::notify::ComposedMessage;

/// Result type alias for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Errors reported by a mail provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Connection or session failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// The requested folder does not exist.
    #[error("folder not found: {0}")]
    FolderNotFound(String),

    /// The filter expression could not be parsed or evaluated.
    #[error("filter error: {0}")]
    Filter(String),

    /// The provider does not implement the requested operation.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Sending or displaying a message failed.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Which folder to read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderSelector {
    /// The default inbox.
    #[default]
    Inbox,
    /// A folder by path.
    Named(String),
}

impl fmt::Display for FolderSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inbox => f.write_str("Inbox"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// How much of a filter expression the provider can evaluate itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCapability {
    /// No store-side filtering; every search is a full scan.
    #[default]
    None,
    /// Only `=` comparisons.
    EqualityOnly,
    /// `=` and `LIKE` comparisons.
    Full,
}

/// Mail transport collaborator consumed by the engine.
///
/// Equality comparisons in filter expressions are expected to be
/// case-insensitive over whitespace-trimmed values; `LIKE` uses `%` as the only
/// wildcard. Providers that cannot honour this should report
/// [`FilterCapability::None`].
pub trait MailProvider: Send + Sync {
    /// Lists every item in the folder.
    fn fetch_messages(
        &self,
        folder: &FolderSelector,
    ) -> impl Future<Output = ProviderResult<Vec<RawMessage>>> + Send;

    /// Store-side filtering support.
    fn filter_capability(&self) -> FilterCapability {
        FilterCapability::None
    }

    /// Whether any pushdown filtering is available.
    fn supports_pushdown_filter(&self) -> bool {
        self.filter_capability() != FilterCapability::None
    }

    /// Lists the items matching `filter`.
    fn restrict_and_fetch(
        &self,
        folder: &FolderSelector,
        filter: &str,
    ) -> impl Future<Output = ProviderResult<Vec<RawMessage>>> + Send;

    /// Sends a composed message.
    fn send(&self, message: &ComposedMessage) -> impl Future<Output = ProviderResult<()>> + Send;

    /// Opens a composed message for review instead of sending it.
    fn display(&self, message: &ComposedMessage)
    -> impl Future<Output = ProviderResult<()>> + Send;
}

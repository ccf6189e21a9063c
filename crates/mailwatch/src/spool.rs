//! File-backed mail provider.
//!
//! The spool is a JSON file holding either an array of items (the inbox) or
//! an object mapping folder names to arrays. It is re-read on every fetch, so
//! whatever feeds it can rewrite it between cycles. Sent alerts are appended
//! to an outbox as JSON lines.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use mailwatch_core::{
    ComposedMessage, FilterCapability, FolderSelector, MailProvider, ProviderError,
    ProviderResult, RawMessage,
};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpoolFile {
    Inbox(Vec<RawMessage>),
    Folders(BTreeMap<String, Vec<RawMessage>>),
}

impl SpoolFile {
    fn take(self, folder: &FolderSelector) -> ProviderResult<Vec<RawMessage>> {
        match (self, folder) {
            (Self::Inbox(items), FolderSelector::Inbox) => Ok(items),
            (Self::Inbox(_), FolderSelector::Named(name)) => {
                Err(ProviderError::FolderNotFound(name.clone()))
            }
            (Self::Folders(mut folders), folder) => {
                let name = folder.to_string();
                let key = folders
                    .keys()
                    .find(|k| k.eq_ignore_ascii_case(&name))
                    .cloned();
                match key {
                    Some(key) => Ok(folders.remove(&key).unwrap_or_default()),
                    None if *folder == FolderSelector::Inbox => Ok(Vec::new()),
                    None => Err(ProviderError::FolderNotFound(name)),
                }
            }
        }
    }
}

/// Mail provider reading a JSON spool and writing a JSON-lines outbox.
#[derive(Debug, Clone)]
pub struct SpoolMailbox {
    spool: PathBuf,
    outbox: PathBuf,
}

impl SpoolMailbox {
    /// Creates a provider over the given files.
    pub fn new(spool: impl Into<PathBuf>, outbox: impl Into<PathBuf>) -> Self {
        Self {
            spool: spool.into(),
            outbox: outbox.into(),
        }
    }

    /// Path of the spool file.
    pub fn spool(&self) -> &Path {
        &self.spool
    }

    async fn read(&self) -> ProviderResult<SpoolFile> {
        let contents = tokio::fs::read_to_string(&self.spool)
            .await
            .map_err(|e| ProviderError::Connection(format!("{}: {e}", self.spool.display())))?;
        serde_json::from_str(&contents)
            .map_err(|e| ProviderError::Connection(format!("{}: {e}", self.spool.display())))
    }
}

impl MailProvider for SpoolMailbox {
    async fn fetch_messages(&self, folder: &FolderSelector) -> ProviderResult<Vec<RawMessage>> {
        let mut items = self.read().await?.take(folder)?;
        // Hand-written spools use any casing for field names.
        for item in &mut items {
            item.fields = std::mem::take(&mut item.fields)
                .into_iter()
                .map(|(name, value)| (name.to_lowercase(), value))
                .collect();
        }
        debug!(%folder, count = items.len(), "read spool");
        Ok(items)
    }

    fn filter_capability(&self) -> FilterCapability {
        FilterCapability::None
    }

    async fn restrict_and_fetch(
        &self,
        _folder: &FolderSelector,
        _filter: &str,
    ) -> ProviderResult<Vec<RawMessage>> {
        Err(ProviderError::Unsupported("spool filtering".into()))
    }

    async fn send(&self, message: &ComposedMessage) -> ProviderResult<()> {
        let mut line = serde_json::to_string(message)
            .map_err(|e| ProviderError::Delivery(e.to_string()))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.outbox)
            .await
            .map_err(|e| ProviderError::Delivery(format!("{}: {e}", self.outbox.display())))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| ProviderError::Delivery(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| ProviderError::Delivery(e.to_string()))?;

        info!(to = %message.recipient_line(), outbox = %self.outbox.display(), "alert written");
        Ok(())
    }

    async fn display(&self, message: &ComposedMessage) -> ProviderResult<()> {
        let rendered = serde_json::to_string_pretty(message)
            .map_err(|e| ProviderError::Delivery(e.to_string()))?;
        println!("{rendered}");
        Ok(())
    }
}

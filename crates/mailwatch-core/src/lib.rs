//! # mailwatch-core
//!
//! Alert monitoring engine for a single mailbox.
//!
//! This crate provides:
//! - **Message model** - provider items normalized into uniform [`Message`] records
//! - **Classification** - ordered, pluggable rules assigning alert tiers
//! - **Snooze tracking** - file-backed deduplication of alerts already sent
//! - **Search** - subject and attribute lookup with provider pushdown and a
//!   scanning fallback
//! - **Monitoring** - the refresh, notify, snooze, sleep loop
//!
//! The engine talks to mail only through the [`MailProvider`] trait;
//! [`MemoryMailbox`] is an in-process implementation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod alert;
mod error;
pub mod message;
pub mod monitor;
pub mod notify;
pub mod provider;
pub mod search;
pub mod snooze;

pub use alert::{AlertLevel, AlertRule, AlertState, AlertTier, ClassifiedMessage, Classifier};
pub use error::{Error, Result};
pub use message::{Attribute, FieldMap, Message, MessageId, Normalizer, RawHandle};
pub use monitor::{
    CyclePhase, CycleReport, Monitor, MonitorConfig, MonitorConfigBuilder, StopHandle, StopSignal,
    ValidationError, stop_channel,
};
pub use notify::{ComposedMessage, DeliveryMode, Notifier};
pub use provider::{
    FieldValue, FilterCapability, FolderSelector, MailProvider, MemoryMailbox, ProviderError,
    ProviderResult, RawMessage,
};
pub use search::{FilterExpr, SearchQuery, Searcher, SearcherRegistry};
pub use snooze::{SnoozeIdentity, SnoozeKey, SnoozeStore};

//! Alert deduplication.
//!
//! Once an alert has gone out for a message, the message is snoozed under a
//! normalized key until a deadline. Snoozed messages are filtered out of
//! later cycles so the same condition is not reported again before the
//! window closes.

mod model;
mod store;

pub(crate) use model::parse_timestamp;
pub use model::{SnoozeIdentity, SnoozeKey, StoredValue, normalize_subject_key};
pub use store::SnoozeStore;

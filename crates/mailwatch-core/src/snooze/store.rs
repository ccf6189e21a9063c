//! File-backed snooze store.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::model::{SnoozeIdentity, SnoozeKey, StoredValue};
use crate::alert::{AlertLevel, ClassifiedMessage};
use crate::message::Message;
use crate::{Error, Result};

/// Persisted map from snooze key to suppress-until timestamp.
///
/// The file is a flat JSON object. Every successful mutation is written back
/// before the call returns; the in-memory state only changes once the write
/// has succeeded.
#[derive(Debug, Clone)]
pub struct SnoozeStore {
    path: PathBuf,
    identity: SnoozeIdentity,
    entries: BTreeMap<SnoozeKey, StoredValue>,
}

impl SnoozeStore {
    /// Creates an empty store that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            identity: SnoozeIdentity::default(),
            entries: BTreeMap::new(),
        }
    }

    /// Loads the store from `path`.
    ///
    /// A missing, unreadable or malformed file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(path);
        store.entries = read_entries(&store.path);
        debug!(path = %store.path.display(), entries = store.entries.len(), "loaded snooze store");
        store
    }

    /// Sets the key derivation strategy.
    #[must_use]
    pub const fn with_identity(mut self, identity: SnoozeIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Key derivation strategy.
    #[must_use]
    pub const fn identity(&self) -> SnoozeIdentity {
        self.identity
    }

    /// Number of stored entries, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snooze key of `message` under the configured identity.
    #[must_use]
    pub fn key_for(&self, message: &Message) -> SnoozeKey {
        self.identity.key_for(message)
    }

    /// Stored deadline for `key`, live or expired.
    #[must_use]
    pub fn suppressed_until(&self, key: &SnoozeKey) -> Option<DateTime<Utc>> {
        self.entries.get(key).and_then(StoredValue::until)
    }

    /// Whether `message` is suppressed at `now`.
    #[must_use]
    pub fn is_snoozed(&self, message: &Message, now: DateTime<Utc>) -> bool {
        is_live(&self.entries, &self.key_for(message), now)
    }

    /// Removes messages that are currently snoozed.
    #[must_use]
    pub fn filter<T: AlertLevel>(
        &self,
        messages: Vec<ClassifiedMessage<T>>,
        now: DateTime<Utc>,
    ) -> Vec<ClassifiedMessage<T>> {
        let before = messages.len();
        let kept: Vec<_> = messages
            .into_iter()
            .filter(|m| !self.is_snoozed(&m.message, now))
            .collect();
        debug!(suppressed = before - kept.len(), kept = kept.len(), "applied snooze filter");
        kept
    }

    /// Snoozes every message that is not already snoozed until `until`.
    ///
    /// Live entries are left alone, so a re-triggered alert does not extend
    /// its window. Returns the number of keys written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceWriteFailed`] if the file cannot be
    /// written; the store is unchanged in that case.
    pub fn mark_all<T: AlertLevel>(
        &mut self,
        messages: &[ClassifiedMessage<T>],
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let mut next = self.entries.clone();
        let mut written = 0;
        for classified in messages {
            let key = self.key_for(&classified.message);
            if is_live(&next, &key, now) {
                continue;
            }
            next.insert(key, StoredValue::Until(until));
            written += 1;
        }

        if written == 0 {
            debug!("no new snooze entries");
            return Ok(0);
        }

        write_entries(&self.path, &next)?;
        self.entries = next;
        info!(written, until = %until, "snoozed messages");
        Ok(written)
    }

    /// Writes the current entries to disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceWriteFailed`] if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        write_entries(&self.path, &self.entries)
    }

    /// Drops expired timestamp entries and persists the result.
    ///
    /// Non-timestamp values are kept. Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceWriteFailed`] if the file cannot be written.
    pub fn compact(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let next: BTreeMap<_, _> = self
            .entries
            .iter()
            .filter(|(_, value)| value.until().is_none_or(|until| until > now))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let removed = self.entries.len() - next.len();
        if removed > 0 {
            write_entries(&self.path, &next)?;
            self.entries = next;
            info!(removed, "compacted snooze store");
        }
        Ok(removed)
    }
}

fn is_live(
    entries: &BTreeMap<SnoozeKey, StoredValue>,
    key: &SnoozeKey,
    now: DateTime<Utc>,
) -> bool {
    entries
        .get(key)
        .and_then(StoredValue::until)
        .is_some_and(|until| now < until)
}

fn read_entries(path: &Path) -> BTreeMap<SnoozeKey, StoredValue> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no snooze file, starting empty");
            return BTreeMap::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read snooze file, starting empty");
            return BTreeMap::new();
        }
    };

    match serde_json::from_str::<BTreeMap<String, Value>>(&text) {
        Ok(raw) => raw
            .into_iter()
            .map(|(k, v)| (SnoozeKey::from_raw(k), StoredValue::decode(v)))
            .collect(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "malformed snooze file, starting empty");
            BTreeMap::new()
        }
    }
}

/// Writes to a sibling temp file, syncs it, then renames over `path`.
fn write_entries(path: &Path, entries: &BTreeMap<SnoozeKey, StoredValue>) -> Result<()> {
    let raw: BTreeMap<&str, Value> = entries
        .iter()
        .map(|(k, v)| (k.as_str(), v.encode()))
        .collect();
    let json = serde_json::to_vec_pretty(&raw)?;

    let write_failed = |source: io::Error| Error::PersistenceWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_failed)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    if let Err(e) = write_synced(&tmp, &json).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(write_failed(e));
    }
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::alert::AlertTier;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn overdue(id: &str, subject: &str) -> ClassifiedMessage {
        ClassifiedMessage::new(Message::new(id, subject), AlertTier::Overdue)
    }

    fn store_in(dir: &TempDir) -> SnoozeStore {
        SnoozeStore::load(dir.path().join("snooze_tracker.json"))
    }

    #[test]
    fn test_invoice_overdue_window() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let batch = vec![overdue("1", "Invoice overdue")];

        let marked_at = at(1, 0);
        let written = store
            .mark_all(&batch, marked_at + Duration::hours(24), marked_at)
            .unwrap();
        assert_eq!(written, 1);

        assert!(store.filter(batch.clone(), at(1, 12)).is_empty());
        assert_eq!(store.filter(batch, at(2, 1)).len(), 1);
    }

    #[test]
    fn test_mark_all_does_not_extend_live_entries() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let batch = vec![overdue("1", "Invoice overdue")];
        let key = store.key_for(&batch[0].message);

        store.mark_all(&batch, at(2, 0), at(1, 0)).unwrap();
        let written = store.mark_all(&batch, at(9, 0), at(1, 6)).unwrap();
        assert_eq!(written, 0);
        assert_eq!(store.suppressed_until(&key), Some(at(2, 0)));

        // Once expired the entry is overwritten.
        let written = store.mark_all(&batch, at(9, 0), at(3, 0)).unwrap();
        assert_eq!(written, 1);
        assert_eq!(store.suppressed_until(&key), Some(at(9, 0)));
    }

    #[test]
    fn test_replies_share_a_key() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let batch = vec![overdue("1", "Invoice"), overdue("2", "RE: invoice")];

        assert_eq!(store.mark_all(&batch, at(2, 0), at(1, 0)).unwrap(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.is_snoozed(&Message::new("3", "FW: Invoice"), at(1, 1)));
    }

    #[test]
    fn test_persisted_state_survives_reload() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store
            .mark_all(&[overdue("1", "Permit renewal")], at(2, 0), at(1, 0))
            .unwrap();

        let reloaded = store_in(&dir);
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.is_snoozed(&Message::new("9", "permit renewal"), at(1, 12)));

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"permit renewal\": \"2024-01-02T00:00:00Z\""));
    }

    #[test]
    fn test_hand_edited_values_pass_through() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snooze_tracker.json");
        fs::write(
            &path,
            r#"{"weekly report": "whenever", "invoice": "2024-01-02T00:00:00"}"#,
        )
        .unwrap();

        let mut store = SnoozeStore::load(&path);
        assert!(!store.is_snoozed(&Message::new("1", "Weekly report"), at(1, 0)));
        assert!(store.is_snoozed(&Message::new("2", "Invoice"), at(1, 0)));

        store
            .mark_all(&[overdue("3", "Permit")], at(5, 0), at(1, 0))
            .unwrap();
        let raw: BTreeMap<String, Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["weekly report"], Value::String("whenever".into()));
        assert_eq!(raw["invoice"], Value::String("2024-01-02T00:00:00Z".into()));
        assert_eq!(raw.len(), 3);
    }

    #[test]
    fn test_corrupt_file_means_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snooze_tracker.json");
        fs::write(&path, "{not json").unwrap();
        assert!(SnoozeStore::load(&path).is_empty());

        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(SnoozeStore::load(&path).is_empty());
    }

    #[test]
    fn test_failed_save_leaves_state_untouched() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("taken");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("child"), "x").unwrap();

        let mut store = SnoozeStore::new(&path);
        let err = store
            .mark_all(&[overdue("1", "Invoice")], at(2, 0), at(1, 0))
            .unwrap_err();
        assert!(matches!(err, Error::PersistenceWriteFailed { .. }));
        assert!(store.is_empty());
        assert!(!dir.path().join("taken.tmp").exists());
    }

    #[test]
    fn test_compact_removes_expired_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snooze_tracker.json");
        fs::write(
            &path,
            r#"{"a": "2024-01-01T00:00:00Z", "b": "2024-01-09T00:00:00Z", "c": "manual"}"#,
        )
        .unwrap();

        let mut store = SnoozeStore::load(&path);
        assert_eq!(store.compact(at(2, 0)).unwrap(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(SnoozeStore::load(&path).len(), 2);
    }

    #[test]
    fn test_sender_identity_separates_senders() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir).with_identity(SnoozeIdentity::SubjectAndSender);
        let alice = ClassifiedMessage::new(
            Message::new("1", "Invoice").from_sender("alice@example.com"),
            AlertTier::Warning,
        );
        let bob = Message::new("2", "Invoice").from_sender("bob@example.com");

        store.mark_all(&[alice], at(2, 0), at(1, 0)).unwrap();
        assert!(!store.is_snoozed(&bob, at(1, 1)));
    }
}

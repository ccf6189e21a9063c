//! Per-cycle alert state.

use super::classifier::ClassifiedMessage;
use super::tier::{AlertLevel, AlertTier};
use crate::{Error, Result};

/// Classified, unsuppressed messages of the current polling cycle.
///
/// Every presence query fails with [`Error::NotRefreshed`] until
/// [`refresh`](Self::refresh) has been called for the cycle.
#[derive(Debug, Clone)]
pub struct AlertState<T: AlertLevel = AlertTier> {
    messages: Vec<ClassifiedMessage<T>>,
    refreshed: bool,
}

impl<T: AlertLevel> Default for AlertState<T> {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            refreshed: false,
        }
    }
}

impl<T: AlertLevel> AlertState<T> {
    /// Creates an empty, unrefreshed state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs this cycle's messages and marks the state refreshed.
    pub fn refresh(&mut self, messages: Vec<ClassifiedMessage<T>>) {
        self.messages = messages;
        self.refreshed = true;
    }

    /// Drops the messages and clears the refreshed flag.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.refreshed = false;
    }

    /// Whether the current cycle has been refreshed.
    #[must_use]
    pub const fn is_refreshed(&self) -> bool {
        self.refreshed
    }

    /// This cycle's messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRefreshed`] before a refresh.
    pub fn messages(&self) -> Result<&[ClassifiedMessage<T>]> {
        self.ensure_refreshed()?;
        Ok(&self.messages)
    }

    /// Whether any message carries `tier`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRefreshed`] before a refresh.
    pub fn has_tier(&self, tier: T) -> Result<bool> {
        self.ensure_refreshed()?;
        Ok(self.messages.iter().any(|m| m.tier == tier))
    }

    /// Whether any message is overdue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRefreshed`] before a refresh.
    pub fn has_overdue(&self) -> Result<bool> {
        self.has_tier(T::OVERDUE)
    }

    /// Whether any message is a warning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRefreshed`] before a refresh.
    pub fn has_warning(&self) -> Result<bool> {
        self.has_tier(T::WARNING)
    }

    /// Whether any message is a critical warning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRefreshed`] before a refresh.
    pub fn has_critical_warning(&self) -> Result<bool> {
        self.has_tier(T::CRITICAL_WARNING)
    }

    /// The first tier in `priority` that is present this cycle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRefreshed`] before a refresh.
    pub fn active_tier(&self, priority: &[T]) -> Result<Option<T>> {
        for &tier in priority {
            if self.has_tier(tier)? {
                return Ok(Some(tier));
            }
        }
        self.ensure_refreshed()?;
        Ok(None)
    }

    const fn ensure_refreshed(&self) -> Result<()> {
        if self.refreshed {
            Ok(())
        } else {
            Err(Error::NotRefreshed)
        }
    }
}

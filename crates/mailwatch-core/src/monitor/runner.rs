//! The polling loop.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use super::config::MonitorConfig;
use super::sandman::{Sandman, SleepOutcome, StopSignal};
use super::validation::ValidationError;
use crate::alert::{AlertLevel, AlertState, AlertTier, ClassifiedMessage, Classifier};
use crate::message::Normalizer;
use crate::notify::{DeliveryMode, Notifier};
use crate::provider::MailProvider;
use crate::snooze::SnoozeStore;
use crate::{Error, Result};

/// Where the monitor is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePhase {
    /// Not running.
    #[default]
    Idle,
    /// Fetching and classifying messages.
    Refreshing,
    /// Choosing the active tier.
    Evaluating,
    /// Composing and delivering the alert.
    Notifying,
    /// Recording snoozes.
    Snoozing,
    /// Waiting for the next cycle.
    Sleeping,
}

/// Outcome of one polling cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport<T: AlertLevel = AlertTier> {
    /// Evaluation time.
    pub at: DateTime<Utc>,
    /// Items listed by the provider.
    pub fetched: usize,
    /// Items that received a tier.
    pub classified: usize,
    /// Classified items dropped because they were snoozed.
    pub suppressed: usize,
    /// Tier that triggered the alert.
    pub active_tier: Option<T>,
    /// How the alert was delivered, if one was raised.
    pub delivery: Option<DeliveryMode>,
    /// Keys newly written to the snooze store.
    pub snoozed: usize,
}

/// Watches one folder and raises alerts.
pub struct Monitor<P, T: AlertLevel = AlertTier> {
    provider: P,
    config: MonitorConfig<T>,
    normalizer: Normalizer,
    classifier: Classifier<T>,
    snooze: SnoozeStore,
    notifier: Notifier,
    state: AlertState<T>,
    phase: CyclePhase,
}

impl<P: MailProvider, T: AlertLevel> Monitor<P, T> {
    /// Creates a monitor, loading snooze state from the configured file.
    pub fn new(provider: P, config: MonitorConfig<T>, classifier: Classifier<T>) -> Self {
        let snooze =
            SnoozeStore::load(config.snooze_path()).with_identity(config.snooze_identity());
        let notifier = Notifier::new(config.signature()).with_colors(config.colorize());
        Self {
            provider,
            config,
            normalizer: Normalizer::default(),
            classifier,
            snooze,
            notifier,
            state: AlertState::new(),
            phase: CyclePhase::Idle,
        }
    }

    /// Uses a custom normalizer.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Replaces the snooze store.
    #[must_use]
    pub fn with_snooze_store(mut self, store: SnoozeStore) -> Self {
        self.snooze = store;
        self
    }

    /// The provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// The configuration.
    pub const fn config(&self) -> &MonitorConfig<T> {
        &self.config
    }

    /// Alert state of the current cycle.
    pub const fn state(&self) -> &AlertState<T> {
        &self.state
    }

    /// The snooze store.
    pub const fn snooze_store(&self) -> &SnoozeStore {
        &self.snooze
    }

    /// Current phase.
    pub const fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Fetches, classifies and snooze-filters the folder.
    ///
    /// Returns `(fetched, classified, suppressed)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderUnavailable`] if the folder cannot be listed;
    /// the state stays unrefreshed.
    pub async fn refresh(&mut self, now: DateTime<Utc>) -> Result<(usize, usize, usize)> {
        self.phase = CyclePhase::Refreshing;
        self.state.reset();

        let items = self.provider.fetch_messages(self.config.folder()).await?;
        let messages = self.normalizer.normalize_all(&items);
        let classified = self.classifier.classify_all(messages, now);
        let classified_count = classified.len();
        let kept = self.snooze.filter(classified, now);
        let suppressed = classified_count - kept.len();

        debug!(
            fetched = items.len(),
            classified = classified_count,
            suppressed,
            "refreshed messages"
        );
        self.state.refresh(kept);
        Ok((items.len(), classified_count, suppressed))
    }

    /// Runs one cycle at the current time.
    ///
    /// # Errors
    ///
    /// See [`check_for_alerts_at`](Self::check_for_alerts_at).
    pub async fn check_for_alerts(&mut self) -> Result<CycleReport<T>> {
        self.check_for_alerts_at(Utc::now()).await
    }

    /// Runs one cycle: refresh, pick the active tier, notify, snooze.
    ///
    /// At most one alert is raised per cycle; its body lists every
    /// unsuppressed classified message. All of them are snoozed afterwards,
    /// including in dry-run mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderUnavailable`] when fetching or delivery fails,
    /// in which case nothing is snoozed, and
    /// [`Error::PersistenceWriteFailed`] when the snooze file cannot be
    /// written.
    pub async fn check_for_alerts_at(&mut self, now: DateTime<Utc>) -> Result<CycleReport<T>> {
        info!(folder = %self.config.folder(), "checking for messages with an alert");
        let result = self.cycle(now).await;
        self.phase = CyclePhase::Idle;
        result
    }

    async fn cycle(&mut self, now: DateTime<Utc>) -> Result<CycleReport<T>> {
        let (fetched, classified, suppressed) = self.refresh(now).await?;

        self.phase = CyclePhase::Evaluating;
        let active_tier = self.state.active_tier(self.config.priority())?;
        let messages = self.state.messages()?.to_vec();

        let delivery = match active_tier {
            Some(tier) => {
                self.phase = CyclePhase::Notifying;
                info!(tier = tier.name(), messages = messages.len(), "alert found");
                Some(self.notify(&messages).await?)
            }
            None => {
                info!(folder = %self.config.folder(), "no messages with an alert");
                None
            }
        };

        self.phase = CyclePhase::Snoozing;
        let until = now
            .checked_add_signed(self.config.snooze_duration())
            .ok_or_else(|| Error::invalid(ValidationError::SnoozeTooLong))?;
        let snoozed = self.snooze.mark_all(&messages, until, now)?;

        Ok(CycleReport {
            at: now,
            fetched,
            classified,
            suppressed,
            active_tier,
            delivery,
            snoozed,
        })
    }

    async fn notify(&self, messages: &[ClassifiedMessage<T>]) -> Result<DeliveryMode> {
        let recipients = self.config.admin_recipients();
        let body = self.notifier.alert_body(recipients, messages);
        let composed = self.notifier.compose(
            recipients,
            self.config.subject(),
            body,
            self.config.attachments(),
        )?;

        let mode = self.config.delivery();
        match mode {
            DeliveryMode::Send => {
                self.provider.send(&composed).await?;
                info!(to = %composed.recipient_line(), subject = %composed.subject, "alert sent");
            }
            DeliveryMode::Display => {
                self.provider.display(&composed).await?;
                info!(to = %composed.recipient_line(), "alert displayed");
            }
            DeliveryMode::DryRun => {
                warn!(
                    to = %composed.recipient_line(),
                    subject = %composed.subject,
                    "dry run, alert not sent"
                );
            }
        }
        Ok(mode)
    }

    /// Runs cycles until `stop` fires.
    ///
    /// # Errors
    ///
    /// Only unrecoverable errors end the loop early.
    pub async fn run(&mut self, stop: StopSignal) -> Result<()> {
        self.run_until(stop, || false).await
    }

    /// Runs cycles until `stop` fires or `done` returns true.
    ///
    /// `done` is checked before every cycle. Provider failures are logged as
    /// warnings and other recoverable errors as errors; the next cycle
    /// retries either way.
    ///
    /// # Errors
    ///
    /// Returns the first unrecoverable error.
    pub async fn run_until(
        &mut self,
        mut stop: StopSignal,
        mut done: impl FnMut() -> bool,
    ) -> Result<()> {
        let sandman = Sandman::new(self.config.sleep_interval(), self.config.sleep_round());
        info!(
            folder = %self.config.folder(),
            interval_secs = sandman.interval().as_secs(),
            "watching for messages with alerts"
        );

        loop {
            if stop.is_stopped() || done() {
                break;
            }

            match self.check_for_alerts().await {
                Ok(report) => info!(
                    fetched = report.fetched,
                    classified = report.classified,
                    suppressed = report.suppressed,
                    tier = report.active_tier.map(|t| t.name()),
                    delivery = ?report.delivery,
                    snoozed = report.snoozed,
                    "cycle finished"
                ),
                Err(e) if !e.is_recoverable() => {
                    error!(error = %e, "stopping monitor");
                    return Err(e);
                }
                Err(e @ Error::ProviderUnavailable(_)) => {
                    warn!(error = %e, "provider failed, retrying next cycle");
                }
                Err(e) => error!(error = %e, "alert cycle aborted"),
            }

            self.phase = CyclePhase::Sleeping;
            let outcome = sandman.sleep_in_rounds(&mut stop).await;
            self.phase = CyclePhase::Idle;
            if outcome == SleepOutcome::Stopped {
                break;
            }
        }

        info!("monitor stopped");
        Ok(())
    }
}

impl<P, T: AlertLevel> std::fmt::Debug for Monitor<P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("folder", self.config.folder())
            .field("phase", &self.phase)
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

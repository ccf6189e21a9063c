//! Continuous monitoring.
//!
//! A [`Monitor`] polls one folder on an interval. Each cycle it refreshes
//! and classifies the folder, drops snoozed messages, raises at most one
//! alert for the highest-priority tier present, and snoozes what it alerted
//! on. Sleeping between cycles is split into rounds so a [`StopSignal`] is
//! honoured promptly.

mod config;
mod runner;
mod sandman;
mod validation;

pub use config::{
    DEFAULT_SNOOZE_FILE, DEFAULT_SUBJECT, MAX_SNOOZE_DAYS, MonitorConfig, MonitorConfigBuilder,
};
pub use runner::{CycleReport, CyclePhase, Monitor};
pub use sandman::{Sandman, SleepOutcome, StopHandle, StopSignal, stop_channel};
pub use validation::ValidationError;

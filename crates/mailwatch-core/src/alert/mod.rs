//! Alert classification.
//!
//! This module provides:
//! - **Tiers**: the [`AlertLevel`] contract and the built-in [`AlertTier`]
//! - **Rules**: pluggable [`AlertRule`] predicates (keywords, age, due dates)
//! - **Classifier**: first-match evaluation in registration order
//! - **State**: the per-cycle [`AlertState`] that answers "is tier X present?"
//!
//! # Example
//!
//! ```ignore
//! use mailwatch_core::alert::{AlertTier, Classifier, DueDateRule, SubjectKeywordRule};
//!
//! let classifier = Classifier::new()
//!     .with_rule(DueDateRule::new(AlertTier::Overdue, "due", Duration::zero()))
//!     .with_rule(DueDateRule::new(AlertTier::CriticalWarning, "due", Duration::days(1)))
//!     .with_rule(SubjectKeywordRule::new(AlertTier::Warning, ["rfi"]));
//!
//! let tier = classifier.classify(&message, Utc::now());
//! ```

mod classifier;
mod rules;
mod state;
mod tier;

pub use classifier::{AlertRule, ClassifiedMessage, Classifier};
pub use rules::{AgeRule, AllOf, DueDateRule, SubjectKeywordRule};
pub use state::AlertState;
pub use tier::{AlertLevel, AlertTier};

//! Alert tiers.

use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Contract for an alert taxonomy.
///
/// A deployment may bring its own enumeration as long as it names the three
/// required members and is totally ordered.
pub trait AlertLevel: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    /// Approaching a deadline.
    const WARNING: Self;
    /// Close to a deadline.
    const CRITICAL_WARNING: Self;
    /// Past a deadline.
    const OVERDUE: Self;

    /// Name used in logs and alert bodies.
    fn name(&self) -> &'static str;

    /// HTML colour for the tier label, if any.
    fn html_color(&self) -> Option<&'static str> {
        None
    }

    /// Order in which the monitor checks for tiers; the first present wins.
    #[must_use]
    fn default_priority() -> Vec<Self> {
        vec![Self::OVERDUE, Self::WARNING, Self::CRITICAL_WARNING]
    }
}

/// Built-in three-tier taxonomy, ordered by nominal severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTier {
    /// Approaching a deadline.
    Warning,
    /// Close to a deadline.
    CriticalWarning,
    /// Past a deadline.
    Overdue,
}

impl AlertTier {
    /// Parse from the configuration string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "warning" => Some(Self::Warning),
            "critical_warning" | "critical" => Some(Self::CriticalWarning),
            "overdue" => Some(Self::Overdue),
            _ => None,
        }
    }

    /// Convert to the configuration string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::CriticalWarning => "critical_warning",
            Self::Overdue => "overdue",
        }
    }
}

impl AlertLevel for AlertTier {
    const WARNING: Self = Self::Warning;
    const CRITICAL_WARNING: Self = Self::CriticalWarning;
    const OVERDUE: Self = Self::Overdue;

    fn name(&self) -> &'static str {
        match self {
            Self::Warning => "WARNING",
            Self::CriticalWarning => "CRITICAL_WARNING",
            Self::Overdue => "OVERDUE",
        }
    }

    fn html_color(&self) -> Option<&'static str> {
        Some(match self {
            Self::Warning => "#e6a700",
            Self::CriticalWarning => "#e8590c",
            Self::Overdue => "#c92a2a",
        })
    }
}

impl std::fmt::Display for AlertTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(AlertLevel::name(self))
    }
}

impl std::str::FromStr for AlertTier {
    type Err = crate::monitor::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::monitor::ValidationError::UnknownTier(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_roundtrip() {
        for tier in [
            AlertTier::Warning,
            AlertTier::CriticalWarning,
            AlertTier::Overdue,
        ] {
            assert_eq!(AlertTier::parse(tier.as_str()), Some(tier));
        }
        assert_eq!(AlertTier::parse("Critical-Warning"), Some(AlertTier::CriticalWarning));
        assert!("urgent".parse::<AlertTier>().is_err());
    }

    #[test]
    fn test_severity_order() {
        assert!(AlertTier::Warning < AlertTier::CriticalWarning);
        assert!(AlertTier::CriticalWarning < AlertTier::Overdue);
    }

    #[test]
    fn test_default_priority_checks_overdue_then_warning() {
        assert_eq!(
            AlertTier::default_priority(),
            vec![
                AlertTier::Overdue,
                AlertTier::Warning,
                AlertTier::CriticalWarning
            ]
        );
    }
}

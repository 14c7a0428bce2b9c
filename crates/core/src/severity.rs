//! Severity tri-state shared by run status and alert severity.
//!
//! The order is total (`Green < Amber < Red`), so "worst of" is just `max`.
//! Anything that is not exactly one of the three known values normalizes to
//! [`Severity::Amber`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Traffic-light severity used for run status, edge severity, and alerts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Green,
    Amber,
    Red,
}

impl Severity {
    /// Lowercase wire/database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Green => "green",
            Severity::Amber => "amber",
            Severity::Red => "red",
        }
    }

    /// Parse a known severity string (case-insensitive).
    pub fn parse(raw: &str) -> Option<Severity> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "green" => Some(Severity::Green),
            "amber" => Some(Severity::Amber),
            "red" => Some(Severity::Red),
            _ => None,
        }
    }

    /// Normalize an optional, possibly unknown severity string.
    ///
    /// Missing, empty, or unrecognized values become `Amber`.
    pub fn normalize(raw: Option<&str>) -> Severity {
        raw.and_then(Severity::parse).unwrap_or(Severity::Amber)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_green_amber_red() {
        assert!(Severity::Green < Severity::Amber);
        assert!(Severity::Amber < Severity::Red);
    }

    #[test]
    fn max_picks_the_worst() {
        let worst = [Severity::Green, Severity::Red, Severity::Amber]
            .into_iter()
            .max();
        assert_eq!(worst, Some(Severity::Red));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Severity::parse("RED"), Some(Severity::Red));
        assert_eq!(Severity::parse(" amber "), Some(Severity::Amber));
    }

    #[test]
    fn normalize_defaults_to_amber() {
        assert_eq!(Severity::normalize(None), Severity::Amber);
        assert_eq!(Severity::normalize(Some("")), Severity::Amber);
        assert_eq!(Severity::normalize(Some("critical")), Severity::Amber);
        assert_eq!(Severity::normalize(Some("green")), Severity::Green);
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Red).unwrap(), "\"red\"");
        let parsed: Severity = serde_json::from_str("\"amber\"").unwrap();
        assert_eq!(parsed, Severity::Amber);
    }
}

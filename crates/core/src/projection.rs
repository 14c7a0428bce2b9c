//! Run-status projection.
//!
//! The run row caches the current status; the occurrence log is the audit
//! trail. The projection is a pure function of the new event's outcome so it
//! can be tested without any state.

use crate::severity::Severity;

/// Status a run takes after an event with the given outcome.
///
/// Order violations dominate; lateness takes the worst severity among the
/// cleared expectations (amber when none carried one); otherwise green.
pub fn derive_status(late: bool, order_violation: bool, cleared: &[Severity]) -> Severity {
    if order_violation {
        return Severity::Red;
    }
    if late {
        return worst_cleared(cleared);
    }
    Severity::Green
}

/// Severity for an alert raised from a rule evaluation.
pub fn alert_severity(order_violation: bool, cleared: &[Severity]) -> Severity {
    if order_violation {
        return Severity::Red;
    }
    worst_cleared(cleared)
}

fn worst_cleared(cleared: &[Severity]) -> Severity {
    cleared.iter().copied().max().unwrap_or(Severity::Amber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_violation_is_always_red() {
        assert_eq!(derive_status(true, true, &[Severity::Green]), Severity::Red);
        assert_eq!(derive_status(false, true, &[]), Severity::Red);
    }

    #[test]
    fn late_takes_worst_cleared_severity() {
        let cleared = [Severity::Green, Severity::Red, Severity::Amber];
        assert_eq!(derive_status(true, false, &cleared), Severity::Red);
    }

    #[test]
    fn late_without_severities_defaults_to_amber() {
        assert_eq!(derive_status(true, false, &[]), Severity::Amber);
    }

    #[test]
    fn on_time_in_order_is_green() {
        assert_eq!(derive_status(false, false, &[Severity::Red]), Severity::Green);
    }

    #[test]
    fn alert_severity_matches_status_rules() {
        assert_eq!(alert_severity(true, &[Severity::Green]), Severity::Red);
        assert_eq!(alert_severity(false, &[Severity::Amber]), Severity::Amber);
        assert_eq!(alert_severity(false, &[]), Severity::Amber);
    }
}

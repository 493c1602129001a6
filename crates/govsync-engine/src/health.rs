//! Health classification.
//!
//! Collapses the many upstream state vocabularies into a coarse
//! three-way label for at-a-glance flagging. The raw state string is
//! preserved verbatim on the record; this signal is intentionally
//! lossy.

use govsync_core::HealthStatus;

/// Classify an upstream state string.
///
/// Case-insensitive substring match: stopped/off/disabled/suspended
/// means [`HealthStatus::Disabled`], failed/issue means
/// [`HealthStatus::Issues`], anything else is healthy.
#[must_use]
pub fn classify(state: &str) -> HealthStatus {
    let lower = state.to_lowercase();

    if ["stopped", "off", "disabled", "suspended"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        return HealthStatus::Disabled;
    }

    if ["failed", "issue"].iter().any(|needle| lower.contains(needle)) {
        return HealthStatus::Issues;
    }

    HealthStatus::Healthy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_states() {
        assert_eq!(classify("Stopped"), HealthStatus::Disabled);
        assert_eq!(classify("TurnedOff"), HealthStatus::Disabled);
        assert_eq!(classify("suspended by admin"), HealthStatus::Disabled);
        assert_eq!(classify("DISABLED"), HealthStatus::Disabled);
    }

    #[test]
    fn test_issue_states() {
        assert_eq!(classify("Failed Deployment"), HealthStatus::Issues);
        assert_eq!(classify("known issue"), HealthStatus::Issues);
    }

    #[test]
    fn test_healthy_states() {
        assert_eq!(classify("Started"), HealthStatus::Healthy);
        assert_eq!(classify("Active"), HealthStatus::Healthy);
        assert_eq!(classify("Succeeded"), HealthStatus::Healthy);
        assert_eq!(classify(""), HealthStatus::Healthy);
    }

    #[test]
    fn test_disabled_outranks_issues() {
        // A state mentioning both reads as deliberately stopped.
        assert_eq!(classify("stopped after failure"), HealthStatus::Disabled);
    }
}

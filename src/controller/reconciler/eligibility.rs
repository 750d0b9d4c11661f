//! # Eligibility
//!
//! Decides whether a pod is a garbage collection candidate and whether it
//! has outlived `max_age`.

use crate::constants::{POD_PHASE_FAILED, POD_REASON_EVICTED};
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;
use std::time::Duration;

/// A pod is a candidate only when it failed because it was evicted
#[must_use]
pub fn is_evicted(pod: &Pod) -> bool {
    pod.status.as_ref().is_some_and(|status| {
        status.phase.as_deref() == Some(POD_PHASE_FAILED)
            && status.reason.as_deref() == Some(POD_REASON_EVICTED)
    })
}

/// Creation timestamp of a pod
#[must_use]
pub fn creation_time(pod: &Pod) -> Option<DateTime<Utc>> {
    pod.metadata.creation_timestamp.as_ref().map(|time| time.0)
}

/// Whether `creationTimestamp + max_age` lies strictly before `now`
///
/// Always false when `max_age` is zero or the pod has no creation timestamp.
#[must_use]
pub fn is_expired(pod: &Pod, max_age: Duration, now: DateTime<Utc>) -> bool {
    if max_age.is_zero() {
        return false;
    }
    let Some(created) = creation_time(pod) else {
        return false;
    };
    let Ok(max_age) = chrono::Duration::from_std(max_age) else {
        return false;
    };
    created
        .checked_add_signed(max_age)
        .is_some_and(|deadline| deadline < now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pod(phase: &str, reason: Option<&str>, created: DateTime<Utc>) -> Pod {
        serde_json::from_value(json!({
            "metadata": {
                "name": "worker-abc",
                "namespace": "default",
                "creationTimestamp": created.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            },
            "status": { "phase": phase, "reason": reason },
        }))
        .unwrap()
    }

    #[test]
    fn test_is_evicted_requires_failed_and_evicted() {
        let now = Utc::now();
        assert!(is_evicted(&pod("Failed", Some("Evicted"), now)));
        assert!(!is_evicted(&pod("Failed", Some("OOMKilled"), now)));
        assert!(!is_evicted(&pod("Failed", None, now)));
        assert!(!is_evicted(&pod("Running", Some("Evicted"), now)));
        assert!(!is_evicted(&pod("Succeeded", None, now)));
        assert!(!is_evicted(&Pod::default()));
    }

    #[test]
    fn test_is_evicted_is_case_sensitive() {
        assert!(!is_evicted(&pod("failed", Some("evicted"), Utc::now())));
    }

    #[test]
    fn test_creation_time_round_trips_seconds() {
        let created = DateTime::parse_from_rfc3339("2024-03-01T12:30:45Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            creation_time(&pod("Failed", Some("Evicted"), created)),
            Some(created)
        );
        assert_eq!(creation_time(&Pod::default()), None);
    }

    #[test]
    fn test_creation_time_keeps_subsecond_precision() {
        let evicted: Pod = serde_json::from_value(json!({
            "metadata": {
                "name": "worker-abc",
                "namespace": "default",
                "creationTimestamp": "2024-03-01T12:30:45.5Z",
            },
            "status": { "phase": "Failed", "reason": "Evicted" },
        }))
        .unwrap();
        let expected = DateTime::parse_from_rfc3339("2024-03-01T12:30:45.5Z")
            .unwrap()
            .with_timezone(&Utc);

        let created = creation_time(&evicted).unwrap();
        assert_eq!(created, expected);
        assert_eq!(created.timestamp_subsec_millis(), 500);

        // Deadline lands on the half second
        let max_age = Duration::from_secs(60);
        let deadline = expected + chrono::Duration::seconds(60);
        assert!(!is_expired(&evicted, max_age, deadline));
        assert!(is_expired(
            &evicted,
            max_age,
            deadline + chrono::Duration::milliseconds(1)
        ));
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let two_hours_old = pod("Failed", Some("Evicted"), now - chrono::Duration::hours(2));
        let one_hour = Duration::from_secs(3600);
        let three_hours = Duration::from_secs(3 * 3600);

        assert!(is_expired(&two_hours_old, one_hour, now));
        assert!(!is_expired(&two_hours_old, three_hours, now));
        assert!(!is_expired(&two_hours_old, Duration::ZERO, now));
    }

    #[test]
    fn test_is_expired_boundary_is_exclusive() {
        let created = DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let evicted = pod("Failed", Some("Evicted"), created);
        let max_age = Duration::from_secs(60);
        let deadline = created + chrono::Duration::seconds(60);

        assert!(!is_expired(&evicted, max_age, deadline));
        assert!(is_expired(
            &evicted,
            max_age,
            deadline + chrono::Duration::seconds(1)
        ));
    }

    #[test]
    fn test_is_expired_without_timestamp() {
        assert!(!is_expired(
            &Pod::default(),
            Duration::from_secs(1),
            Utc::now()
        ));
    }
}

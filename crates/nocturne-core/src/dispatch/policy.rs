//! Trust policy for trigger identifiers.

use chrono::{DateTime, Utc};
use nocturne_types::session::TrustDecision;

const MANUAL_PREFIX: &str = "manual";
const SCHEDULED_PREFIX: &str = "scheduled";
const TEST_MARKER: &str = "test";

/// Decide whether a trigger id needs upstream confirmation.
///
/// Local invocations (`manual*`, `scheduled*`, or exactly `test`) are trusted
/// unconditionally. Anything else is an upstream sleep id.
pub fn classify_trigger(trigger_id: &str) -> TrustDecision {
    if trigger_id.starts_with(MANUAL_PREFIX)
        || trigger_id.starts_with(SCHEDULED_PREFIX)
        || trigger_id == TEST_MARKER
    {
        TrustDecision::Trusted
    } else {
        TrustDecision::NeedsLookup
    }
}

/// Trigger id for a manual invocation started at `now`.
pub fn manual_trigger_id(now: DateTime<Utc>) -> String {
    format!("{MANUAL_PREFIX}-{}", now.timestamp_millis())
}

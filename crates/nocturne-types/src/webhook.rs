//! Inbound webhook payload from the biometric service.

use serde::{Deserialize, Serialize};

/// Event type that starts a night exploration.
pub const SLEEP_UPDATED: &str = "sleep.updated";

/// Body of a webhook delivery.
///
/// Untrusted: only parsed after the signature has been verified. `id` is the
/// upstream sleep identifier and becomes the exploration's trigger id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub user_id: i64,
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub trace_id: String,
}

impl WebhookPayload {
    /// Whether this event should start an exploration.
    pub fn is_trigger_event(&self, trigger_event: &str) -> bool {
        self.event_type == trigger_event
    }
}

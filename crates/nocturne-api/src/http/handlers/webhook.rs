//! Webhook receiver for sleep events.
//!
//! Authenticates the delivery against the webhook secret from the credential
//! file, then hands trigger events to the dispatcher without waiting for it.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::HeaderMap;

use nocturne_core::credentials::CredentialStore;
use nocturne_infra::signature;
use nocturne_types::webhook::WebhookPayload;

use crate::http::error::AppError;
use crate::state::AppState;

/// POST /webhook - Receive a signed event.
///
/// - Missing signature or timestamp header: 401
/// - Signature mismatch: 401, dispatcher untouched
/// - Unreadable credential file: 500
/// - Body that is not a payload: 400
/// - Anything else: 200, dispatching first when the event type triggers
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<&'static str, AppError> {
    // The raw bytes are what was signed; parse only after verifying.
    let body = body.map_err(|e| AppError::MalformedInput(e.body_text()))?;

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let (Some(signature), Some(timestamp)) = (
        header(&state.webhook.signature_header),
        header(&state.webhook.timestamp_header),
    ) else {
        tracing::warn!("webhook rejected: missing signature headers");
        return Err(AppError::Unauthorized("missing signature"));
    };

    let credentials = state.credentials.load().await.map_err(|e| {
        AppError::Internal(format!("cannot verify webhook: {e}"))
    })?;

    if !signature::verify(timestamp, &body, signature, credentials.webhook_key()) {
        tracing::warn!(timestamp = %timestamp, "webhook rejected: invalid signature");
        return Err(AppError::Unauthorized("invalid signature"));
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::MalformedInput(format!("invalid payload: {e}")))?;

    tracing::info!(
        event_type = %payload.event_type,
        user_id = payload.user_id,
        trace_id = %payload.trace_id,
        "webhook received"
    );

    if payload.is_trigger_event(&state.webhook.trigger_event) {
        state.dispatcher.dispatch(payload.id);
    }

    Ok("ok")
}

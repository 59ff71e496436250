//! Router for the provider webhook

use std::sync::{Arc, RwLock};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::Query;
use serde_json::json;
use tracing::Instrument;
use uuid::Uuid;

use super::public::{ChallengeParams, WebhookEvent};
use super::verify::verify_signature;
use crate::api::public::ApiError;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

const SIGNATURE_HEADER: &str = "x-signature";

/// Endpoint verification handshake: echo the challenge token back
/// verbatim. The provider sends this before any signed delivery.
async fn challenge(Query(params): Query<ChallengeParams>) -> Result<Response, ApiError> {
    let Some(token) = params.challenge else {
        return Err(ApiError::invalid_payload("missing challenge parameter"));
    };
    tracing::info!("answering webhook challenge");
    Ok(token.into_response())
}

/// Handle a webhook delivery. The signature covers the exact raw body
/// bytes, so the body is read unparsed first.
async fn receive(
    State(state): State<SharedState>,
    Query(params): Query<ChallengeParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    // Some providers re-run the handshake as a POST
    if let Some(token) = params.challenge {
        tracing::info!("answering webhook challenge");
        return Ok(token.into_response());
    }

    let (secret, processor) = {
        let state = state.read().unwrap();
        (
            state.config.webhook_secret.clone(),
            Arc::clone(&state.processor),
        )
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !verify_signature(&secret, &body, signature) {
        return Err(ApiError::unauthorized("webhook signature mismatch"));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|err| ApiError::invalid_payload(format!("malformed webhook payload: {err}")))?;
    let object_id = event.data.object.id;
    if object_id.is_empty() {
        return Err(ApiError::invalid_payload("missing object id"));
    }

    let request_id = Uuid::new_v4().simple().to_string()[..8].to_string();
    let span = tracing::info_span!(
        "webhook",
        %request_id,
        event_type = %event.event_type,
        %object_id,
    );

    async move {
        match event.event_type.as_str() {
            "message.created" => {
                let updated = processor.on_message_created(&object_id).await?;
                tracing::debug!(updated, "processed message.created");
                Ok(Json(json!({ "ok": true, "action": "message.created" })).into_response())
            }
            "message.updated" => {
                let updated = processor.on_message_updated(&object_id).await?;
                tracing::debug!(updated, "processed message.updated");
                Ok(Json(json!({ "ok": true, "action": "message.updated" })).into_response())
            }
            other => {
                tracing::debug!(event_type = other, "ignoring unhandled event type");
                Ok(Json(json!({ "ok": true, "skipped": true })).into_response())
            }
        }
    }
    .instrument(span)
    .await
}

/// Create the webhook router
pub fn router() -> Router<SharedState> {
    Router::new().route("/nylas", get(challenge).post(receive))
}

//! Public types for the webhook API
use serde::{Deserialize, Serialize};

/// Webhook delivery envelope. Only the event type and the object id
/// are read from it; all mailbox state is fetched fresh.
#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookData {
    pub object: WebhookObject,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookObject {
    pub id: String,
}

/// Endpoint verification handshake parameters
#[derive(Debug, Deserialize)]
pub struct ChallengeParams {
    pub challenge: Option<String>,
}

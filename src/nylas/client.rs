//! HTTP client for the Nylas v3 API, scoped to a single grant.

use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::models::{CleanMessage, Folder, Message, Thread};

/// The clean-messages endpoint rejects requests with more ids than
/// this, so larger fetches are split into batches.
const CLEAN_BATCH_SIZE: usize = 20;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Mailbox operations the webhook handlers need. Implemented by
/// [`NylasClient`] in production and by an in-memory fake in tests.
#[async_trait]
pub trait MailProvider: Send + Sync {
    async fn get_message(&self, message_id: &str) -> Result<Message>;

    async fn get_thread(&self, thread_id: &str) -> Result<Thread>;

    async fn get_folders(&self) -> Result<Vec<Folder>>;

    /// Replaces the message's folder set and returns the message as
    /// the provider now sees it.
    async fn update_message_folders(
        &self,
        message_id: &str,
        folder_ids: Vec<String>,
    ) -> Result<Message>;

    /// Fetches messages with bodies converted to markdown.
    async fn get_clean_messages(&self, message_ids: &[String]) -> Result<Vec<CleanMessage>>;
}

/// All responses arrive wrapped in a `data` envelope.
#[derive(Deserialize)]
struct ApiResponse<T> {
    data: T,
}

pub struct NylasClient {
    client: Client,
    base_url: String,
    api_key: String,
    grant_id: String,
}

impl NylasClient {
    pub fn new(base_url: &str, api_key: &str, grant_id: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            grant_id: grant_id.to_string(),
        }
    }

    fn grant_url(&self, endpoint: &str) -> String {
        format!("{}/grants/{}{}", self.base_url, self.grant_id, endpoint)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let resp = self
            .client
            .get(self.grant_url(endpoint))
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            bail!("Nylas API request failed: {} - {}", status, body);
        }

        let parsed: ApiResponse<T> = serde_json::from_str(&body)?;
        Ok(parsed.data)
    }

    async fn put_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> Result<T> {
        let resp = self
            .client
            .put(self.grant_url(endpoint))
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            bail!("Nylas API request failed: {} - {}", status, body);
        }

        let parsed: ApiResponse<T> = serde_json::from_str(&body)?;
        Ok(parsed.data)
    }
}

#[async_trait]
impl MailProvider for NylasClient {
    async fn get_message(&self, message_id: &str) -> Result<Message> {
        self.get_json(&format!("/messages/{message_id}")).await
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Thread> {
        self.get_json(&format!("/threads/{thread_id}")).await
    }

    async fn get_folders(&self) -> Result<Vec<Folder>> {
        // A single page covers any realistic label count.
        self.get_json("/folders?limit=200").await
    }

    async fn update_message_folders(
        &self,
        message_id: &str,
        folder_ids: Vec<String>,
    ) -> Result<Message> {
        self.put_json(
            &format!("/messages/{message_id}"),
            &json!({ "folders": folder_ids }),
        )
        .await
    }

    async fn get_clean_messages(&self, message_ids: &[String]) -> Result<Vec<CleanMessage>> {
        let mut cleaned = Vec::with_capacity(message_ids.len());
        for batch in message_ids.chunks(CLEAN_BATCH_SIZE) {
            let payload = json!({
                "message_id": batch,
                "ignore_images": true,
                "ignore_links": false,
                "html_as_markdown": true,
                "images_as_markdown": true,
            });
            let mut page: Vec<CleanMessage> =
                self.put_json("/messages/clean", &payload).await?;
            cleaned.append(&mut page);
        }
        Ok(cleaned)
    }
}

//! Braintrust prompt invocation. The prompt is addressed by project
//! name and slug; its output is the [`Classification`] JSON, sometimes
//! wrapped in a string by chat-style prompts.

use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{Classification, Classifier, ClassifierInput};

const INVOKE_TIMEOUT: Duration = Duration::from_secs(60);

pub struct BraintrustClassifier {
    client: Client,
    base_url: String,
    api_key: String,
    project_name: String,
    slug: String,
}

impl BraintrustClassifier {
    pub fn new(base_url: &str, api_key: &str, project_name: &str, slug: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            project_name: project_name.to_string(),
            slug: slug.to_string(),
        }
    }
}

#[async_trait]
impl Classifier for BraintrustClassifier {
    async fn classify(&self, input: &ClassifierInput) -> Result<Classification> {
        let payload = json!({
            "project_name": self.project_name,
            "slug": self.slug,
            "input": input,
            "stream": false,
        });

        let resp = self
            .client
            .post(format!("{}/function/invoke", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(INVOKE_TIMEOUT)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            bail!("Braintrust invoke failed: {} - {}", status, body);
        }

        parse_invoke_result(&body)
    }
}

fn parse_invoke_result(body: &str) -> Result<Classification> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    match value {
        serde_json::Value::String(inner) => Ok(serde_json::from_str(&inner)?),
        other => Ok(serde_json::from_value(other)?),
    }
}

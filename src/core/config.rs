use std::env;

/// Default priority order for workflow labels, highest first. A message
/// should only ever carry one of these at a time.
pub const DEFAULT_WORKFLOW_LABELS: &[&str] = &["triage", "respond", "review", "drafted"];

/// Default prefix that marks a label as classifier-managed.
pub const DEFAULT_CATEGORY_PREFIX: &str = "ai/";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub nylas_api_url: String,
    pub nylas_api_key: String,
    pub nylas_grant_id: String,
    pub webhook_secret: String,
    pub braintrust_api_url: String,
    pub braintrust_api_key: Option<String>,
    pub braintrust_project: Option<String>,
    pub braintrust_slug: Option<String>,
    pub workflow_labels: Vec<String>,
    pub category_prefix: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let nylas_api_url = env::var("NYLAS_API_URL")
            .unwrap_or_else(|_| "https://api.us.nylas.com/v3".to_string());
        let nylas_api_key = env::var("NYLAS_API_KEY").expect("Missing env var NYLAS_API_KEY");
        let nylas_grant_id = env::var("NYLAS_GRANT_ID").expect("Missing env var NYLAS_GRANT_ID");
        let webhook_secret =
            env::var("NYLAS_WEBHOOK_SECRET").expect("Missing env var NYLAS_WEBHOOK_SECRET");
        let braintrust_api_url = env::var("BRAINTRUST_API_URL")
            .unwrap_or_else(|_| "https://api.braintrust.dev/v1".to_string());
        let braintrust_api_key = env::var("BRAINTRUST_API_KEY").ok();
        let braintrust_project = env::var("BRAINTRUST_PROJECT_NAME").ok();
        let braintrust_slug = env::var("BRAINTRUST_PROMPT_SLUG").ok();
        let workflow_labels = env::var("MAILFLOW_WORKFLOW_LABELS")
            .map(|raw| parse_label_list(&raw))
            .unwrap_or_else(|_| {
                DEFAULT_WORKFLOW_LABELS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });
        let category_prefix = env::var("MAILFLOW_CATEGORY_PREFIX")
            .unwrap_or_else(|_| DEFAULT_CATEGORY_PREFIX.to_string());

        Self {
            nylas_api_url,
            nylas_api_key,
            nylas_grant_id,
            webhook_secret,
            braintrust_api_url,
            braintrust_api_key,
            braintrust_project,
            braintrust_slug,
            workflow_labels,
            category_prefix,
        }
    }
}

/// Parse a comma-separated label list, e.g. "triage,respond,review,drafted".
/// Order is significant: earlier labels outrank later ones.
fn parse_label_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

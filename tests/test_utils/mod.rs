//! Test utilities for integration tests
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use hmac::{Hmac, Mac};
use http::Request;
use sha2::Sha256;

use mailflow::api::AppState;
use mailflow::api::app;
use mailflow::classify::{Classification, Classifier, ClassifierInput};
use mailflow::core::AppConfig;
use mailflow::labels::WorkflowPolicy;
use mailflow::nylas::{CleanMessage, Folder, MailProvider, Message, Participant, Thread};
use mailflow::workflow::{Clock, DedupCache, EventProcessor};

pub const TEST_SECRET: &str = "test-webhook-secret";

/// Clock the tests advance by hand.
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(0),
        })
    }

    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateCall {
    pub message_id: String,
    pub folder_ids: Vec<String>,
}

struct MailboxState {
    messages: HashMap<String, Message>,
    threads: HashMap<String, Thread>,
    folders: Vec<Folder>,
}

/// In-memory mail provider. Folder updates behave like the real one:
/// the requested set replaces the message's folders, except that
/// provider-managed system folders the message already sits in are
/// kept even when the request omits them.
pub struct FakeProvider {
    state: Mutex<MailboxState>,
    update_calls: Mutex<Vec<UpdateCall>>,
}

const SYSTEM_FOLDERS: &[&str] = &["SENT", "DRAFT", "DRAFTS", "TRASH", "SPAM"];

impl FakeProvider {
    pub fn new(folders: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MailboxState {
                messages: HashMap::new(),
                threads: HashMap::new(),
                folders: folders
                    .iter()
                    .map(|(id, name)| Folder {
                        id: id.to_string(),
                        name: name.to_string(),
                    })
                    .collect(),
            }),
            update_calls: Mutex::new(Vec::new()),
        })
    }

    pub fn add_message(&self, message: Message) {
        let mut state = self.state.lock().unwrap();
        state.messages.insert(message.id.clone(), message);
    }

    pub fn add_thread(&self, thread_id: &str, message_ids: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.threads.insert(
            thread_id.to_string(),
            Thread {
                id: thread_id.to_string(),
                subject: String::new(),
                participants: vec![],
                message_ids: message_ids.iter().map(|id| id.to_string()).collect(),
                folders: vec![],
            },
        );
    }

    /// The message as the provider currently stores it.
    pub fn message(&self, message_id: &str) -> Message {
        self.state.lock().unwrap().messages[message_id].clone()
    }

    pub fn update_calls(&self) -> Vec<UpdateCall> {
        self.update_calls.lock().unwrap().clone()
    }

    fn folder_name(state: &MailboxState, folder_id: &str) -> String {
        state
            .folders
            .iter()
            .find(|f| f.id == folder_id)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| folder_id.to_string())
    }
}

#[async_trait]
impl MailProvider for FakeProvider {
    async fn get_message(&self, message_id: &str) -> Result<Message> {
        let state = self.state.lock().unwrap();
        state
            .messages
            .get(message_id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown message: {message_id}"))
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Thread> {
        let state = self.state.lock().unwrap();
        state
            .threads
            .get(thread_id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown thread: {thread_id}"))
    }

    async fn get_folders(&self) -> Result<Vec<Folder>> {
        Ok(self.state.lock().unwrap().folders.clone())
    }

    async fn update_message_folders(
        &self,
        message_id: &str,
        folder_ids: Vec<String>,
    ) -> Result<Message> {
        self.update_calls.lock().unwrap().push(UpdateCall {
            message_id: message_id.to_string(),
            folder_ids: folder_ids.clone(),
        });

        let mut state = self.state.lock().unwrap();
        let preserved: Vec<String> = {
            let message = state
                .messages
                .get(message_id)
                .ok_or_else(|| anyhow!("unknown message: {message_id}"))?;
            message
                .folders
                .iter()
                .filter(|id| {
                    let name = Self::folder_name(&state, id);
                    SYSTEM_FOLDERS
                        .iter()
                        .any(|sys| name.eq_ignore_ascii_case(sys))
                })
                .cloned()
                .collect()
        };

        let mut new_folders = folder_ids;
        for id in preserved {
            if !new_folders.contains(&id) {
                new_folders.push(id);
            }
        }

        let message = state.messages.get_mut(message_id).unwrap();
        message.folders = new_folders;
        Ok(message.clone())
    }

    async fn get_clean_messages(&self, message_ids: &[String]) -> Result<Vec<CleanMessage>> {
        let state = self.state.lock().unwrap();
        Ok(message_ids
            .iter()
            .filter_map(|id| state.messages.get(id))
            .map(|message| CleanMessage {
                id: message.id.clone(),
                from: message.from.clone(),
                date: message.date,
                conversation: format!("Body of {}", message.id),
            })
            .collect())
    }
}

enum ClassifierBehavior {
    Respond(Classification),
    Fail(String),
}

/// Classifier stub that records every input it is given.
pub struct FakeClassifier {
    behavior: ClassifierBehavior,
    inputs: Mutex<Vec<ClassifierInput>>,
}

impl FakeClassifier {
    pub fn returning(labels: &[&str], reason: &str) -> Arc<Self> {
        Arc::new(Self {
            behavior: ClassifierBehavior::Respond(Classification {
                labels: labels.iter().map(|l| l.to_string()).collect(),
                reason: reason.to_string(),
            }),
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            behavior: ClassifierBehavior::Fail(message.to_string()),
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn inputs(&self) -> Vec<ClassifierInput> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for FakeClassifier {
    async fn classify(&self, input: &ClassifierInput) -> Result<Classification> {
        self.inputs.lock().unwrap().push(input.clone());
        match &self.behavior {
            ClassifierBehavior::Respond(classification) => Ok(classification.clone()),
            ClassifierBehavior::Fail(message) => Err(anyhow!("{message}")),
        }
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        nylas_api_url: String::from("http://localhost:1"),
        nylas_api_key: String::from("test-api-key"),
        nylas_grant_id: String::from("test-grant"),
        webhook_secret: String::from(TEST_SECRET),
        braintrust_api_url: String::from("http://localhost:1"),
        braintrust_api_key: None,
        braintrust_project: None,
        braintrust_slug: None,
        workflow_labels: vec![
            String::from("triage"),
            String::from("respond"),
            String::from("review"),
            String::from("drafted"),
        ],
        category_prefix: String::from("ai/"),
    }
}

/// Creates a test application router around the fakes. Each call owns
/// its state, so tests run in parallel.
pub fn test_app(
    provider: Arc<FakeProvider>,
    classifier: Option<Arc<FakeClassifier>>,
    clock: Arc<ManualClock>,
) -> Router {
    let config = test_config();
    let processor = Arc::new(EventProcessor::new(
        provider,
        classifier.map(|c| c as Arc<dyn Classifier>),
        DedupCache::new(clock),
        WorkflowPolicy::new(config.workflow_labels.clone()),
        config.category_prefix.clone(),
    ));
    let app_state = AppState::new(config, processor);
    app(Arc::new(RwLock::new(app_state)))
}

pub fn participant(name: &str, email: &str) -> Participant {
    Participant {
        name: name.to_string(),
        email: email.to_string(),
    }
}

pub fn message(id: &str, thread_id: &str, folder_ids: &[&str]) -> Message {
    Message {
        id: id.to_string(),
        thread_id: Some(thread_id.to_string()),
        subject: format!("Subject of {id}"),
        from: vec![participant("Ada Lovelace", "ada@example.com")],
        to: vec![participant("", "me@example.com")],
        cc: vec![],
        date: 1704708000,
        folders: folder_ids.iter().map(|id| id.to_string()).collect(),
        attachments: vec![],
    }
}

pub fn sign(body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(TEST_SECRET.as_bytes()).unwrap();
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub fn event_body(event_type: &str, object_id: &str) -> String {
    serde_json::json!({
        "type": event_type,
        "data": { "object": { "id": object_id } }
    })
    .to_string()
}

/// A delivery with a valid signature over the body.
pub fn signed_post(body: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/webhook/nylas")
        .method("POST")
        .header("content-type", "application/json")
        .header("x-signature", sign(body))
        .body(Body::from(body.to_string()))
        .unwrap()
}

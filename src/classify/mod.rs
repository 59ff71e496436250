//! Categorization of incoming mail through a hosted prompt. Builds the
//! classifier input from thread context, then applies the returned
//! labels, keeping provider-managed folders untouched.

pub mod braintrust;

use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use braintrust::BraintrustClassifier;

use crate::labels::FolderDirectory;
use crate::labels::policy;
use crate::nylas::{CleanMessage, MailProvider, Message, Participant};

/// How many thread messages of context the classifier sees.
const CONTEXT_MESSAGES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ClassifierInput {
    pub subject: String,
    pub from: String,
    pub to: String,
    pub cc: String,
    pub date: String,
    pub is_reply: bool,
    pub thread_length: usize,
    pub has_attachments: bool,
    pub attachment_types: Vec<String>,
    pub context: String,
}

/// What the prompt returns. An empty `labels` list is a valid answer,
/// not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classification {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub reason: String,
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, input: &ClassifierInput) -> Result<Classification>;
}

/// Assembles the classifier input for `message`, pulling up to
/// [`CONTEXT_MESSAGES`] cleaned bodies from its thread.
pub async fn build_classifier_input(
    provider: &dyn MailProvider,
    message: &Message,
) -> Result<ClassifierInput> {
    let (context_ids, thread_length, is_reply) = match message.thread_id.as_deref() {
        Some(thread_id) => {
            let thread = provider.get_thread(thread_id).await?;
            let ids = select_context_ids(&thread.message_ids, &message.id);
            // A reply, as opposed to a thread the message itself started.
            let is_reply = thread.message_ids.len() > 1
                && thread.message_ids.first() != Some(&message.id);
            (ids, thread.message_ids.len().max(1), is_reply)
        }
        None => (vec![message.id.clone()], 1, false),
    };

    let cleaned = provider.get_clean_messages(&context_ids).await?;

    Ok(ClassifierInput {
        subject: message.subject.clone(),
        from: join_participants(&message.from),
        to: join_participants(&message.to),
        cc: join_participants(&message.cc),
        date: format_date(message.date),
        is_reply,
        thread_length,
        has_attachments: !message.attachments.is_empty(),
        attachment_types: message
            .attachments
            .iter()
            .filter_map(|a| a.content_type.clone())
            .collect(),
        context: format_context(&cleaned),
    })
}

/// Classifies `message` and applies the returned category labels:
/// existing labels under `category_prefix` are replaced, labels the
/// mailbox does not have are dropped with a warning, and the update is
/// skipped entirely when the folder set would not change. Returns the
/// updated message when an update was issued.
pub async fn apply_categories(
    provider: &dyn MailProvider,
    classifier: &dyn Classifier,
    message: &Message,
    directory: &FolderDirectory,
    category_prefix: &str,
) -> Result<Option<Message>> {
    let input = build_classifier_input(provider, message).await?;
    let result = classifier.classify(&input).await?;

    if result.labels.is_empty() {
        debug!(message_id = %message.id, "classifier assigned no labels");
        return Ok(None);
    }

    let names = directory.names_for(&message.folders);

    // Read-only folders are excluded on both sides of the comparison;
    // the provider keeps them regardless of what the update says.
    let current: BTreeSet<String> = message
        .folders
        .iter()
        .zip(&names)
        .filter(|(_, name)| !policy::is_read_only(name))
        .map(|(id, _)| id.clone())
        .collect();

    let mut desired: BTreeSet<String> = message
        .folders
        .iter()
        .zip(&names)
        .filter(|(_, name)| {
            !policy::is_read_only(name) && !name.starts_with(category_prefix)
        })
        .map(|(id, _)| id.clone())
        .collect();

    for label in &result.labels {
        match directory.id_for(label) {
            Some(id) if !policy::is_read_only(label) => {
                desired.insert(id.to_string());
            }
            Some(_) => {}
            None => {
                warn!(label, "classifier returned a label the mailbox does not have")
            }
        }
    }

    if desired == current {
        debug!(message_id = %message.id, "labels already match classification");
        return Ok(None);
    }

    info!(
        message_id = %message.id,
        labels = ?result.labels,
        reason = %result.reason,
        "applying category labels"
    );
    let updated = provider
        .update_message_folders(&message.id, desired.into_iter().collect())
        .await?;
    Ok(Some(updated))
}

/// The most recent context ids, always including the trigger. Thread
/// message ids are ordered oldest first.
fn select_context_ids(message_ids: &[String], trigger_id: &str) -> Vec<String> {
    let start = message_ids.len().saturating_sub(CONTEXT_MESSAGES);
    let mut ids = message_ids[start..].to_vec();
    if !ids.iter().any(|id| id == trigger_id) {
        if ids.len() >= CONTEXT_MESSAGES {
            ids.remove(0);
        }
        ids.push(trigger_id.to_string());
    }
    ids
}

fn join_participants(participants: &[Participant]) -> String {
    participants
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_date(timestamp: i64) -> String {
    if timestamp == 0 {
        return "Unknown".to_string();
    }
    match DateTime::from_timestamp(timestamp, 0) {
        Some(date) => date.format("%Y-%m-%d %H:%M").to_string(),
        None => "Unknown".to_string(),
    }
}

fn format_context(cleaned: &[CleanMessage]) -> String {
    let mut ordered: Vec<&CleanMessage> = cleaned.iter().collect();
    ordered.sort_by_key(|msg| msg.date);

    let total = ordered.len();
    ordered
        .iter()
        .enumerate()
        .map(|(i, msg)| {
            format!(
                "--- Message {} of {} ---\nFrom: {}\nDate: {}\n\n{}",
                i + 1,
                total,
                join_participants(&msg.from),
                format_date(msg.date),
                msg.conversation,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

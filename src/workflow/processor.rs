//! Event processing for webhook deliveries. The payload is only
//! trusted for the object id; everything else is fetched fresh from
//! the provider so handlers always act on current state.

use std::sync::Arc;

use anyhow::Result;
use futures::future::try_join_all;
use tracing::{debug, info};

use crate::classify::{self, Classifier};
use crate::labels::{FolderDirectory, WorkflowPolicy, policy};
use crate::nylas::{MailProvider, Message};

use super::dedup::DedupCache;

/// Thread-wide clears touch the trigger plus at most this many other
/// messages.
const MAX_THREAD_MESSAGES: usize = 20;

/// Message fetches run concurrently in batches of this size.
const FETCH_BATCH_SIZE: usize = 5;

pub struct EventProcessor {
    provider: Arc<dyn MailProvider>,
    classifier: Option<Arc<dyn Classifier>>,
    dedup: DedupCache,
    policy: WorkflowPolicy,
    category_prefix: String,
}

impl EventProcessor {
    pub fn new(
        provider: Arc<dyn MailProvider>,
        classifier: Option<Arc<dyn Classifier>>,
        dedup: DedupCache,
        policy: WorkflowPolicy,
        category_prefix: String,
    ) -> Self {
        Self {
            provider,
            classifier,
            dedup,
            policy,
            category_prefix,
        }
    }

    /// A message changed. Detects archival (no longer in the inbox and
    /// not sent mail), otherwise enforces the single-workflow-label
    /// invariant. Returns whether any update was issued.
    pub async fn on_message_updated(&self, message_id: &str) -> Result<bool> {
        let (message, folders) = tokio::try_join!(
            self.provider.get_message(message_id),
            self.provider.get_folders(),
        )?;
        let directory = FolderDirectory::new(&folders);
        self.reconcile(&message, &directory).await
    }

    /// A message arrived. Sent mail completes the thread's workflow;
    /// received mail is categorized first, then reconciled like any
    /// other change.
    pub async fn on_message_created(&self, message_id: &str) -> Result<bool> {
        let (message, folders) = tokio::try_join!(
            self.provider.get_message(message_id),
            self.provider.get_folders(),
        )?;
        let directory = FolderDirectory::new(&folders);
        let names = directory.names_for(&message.folders);

        if policy::is_sent(&names) {
            debug!(message_id = %message.id, "sent message completes the workflow");
            return self.clear_thread(&message, &directory).await;
        }

        // Categorization may rewrite the folder set; reconcile runs on
        // the message as the provider returned it from that update.
        let message = match &self.classifier {
            Some(classifier) => classify::apply_categories(
                self.provider.as_ref(),
                classifier.as_ref(),
                &message,
                &directory,
                &self.category_prefix,
            )
            .await?
            .unwrap_or(message),
            None => message,
        };

        self.reconcile(&message, &directory).await
    }

    async fn reconcile(
        &self,
        message: &Message,
        directory: &FolderDirectory,
    ) -> Result<bool> {
        let names = directory.names_for(&message.folders);

        if !policy::is_sent(&names) && !policy::has_inbox(&names) {
            debug!(message_id = %message.id, "message archived");
            return self.clear_thread(message, directory).await;
        }

        self.enforce_single_label(message, &names).await
    }

    async fn enforce_single_label(
        &self,
        message: &Message,
        names: &[String],
    ) -> Result<bool> {
        let present = self.policy.workflow_labels_in(names);
        if present.len() < 2 {
            debug!(message_id = %message.id, "workflow labels consistent, nothing to do");
            return Ok(false);
        }
        let survivor = present[0].as_str();

        let keep: Vec<String> = message
            .folders
            .iter()
            .zip(names)
            .filter(|(_, name)| {
                if policy::is_read_only(name) {
                    return false;
                }
                !self.policy.is_workflow_label(name) || name.as_str() == survivor
            })
            .map(|(id, _)| id.clone())
            .collect();

        info!(
            message_id = %message.id,
            survivor,
            dropped = present.len() - 1,
            "removing competing workflow labels"
        );
        self.provider
            .update_message_folders(&message.id, keep)
            .await?;
        Ok(true)
    }

    /// Removes workflow labels from every message in the trigger's
    /// thread, gated by the dedup cache since each per-message update
    /// echoes back as another webhook.
    async fn clear_thread(
        &self,
        message: &Message,
        directory: &FolderDirectory,
    ) -> Result<bool> {
        let Some(thread_id) = message.thread_id.as_deref() else {
            return self.clear_message_labels(message, directory).await;
        };

        if self.dedup.was_recently_processed(thread_id) {
            debug!(thread_id, "thread cleared a moment ago, skipping");
            return Ok(false);
        }

        let messages = self.fetch_thread_messages(message, thread_id).await?;
        let mut any_updated = false;
        for msg in &messages {
            any_updated |= self.clear_message_labels(msg, directory).await?;
        }
        if any_updated {
            info!(thread_id, "cleared workflow labels across thread");
        }
        Ok(any_updated)
    }

    /// Issues an update only when the message actually carries a
    /// workflow label.
    async fn clear_message_labels(
        &self,
        message: &Message,
        directory: &FolderDirectory,
    ) -> Result<bool> {
        let names = directory.names_for(&message.folders);
        if self.policy.workflow_labels_in(&names).is_empty() {
            return Ok(false);
        }

        let keep: Vec<String> = message
            .folders
            .iter()
            .zip(&names)
            .filter(|(_, name)| {
                !self.policy.is_workflow_label(name) && !policy::is_read_only(name)
            })
            .map(|(id, _)| id.clone())
            .collect();

        self.provider
            .update_message_folders(&message.id, keep)
            .await?;
        Ok(true)
    }

    /// The trigger plus the most recent other messages in its thread,
    /// fetched concurrently in small batches to stay under provider
    /// rate limits.
    async fn fetch_thread_messages(
        &self,
        trigger: &Message,
        thread_id: &str,
    ) -> Result<Vec<Message>> {
        let thread = self.provider.get_thread(thread_id).await?;

        let other_ids: Vec<String> = thread
            .message_ids
            .iter()
            .filter(|id| **id != trigger.id)
            .cloned()
            .collect();
        let start = other_ids.len().saturating_sub(MAX_THREAD_MESSAGES);

        let mut messages = vec![trigger.clone()];
        for batch in other_ids[start..].chunks(FETCH_BATCH_SIZE) {
            let fetched =
                try_join_all(batch.iter().map(|id| self.provider.get_message(id)))
                    .await?;
            messages.extend(fetched);
        }
        Ok(messages)
    }
}

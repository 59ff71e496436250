//! Wire types for the Nylas v3 API. Field names follow the API's JSON
//! so only absent fields need serde defaults.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A sender or recipient on a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default)]
    pub name: String,
    pub email: String,
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name.is_empty() && self.name != self.email {
            write!(f, "{} <{}>", self.name, self.email)
        } else {
            write!(f, "{}", self.email)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// A single email message. `folders` holds folder ids, not display
/// names; resolve them through the folder directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub from: Vec<Participant>,
    #[serde(default)]
    pub to: Vec<Participant>,
    #[serde(default)]
    pub cc: Vec<Participant>,
    /// Unix timestamp in seconds.
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// A conversation thread. `message_ids` is ordered oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub message_ids: Vec<String>,
    #[serde(default)]
    pub folders: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
}

/// A message with its body converted to markdown by the clean-messages
/// endpoint. The cleaned body arrives in `conversation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanMessage {
    pub id: String,
    #[serde(default)]
    pub from: Vec<Participant>,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub conversation: String,
}

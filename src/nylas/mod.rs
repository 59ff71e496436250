pub mod client;
pub mod models;

pub use client::{MailProvider, NylasClient};
pub use models::{Attachment, CleanMessage, Folder, Message, Participant, Thread};

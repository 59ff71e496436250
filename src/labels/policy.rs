//! Pure classification of folder names. No I/O here; the processors
//! feed this module names resolved through the directory.

/// System folders the provider manages itself. These are never included
/// in a folder update and are matched case-insensitively.
pub const READ_ONLY_FOLDERS: &[&str] = &["SENT", "DRAFT", "DRAFTS", "TRASH", "SPAM"];

pub fn is_read_only(name: &str) -> bool {
    READ_ONLY_FOLDERS
        .iter()
        .any(|folder| name.eq_ignore_ascii_case(folder))
}

pub fn is_sent(names: &[String]) -> bool {
    names.iter().any(|name| name.eq_ignore_ascii_case("SENT"))
}

pub fn has_inbox(names: &[String]) -> bool {
    names.iter().any(|name| name.eq_ignore_ascii_case("INBOX"))
}

/// The configured workflow labels in priority order. A message may
/// carry at most one of these; when several are present the first in
/// priority order survives.
#[derive(Debug, Clone)]
pub struct WorkflowPolicy {
    labels: Vec<String>,
}

impl WorkflowPolicy {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn is_workflow_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| label == name)
    }

    /// Workflow labels present in `names`, ordered by priority. The
    /// first entry is the survivor when the invariant is enforced.
    pub fn workflow_labels_in(&self, names: &[String]) -> Vec<String> {
        self.labels
            .iter()
            .filter(|label| names.contains(label))
            .cloned()
            .collect()
    }
}

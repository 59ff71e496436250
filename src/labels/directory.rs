//! Lookup between folder ids and display names, rebuilt from the live
//! folder list on every event so renames are picked up immediately.

use std::collections::HashMap;

use tracing::warn;

use crate::nylas::Folder;

pub struct FolderDirectory {
    by_id: HashMap<String, String>,
    by_name: HashMap<String, String>,
}

impl FolderDirectory {
    pub fn new(folders: &[Folder]) -> Self {
        let mut by_id = HashMap::with_capacity(folders.len());
        let mut by_name = HashMap::with_capacity(folders.len());
        for folder in folders {
            by_id.insert(folder.id.clone(), folder.name.clone());
            by_name.insert(folder.name.clone(), folder.id.clone());
        }
        Self { by_id, by_name }
    }

    pub fn id_for(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// Resolves folder ids to display names. System folders use their
    /// name as the id, so unknown ids fall back to the id itself.
    pub fn names_for(&self, ids: &[String]) -> Vec<String> {
        ids.iter()
            .map(|id| self.by_id.get(id).unwrap_or(id).clone())
            .collect()
    }

    /// Resolves display names to folder ids. Names the mailbox does not
    /// have are dropped, never an error.
    pub fn ids_for(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter_map(|name| match self.by_name.get(name) {
                Some(id) => Some(id.clone()),
                None => {
                    warn!(name, "no folder with this name, dropping");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: &str, name: &str) -> Folder {
        Folder {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_names_fall_back_to_id() {
        let directory = FolderDirectory::new(&[folder("Label_1", "triage")]);
        let names = directory.names_for(&[
            "Label_1".to_string(),
            "INBOX".to_string(),
        ]);
        assert_eq!(names, vec!["triage", "INBOX"]);
    }

    #[test]
    fn test_unknown_names_are_dropped() {
        let directory = FolderDirectory::new(&[folder("Label_1", "triage")]);
        let ids = directory.ids_for(&[
            "triage".to_string(),
            "no-such-label".to_string(),
        ]);
        assert_eq!(ids, vec!["Label_1"]);
    }

    #[test]
    fn test_id_for() {
        let directory = FolderDirectory::new(&[folder("Label_2", "respond")]);
        assert_eq!(directory.id_for("respond"), Some("Label_2"));
        assert_eq!(directory.id_for("triage"), None);
    }
}

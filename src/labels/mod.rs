pub mod directory;
pub mod policy;

pub use directory::FolderDirectory;
pub use policy::WorkflowPolicy;

pub mod public;
mod router;
mod verify;

pub use router::router;

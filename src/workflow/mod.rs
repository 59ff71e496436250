pub mod dedup;
pub mod processor;

pub use dedup::{Clock, DedupCache, SystemClock};
pub use processor::EventProcessor;

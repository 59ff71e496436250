pub mod api;
pub mod classify;
pub mod cli;
pub mod core;
pub mod labels;
pub mod nylas;
pub mod workflow;

//! Hosted model integration

pub mod assistant;
pub mod cache;
pub mod client;
pub mod prompts;

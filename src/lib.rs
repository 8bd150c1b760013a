//! CareerMate: resume review, job matching and resume building with a hosted model

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod llm;
pub mod output;
pub mod processing;
pub mod session;

pub use config::Config;
pub use error::{CareerMateError, Result};

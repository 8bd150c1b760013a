//! Interactive session: context, commands and their handlers

pub mod chat;
pub mod command;
pub mod handlers;
pub mod state;

pub use chat::{ChatHistory, ChatMessage, Role};
pub use command::Command;
pub use handlers::{Reply, SessionHandler};
pub use state::Session;

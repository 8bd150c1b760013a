//! Export and terminal presentation

pub mod formatter;
pub mod markdown;

pub use formatter::{save_to_file, ConsoleFormatter};
pub use markdown::{export_resume, project_filename, resume_filename};

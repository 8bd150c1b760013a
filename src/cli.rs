//! CLI interface for careermate

use crate::llm::prompts::SuggestionKind;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "careermate")]
#[command(about = "AI career assistant: resume review, job matching and resume building")]
#[command(long_about = "Review a resume against a job description, estimate the ATS match, extract keywords, chat with a career coach, and build a Markdown resume with model suggestions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Resume PDF plus a job description from a file or inline text
#[derive(Args, Debug, Clone)]
pub struct AnalysisInputs {
    /// Path to the resume (PDF)
    #[arg(short, long)]
    pub resume: PathBuf,

    #[command(flatten)]
    pub job: JobInput,
}

#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct JobInput {
    /// Path to the job description (TXT, MD)
    #[arg(short, long)]
    pub job: Option<PathBuf>,

    /// Job description text
    #[arg(long)]
    pub job_text: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// HR-style review of the resume against the job description
    Review {
        #[command(flatten)]
        inputs: AnalysisInputs,
    },

    /// ATS match percentage, missing keywords and recommendations
    Match {
        #[command(flatten)]
        inputs: AnalysisInputs,
    },

    /// Keyword analysis of the resume
    Keywords {
        #[command(flatten)]
        inputs: AnalysisInputs,

        /// Count keywords locally instead of asking the model
        #[arg(long)]
        local: bool,
    },

    /// Generate a portfolio project that strengthens the application
    Project {
        #[command(flatten)]
        inputs: AnalysisInputs,

        /// Save the plan to a file or directory
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Ask the career coach a single question
    Chat {
        #[command(flatten)]
        inputs: AnalysisInputs,

        /// Question to ask
        #[arg(short, long)]
        question: String,
    },

    /// Draft resume content for a job description
    Suggest {
        #[command(flatten)]
        job: JobInput,

        /// What to draft
        #[arg(short, long, value_enum)]
        kind: SuggestionKind,
    },

    /// Structure a plain text resume and export it as Markdown
    Import {
        /// Resume text file (TXT, MD)
        #[arg(short, long)]
        text: PathBuf,

        /// Output file or directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Interactive session
    Session {
        /// Resume to upload at start
        #[arg(short, long)]
        resume: Option<PathBuf>,

        /// Job description to load at start
        #[arg(short, long)]
        job: Option<PathBuf>,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_job_text_and_job_file_are_exclusive() {
        let parsed = Cli::try_parse_from([
            "careermate", "review", "--resume", "cv.pdf", "--job", "job.txt", "--job-text", "Rust",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from(["careermate", "review", "--resume", "cv.pdf"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_suggest_kind() {
        let cli = Cli::try_parse_from(["careermate", "suggest", "--job-text", "Rust", "--kind", "bullets"]).unwrap();
        match cli.command {
            Commands::Suggest { kind, job } => {
                assert_eq!(kind, SuggestionKind::ExperienceBullets);
                assert_eq!(job.job_text.as_deref(), Some("Rust"));
            }
            _ => panic!("expected suggest"),
        }
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension(Path::new("cv.PDF"), &["pdf"]).is_ok());
        assert!(validate_file_extension(Path::new("cv.docx"), &["pdf"]).is_err());
        assert!(validate_file_extension(Path::new("cv"), &["pdf"]).is_err());
    }
}

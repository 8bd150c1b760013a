//! Per-session context handed to every command handler

use crate::config::CacheConfig;
use crate::error::{CareerMateError, Result};
use crate::input::manager::ResumeSource;
use crate::llm::cache::ResponseCache;
use crate::llm::prompts::SuggestionKind;
use crate::processing::resume::ResumeDraft;
use crate::session::chat::ChatHistory;
use std::time::Duration;

/// Last model suggestion for the builder, waiting for `accept`
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub text: String,
}

/// Everything one user session holds. Nothing here outlives the session.
#[derive(Debug)]
pub struct Session {
    pub job_description: Option<String>,
    pub resume: Option<ResumeSource>,
    pub chat: ChatHistory,
    pub last_suggestion: Option<Suggestion>,
    pub last_project: Option<String>,
    pub cache: ResponseCache,
    draft: Option<ResumeDraft>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ResponseCache::new(Duration::from_secs(CacheConfig::default().ttl_secs)))
    }
}

impl Session {
    pub fn new(cache: ResponseCache) -> Self {
        Self {
            job_description: None,
            resume: None,
            chat: ChatHistory::new(),
            last_suggestion: None,
            last_project: None,
            cache,
            draft: None,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let cache = if config.enabled {
            ResponseCache::new(Duration::from_secs(config.ttl_secs))
        } else {
            ResponseCache::disabled()
        };
        Self::new(cache)
    }

    pub fn set_job_description(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CareerMateError::MissingInput("The job description is empty".to_string()));
        }
        self.job_description = Some(text.to_string());
        Ok(())
    }

    /// Both inputs every analysis needs
    pub fn require_inputs(&self) -> Result<(&ResumeSource, &str)> {
        match (&self.resume, &self.job_description) {
            (Some(resume), Some(job)) => Ok((resume, job.as_str())),
            _ => Err(missing_inputs()),
        }
    }

    pub fn require_job(&self) -> Result<&str> {
        self.job_description.as_deref().ok_or_else(|| {
            CareerMateError::MissingInput("Please provide a job description first.".to_string())
        })
    }

    pub fn require_resume(&self) -> Result<&ResumeSource> {
        self.resume
            .as_ref()
            .ok_or_else(|| CareerMateError::MissingInput("Please upload a resume first.".to_string()))
    }

    pub fn draft(&self) -> Option<&ResumeDraft> {
        self.draft.as_ref()
    }

    /// The builder draft, created from the empty template on first use
    pub fn draft_mut(&mut self) -> &mut ResumeDraft {
        self.draft.get_or_insert_with(ResumeDraft::template)
    }

    pub fn replace_draft(&mut self, draft: ResumeDraft) {
        self.draft = Some(draft);
    }
}

pub fn missing_inputs() -> CareerMateError {
    CareerMateError::MissingInput("Please upload a resume and provide a job description.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_is_created_lazily() {
        let mut session = Session::default();
        assert!(session.draft().is_none());

        session.draft_mut().add_skill("Rust");
        assert_eq!(session.draft().unwrap().skills, vec!["Rust"]);
        assert_eq!(session.draft().unwrap().experience.len(), 1);
    }

    #[test]
    fn test_missing_inputs() {
        let mut session = Session::default();
        assert!(matches!(session.require_inputs(), Err(CareerMateError::MissingInput(_))));

        session.set_job_description("  Rust developer  ").unwrap();
        assert_eq!(session.require_job().unwrap(), "Rust developer");
        assert!(session.require_inputs().is_err());
        assert!(session.set_job_description("   ").is_err());
    }

    #[test]
    fn test_disabled_cache_from_config() {
        let config = CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        };
        let mut session = Session::from_config(&config);
        session.cache.insert("k".to_string(), "v".to_string());
        assert!(session.cache.is_empty());
    }
}

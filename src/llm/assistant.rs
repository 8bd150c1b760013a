//! Career assistant: one model request per feature

use crate::config::ModelConfig;
use crate::error::Result;
use crate::input::manager::ResumeSource;
use crate::llm::client::{GenerativeModel, ModelRequest};
use crate::llm::prompts::{PromptTemplates, SuggestionKind};
use crate::processing::resume::ResumeDraft;
use log::{debug, warn};
use regex::Regex;
use std::fmt;

/// Model-backed actions; the name doubles as part of the cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Review,
    Match,
    Keywords,
    Transcribe,
    Chat,
    Suggest(SuggestionKind),
    Import,
    Project,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Review => write!(f, "review"),
            Action::Match => write!(f, "match"),
            Action::Keywords => write!(f, "keywords"),
            Action::Transcribe => write!(f, "transcribe"),
            Action::Chat => write!(f, "chat"),
            Action::Suggest(kind) => write!(f, "suggest-{}", kind),
            Action::Import => write!(f, "import"),
            Action::Project => write!(f, "project"),
        }
    }
}

pub struct CareerAssistant<M> {
    model: M,
    prompts: PromptTemplates,
    default_model: String,
    review_model: String,
}

impl<M: GenerativeModel> CareerAssistant<M> {
    pub fn new(model: M, config: &ModelConfig) -> Self {
        Self {
            model,
            prompts: PromptTemplates::default(),
            default_model: config.default_model.clone(),
            review_model: config.review_model.clone(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub async fn generate(&self, request: &ModelRequest) -> Result<String> {
        debug!("Generating with {} ({} chars of text)", request.model, request.text_content().len());
        self.model.generate(request).await
    }

    pub fn review_request(&self, resume: &ResumeSource, job: &str) -> ModelRequest {
        ModelRequest::new(&self.review_model)
            .text(&self.prompts.review)
            .image(&resume.image)
            .text(PromptTemplates::job_part(job))
    }

    pub fn match_request(&self, resume: &ResumeSource, job: &str) -> ModelRequest {
        ModelRequest::new(&self.default_model)
            .text(&self.prompts.match_score)
            .image(&resume.image)
            .text(PromptTemplates::job_part(job))
    }

    pub fn keywords_request(&self, resume: &ResumeSource, job: &str) -> ModelRequest {
        ModelRequest::new(&self.default_model)
            .text(&self.prompts.keyword_extraction)
            .image(&resume.image)
            .text(PromptTemplates::job_part(job))
    }

    pub fn transcribe_request(&self, resume: &ResumeSource) -> ModelRequest {
        ModelRequest::new(&self.default_model)
            .text(&self.prompts.transcription)
            .image(&resume.image)
    }

    pub fn chat_request(&self, resume: &ResumeSource, job: &str, history: &str, query: &str) -> ModelRequest {
        ModelRequest::new(&self.default_model)
            .text(self.prompts.render_chat(job, history, query))
            .image(&resume.image)
    }

    pub fn suggestion_request(&self, job: &str, kind: SuggestionKind) -> ModelRequest {
        ModelRequest::new(&self.default_model).text(self.prompts.render_suggestion(kind, job))
    }

    pub fn import_request(&self, text: &str) -> ModelRequest {
        ModelRequest::new(&self.default_model).text(self.prompts.render_import(text))
    }

    pub fn project_request(&self, resume: &ResumeSource, job: &str) -> ModelRequest {
        ModelRequest::new(&self.default_model)
            .text(self.prompts.render_project(job))
            .image(&resume.image)
    }
}

pub fn draft_or_template(raw: &str) -> ResumeDraft {
    parse_imported_draft(raw).unwrap_or_else(|| {
        warn!("Model output was not a resume draft; starting from the empty template");
        ResumeDraft::template()
    })
}

/// First percentage mentioned in a match response, clamped to 0-100
pub fn parse_match_percentage(text: &str) -> Option<u8> {
    let re = Regex::new(r"(\d{1,3}(?:\.\d+)?)\s*%").ok()?;
    let value: f32 = re.captures(text)?.get(1)?.as_str().parse().ok()?;
    Some(value.round().clamp(0.0, 100.0) as u8)
}

/// Parses the JSON object in a model reply, tolerating code fences and chatter around it
pub fn parse_imported_draft(raw: &str) -> Option<ResumeDraft> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    let parsed = serde_json::from_str::<serde_json::Value>(&raw[start..=end]).and_then(|mut value| {
        drop_nulls(&mut value);
        serde_json::from_value::<ResumeDraft>(value)
    });

    match parsed {
        Ok(mut draft) => {
            draft.assign_fresh_ids();
            Some(draft)
        }
        Err(e) => {
            debug!("Imported draft did not parse: {}", e);
            None
        }
    }
}

/// Models write `null` for fields they could not find; those fall back to the defaults
fn drop_nulls(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(drop_nulls);
        }
        serde_json::Value::Array(items) => {
            items.retain(|v| !v.is_null());
            items.iter_mut().for_each(drop_nulls);
        }
        _ => {}
    }
}

/// Skills from a comma or line separated suggestion, in order, without duplicates
pub fn split_skill_suggestions(text: &str) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for raw in text.split(|c| c == ',' || c == '\n') {
        let skill = raw.trim().trim_start_matches(|c| c == '-' || c == '*' || c == '•').trim();
        if !skill.is_empty() && !skills.iter().any(|s| s == skill) {
            skills.push(skill.to_string());
        }
    }
    skills
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CareerMateError;
    use crate::input::rasterizer::PageImage;
    use crate::llm::client::Part;
    use std::sync::Mutex;

    struct ScriptedModel {
        reply: std::result::Result<String, String>,
        seen: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedModel {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl GenerativeModel for ScriptedModel {
        async fn generate(&self, request: &ModelRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(CareerMateError::Network)
        }
    }

    fn resume() -> ResumeSource {
        ResumeSource {
            file_name: "cv.pdf".to_string(),
            fingerprint: "f".to_string(),
            image: PageImage::jpeg(b"jpeg"),
            text: None,
        }
    }

    #[tokio::test]
    async fn test_review_uses_lite_model_and_orders_parts() {
        let assistant = CareerAssistant::new(ScriptedModel::replying("ok"), &ModelConfig::default());
        let request = assistant.review_request(&resume(), "Rust job");
        assistant.generate(&request).await.unwrap();

        let seen = assistant.model().seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.model, "gemini-2.5-flash-lite");
        assert_eq!(request.parts.len(), 3);
        assert!(matches!(request.parts[1], Part::InlineData { .. }));
        assert_eq!(
            request.parts[2],
            Part::Text {
                text: "Job Description: Rust job".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_suggestions_are_text_only() {
        let assistant = CareerAssistant::new(ScriptedModel::replying("Rust, SQL"), &ModelConfig::default());
        let request = assistant.suggestion_request("Data role", SuggestionKind::Skills);
        let reply = assistant.generate(&request).await.unwrap();
        assert_eq!(reply, "Rust, SQL");

        let seen = assistant.model().seen.lock().unwrap();
        assert_eq!(seen[0].model, "gemini-2.5-flash");
        assert!(seen[0].parts.iter().all(|p| matches!(p, Part::Text { .. })));
    }

    #[tokio::test]
    async fn test_generate_propagates_model_failure() {
        let assistant = CareerAssistant::new(ScriptedModel::failing("quota"), &ModelConfig::default());
        let request = assistant.import_request("Jane");
        assert!(matches!(
            assistant.generate(&request).await,
            Err(CareerMateError::Network(_))
        ));
    }

    #[test]
    fn test_import_falls_back_to_template_on_bad_json() {
        let draft = draft_or_template("Sorry, I cannot do that.");
        assert_eq!(draft.experience.len(), 1);
        assert!(draft.contact.name.is_empty());
    }

    #[test]
    fn test_imported_nulls_read_as_empty_fields() {
        let raw = r#"{
            "contact": {"name": "Jane Doe", "email": "jane@example.com", "phone": null, "linkedin": null},
            "summary": null,
            "experience": [{"title": "Engineer", "company": "Acme", "location": null, "end_date": null}],
            "certifications": null,
            "skills": ["Rust", null, "SQL"]
        }"#;
        let draft = draft_or_template(raw);

        assert_eq!(draft.contact.name, "Jane Doe");
        assert_eq!(draft.contact.email, "jane@example.com");
        assert!(draft.contact.linkedin.is_empty());
        assert!(draft.summary.is_empty());
        assert_eq!(draft.experience.len(), 1);
        assert_eq!(draft.experience[0].title, "Engineer");
        assert!(draft.experience[0].location.is_empty());
        assert!(draft.certifications.is_empty());
        assert_eq!(draft.skills, vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_parse_imported_draft_with_fences() {
        let raw = "```json\n{\"contact\": {\"name\": \"Jane\"}, \"skills\": [\"Rust\"], \"experience\": [{\"title\": \"Dev\"}]}\n```";
        let draft = parse_imported_draft(raw).unwrap();
        assert_eq!(draft.contact.name, "Jane");
        assert_eq!(draft.skills, vec!["Rust"]);
        assert_eq!(draft.experience[0].title, "Dev");
        assert!(!draft.experience[0].id.is_empty());
        assert!(draft.education.is_empty());
    }

    #[test]
    fn test_parse_imported_draft_rejects_garbage() {
        assert!(parse_imported_draft("no json here").is_none());
        assert!(parse_imported_draft("} backwards {").is_none());
        assert!(parse_imported_draft("{\"skills\": \"not a list\"}").is_none());
    }

    #[test]
    fn test_parse_match_percentage() {
        assert_eq!(parse_match_percentage("**Match: 78%**\nMissing: Kafka"), Some(78));
        assert_eq!(parse_match_percentage("around 66.6 % overall"), Some(67));
        assert_eq!(parse_match_percentage("150% sure"), Some(100));
        assert_eq!(parse_match_percentage("no score"), None);
    }

    #[test]
    fn test_split_skill_suggestions() {
        let skills = split_skill_suggestions("Rust, SQL,  , Kubernetes\n- Communication, Rust");
        assert_eq!(skills, vec!["Rust", "SQL", "Kubernetes", "Communication"]);
    }

    #[test]
    fn test_action_names() {
        assert_eq!(Action::Suggest(SuggestionKind::ExperienceBullets).to_string(), "suggest-bullets");
        assert_eq!(Action::Match.to_string(), "match");
    }
}

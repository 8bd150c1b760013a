//! One handler per session command
//!
//! Handlers never fail the session: every error is turned into an
//! `Error: ...` reply and the user can simply retry.

use crate::config::Config;
use crate::error::{CareerMateError, Result};
use crate::input::manager::{read_job_description, read_text, InputManager};
use crate::input::rasterizer::{PageRenderer, Rasterizer};
use crate::llm::assistant::{draft_or_template, parse_match_percentage, split_skill_suggestions, Action, CareerAssistant};
use crate::llm::cache::{cache_key, ResponseCache};
use crate::llm::client::{reply_text, GenerativeModel, ModelRequest};
use crate::llm::prompts::SuggestionKind;
use crate::output::formatter::{save_to_file, ConsoleFormatter};
use crate::output::markdown::{export_resume, project_filename, resume_filename};
use crate::processing::keywords::{KeywordCount, KeywordCounter};
use crate::processing::resume::{FieldPath, ResumeDraft, Section};
use crate::session::chat::{ChatMessage, Role};
use crate::session::command::{Command, HELP};
use crate::session::state::{Session, Suggestion};
use chrono::Local;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// What a handler hands back for display
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    /// Model output, rendered as Markdown
    Markdown(String),
    Match { score: Option<u8>, report: String },
    Keywords(Vec<KeywordCount>),
    Transcript(Vec<ChatMessage>),
    Error(String),
    Quit,
}

impl Reply {
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    pub fn render(&self, formatter: &ConsoleFormatter) -> String {
        match self {
            Reply::Text(text) => format!("{}\n", text),
            Reply::Markdown(markdown) => formatter.render_markdown(markdown),
            Reply::Match { score, report } => {
                let headline = score.map(|s| formatter.format_match_headline(s)).unwrap_or_default();
                format!("{}{}", headline, formatter.render_markdown(report))
            }
            Reply::Keywords(keywords) => format!(
                "{}\n{}\n",
                formatter.format_keyword_table(keywords),
                formatter.format_keyword_tags(keywords)
            ),
            Reply::Transcript(messages) => formatter.format_chat(messages),
            Reply::Error(message) => format!("{}\n", formatter.format_error(message)),
            Reply::Quit => String::new(),
        }
    }
}

pub struct SessionHandler<M, R> {
    assistant: CareerAssistant<M>,
    inputs: InputManager<R>,
    counter: KeywordCounter,
    export_dir: PathBuf,
}

impl<M, R> SessionHandler<M, R>
where
    M: GenerativeModel,
    R: PageRenderer + Clone + 'static,
{
    pub fn new(
        assistant: CareerAssistant<M>,
        inputs: InputManager<R>,
        counter: KeywordCounter,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            assistant,
            inputs,
            counter,
            export_dir,
        }
    }

    pub fn from_config(model: M, renderer: R, config: &Config) -> Self {
        Self::new(
            CareerAssistant::new(model, &config.model),
            InputManager::new(Rasterizer::new(renderer, &config.render)).with_cache(config.cache.enabled),
            KeywordCounter::from_config(&config.keywords),
            config.output.export_dir.clone(),
        )
    }

    pub fn assistant(&self) -> &CareerAssistant<M> {
        &self.assistant
    }

    pub async fn handle_line(&mut self, session: &mut Session, line: &str) -> Reply {
        match line.parse::<Command>() {
            Ok(command) => self.handle(session, command).await,
            Err(e) => Reply::Error(reply_text(Err(CareerMateError::from(e)))),
        }
    }

    pub async fn handle(&mut self, session: &mut Session, command: Command) -> Reply {
        match self.dispatch(session, command).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Command failed: {}", e);
                Reply::Error(reply_text(Err(e)))
            }
        }
    }

    async fn dispatch(&mut self, session: &mut Session, command: Command) -> Result<Reply> {
        match command {
            Command::Help => Ok(Reply::Text(HELP.to_string())),
            Command::Quit => Ok(Reply::Quit),
            Command::Job(path) => {
                let text = read_job_description(&path).await?;
                session.set_job_description(&text)?;
                Ok(Reply::Text(format!("Job description loaded ({} characters)", text.chars().count())))
            }
            Command::JobText(text) => {
                session.set_job_description(&text)?;
                Ok(Reply::Text("Job description set".to_string()))
            }
            Command::Resume(path) => self.load_resume(session, &path).await,
            Command::Review => {
                let text = self.analysis(session, Action::Review).await?;
                Ok(Reply::Markdown(text))
            }
            Command::Match => {
                let report = self.analysis(session, Action::Match).await?;
                Ok(Reply::Match {
                    score: parse_match_percentage(&report),
                    report,
                })
            }
            Command::Keywords => {
                let text = self.analysis(session, Action::Keywords).await?;
                Ok(Reply::Markdown(text))
            }
            Command::KeywordsLocal => self.local_keywords(session).await,
            Command::Chat(question) => self.chat(session, &question).await,
            Command::History => Ok(Reply::Transcript(session.chat.messages().to_vec())),
            Command::Project => {
                let plan = self.analysis(session, Action::Project).await?;
                session.last_project = Some(plan.clone());
                Ok(Reply::Markdown(plan))
            }
            Command::SaveProject(target) => {
                let plan = session.last_project.as_deref().ok_or_else(|| {
                    CareerMateError::MissingInput("Generate a project with `project` first".to_string())
                })?;
                let path = self.target_path(target, project_filename(&Local::now()));
                save_to_file(plan, &path)?;
                Ok(Reply::Text(format!("Project plan saved to {}", path.display())))
            }
            Command::NewDraft => {
                session.replace_draft(ResumeDraft::template());
                Ok(Reply::Text("Started a new resume draft".to_string()))
            }
            Command::Import(path) => self.import(session, &path).await,
            Command::Show(path) => self.show(session, path),
            Command::Set(path, value) => {
                let field = path.field.as_deref().unwrap_or("");
                session.draft_mut().set_field(path.section, path.index, field, &value)?;
                Ok(Reply::Text(format!("Updated {}", describe(&path))))
            }
            Command::Add(section) => {
                let index = session.draft_mut().add_entry(section)?;
                Ok(Reply::Text(format!("Added {} entry {}", section, index)))
            }
            Command::Remove(section, index) => {
                session.draft_mut().remove_entry(section, index)?;
                Ok(Reply::Text(format!("Removed {} entry {}", section, index)))
            }
            Command::Skill(name) => {
                if session.draft_mut().add_skill(&name) {
                    Ok(Reply::Text(format!("Added skill: {}", name.trim())))
                } else {
                    Ok(Reply::Text(format!("Skill already listed: {}", name.trim())))
                }
            }
            Command::Suggest(kind) => self.suggest(session, kind).await,
            Command::Accept(index) => accept(session, index),
            Command::Preview => {
                let markdown = export_resume(session.draft_mut());
                if markdown.is_empty() {
                    Ok(Reply::Text("The draft is empty. Use `set`, `skill` or `import` to fill it in.".to_string()))
                } else {
                    Ok(Reply::Markdown(markdown))
                }
            }
            Command::Export(target) => {
                let draft = session.draft_mut();
                let path = self.target_path(target, resume_filename(draft, &Local::now()));
                save_to_file(&export_resume(draft), &path)?;
                Ok(Reply::Text(format!("Resume exported to {}", path.display())))
            }
            Command::Cache => {
                let purged = session.cache.purge_expired();
                let stats = session.cache.stats();
                Ok(Reply::Text(format!(
                    "Cached responses: {} (hits {}, misses {}, expired {}, ttl {}s); cached uploads: {}",
                    stats.entries,
                    stats.hits,
                    stats.misses,
                    purged,
                    stats.ttl_secs,
                    self.inputs.cache_size()
                )))
            }
            Command::ClearCache => {
                session.cache.clear();
                self.inputs.clear_cache();
                Ok(Reply::Text("Cache cleared".to_string()))
            }
        }
    }

    async fn load_resume(&mut self, session: &mut Session, path: &Path) -> Result<Reply> {
        let source = self.inputs.load_resume(path).await?;
        let reply = format!(
            "Resume uploaded: {} (page 1 rendered{})",
            source.file_name,
            if source.text.is_some() { ", text layer found" } else { "" }
        );
        session.resume = Some(source);
        Ok(Reply::Text(reply))
    }

    /// Runs one of the analyses that need both the resume and the job description
    async fn analysis(&self, session: &mut Session, action: Action) -> Result<String> {
        let (resume, job) = session.require_inputs()?;
        let request = match action {
            Action::Review => self.assistant.review_request(resume, job),
            Action::Match => self.assistant.match_request(resume, job),
            Action::Keywords => self.assistant.keywords_request(resume, job),
            Action::Project => self.assistant.project_request(resume, job),
            other => {
                return Err(CareerMateError::InvalidInput(format!("{} is not an analysis", other)));
            }
        };
        let fingerprint = resume.fingerprint.clone();

        self.cached(&mut session.cache, action, &fingerprint, request).await
    }

    async fn local_keywords(&self, session: &mut Session) -> Result<Reply> {
        let resume = session.require_resume()?;
        let text = match &resume.text {
            Some(text) => text.clone(),
            None => {
                info!("No text layer in {}; transcribing the page image", resume.file_name);
                let request = self.assistant.transcribe_request(resume);
                let fingerprint = resume.fingerprint.clone();
                self.cached(&mut session.cache, Action::Transcribe, &fingerprint, request)
                    .await?
            }
        };

        Ok(Reply::Keywords(self.counter.count(&text)))
    }

    async fn chat(&self, session: &mut Session, question: &str) -> Result<Reply> {
        let (resume, job) = session.require_inputs()?;
        let request = self
            .assistant
            .chat_request(resume, job, &session.chat.transcript(), question);
        let fingerprint = resume.fingerprint.clone();

        let answer = self
            .cached(&mut session.cache, Action::Chat, &fingerprint, request)
            .await?;

        session.chat.push(Role::User, question);
        session.chat.push(Role::Assistant, answer.clone());
        Ok(Reply::Markdown(answer))
    }

    async fn suggest(&self, session: &mut Session, kind: SuggestionKind) -> Result<Reply> {
        let request = self.assistant.suggestion_request(session.require_job()?, kind);
        let text = self
            .cached(&mut session.cache, Action::Suggest(kind), "", request)
            .await?;

        session.last_suggestion = Some(Suggestion {
            kind,
            text: text.clone(),
        });
        Ok(Reply::Markdown(format!("{}\n\n_Use `accept` to apply this suggestion._", text)))
    }

    async fn import(&self, session: &mut Session, path: &Path) -> Result<Reply> {
        let text = read_text(path).await?;
        if text.trim().is_empty() {
            return Err(CareerMateError::MissingInput(format!("{} is empty", path.display())));
        }

        let request = self.assistant.import_request(&text);
        let raw = self
            .cached(&mut session.cache, Action::Import, "", request)
            .await?;
        let draft = draft_or_template(&raw);

        let summary = format!(
            "Imported draft: {} experience, {} education, {} certification, {} project, {} achievement entries and {} skills",
            draft.experience.len(),
            draft.education.len(),
            draft.certifications.len(),
            draft.projects.len(),
            draft.achievements.len(),
            draft.skills.len()
        );
        session.replace_draft(draft);
        Ok(Reply::Text(summary))
    }

    fn show(&self, session: &mut Session, path: Option<FieldPath>) -> Result<Reply> {
        let draft = session.draft_mut();
        let text = match path {
            None => serde_json::to_string_pretty(&*draft)?,
            Some(FieldPath {
                section: Section::Summary,
                ..
            }) => draft.summary.clone(),
            Some(FieldPath {
                section,
                index,
                field: Some(field),
            }) => draft.get_field(section, index, &field)?,
            Some(FieldPath {
                section,
                field: None,
                ..
            }) => serde_json::to_string_pretty(&draft.section_value(section)?)?,
        };
        Ok(Reply::Text(text))
    }

    /// Model call through the session cache; only successful replies are stored
    async fn cached(
        &self,
        cache: &mut ResponseCache,
        action: Action,
        fingerprint: &str,
        request: ModelRequest,
    ) -> Result<String> {
        let key = cache_key(fingerprint, &action.to_string(), &request.text_content());
        if let Some(text) = cache.get(&key) {
            info!("Reusing cached {} response", action);
            return Ok(text);
        }

        let text = self.assistant.generate(&request).await?;
        cache.insert(key, text.clone());
        Ok(text)
    }

    /// Explicit file path, a directory to put `file_name` in, or the export directory
    fn target_path(&self, target: Option<PathBuf>, file_name: String) -> PathBuf {
        match target {
            Some(path) if path.is_dir() || path.extension().is_none() => path.join(file_name),
            Some(path) => path,
            None => self.export_dir.join(file_name),
        }
    }
}

fn accept(session: &mut Session, index: Option<usize>) -> Result<Reply> {
    let suggestion = session.last_suggestion.clone().ok_or_else(|| {
        CareerMateError::MissingInput("Nothing to accept; run `suggest` first".to_string())
    })?;
    let draft = session.draft_mut();

    let message = match suggestion.kind {
        SuggestionKind::Summary => {
            draft.summary = suggestion.text.trim().to_string();
            "Summary updated".to_string()
        }
        SuggestionKind::Skills => {
            let skills = split_skill_suggestions(&suggestion.text);
            let chosen: Vec<String> = match index {
                Some(i) => vec![skills.get(i).cloned().ok_or_else(|| {
                    CareerMateError::InvalidInput(format!(
                        "The suggestion has {} skills; index {} is out of range",
                        skills.len(),
                        i
                    ))
                })?],
                None => skills,
            };
            let added = chosen.iter().filter(|skill| draft.add_skill(skill)).count();
            format!("Added {} skills", added)
        }
        SuggestionKind::ExperienceBullets => {
            let index = index.unwrap_or(0);
            if index == 0 && draft.experience.is_empty() {
                draft.add_entry(Section::Experience)?;
            }
            let current = draft.get_field(Section::Experience, index, "description")?;
            let bullets = suggestion.text.trim();
            let updated = if current.trim().is_empty() {
                bullets.to_string()
            } else {
                format!("{}\n{}", current.trim_end(), bullets)
            };
            draft.set_field(Section::Experience, index, "description", &updated)?;
            format!("Bullets added to experience entry {}", index)
        }
    };

    Ok(Reply::Text(message))
}

fn describe(path: &FieldPath) -> String {
    match (&path.field, path.section.is_list()) {
        (Some(field), true) => format!("{}.{}.{}", path.section, path.index, field),
        (Some(field), false) => format!("{}.{}", path.section, field),
        (None, true) => format!("{}.{}", path.section, path.index),
        (None, false) => path.section.to_string(),
    }
}

//! One line of interactive input, parsed into a session command

use crate::llm::prompts::SuggestionKind;
use crate::processing::resume::{FieldPath, Section};
use anyhow::{anyhow, bail, Context};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Job(PathBuf),
    JobText(String),
    Resume(PathBuf),
    Review,
    Match,
    Keywords,
    KeywordsLocal,
    Chat(String),
    History,
    Project,
    SaveProject(Option<PathBuf>),
    NewDraft,
    Import(PathBuf),
    Show(Option<FieldPath>),
    Set(FieldPath, String),
    Add(Section),
    Remove(Section, usize),
    Skill(String),
    Suggest(SuggestionKind),
    Accept(Option<usize>),
    Preview,
    Export(Option<PathBuf>),
    Cache,
    ClearCache,
}

pub const HELP: &str = r#"Inputs
  job <path>                 load a job description (.txt, .md)
  job-text <text>            paste a job description
  resume <path>              upload a resume PDF

Analysis
  review                     HR-style review against the job
  match                      ATS match percentage and missing keywords
  keywords                   model keyword analysis
  keywords-local             local keyword frequency count
  chat <question>            ask the career coach
  history                    show the chat transcript
  project                    generate an ideal portfolio project
  save-project [path]        save the last project plan

Resume builder
  new-draft                  start from the empty template
  import <path>              structure a plain text resume into the draft
  show [section[.i][.field]] show the draft or part of it
  set <section[.i].field> <value>
  add <section>              append a blank entry
  remove <section> <index>   remove an entry or skill
  skill <name>               add a skill
  suggest <summary|skills|bullets>
  accept [index]             apply the last suggestion
  preview                    render the draft as Markdown
  export [dir]               save the draft as Markdown

Session
  cache | clear-cache | help | quit"#;

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<Self> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name.to_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "job" => Command::Job(PathBuf::from(required(rest, "job <path>")?)),
            "job-text" => Command::JobText(required(rest, "job-text <text>")?.to_string()),
            "resume" => Command::Resume(PathBuf::from(required(rest, "resume <path>")?)),
            "review" => Command::Review,
            "match" => Command::Match,
            "keywords" => Command::Keywords,
            "keywords-local" => Command::KeywordsLocal,
            "chat" | "ask" => Command::Chat(required(rest, "chat <question>")?.to_string()),
            "history" => Command::History,
            "project" => Command::Project,
            "save-project" => Command::SaveProject(optional(rest).map(PathBuf::from)),
            "new-draft" => Command::NewDraft,
            "import" => Command::Import(PathBuf::from(required(rest, "import <path>")?)),
            "show" => Command::Show(optional(rest).map(str::parse::<FieldPath>).transpose()?),
            "set" => {
                let usage = "set <section[.index].field> <value>";
                let (path, value) = required(rest, usage)?
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| anyhow!("Usage: {}", usage))?;
                Command::Set(path.parse()?, value.trim().to_string())
            }
            "add" => Command::Add(required(rest, "add <section>")?.parse()?),
            "remove" => {
                let usage = "remove <section> <index>";
                let (section, index) = required(rest, usage)?
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| anyhow!("Usage: {}", usage))?;
                let index = index
                    .trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid index: {}", index.trim()))?;
                Command::Remove(section.parse()?, index)
            }
            "skill" => Command::Skill(required(rest, "skill <name>")?.to_string()),
            "suggest" => Command::Suggest(
                required(rest, "suggest <summary|skills|bullets>")?
                    .parse()
                    .map_err(|e: String| anyhow!(e))?,
            ),
            "accept" => Command::Accept(
                optional(rest)
                    .map(|i| i.parse::<usize>().with_context(|| format!("Invalid index: {}", i)))
                    .transpose()?,
            ),
            "preview" => Command::Preview,
            "export" => Command::Export(optional(rest).map(PathBuf::from)),
            "cache" => Command::Cache,
            "clear-cache" => Command::ClearCache,
            "" => bail!("Empty command. Type `help` for the list of commands"),
            other => bail!("Unknown command: {}. Type `help` for the list of commands", other),
        };

        Ok(command)
    }
}

fn required<'a>(rest: &'a str, usage: &str) -> anyhow::Result<&'a str> {
    optional(rest).ok_or_else(|| anyhow!("Usage: {}", usage))
}

fn optional(rest: &str) -> Option<&str> {
    Some(rest.trim()).filter(|r| !r.is_empty())
}

//! Prompt library for every model-backed feature

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Builder sections the model can draft content for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum SuggestionKind {
    Summary,
    Skills,
    #[value(name = "bullets", alias = "experience-bullets")]
    ExperienceBullets,
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionKind::Summary => write!(f, "summary"),
            SuggestionKind::Skills => write!(f, "skills"),
            SuggestionKind::ExperienceBullets => write!(f, "bullets"),
        }
    }
}

impl FromStr for SuggestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(SuggestionKind::Summary),
            "skills" => Ok(SuggestionKind::Skills),
            "bullets" | "experience" | "experience-bullets" => Ok(SuggestionKind::ExperienceBullets),
            _ => Err(format!("Unknown suggestion kind: {}. Supported: summary, skills, bullets", s)),
        }
    }
}

/// Fixed instruction texts; templates use `{job}`, `{query}`, `{history}` and `{text}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub review: String,
    pub match_score: String,
    pub keyword_extraction: String,
    pub transcription: String,
    pub chat: String,
    pub summary_suggestion: String,
    pub skills_suggestion: String,
    pub bullets_suggestion: String,
    pub import: String,
    pub project: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            review: REVIEW_PROMPT.to_string(),
            match_score: MATCH_PROMPT.to_string(),
            keyword_extraction: KEYWORD_PROMPT.to_string(),
            transcription: TRANSCRIPTION_PROMPT.to_string(),
            chat: CHAT_TEMPLATE.to_string(),
            summary_suggestion: SUMMARY_TEMPLATE.to_string(),
            skills_suggestion: SKILLS_TEMPLATE.to_string(),
            bullets_suggestion: BULLETS_TEMPLATE.to_string(),
            import: IMPORT_TEMPLATE.to_string(),
            project: PROJECT_TEMPLATE.to_string(),
        }
    }
}

/// Substitutes `{name}` placeholders in one pass; inserted values are never rescanned
/// and braces that do not name a known placeholder are kept as written.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let tail = &rest[open..];
        let placeholder = tail.find('}').and_then(|close| {
            values
                .iter()
                .find(|(name, _)| *name == &tail[1..close])
                .map(|(_, value)| (close, *value))
        });

        match placeholder {
            Some((close, value)) => {
                rendered.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                rendered.push('{');
                rest = &tail[1..];
            }
        }
    }

    rendered.push_str(rest);
    rendered
}

impl PromptTemplates {
    pub fn render_chat(&self, job: &str, history: &str, query: &str) -> String {
        let history = if history.trim().is_empty() {
            "(no previous messages)"
        } else {
            history
        };

        fill(&self.chat, &[("job", job), ("history", history), ("query", query)])
    }

    pub fn render_suggestion(&self, kind: SuggestionKind, job: &str) -> String {
        let template = match kind {
            SuggestionKind::Summary => &self.summary_suggestion,
            SuggestionKind::Skills => &self.skills_suggestion,
            SuggestionKind::ExperienceBullets => &self.bullets_suggestion,
        };
        fill(template, &[("job", job)])
    }

    pub fn render_import(&self, text: &str) -> String {
        fill(&self.import, &[("text", text)])
    }

    pub fn render_project(&self, job: &str) -> String {
        fill(&self.project, &[("job", job)])
    }

    /// The job description travels as its own trailing part
    pub fn job_part(job: &str) -> String {
        format!("Job Description: {}", job)
    }
}

const REVIEW_PROMPT: &str = r#"You are an experienced Technical Human Resource Manager, your task is to review the provided resume against the job description.
Please share your professional evaluation on whether the candidate's profile aligns with the role.
Highlight the strengths and weaknesses of the applicant in relation to the specified job requirements.
Format your response with clear sections for Strengths, Areas for Improvement, and Overall Assessment."#;

const MATCH_PROMPT: &str = r#"You are a skilled ATS (Applicant Tracking System) scanner with a deep understanding of data science and ATS functionality,
your task is to evaluate the resume against the provided job description.
Give me the percentage of match if the resume matches the job description.
Format your response with:
1. A clear percentage match at the beginning
2. Missing keywords or skills section
3. Final recommendations for improving the match

Make your response visually structured with clear headings for each section."#;

const KEYWORD_PROMPT: &str = r#"As an expert in resume analysis and keyword extraction, your task is to:
1. Extract the most significant and relevant keywords from the resume
2. Categorize these keywords into different professional domains
3. Provide insights into the candidate's key skills and expertise
4. Compare the extracted keywords with the job description

Please provide:
- Technical Skills
- Soft Skills
- Professional Certifications
- Key Technologies
- Industry-specific Keywords
- Match with Job Description Keywords

Format the output as a structured, easy-to-read analysis."#;

const TRANSCRIPTION_PROMPT: &str = r#"Extract raw text from this resume image.
Return only the plain text content, removing any formatting.
Focus on extracting words that could be skills, technologies, job titles, and qualifications."#;

const CHAT_TEMPLATE: &str = r#"You are an AI career coach and ATS expert assistant specializing in resume analysis.
You have access to a resume and a job description. Your goal is to:
1. Provide insightful, constructive career advice
2. Help the user understand how well their resume matches the job description
3. Offer specific, actionable recommendations for improvement
4. Maintain a professional, supportive tone

Always base your responses on the uploaded resume and job description.
If the question is unrelated to the resume, the job description, or the user's career, politely decline and steer the conversation back.

Job Description:
{job}

Conversation so far:
{history}

User's Query: {query}

Please provide a detailed, helpful response that addresses the user's specific question while referencing the resume and job description."#;

const SUMMARY_TEMPLATE: &str = r#"As a professional resume writer, create a compelling professional summary for a resume targeting this job description:

{job}

Write a concise, impactful 3-4 sentence professional summary that highlights the most relevant qualifications for this role.
Focus on key skills, experience level, and career achievements that align with the job requirements."#;

const SKILLS_TEMPLATE: &str = r#"As a resume expert, extract a list of 10-12 key hard and soft skills that would be most relevant for this job description:

{job}

Format your response as a simple comma-separated list with no explanations or additional text.
Include both technical/hard skills and soft skills relevant to the position."#;

const BULLETS_TEMPLATE: &str = r#"As a professional resume writer, create 3-4 powerful bullet points for a resume work experience section targeting this job description:

{job}

Write concise, achievement-focused bullet points that demonstrate relevant skills and accomplishments.
Use strong action verbs and include measurable results where possible.
Each bullet should be 1-2 lines long and highlight transferable skills relevant to the job.
Format as simple bullet points with no additional explanations."#;

const IMPORT_TEMPLATE: &str = r#"Extract structured information from this resume text into the following JSON format:

{
    "contact": {"name": "", "email": "", "phone": "", "location": "", "linkedin": ""},
    "summary": "",
    "experience": [
        {"title": "", "company": "", "location": "", "start_date": "", "end_date": "", "description": ""}
    ],
    "education": [
        {"degree": "", "institution": "", "location": "", "graduation_date": "", "description": ""}
    ],
    "certifications": [
        {"name": "", "issuer": "", "date": "", "url": ""}
    ],
    "skills": [],
    "projects": [
        {"title": "", "technologies": "", "description": "", "url": ""}
    ],
    "achievements": [
        {"title": "", "date": "", "description": ""}
    ]
}

Here is the resume text:
{text}

Respond with ONLY the JSON object, no explanations or other text."#;

const PROJECT_TEMPLATE: &str = r#"As a senior technical mentor and career advisor, analyze the provided resume and job description to generate a comprehensive,
ideal project that would significantly strengthen the candidate's application.

Job Description:
{job}

Based on the candidate's current skills and the job requirements, create a detailed project proposal that:
1. Bridges skill gaps between the resume and job requirements
2. Demonstrates proficiency in key technologies mentioned in the job description
3. Shows real-world problem-solving abilities
4. Is realistic and achievable within 2-4 weeks
5. Would be impressive to hiring managers for this role

Provide the following structure:

## Project Title
[Creative, professional title]

## Project Overview
[2-3 sentences describing what the project does and its purpose]

## Key Objectives
- [Objective 1]
- [Objective 2]
- [Objective 3]

## Technical Stack
[List all technologies, frameworks, and tools to be used]

## Core Features
1. [Feature 1 with brief description]
2. [Feature 2 with brief description]
3. [Feature 3 with brief description]
4. [Feature 4 with brief description]

## Implementation Steps
### Phase 1: [Phase Name]
- [Step 1]
- [Step 2]

### Phase 2: [Phase Name]
- [Step 1]
- [Step 2]

### Phase 3: [Phase Name]
- [Step 1]
- [Step 2]

## Skills Demonstrated
- [Skill 1]: [How it's demonstrated]
- [Skill 2]: [How it's demonstrated]
- [Skill 3]: [How it's demonstrated]

## Expected Outcomes
[What the candidate will learn and achieve]

## Bonus Enhancements (Optional)
- [Enhancement 1]
- [Enhancement 2]

## How to Showcase
[Tips on presenting this project in resume, GitHub, and interviews]

Make this comprehensive, actionable, and specifically tailored to help the candidate stand out for THIS specific job."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_rendering() {
        let templates = PromptTemplates::default();
        let prompt = templates.render_chat("Senior Rust Engineer", "user: hi", "Am I a fit?");

        assert!(prompt.contains("Senior Rust Engineer"));
        assert!(prompt.contains("user: hi"));
        assert!(prompt.contains("User's Query: Am I a fit?"));
        assert!(prompt.contains("politely decline"));
    }

    #[test]
    fn test_inserted_text_is_not_rescanned() {
        let templates = PromptTemplates::default();
        let prompt = templates.render_chat(
            "Build URL templates like /search?q={query} and log {history}",
            "assistant: use f\"{query}\" in Python",
            "Is my Flask experience enough?",
        );

        assert!(prompt.contains("/search?q={query} and log {history}"));
        assert!(prompt.contains("assistant: use f\"{query}\" in Python"));
        assert_eq!(prompt.matches("Is my Flask experience enough?").count(), 1);
    }

    #[test]
    fn test_unknown_braces_are_kept() {
        assert_eq!(fill("{a} {b} {", &[("a", "{b}")]), "{b} {b} {");
    }

    #[test]
    fn test_chat_without_history() {
        let templates = PromptTemplates::default();
        let prompt = templates.render_chat("job", "", "q");
        assert!(prompt.contains("(no previous messages)"));
    }

    #[test]
    fn test_suggestion_templates_interpolate_job() {
        let templates = PromptTemplates::default();
        for kind in [SuggestionKind::Summary, SuggestionKind::Skills, SuggestionKind::ExperienceBullets] {
            let prompt = templates.render_suggestion(kind, "Data Engineer at Acme");
            assert!(prompt.contains("Data Engineer at Acme"));
            assert!(!prompt.contains("{job}"));
        }
    }

    #[test]
    fn test_import_keeps_json_braces() {
        let templates = PromptTemplates::default();
        let prompt = templates.render_import("Jane Doe\nRust developer");

        assert!(prompt.contains("\"contact\": {\"name\""));
        assert!(prompt.contains("Jane Doe\nRust developer"));
        assert!(!prompt.contains("{text}"));
    }

    #[test]
    fn test_project_structure_headings() {
        let templates = PromptTemplates::default();
        let prompt = templates.render_project("Backend role");
        assert!(prompt.contains("## Project Title"));
        assert!(prompt.contains("## How to Showcase"));
        assert!(prompt.contains("Backend role"));
    }

    #[test]
    fn test_suggestion_kind_parsing() {
        assert_eq!("Skills".parse::<SuggestionKind>().unwrap(), SuggestionKind::Skills);
        assert_eq!("bullets".parse::<SuggestionKind>().unwrap(), SuggestionKind::ExperienceBullets);
        assert!("cover-letter".parse::<SuggestionKind>().is_err());
    }
}

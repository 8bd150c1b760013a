//! Terminal presentation of model replies, keyword counts and chat transcripts

use crate::error::Result;
use crate::processing::keywords::KeywordCount;
use crate::session::chat::{ChatMessage, Role};
use colored::{Color, Colorize};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag};
use std::fs;
use std::path::Path;

/// Console formatter with optional colors
#[derive(Debug, Clone, Copy)]
pub struct ConsoleFormatter {
    use_colors: bool,
}

impl Default for ConsoleFormatter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.use_colors {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            3 => "▒",
            _ => "░",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            3 => Color::Yellow,
            _ => Color::White,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    pub fn format_score_badge(&self, score: u8) -> String {
        let (badge, color) = match score {
            90..=100 => ("EXCELLENT", Color::Green),
            80..=89 => ("VERY GOOD", Color::BrightGreen),
            70..=79 => ("GOOD", Color::Yellow),
            60..=69 => ("FAIR", Color::BrightYellow),
            50..=59 => ("BELOW AVG", Color::Red),
            _ => ("POOR", Color::BrightRed),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    /// Headline shown above a match report when a percentage could be read from it
    pub fn format_match_headline(&self, score: u8) -> String {
        format!("🎯 Match score: {}% {}\n", self.bold(&score.to_string()), self.format_score_badge(score))
    }

    /// Renders model Markdown for a terminal: headings become colored banners,
    /// list items get bullets, inline code is highlighted
    pub fn render_markdown(&self, markdown: &str) -> String {
        let mut output = String::new();
        let mut heading: Option<(u8, String)> = None;
        let mut ordered: Vec<Option<u64>> = Vec::new();
        let mut strong = false;

        for event in Parser::new(markdown) {
            match event {
                Event::Start(Tag::Heading(level, ..)) => heading = Some((heading_depth(level), String::new())),
                Event::End(Tag::Heading(..)) => {
                    if let Some((level, title)) = heading.take() {
                        output.push_str(&self.format_header(&title, level));
                    }
                }
                Event::Start(Tag::List(start)) => ordered.push(start),
                Event::End(Tag::List(_)) => {
                    ordered.pop();
                    if ordered.is_empty() {
                        output.push('\n');
                    }
                }
                Event::Start(Tag::Item) => {
                    let indent = "  ".repeat(ordered.len().saturating_sub(1));
                    let marker = match ordered.last_mut() {
                        Some(Some(n)) => {
                            let marker = format!("{}.", n);
                            *n += 1;
                            marker
                        }
                        _ => "•".to_string(),
                    };
                    output.push_str(&format!("{}  {} ", indent, marker));
                }
                Event::End(Tag::Item) => {
                    if !output.ends_with('\n') {
                        output.push('\n');
                    }
                }
                Event::Start(Tag::Strong) => strong = true,
                Event::End(Tag::Strong) => strong = false,
                Event::End(Tag::Paragraph) => {
                    if ordered.is_empty() {
                        output.push_str("\n\n");
                    } else {
                        output.push('\n');
                    }
                }
                Event::End(Tag::CodeBlock(_)) => output.push('\n'),
                Event::Text(text) => match heading.as_mut() {
                    Some((_, title)) => title.push_str(&text),
                    None if strong => output.push_str(&self.bold(&text)),
                    None => output.push_str(&text),
                },
                Event::Code(code) => match heading.as_mut() {
                    Some((_, title)) => title.push_str(&code),
                    None => output.push_str(&self.colorize(&code, Color::Cyan)),
                },
                Event::SoftBreak | Event::HardBreak => output.push('\n'),
                Event::Rule => output.push_str(&format!("{}\n\n", "─".repeat(40))),
                _ => {}
            }
        }

        output.trim_end().to_string() + "\n"
    }

    pub fn format_keyword_table(&self, keywords: &[KeywordCount]) -> String {
        if keywords.is_empty() {
            return "No keywords found.\n".to_string();
        }

        let width = keywords.iter().map(|k| k.word.chars().count()).max().unwrap_or(0).max(7);
        let max_count = keywords.iter().map(|k| k.count).max().unwrap_or(1).max(1);

        let mut output = self.format_header("Top Keywords by Frequency", 3);
        output.push_str(&format!(
            "{:>4}  {:<width$}  {:>5}\n",
            "#",
            "Keyword",
            "Count",
            width = width
        ));

        for (i, keyword) in keywords.iter().enumerate() {
            let bar_len = (keyword.count * 20).div_ceil(max_count);
            output.push_str(&format!(
                "{:>4}  {:<width$}  {:>5}  {}\n",
                i + 1,
                keyword.word,
                keyword.count,
                self.colorize(&"▇".repeat(bar_len), Color::Green),
                width = width
            ));
        }

        output
    }

    /// Inline tag cloud of the counted words
    pub fn format_keyword_tags(&self, keywords: &[KeywordCount]) -> String {
        keywords
            .iter()
            .map(|k| self.colorize(&format!("[{}]", k.word), Color::Cyan))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn format_chat(&self, messages: &[ChatMessage]) -> String {
        if messages.is_empty() {
            return "No messages yet. Ask a question with `chat <question>`.\n".to_string();
        }

        let mut output = String::new();
        for message in messages {
            let label = match message.role {
                Role::User => self.colorize("🧑 You", Color::Blue),
                Role::Assistant => self.colorize("🤖 Assistant", Color::Magenta),
            };
            output.push_str(&format!("{}:\n", self.bold(&label)));
            match message.role {
                Role::User => output.push_str(&format!("{}\n\n", message.content)),
                Role::Assistant => {
                    output.push_str(&self.render_markdown(&message.content));
                    output.push('\n');
                }
            }
        }
        output
    }

    pub fn format_error(&self, message: &str) -> String {
        self.colorize(&format!("❌ {}", message), Color::Red)
    }

    pub fn format_success(&self, message: &str) -> String {
        self.colorize(&format!("✅ {}", message), Color::Green)
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        _ => 4,
    }
}

/// Writes a file, creating missing parent directories
pub fn save_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(file_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> ConsoleFormatter {
        ConsoleFormatter::new(false)
    }

    #[test]
    fn test_markdown_headings_and_lists() {
        let rendered = plain().render_markdown("## Strengths\n\n- Rust\n- **SQL** skills\n\nDone.");

        assert!(rendered.contains("▓ Strengths"));
        assert!(rendered.contains("  • Rust\n"));
        assert!(rendered.contains("  • SQL skills\n"));
        assert!(rendered.ends_with("Done.\n"));
        assert!(!rendered.contains("##"));
    }

    #[test]
    fn test_ordered_lists_are_numbered() {
        let rendered = plain().render_markdown("1. First\n2. Second\n");
        assert!(rendered.contains("1. First"));
        assert!(rendered.contains("2. Second"));
    }

    #[test]
    fn test_keyword_table() {
        let keywords = vec![
            KeywordCount {
                word: "sql".to_string(),
                count: 3,
            },
            KeywordCount {
                word: "python".to_string(),
                count: 2,
            },
        ];
        let table = plain().format_keyword_table(&keywords);

        let lines: Vec<&str> = table.lines().filter(|l| l.contains("sql") || l.contains("python")).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].trim_start().starts_with("1  sql"));
        assert!(lines[0].ends_with(&"▇".repeat(20)));
        assert_eq!(plain().format_keyword_tags(&keywords), "[sql] [python]");
    }

    #[test]
    fn test_empty_keyword_table() {
        assert_eq!(plain().format_keyword_table(&[]), "No keywords found.\n");
    }

    #[test]
    fn test_chat_transcript() {
        let messages = vec![
            ChatMessage::new(Role::User, "Am I a fit?"),
            ChatMessage::new(Role::Assistant, "Mostly, yes."),
        ];
        let transcript = plain().format_chat(&messages);
        assert!(transcript.contains("🧑 You:\nAm I a fit?"));
        assert!(transcript.contains("🤖 Assistant:\nMostly, yes."));
    }

    #[test]
    fn test_score_badge() {
        assert_eq!(plain().format_score_badge(92), "[EXCELLENT]");
        assert_eq!(plain().format_score_badge(10), "[POOR]");
        assert!(plain().format_match_headline(74).contains("74% [GOOD]"));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.md");
        save_to_file("# hi", &path).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "# hi");
    }
}

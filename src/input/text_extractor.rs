//! Text extraction from uploaded files

use crate::error::{CareerMateError, Result};
use pulldown_cmark::{Event, Parser, Tag};
use std::path::Path;
use tokio::fs;

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Local text layer of a PDF, fed to the frequency counter so it can skip a transcription call
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn extract_from_mem(bytes: &[u8]) -> Result<String> {
        // pdf-extract panics on some malformed font tables
        std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
            .map_err(|_| CareerMateError::PdfExtraction("Text extraction panicked".to_string()))?
            .map_err(|e| CareerMateError::PdfExtraction(format!("Failed to extract text: {}", e)))
    }
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let content = fs::read_to_string(path).await?;
        Ok(content)
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let markdown_content = fs::read_to_string(path).await?;
        Ok(Self::to_plain_text(&markdown_content))
    }
}

impl MarkdownExtractor {
    /// Strip Markdown syntax, keeping one line per block
    pub fn to_plain_text(markdown: &str) -> String {
        let mut text = String::new();

        for event in Parser::new(markdown) {
            match event {
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak => text.push(' '),
                Event::End(Tag::Paragraph | Tag::Heading(..) | Tag::Item | Tag::CodeBlock(_)) => {
                    text.push('\n')
                }
                _ => {}
            }
        }

        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

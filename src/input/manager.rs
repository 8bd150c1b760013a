//! Input manager for resume uploads and job descriptions

use crate::error::{CareerMateError, Result};
use crate::input::file_detector::FileType;
use crate::input::rasterizer::{PageImage, PageRenderer, Rasterizer};
use crate::input::text_extractor::{MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor};
use log::{info, warn};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;

/// An uploaded resume, ready to be attached to model requests
#[derive(Debug, Clone)]
pub struct ResumeSource {
    pub file_name: String,
    /// SHA-256 of the uploaded bytes, hex encoded
    pub fingerprint: String,
    pub image: PageImage,
    /// Text layer extracted locally; absent for scanned or unreadable PDFs
    pub text: Option<String>,
}

pub struct InputManager<R> {
    rasterizer: Rasterizer<R>,
    cache: HashMap<String, ResumeSource>,
    enable_cache: bool,
}

impl<R> InputManager<R>
where
    R: PageRenderer + Clone + 'static,
{
    pub fn new(rasterizer: Rasterizer<R>) -> Self {
        Self {
            rasterizer,
            cache: HashMap::new(),
            enable_cache: true,
        }
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    pub async fn load_resume(&mut self, path: &Path) -> Result<ResumeSource> {
        if FileType::from_path(path) != FileType::Pdf {
            return Err(CareerMateError::UnsupportedFormat(format!(
                "Resume must be a PDF: {}",
                path.display()
            )));
        }

        if !path.exists() {
            return Err(CareerMateError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "resume.pdf".to_string());

        self.load_resume_bytes(&file_name, bytes).await
    }

    pub async fn load_resume_bytes(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<ResumeSource> {
        if bytes.is_empty() {
            return Err(CareerMateError::MissingInput("No file uploaded".to_string()));
        }

        let fingerprint = fingerprint(&bytes);

        if self.enable_cache {
            if let Some(cached) = self.cache.get(&fingerprint) {
                info!("Using cached rendering for: {}", file_name);
                let mut source = cached.clone();
                source.file_name = file_name.to_string();
                return Ok(source);
            }
        }

        info!("Rasterizing first page of: {}", file_name);
        let rasterizer = self.rasterizer.clone();
        let (image, text) = tokio::task::spawn_blocking(move || {
            let image = rasterizer.rasterize_first_page(&bytes)?;
            let text = match PdfExtractor::extract_from_mem(&bytes) {
                Ok(text) if !text.trim().is_empty() => Some(text),
                Ok(_) => None,
                Err(e) => {
                    warn!("No local text layer available: {}", e);
                    None
                }
            };
            Ok::<_, CareerMateError>((image, text))
        })
        .await
        .map_err(|e| CareerMateError::Rendering(format!("Rasterization task failed: {}", e)))??;

        let source = ResumeSource {
            file_name: file_name.to_string(),
            fingerprint: fingerprint.clone(),
            image,
            text,
        };

        if self.enable_cache {
            self.cache.insert(fingerprint, source.clone());
        }

        Ok(source)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

/// Reads a job description; an empty one counts as missing input
pub async fn read_job_description(path: &Path) -> Result<String> {
    let text = read_text(path).await?;
    if text.trim().is_empty() {
        return Err(CareerMateError::MissingInput(format!(
            "The job description in {} is empty",
            path.display()
        )));
    }
    Ok(text.trim().to_string())
}

/// Reads a plain text or Markdown file as text
pub async fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(CareerMateError::InvalidInput(format!(
            "File does not exist: {}",
            path.display()
        )));
    }

    match FileType::from_path(path) {
        FileType::Text => PlainTextExtractor.extract(path).await,
        FileType::Markdown => MarkdownExtractor.extract(path).await,
        _ => Err(CareerMateError::UnsupportedFormat(format!(
            "Expected a .txt or .md file: {}",
            path.display()
        ))),
    }
}

pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

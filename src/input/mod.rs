//! Input processing module
//! Handles file detection, PDF rasterization, text extraction, and uploads

pub mod file_detector;
pub mod manager;
pub mod rasterizer;
pub mod text_extractor;

pub use manager::{InputManager, ResumeSource};
pub use rasterizer::{PageImage, PageRenderer, PdfiumRenderer, Rasterizer};

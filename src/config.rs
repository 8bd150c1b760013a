//! Configuration management for careermate

use crate::error::{CareerMateError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub render: RenderConfig,
    pub keywords: KeywordConfig,
    pub cache: CacheConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub base_url: String,
    pub default_model: String,
    /// Lighter model used for the plain resume review
    pub review_model: String,
    pub request_timeout_secs: u64,
    /// Upper bound on the time spent retrying transient failures
    pub max_retry_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub scale: f32,
    pub jpeg_quality: u8,
    /// Directory containing the pdfium shared library; system lookup when unset
    pub pdfium_library_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub min_length: usize,
    pub limit: usize,
    pub extra_stop_words: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub export_dir: PathBuf,
    pub color_output: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key_env: "GOOGLE_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            default_model: "gemini-2.5-flash".to_string(),
            review_model: "gemini-2.5-flash-lite".to_string(),
            request_timeout_secs: 120,
            max_retry_secs: 60,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            jpeg_quality: 85,
            pdfium_library_path: None,
        }
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            min_length: 3,
            limit: 20,
            extra_stop_words: Vec::new(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 30 * 60,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("."),
            color_output: true,
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| CareerMateError::Configuration(format!("Failed to parse config '{}': {}", path.display(), e)))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| CareerMateError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("careermate")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.model.api_key_env, "GOOGLE_API_KEY");
        assert_eq!(config.render.scale, 2.0);
        assert_eq!(config.keywords.limit, 20);
        assert_eq!(config.keywords.min_length, 3);
        assert_eq!(config.cache.ttl_secs, 1800);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("[cache]\nttl_secs = 3600\n").unwrap();
        assert_eq!(config.cache.ttl_secs, 3600);
        assert!(config.cache.enabled);
        assert_eq!(config.model.default_model, "gemini-2.5-flash");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.keywords.extra_stop_words = vec!["team".to_string()];
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.keywords.extra_stop_words, vec!["team".to_string()]);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.output.export_dir, PathBuf::from("."));
    }
}

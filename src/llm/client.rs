//! Hosted generative model client (Gemini REST API)

use crate::config::ModelConfig;
use crate::error::{CareerMateError, Result};
use crate::input::rasterizer::PageImage;
use backoff::{future::retry, ExponentialBackoff};
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One ordered element of a request: instruction text or an image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

/// A single non-streaming generation request
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub parts: Vec<Part>,
}

impl ModelRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            parts: Vec::new(),
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::Text { text: text.into() });
        self
    }

    pub fn image(mut self, image: &PageImage) -> Self {
        self.parts.push(Part::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            },
        });
        self
    }

    /// Concatenated text parts; images are left out
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Anything that turns a request into free text
pub trait GenerativeModel: Send + Sync {
    fn generate(&self, request: &ModelRequest) -> impl std::future::Future<Output = Result<String>> + Send;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: &'a [Part],
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PromptFeedback {
    #[serde(rename = "blockReason")]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, or an error explaining why there is none
    pub fn into_text(self) -> Result<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(CareerMateError::Model(format!("Request was blocked: {}", reason)));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| CareerMateError::Model("Response contained no candidates".to_string()))?;

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(CareerMateError::Model(format!(
                "Response contained no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    request_timeout: Duration,
    max_retry: Duration,
}

impl GeminiClient {
    pub fn new(config: &ModelConfig, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_retry: Duration::from_secs(config.max_retry_secs),
        }
    }

    /// Reads the API key from the variable named in the config
    pub fn from_env(config: &ModelConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                CareerMateError::Configuration(format!(
                    "{} is not set; add it to the environment or a .env file",
                    config.api_key_env
                ))
            })?;

        Ok(Self::new(config, api_key))
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: &ModelRequest) -> Result<String> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: &request.parts,
            }],
        };
        let url = self.endpoint(&request.model);

        debug!("Calling {} with {} parts", request.model, request.parts.len());

        let backoff_config = ExponentialBackoff {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(20),
            multiplier: 2.0,
            max_elapsed_time: Some(self.max_retry),
            ..Default::default()
        };

        let operation = || async {
            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .timeout(self.request_timeout)
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    if e.is_connect() || e.is_timeout() {
                        warn!("Model API connection error (retrying): {}", e);
                        backoff::Error::transient(CareerMateError::Network(e.to_string()))
                    } else {
                        backoff::Error::permanent(CareerMateError::Network(e.to_string()))
                    }
                })?;

            let status = response.status();
            let response_text = response
                .text()
                .await
                .map_err(|e| backoff::Error::permanent(CareerMateError::Network(e.to_string())))?;

            if matches!(status.as_u16(), 429 | 500 | 502 | 503) {
                warn!("Model API returned {} (retrying)", status);
                return Err(backoff::Error::transient(CareerMateError::Model(format!(
                    "API error ({}): {}",
                    status, response_text
                ))));
            }

            if !status.is_success() {
                return Err(backoff::Error::permanent(CareerMateError::Model(format!(
                    "API error ({}): {}",
                    status, response_text
                ))));
            }

            serde_json::from_str::<GenerateContentResponse>(&response_text).map_err(|e| {
                backoff::Error::permanent(CareerMateError::Model(format!("Malformed response: {}", e)))
            })
        };

        let response = retry(backoff_config, operation).await?;
        response.into_text()
    }
}

/// Turns a model outcome into something displayable; failures never escape an action
pub fn reply_text(result: Result<String>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => format!("Error: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_matches_wire_format() {
        let request = ModelRequest::new("gemini-2.5-flash")
            .text("Review this")
            .image(&PageImage {
                mime_type: "image/jpeg".to_string(),
                data: "QUJD".to_string(),
            })
            .text("Job: Rust developer");

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: &request.parts,
            }],
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "Review this");
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["data"], "QUJD");
        assert_eq!(json["contents"][0]["parts"][2]["text"], "Job: Rust developer");
    }

    #[test]
    fn test_text_content_skips_images() {
        let request = ModelRequest::new("m")
            .text("a")
            .image(&PageImage::jpeg(b"x"))
            .text("b");
        assert_eq!(request.text_content(), "a\nb");
    }

    #[test]
    fn test_response_text_is_joined() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"there"}],"role":"model"},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "Hello there");
    }

    #[test]
    fn test_blocked_response_is_an_error() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        let err = response.into_text().unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_empty_candidate_is_an_error() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#).unwrap();
        assert!(matches!(response.into_text(), Err(CareerMateError::Model(_))));
    }

    #[test]
    fn test_reply_text_formats_errors() {
        let reply = reply_text(Err(CareerMateError::Network("connection refused".to_string())));
        assert_eq!(reply, "Error: Network error: connection refused");
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let config = ModelConfig {
            api_key_env: "CAREERMATE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ModelConfig::default()
        };
        assert!(matches!(
            GeminiClient::from_env(&config),
            Err(CareerMateError::Configuration(_))
        ));
    }
}

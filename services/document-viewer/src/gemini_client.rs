//! Gemini Client
//!
//! Summarization collaborator backed by the Gemini `generateContent` API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use baa_scanner::Summarizer;
use baa_utils::{BaaError, BaaResult, SummarizerConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini client for context summaries
pub struct GeminiClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    prompt_prefix: String,
}

impl GeminiClient {
    pub fn new(config: &SummarizerConfig) -> BaaResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| BaaError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            prompt_prefix: config.prompt_prefix.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }

    /// Ask the model for a summary of `text`
    pub async fn generate_summary(&self, text: &str) -> Result<String> {
        if self.api_key.is_empty() {
            anyhow::bail!("Gemini API key is not configured");
        }

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: format!("{}{}", self.prompt_prefix, text),
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .context("Failed to call Gemini API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error {}: {}", status, error_text);
        }

        let result: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        result.summary_text().context("No summary text in Gemini response")
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(&self, text: &str) -> Result<String> {
        self.generate_summary(text).await
    }
}

/// Gemini API request
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// Gemini API response
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated.
    fn summary_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SummarizerConfig {
        baa_utils::AppConfig::default().summarizer
    }

    #[test]
    fn test_summary_text_from_response() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"A breach "},{"text":"was reported."}],"role":"model"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.summary_text().as_deref(), Some("A breach was reported."));
    }

    #[test]
    fn test_empty_response_has_no_summary() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(response.summary_text().is_none());

        let response: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(response.summary_text().is_none());
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: "Summarize this: x".to_string() }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Summarize this: x");
    }

    #[test]
    fn test_endpoint_uses_model() {
        let client = GeminiClient::new(&config()).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_missing_key_fails_without_network() {
        let client = GeminiClient::new(&config()).unwrap();
        let result = tokio_test::block_on(client.summarize("a breach"));
        assert!(result.is_err());
    }
}

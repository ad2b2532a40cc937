//! Text helpers backed by an external generative model.

use log::{error, info};
use reqwest::blocking::Client;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

use crate::config::AiConfig;
use crate::models::AiAction;

/// Returned when the service answers without any text.
pub const EMPTY_RESPONSE_TEXT: &str = "Could not generate response.";

#[derive(Debug, Error)]
pub enum AiError {
    #[error("API key is missing (set {0})")]
    MissingApiKey(String),
    #[error("AI service unavailable: {0}")]
    Network(String),
    #[error("AI service returned {status}: {body}")]
    Service { status: u16, body: String },
    #[error("Malformed AI response: {0}")]
    Malformed(String),
}

/// Anything that can run an [`AiAction`] over a piece of text.
pub trait AiGateway: Send + Sync {
    fn perform(&self, text: &str, action: AiAction, context_title: Option<&str>) -> Result<String, AiError>;
}

/// Prompt sent for `action`. The title is only used when continuing.
pub fn build_prompt(text: &str, action: AiAction, context_title: Option<&str>) -> String {
    match action {
        AiAction::Summarize => format!(
            "Summarize the following note content concisely in bullet points:\n\n\"{}\"",
            text
        ),
        AiAction::FixGrammar => format!(
            "Fix the grammar and spelling of the following text, keeping the tone natural. Return only the corrected text:\n\n\"{}\"",
            text
        ),
        AiAction::Continue => {
            let title = context_title.filter(|t| !t.trim().is_empty()).unwrap_or("None");
            format!(
                "Continue writing the following text creatively. Keep the style consistent with the input:\n\n\"{}\"\n\nExisting Title Context: {}",
                text, title
            )
        }
    }
}

/// Google Gemini `generateContent` over plain HTTPS.
pub struct GeminiGateway {
    api_key: Option<String>,
    api_key_env: String,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl GeminiGateway {
    /// Build from config, reading the key from the configured environment variable.
    pub fn new(config: &AiConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).ok();
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &AiConfig, api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_key_env: config.api_key_env.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn request_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl AiGateway for GeminiGateway {
    fn perform(&self, text: &str, action: AiAction, context_title: Option<&str>) -> Result<String, AiError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AiError::MissingApiKey(self.api_key_env.clone()))?;

        let prompt = build_prompt(text, action, context_title);
        let payload = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        info!("event=ai_request module=ai status=start action={:?} model={}", action, self.model);

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| AiError::Network(e.to_string()))?;

        let response = client
            .post(self.request_url())
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .map_err(|e| {
                error!("event=ai_request module=ai status=error error={}", e);
                AiError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().map_err(|e| AiError::Network(e.to_string()))?;
        if !status.is_success() {
            error!("event=ai_request module=ai status=error http_status={}", status.as_u16());
            return Err(AiError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| AiError::Malformed(e.to_string()))?;
        let output = extract_response_text(&value);
        info!("event=ai_request module=ai status=ok chars={}", output.chars().count());

        if output.trim().is_empty() {
            Ok(EMPTY_RESPONSE_TEXT.to_string())
        } else {
            Ok(output)
        }
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_response_text(value: &Value) -> String {
    value
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_quote_the_text() {
        let prompt = build_prompt("i has a dog", AiAction::FixGrammar, None);
        assert!(prompt.starts_with("Fix the grammar and spelling"));
        assert!(prompt.ends_with("\"i has a dog\""));
    }

    #[test]
    fn continue_prompt_carries_title_context() {
        let with_title = build_prompt("once", AiAction::Continue, Some("Story"));
        assert!(with_title.ends_with("Existing Title Context: Story"));

        let without = build_prompt("once", AiAction::Continue, Some("  "));
        assert!(without.ends_with("Existing Title Context: None"));
    }

    #[test]
    fn missing_key_fails_before_any_request() {
        let config = AiConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            ..AiConfig::default()
        };
        let gateway = GeminiGateway::with_api_key(&config, Some("   ".to_string()));
        assert!(!gateway.has_api_key());

        let err = gateway.perform("text", AiAction::Summarize, None).unwrap_err();
        assert!(matches!(err, AiError::MissingApiKey(ref var) if var == &config.api_key_env));
    }

    #[test]
    fn response_text_joins_candidate_parts() {
        let value = json!({
            "candidates": [
                { "content": { "parts": [ { "text": "I have " }, { "text": "a dog." } ] } }
            ]
        });
        assert_eq!(extract_response_text(&value), "I have a dog.");
        assert_eq!(extract_response_text(&json!({})), "");
    }
}

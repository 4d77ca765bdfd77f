//! Reflection service contract and HTTP implementation.

use crate::config::ReflectionConfig;
use log::{debug, warn};
use reqwest::blocking::Client;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Shown instead of calling the service when the diary is blank.
pub const EMPTY_DIARY_MESSAGE: &str =
    "Write today's diary and you will get a short, warm note back.";
/// Shown when the service answers with no text.
pub const EMPTY_RESPONSE_MESSAGE: &str = "You did well today.";
/// Shown when the service cannot be reached or fails.
pub const FAILURE_MESSAGE: &str = "Always cheering for your day.";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";
const TEMPERATURE: f64 = 0.7;

#[derive(Debug)]
pub enum ReflectionError {
    /// No API key is configured.
    Disabled,
    Http(reqwest::Error),
    Status(u16),
    MissingText,
}

impl Display for ReflectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "reflection service is not configured"),
            Self::Http(err) => write!(f, "reflection request failed: {err}"),
            Self::Status(code) => write!(f, "reflection service returned status {code}"),
            Self::MissingText => write!(f, "reflection response missing text content"),
        }
    }
}

impl Error for ReflectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ReflectionError {
    // Errors end up in logs; drop the request URL from them.
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value.without_url())
    }
}

/// Diary text in, short natural-language message out.
pub trait ReflectionService {
    fn reflect(&self, diary: &str) -> Result<String, ReflectionError>;
}

/// Placeholder used when no API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledReflectionService;

impl ReflectionService for DisabledReflectionService {
    fn reflect(&self, _diary: &str) -> Result<String, ReflectionError> {
        Err(ReflectionError::Disabled)
    }
}

/// Gemini `generateContent` REST client.
pub struct GeminiReflectionService {
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiReflectionService {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            timeout,
        }
    }

    /// Overrides the API root, e.g. for a local proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Returns `None` when the config carries no API key.
    pub fn from_config(config: &ReflectionConfig) -> Option<Self> {
        let api_key = config.api_key.as_deref()?;
        Some(Self::new(api_key, config.model.as_str(), config.timeout))
    }
}

impl ReflectionService for GeminiReflectionService {
    fn reflect(&self, diary: &str) -> Result<String, ReflectionError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let payload = serde_json::json!({
            "contents": [
                {
                    "parts": [
                        {"text": build_prompt(diary)}
                    ]
                }
            ],
            "generationConfig": {
                "temperature": TEMPERATURE
            }
        });

        let client = Client::builder().timeout(self.timeout).build()?;
        let response = client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&payload)
            .send()?;
        if !response.status().is_success() {
            return Err(ReflectionError::Status(response.status().as_u16()));
        }

        let json: Value = response.json()?;
        extract_candidate_text(&json).ok_or(ReflectionError::MissingText)
    }
}

/// Asks `service` for a reflection and never fails.
///
/// - Blank diary: [`EMPTY_DIARY_MESSAGE`] without calling the service.
/// - Blank answer or missing text: [`EMPTY_RESPONSE_MESSAGE`].
/// - Any other error: [`FAILURE_MESSAGE`].
pub fn reflect_or_fallback(service: &dyn ReflectionService, diary: &str) -> String {
    if diary.trim().is_empty() {
        return EMPTY_DIARY_MESSAGE.to_string();
    }

    match service.reflect(diary) {
        Ok(message) if !message.trim().is_empty() => {
            debug!(
                "event=reflection module=reflection status=ok chars={}",
                message.chars().count()
            );
            message.trim().to_string()
        }
        Ok(_) | Err(ReflectionError::MissingText) => {
            warn!("event=reflection module=reflection status=degraded error_code=empty_response");
            EMPTY_RESPONSE_MESSAGE.to_string()
        }
        Err(err) => {
            warn!("event=reflection module=reflection status=degraded error={err}");
            FAILURE_MESSAGE.to_string()
        }
    }
}

fn build_prompt(diary: &str) -> String {
    format!(
        "Below is a diary entry written by the user. Read it and reply with exactly one \
         sentence of warm comfort, encouragement, or a light-hearted comment: \"{diary}\""
    )
}

fn extract_candidate_text(json: &Value) -> Option<String> {
    let parts = json
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)?;

    let text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("");
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::extract_candidate_text;

    #[test]
    fn extracts_text_parts_from_first_candidate() {
        let json = serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "Keep "}, {"text": "going."}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        });
        assert_eq!(extract_candidate_text(&json).as_deref(), Some("Keep going."));
    }

    #[test]
    fn missing_candidates_yield_none() {
        let json = serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}});
        assert_eq!(extract_candidate_text(&json), None);
    }
}

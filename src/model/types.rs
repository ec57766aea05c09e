//! Gemini `generateContent` wire types.
//!
//! Response fields are all optional so a short or unexpected body still
//! deserializes; [`GenerateContentResponse::into_answer`] decides whether it
//! carries usable text.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Content part. Only text parts are produced or consumed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// Content in a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Generation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Generate content request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Single-turn user prompt
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(prompt)],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.0),
                max_output_tokens: None,
            }),
        }
    }
}

/// Generate content response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

/// Candidate response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Trimmed text of the first part of the first candidate
    pub fn into_answer(self) -> Result<String, ModelError> {
        let candidate = self
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or_else(|| ModelError::MalformedResponse("no candidates".to_string()))?;

        let finish_reason = candidate.finish_reason;
        let part = candidate
            .content
            .and_then(|c| c.parts.into_iter().next())
            .ok_or_else(|| {
                ModelError::MalformedResponse(format!(
                    "first candidate has no content parts (finish reason: {})",
                    finish_reason.as_deref().unwrap_or("unknown")
                ))
            })?;

        let text = part.text.ok_or_else(|| {
            ModelError::MalformedResponse("first content part has no text".to_string())
        })?;

        Ok(text.trim().to_string())
    }
}

/// Error response from API.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiError {
    pub error: GeminiErrorDetail,
}

/// Error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiErrorDetail {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateContentRequest::from_prompt("find it");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "find it");
        assert_eq!(json["generationConfig"]["temperature"], 0.0);
    }

    #[test]
    fn test_first_text_is_trimmed() {
        let response = parse(serde_json::json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "  #submit \n"}, {"text": "ignored"}]}},
                {"content": {"parts": [{"text": "second"}]}}
            ]
        }));
        assert_eq!(response.into_answer().unwrap(), "#submit");
    }

    #[test]
    fn test_missing_candidates_is_malformed() {
        for body in [serde_json::json!({}), serde_json::json!({"candidates": []})] {
            let err = parse(body).into_answer().unwrap_err();
            assert!(matches!(err, ModelError::MalformedResponse(_)));
        }
    }

    #[test]
    fn test_missing_parts_is_malformed() {
        let response = parse(serde_json::json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }));
        let err = response.into_answer().unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_part_without_text_is_malformed() {
        let response = parse(serde_json::json!({
            "candidates": [{"content": {"parts": [{"inlineData": {}}]}}]
        }));
        assert!(matches!(
            response.into_answer(),
            Err(ModelError::MalformedResponse(_))
        ));
    }
}

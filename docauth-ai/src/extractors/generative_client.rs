//! Gemini Client
//!
//! [`GenerativeService`] implementation over the Generative Language
//! `generateContent` REST method. The prompt and the base64 image travel in
//! one user turn; the answer is the concatenated text of the first
//! candidate.
//!
//! # API Reference
//! - Endpoint: https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent
//! - Auth: API key query parameter

use crate::types::{GenerativeRequest, GenerativeService, ServiceError, ServiceErrorCause};
use async_trait::async_trait;
use base64::Engine;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use tracing::debug;

/// Generative Language API base URL
pub const DEFAULT_GENERATIVE_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
pub const DEFAULT_GENERATIVE_MODEL: &str = "gemini-1.5-flash";

/// Default request budget per minute
pub const DEFAULT_GENERATIVE_RPM: u32 = 15;

const USER_AGENT: &str = concat!("docauth/", env!("CARGO_PKG_VERSION"));

/// Gemini Client
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    rate_limiter: RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(
            api_key,
            DEFAULT_GENERATIVE_ENDPOINT.to_string(),
            DEFAULT_GENERATIVE_MODEL.to_string(),
            DEFAULT_GENERATIVE_RPM,
        )
    }

    pub fn with_endpoint(
        api_key: String,
        endpoint: String,
        model: String,
        requests_per_minute: u32,
    ) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
        Self {
            http_client: Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            rate_limiter: RateLimiter::direct(quota),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl GenerativeService for GeminiClient {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn generate(&self, request: &GenerativeRequest<'_>) -> Result<String, ServiceError> {
        self.rate_limiter.until_ready().await;

        let body = build_request(request);
        debug!(model = %self.model, image_bytes = request.image.len(), "Sending generateContent request");

        let response = self
            .http_client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let cause = if e.is_timeout() {
                    ServiceErrorCause::Quota
                } else {
                    ServiceErrorCause::Unknown
                };
                ServiceError::new(cause, format!("Gemini request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|env| format!("{} {}", env.error.status, env.error.message))
                .unwrap_or(text);
            return Err(ServiceError::new(
                ServiceErrorCause::from_status(status.as_u16(), &message),
                format!("Gemini returned {}: {}", status, message.trim()),
            ));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            ServiceError::new(
                ServiceErrorCause::Unknown,
                format!("Failed to parse Gemini response: {}", e),
            )
        })?;

        response_text(parsed)
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Inline { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

fn build_request(request: &GenerativeRequest<'_>) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                RequestPart::Text {
                    text: request.prompt.to_string(),
                },
                RequestPart::Inline {
                    inline_data: InlineData {
                        mime_type: request.media_type.mime(),
                        data: base64::engine::general_purpose::STANDARD.encode(request.image),
                    },
                },
            ],
        }],
    }
}

fn response_text(response: GenerateContentResponse) -> Result<String, ServiceError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ServiceError::new(
            ServiceErrorCause::MalformedInput,
            format!("Gemini blocked the request: {}", reason),
        ));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ServiceError::new(
            ServiceErrorCause::Unknown,
            "Gemini returned no text",
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MediaType;

    #[test]
    fn test_url_shape() {
        let client = GeminiClient::with_endpoint(
            "k".to_string(),
            "http://localhost:8080/v1beta/".to_string(),
            "test-model".to_string(),
            60,
        );
        assert_eq!(client.url(), "http://localhost:8080/v1beta/models/test-model:generateContent");
        assert_eq!(client.model(), "test-model");
        assert_eq!(client.name(), "Gemini");
    }

    #[test]
    fn test_request_body_shape() {
        let request = GenerativeRequest {
            prompt: "Answer with JSON",
            image: b"abc",
            media_type: MediaType::Jpeg,
        };
        let body = serde_json::to_value(build_request(&request)).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(parts[0]["text"], "Answer with JSON");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[1]["inlineData"]["data"], "YWJj");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let json = r#"{"candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}]}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response_text(response).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_empty_and_blocked_responses() {
        let response: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert_eq!(response_text(response).unwrap_err().cause, ServiceErrorCause::Unknown);

        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert_eq!(
            response_text(response).unwrap_err().cause,
            ServiceErrorCause::MalformedInput
        );
    }
}

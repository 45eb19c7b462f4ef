//! Cloud Vision Client
//!
//! [`VisionService`] implementation over the Cloud Vision `images:annotate`
//! REST endpoint. One request carries every feature of
//! [`VisionFeature::ALL`]; the single response is normalized into an
//! [`AnnotationBundle`].
//!
//! # API Reference
//! - Endpoint: https://vision.googleapis.com/v1/images:annotate
//! - Auth: API key query parameter
//!
//! # Error Mapping
//! HTTP 429 → quota, 401/403 → permission, 400 → malformed input.
//! Per-image errors carry an RPC code: RESOURCE_EXHAUSTED (8) → quota,
//! PERMISSION_DENIED (7) / UNAUTHENTICATED (16) → permission,
//! INVALID_ARGUMENT (3) → malformed input.

use crate::types::{
    Annotation, AnnotationBundle, DominantColor, ImageProperties, ServiceError, ServiceErrorCause,
    VisionRequest, VisionService,
};
use async_trait::async_trait;
use base64::Engine;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use tracing::debug;

/// Cloud Vision annotate endpoint
pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Default request budget per minute
pub const DEFAULT_VISION_RPM: u32 = 600;

/// Maximum results requested for list features
const MAX_RESULTS: u32 = 50;

const USER_AGENT: &str = concat!("docauth/", env!("CARGO_PKG_VERSION"));

/// Cloud Vision client
pub struct CloudVisionClient {
    http_client: Client,
    api_key: String,
    endpoint: String,
    rate_limiter: RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl CloudVisionClient {
    /// Client for the public endpoint with the default request budget
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, DEFAULT_VISION_ENDPOINT.to_string(), DEFAULT_VISION_RPM)
    }

    /// Client for a custom endpoint (proxies, emulators)
    pub fn with_endpoint(api_key: String, endpoint: String, requests_per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
        Self {
            http_client: Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            endpoint,
            rate_limiter: RateLimiter::direct(quota),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl VisionService for CloudVisionClient {
    fn name(&self) -> &'static str {
        "CloudVision"
    }

    async fn annotate(&self, request: &VisionRequest<'_>) -> Result<AnnotationBundle, ServiceError> {
        self.rate_limiter.until_ready().await;

        let body = build_request(request);
        debug!(
            endpoint = %self.endpoint,
            features = request.features.len(),
            "Sending Cloud Vision annotate request"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
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
                ServiceError::new(cause, format!("Cloud Vision request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<HttpErrorEnvelope>(&text)
                .map(|env| env.error.message)
                .unwrap_or(text);
            return Err(ServiceError::new(
                ServiceErrorCause::from_status(status.as_u16(), &message),
                format!("Cloud Vision returned {}: {}", status, message),
            ));
        }

        let parsed: AnnotateResponse = response.json().await.map_err(|e| {
            ServiceError::new(
                ServiceErrorCause::Unknown,
                format!("Failed to parse Cloud Vision response: {}", e),
            )
        })?;

        into_bundle(parsed)
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageRequest {
    image: ImageContent,
    features: Vec<FeatureRequest>,
    image_context: ImageContext,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeatureRequest {
    #[serde(rename = "type")]
    feature_type: &'static str,
    max_results: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext {
    language_hints: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    full_text_annotation: Option<FullTextAnnotation>,
    #[serde(default)]
    logo_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    localized_object_annotations: Vec<LocalizedObject>,
    #[serde(default)]
    label_annotations: Vec<EntityAnnotation>,
    image_properties_annotation: Option<ImagePropertiesAnnotation>,
    error: Option<RpcStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
    #[serde(default)]
    score: f32,
}

#[derive(Debug, Deserialize)]
struct LocalizedObject {
    #[serde(default)]
    name: String,
    #[serde(default)]
    score: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagePropertiesAnnotation {
    dominant_colors: Option<DominantColors>,
}

#[derive(Debug, Deserialize)]
struct DominantColors {
    #[serde(default)]
    colors: Vec<ColorInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColorInfo {
    #[serde(default)]
    color: Color,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    pixel_fraction: f32,
}

#[derive(Debug, Default, Deserialize)]
struct Color {
    #[serde(default)]
    red: f32,
    #[serde(default)]
    green: f32,
    #[serde(default)]
    blue: f32,
}

#[derive(Debug, Deserialize)]
struct RpcStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct HttpErrorEnvelope {
    error: RpcStatus,
}

// ============================================================================
// Conversion
// ============================================================================

fn build_request(request: &VisionRequest<'_>) -> AnnotateRequest {
    let content = base64::engine::general_purpose::STANDARD.encode(request.content);
    AnnotateRequest {
        requests: vec![ImageRequest {
            image: ImageContent { content },
            features: request
                .features
                .iter()
                .map(|f| FeatureRequest {
                    feature_type: f.api_name(),
                    max_results: MAX_RESULTS,
                })
                .collect(),
            image_context: ImageContext {
                language_hints: request.language_hints.to_vec(),
            },
        }],
    }
}

fn into_bundle(response: AnnotateResponse) -> Result<AnnotationBundle, ServiceError> {
    let image = response.responses.into_iter().next().unwrap_or_default();

    if let Some(error) = image.error {
        return Err(ServiceError::new(
            cause_from_rpc_code(error.code, &error.message),
            format!("Cloud Vision error {}: {}", error.code, error.message),
        ));
    }

    Ok(AnnotationBundle {
        full_text: image.full_text_annotation.map(|f| f.text),
        text_annotations: image
            .text_annotations
            .into_iter()
            .map(|t| t.description)
            .collect(),
        logos: image
            .logo_annotations
            .into_iter()
            .map(|a| Annotation::new(a.description, a.score))
            .collect(),
        objects: image
            .localized_object_annotations
            .into_iter()
            .map(|o| Annotation::new(o.name, o.score))
            .collect(),
        labels: image
            .label_annotations
            .into_iter()
            .map(|a| Annotation::new(a.description, a.score))
            .collect(),
        image_properties: ImageProperties {
            dominant_colors: image
                .image_properties_annotation
                .and_then(|p| p.dominant_colors)
                .map(|d| {
                    d.colors
                        .into_iter()
                        .map(|c| DominantColor {
                            red: c.color.red,
                            green: c.color.green,
                            blue: c.color.blue,
                            score: c.score,
                            pixel_fraction: c.pixel_fraction,
                        })
                        .collect()
                })
                .unwrap_or_default(),
        },
    })
}

/// Map a google.rpc status code to an error cause
fn cause_from_rpc_code(code: i32, message: &str) -> ServiceErrorCause {
    match code {
        8 => ServiceErrorCause::Quota,
        7 | 16 => ServiceErrorCause::Permission,
        3 => ServiceErrorCause::MalformedInput,
        _ => ServiceErrorCause::classify(message),
    }
}

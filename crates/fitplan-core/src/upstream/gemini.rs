//! Google Gemini `generateContent` client.
//!
//! Requests JSON output (`responseMimeType: application/json`) and returns the
//! first candidate's text unparsed; schema validation happens in
//! [`crate::plan::schema`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::http_client::shared_client;
use super::{GEMINI_API_KEY_VAR, PlanModel, UpstreamError, join_url, non_blank};

const SERVICE: &str = "gemini";

/// Public API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Model used for plan generation.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
/// Output budget for one weekly plan.
pub const MAX_OUTPUT_TOKENS: u32 = 5000;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
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
struct ApiError {
    message: String,
}

// ============================================================================
// Client
// ============================================================================

/// Gemini plan model.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: Option<String>,
    base_url: String,
    model: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: non_blank(api_key),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            client: shared_client().clone(),
        }
    }

    /// Point the client at a different host (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        join_url(
            &self.base_url,
            &format!("models/{}:generateContent", self.model),
        )
    }

    fn extract_text(response: GenerateResponse) -> Result<String, UpstreamError> {
        if let Some(err) = response.error {
            return Err(UpstreamError::Decode {
                service: SERVICE,
                reason: err.message,
            });
        }
        let text: String = response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(UpstreamError::Decode {
                service: SERVICE,
                reason: "response has no text candidate".to_string(),
            });
        }
        Ok(text)
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

#[async_trait]
impl PlanModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn complete_json(&self, prompt: &str) -> Result<String, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredential {
                service: SERVICE,
                variable: GEMINI_API_KEY_VAR,
            })?;

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        debug!("sending plan request to Gemini");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: SERVICE,
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: SERVICE,
                source,
            })?;

        if !status.is_success() {
            error!(status = %status, body = %body, "Gemini API error");
            return Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Decode {
                service: SERVICE,
                reason: e.to_string(),
            })?;
        Self::extract_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_generation_config() {
        let req = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 5000);
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new(Some("k".into())).with_base_url("http://127.0.0.1:9/");
        assert_eq!(
            client.endpoint(),
            "http://127.0.0.1:9/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn extract_text_joins_parts() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\""},{"text":":1}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(GeminiClient::extract_text(resp).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn extract_text_rejects_empty_candidates() {
        let resp: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(
            GeminiClient::extract_text(resp),
            Err(UpstreamError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = GeminiClient::new(None).with_base_url("http://127.0.0.1:9");
        let err = client.complete_json("prompt").await.unwrap_err();
        assert!(matches!(
            err,
            UpstreamError::MissingCredential {
                variable: "GEMINI_API_KEY",
                ..
            }
        ));
    }

    #[test]
    fn debug_redacts_key() {
        let client = GeminiClient::new(Some("secret-key".into()));
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("[redacted]"));
    }
}

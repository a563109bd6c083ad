//! Stability AI `stable-image/generate/core` client.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::Form;
use serde::Deserialize;
use tracing::{debug, error, instrument};

use super::http_client::shared_client;
use super::{ImageGenerator, STABILITY_API_KEY_VAR, UpstreamError, join_url, non_blank};

const SERVICE: &str = "stability";

pub const DEFAULT_BASE_URL: &str = "https://api.stability.ai";
const GENERATE_PATH: &str = "v2beta/stable-image/generate/core";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    image: Option<String>,
}

/// Stability image generator. Always requests PNG output.
#[derive(Clone)]
pub struct StabilityClient {
    api_key: Option<String>,
    base_url: String,
    client: Client,
}

impl StabilityClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: non_blank(api_key),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: shared_client().clone(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

impl std::fmt::Debug for StabilityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StabilityClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Wrap base64 PNG data in a `data:` URL.
pub fn png_data_url(base64_png: &str) -> String {
    format!("data:image/png;base64,{base64_png}")
}

#[async_trait]
impl ImageGenerator for StabilityClient {
    #[instrument(skip(self, prompt))]
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredential {
                service: SERVICE,
                variable: STABILITY_API_KEY_VAR,
            })?;

        let form = Form::new()
            .text("prompt", prompt.to_string())
            .text("output_format", "png");

        let response = self
            .client
            .post(join_url(&self.base_url, GENERATE_PATH))
            .bearer_auth(api_key)
            .header("Accept", "application/json")
            .multipart(form)
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
            error!(status = %status, body = %body, "Stability image error");
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
        let image = parsed
            .image
            .filter(|s| !s.is_empty())
            .ok_or_else(|| UpstreamError::Decode {
                service: SERVICE,
                reason: "response has no image".to_string(),
            })?;
        debug!(len = image.len(), "received image");
        Ok(png_data_url(&image))
    }
}

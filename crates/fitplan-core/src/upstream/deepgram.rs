//! Deepgram `speak` text-to-speech client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, instrument};

use super::http_client::shared_client;
use super::{DEEPGRAM_API_KEY_VAR, SpeechSynthesizer, UpstreamError, join_url, non_blank};

const SERVICE: &str = "deepgram";

pub const DEFAULT_BASE_URL: &str = "https://api.deepgram.com";
pub const DEFAULT_VOICE: &str = "aura-asteria-en";

#[derive(Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
}

/// Deepgram speech synthesizer.
#[derive(Clone)]
pub struct DeepgramClient {
    api_key: Option<String>,
    base_url: String,
    voice: String,
    client: Client,
}

impl DeepgramClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: non_blank(api_key),
            base_url: DEFAULT_BASE_URL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
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

impl std::fmt::Debug for DeepgramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepgramClient")
            .field("base_url", &self.base_url)
            .field("voice", &self.voice)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

#[async_trait]
impl SpeechSynthesizer for DeepgramClient {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredential {
                service: SERVICE,
                variable: DEEPGRAM_API_KEY_VAR,
            })?;

        let response = self
            .client
            .post(join_url(&self.base_url, "v1/speak"))
            .query(&[("model", self.voice.as_str())])
            .header("Authorization", format!("Token {api_key}"))
            .json(&SpeakRequest { text })
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: SERVICE,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Deepgram TTS error");
            return Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: SERVICE,
                source,
            })?;
        debug!(bytes = bytes.len(), "received narration audio");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = DeepgramClient::new(Some("  ".into())).with_base_url("http://127.0.0.1:9");
        assert!(!client.has_credential());
        let err = client.synthesize("hello there").await.unwrap_err();
        assert!(matches!(
            err,
            UpstreamError::MissingCredential {
                variable: "DEEPGRAM_API_KEY",
                ..
            }
        ));
    }
}

//! Upstream generation services.
//!
//! Each external API sits behind a small trait so the plan service and media
//! cache can be driven by fakes in tests:
//!
//! - [`PlanModel`]: text generation returning the plan JSON ([`GeminiClient`])
//! - [`SpeechSynthesizer`]: text-to-speech audio bytes ([`DeepgramClient`])
//! - [`ImageGenerator`]: prompt-to-image data URL ([`StabilityClient`])
//!
//! Every client takes an optional credential. A missing credential only
//! fails calls to that client.

pub mod deepgram;
pub mod gemini;
pub mod http_client;
pub mod stability;

use async_trait::async_trait;
use thiserror::Error;

pub use deepgram::DeepgramClient;
pub use gemini::GeminiClient;
pub use stability::StabilityClient;

/// Environment variable holding the plan generation credential.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Environment variable holding the speech synthesis credential.
pub const DEEPGRAM_API_KEY_VAR: &str = "DEEPGRAM_API_KEY";
/// Environment variable holding the image generation credential.
pub const STABILITY_API_KEY_VAR: &str = "STABILITY_API_KEY";

/// Errors from calling an upstream API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{service} credential missing (set {variable})")]
    MissingCredential {
        service: &'static str,
        variable: &'static str,
    },

    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned HTTP {status}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} response could not be decoded: {reason}")]
    Decode {
        service: &'static str,
        reason: String,
    },
}

impl UpstreamError {
    pub fn service(&self) -> &'static str {
        match self {
            Self::MissingCredential { service, .. }
            | Self::Transport { service, .. }
            | Self::Status { service, .. }
            | Self::Decode { service, .. } => service,
        }
    }
}

/// A language model that answers a prompt with a JSON document.
#[async_trait]
pub trait PlanModel: Send + Sync {
    /// Model identifier, for logs.
    fn name(&self) -> &str;

    /// Send `prompt` and return the raw response text.
    async fn complete_json(&self, prompt: &str) -> Result<String, UpstreamError>;
}

/// A text-to-speech engine.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and return encoded audio (MPEG) bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, UpstreamError>;
}

/// An image generation engine.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image for `prompt` and return it as a `data:` URL.
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError>;
}

/// Treat blank credentials the same as absent ones.
pub(crate) fn non_blank(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

/// Read a credential from the environment.
pub fn key_from_env(variable: &str) -> Option<String> {
    non_blank(std::env::var(variable).ok())
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

//! Day narration via a [`SpeechSynthesizer`].

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::{AudioAsset, MediaError};
use crate::upstream::SpeechSynthesizer;

pub(crate) const FEATURE: &str = "narration";

/// Shorter text is rejected before reaching the upstream.
pub const MIN_NARRATION_CHARS: usize = 3;

/// Hex SHA-256 of the narration text, used to key cached audio.
pub fn fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Turns narration text into audio.
#[derive(Clone)]
pub struct NarrationService {
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl NarrationService {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self { synthesizer }
    }

    pub async fn synthesize_speech(&self, text: &str) -> Result<AudioAsset, MediaError> {
        let text = text.trim();
        if text.chars().count() < MIN_NARRATION_CHARS {
            return Err(MediaError::tts("Invalid text."));
        }

        let bytes = self.synthesizer.synthesize(text).await.map_err(|e| {
            warn!(error = %e, "narration failed");
            MediaError::from_upstream(FEATURE, e)
        })?;
        if bytes.is_empty() {
            return Err(MediaError::tts("upstream returned no audio"));
        }

        info!(bytes = bytes.len(), "narration ready");
        Ok(AudioAsset::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::UpstreamError;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl SpeechSynthesizer for Echo {
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>, UpstreamError> {
            Ok(text.as_bytes().to_vec())
        }
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let fp = fingerprint("abc");
        assert_eq!(
            fp,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn short_text_is_rejected() {
        let svc = NarrationService::new(Arc::new(Echo));
        for text in ["", "hi", "  a  "] {
            let err = svc.synthesize_speech(text).await.unwrap_err();
            assert!(matches!(err, MediaError::Tts { .. }), "{text:?}");
        }
        assert_eq!(svc.synthesize_speech("hey").await.unwrap().bytes(), b"hey");
    }
}

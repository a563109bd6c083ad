//! Derived media for a plan: narration audio and illustrations.
//!
//! Media is generated on demand, per day or per item, and memoized in a
//! session-scoped [`MediaCache`]. Failures here never affect the plan itself.

pub mod cache;
pub mod illustration;
pub mod narration;
pub mod playback;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fitplan_store::models::{DayKey, EnumParseError};

use crate::upstream::UpstreamError;

pub use cache::{CacheOutcome, EntryState, MediaCache};
pub use illustration::{IllustrationService, enrich_prompt};
pub use narration::{MIN_NARRATION_CHARS, NarrationService, fingerprint};
pub use playback::{NowPlaying, PlaybackEvent, SlotState};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from generating media.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("speech synthesis failed: {reason}")]
    Tts {
        reason: String,
        /// Upstream response body, for diagnostics.
        detail: Option<String>,
    },

    #[error("image generation failed: {reason}")]
    ImageGen {
        reason: String,
        detail: Option<String>,
    },

    #[error("{feature} is not configured (set {variable})")]
    UpstreamConfig {
        feature: &'static str,
        variable: &'static str,
    },
}

impl MediaError {
    pub(crate) fn tts(reason: impl Into<String>) -> Self {
        Self::Tts {
            reason: reason.into(),
            detail: None,
        }
    }

    pub(crate) fn image(reason: impl Into<String>) -> Self {
        Self::ImageGen {
            reason: reason.into(),
            detail: None,
        }
    }

    /// Upstream response body, when the upstream rejected the request.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Tts { detail, .. } | Self::ImageGen { detail, .. } => detail.as_deref(),
            Self::UpstreamConfig { .. } => None,
        }
    }

    fn from_upstream(feature: &'static str, err: UpstreamError) -> Self {
        let (reason, detail) = match err {
            UpstreamError::MissingCredential { variable, .. } => {
                return Self::UpstreamConfig { feature, variable };
            }
            UpstreamError::Status { status, body, .. } => {
                (format!("upstream returned HTTP {status}"), Some(body))
            }
            other => (other.to_string(), None),
        };
        match feature {
            narration::FEATURE => Self::Tts { reason, detail },
            _ => Self::ImageGen { reason, detail },
        }
    }
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// Encoded narration audio (MPEG).
#[derive(Clone, PartialEq, Eq)]
pub struct AudioAsset {
    bytes: Arc<[u8]>,
}

impl AudioAsset {
    pub const MIME_TYPE: &'static str = "audio/mpeg";

    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

impl fmt::Debug for AudioAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AudioAsset({} bytes)", self.bytes.len())
    }
}

/// A generated image, as a `data:` URL.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAsset {
    data_url: String,
}

impl ImageAsset {
    pub fn new(data_url: impl Into<String>) -> Self {
        Self {
            data_url: data_url.into(),
        }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Decode the embedded base64 payload, if the URL is a base64 `data:` URL.
    pub fn decode(&self) -> Option<Vec<u8>> {
        let (_, payload) = self.data_url.split_once(";base64,")?;
        BASE64.decode(payload).ok()
    }
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.data_url.chars().take(32).collect();
        write!(f, "ImageAsset({head}...)")
    }
}

/// Any cached media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaAsset {
    Audio(AudioAsset),
    Image(ImageAsset),
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// What an illustration depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageCategory {
    Exercise,
    Meal,
}

impl ImageCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exercise => "exercise",
            Self::Meal => "meal",
        }
    }
}

impl fmt::Display for ImageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageCategory {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exercise" => Ok(Self::Exercise),
            "meal" => Ok(Self::Meal),
            _ => Err(EnumParseError::new("image category", s)),
        }
    }
}

/// Identity of a cached media entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaKey {
    /// Narration for a day, tied to the exact narration text.
    Narration { day: DayKey, fingerprint: String },
    /// Illustration of one exercise or meal on a day.
    Illustration {
        day: DayKey,
        category: ImageCategory,
        item: String,
    },
}

impl MediaKey {
    pub fn narration(day: DayKey, text: &str) -> Self {
        Self::Narration {
            day,
            fingerprint: fingerprint(text),
        }
    }

    pub fn illustration(day: DayKey, category: ImageCategory, item: &str) -> Self {
        Self::Illustration {
            day,
            category,
            item: item.to_string(),
        }
    }

    pub fn day(&self) -> DayKey {
        match self {
            Self::Narration { day, .. } | Self::Illustration { day, .. } => *day,
        }
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Narration { day, fingerprint } => {
                let short = fingerprint.get(..12).unwrap_or(fingerprint);
                write!(f, "{day}-narration-{short}")
            }
            Self::Illustration {
                day,
                category,
                item,
            } => write!(f, "{day}-{category}-{item}"),
        }
    }
}

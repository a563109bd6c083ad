//! Exercise and meal illustrations via an [`ImageGenerator`].

use std::sync::Arc;

use tracing::{info, warn};

use super::{ImageAsset, ImageCategory, MediaError};
use crate::upstream::ImageGenerator;

pub(crate) const FEATURE: &str = "illustration";

/// Wrap a bare item name in a style prompt for its category.
pub fn enrich_prompt(prompt: &str, category: ImageCategory) -> String {
    match category {
        ImageCategory::Exercise => format!(
            "high quality fitness exercise illustration of {prompt}, clean background, detailed body, HD"
        ),
        ImageCategory::Meal => {
            format!("high quality food photography of {prompt}, top view, natural light, HD")
        }
    }
}

/// Generates illustrations for plan items.
#[derive(Clone)]
pub struct IllustrationService {
    generator: Arc<dyn ImageGenerator>,
}

impl IllustrationService {
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self { generator }
    }

    pub async fn generate_image(
        &self,
        prompt: &str,
        category: ImageCategory,
    ) -> Result<ImageAsset, MediaError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(MediaError::image("Prompt missing"));
        }

        let enriched = enrich_prompt(prompt, category);
        let url = self.generator.generate(&enriched).await.map_err(|e| {
            warn!(error = %e, %category, "illustration failed");
            MediaError::from_upstream(FEATURE, e)
        })?;

        info!(%category, item = %prompt, "illustration ready");
        Ok(ImageAsset::new(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::UpstreamError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageGenerator for Recorder {
        async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("data:image/png;base64,AAAA".to_string())
        }
    }

    #[test]
    fn prompts_are_enriched_per_category() {
        assert_eq!(
            enrich_prompt("Push-up", ImageCategory::Exercise),
            "high quality fitness exercise illustration of Push-up, clean background, detailed body, HD"
        );
        assert_eq!(
            enrich_prompt("Oatmeal", ImageCategory::Meal),
            "high quality food photography of Oatmeal, top view, natural light, HD"
        );
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected_without_upstream_call() {
        let recorder = Arc::new(Recorder::default());
        let svc = IllustrationService::new(recorder.clone());
        let err = svc
            .generate_image("   ", ImageCategory::Meal)
            .await
            .unwrap_err();
        assert_eq!(err, MediaError::image("Prompt missing"));
        assert!(recorder.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn generator_receives_enriched_prompt() {
        let recorder = Arc::new(Recorder::default());
        let svc = IllustrationService::new(recorder.clone());
        let image = svc
            .generate_image("Squat", ImageCategory::Exercise)
            .await
            .unwrap();
        assert_eq!(image.data_url(), "data:image/png;base64,AAAA");
        let prompts = recorder.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("high quality fitness exercise illustration of Squat"));
    }
}

//! `fitplan narrate` and `fitplan illustrate`: media for a saved plan.
//!
//! Media is written to files; a failure for one day or item is reported and
//! the rest still run. A missing credential stops the command at once.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::debug;

use fitplan_core::PlanSession;
use fitplan_core::media::{
    AudioAsset, CacheOutcome, ImageAsset, ImageCategory, MediaAsset, MediaError, MediaKey,
};
use fitplan_store::PlanRepository;
use fitplan_store::models::DayKey;

use crate::config::FitplanConfig;
use crate::resolve::load_saved_plan;

async fn open_session(config: &FitplanConfig, plan: Option<&str>) -> Result<PlanSession> {
    let store: Arc<dyn PlanRepository> = Arc::new(config.open_store());
    let saved = load_saved_plan(store.as_ref(), plan).await?;
    Ok(PlanSession::from_saved(config.services(), store, saved))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create output directory: {}", dir.display()))
}

/// Report one failed item. Configuration errors abort the whole command.
fn report_failure(what: &str, err: MediaError) -> Result<()> {
    if let MediaError::UpstreamConfig { .. } = err {
        return Err(err.into());
    }
    if let Some(detail) = err.detail() {
        debug!(%what, detail, "upstream rejected media request");
    }
    eprintln!("  {what}: {err}");
    Ok(())
}

// -----------------------------------------------------------------------
// fitplan narrate
// -----------------------------------------------------------------------

/// Write narration audio (`<day>.mp3`) for one day or every day of a plan.
pub async fn run_narrate(
    config: &FitplanConfig,
    plan: Option<&str>,
    day: Option<DayKey>,
    out_dir: &Path,
) -> Result<()> {
    let session = open_session(config, plan).await?;
    let days: Vec<DayKey> = match day {
        Some(day) => vec![day],
        None => session
            .plan()
            .map(|p| p.iter().map(|(d, _)| d).collect())
            .unwrap_or_default(),
    };
    ensure_dir(out_dir)?;

    let mut failed = 0;
    for day in days {
        match session.narrate_day(day).await {
            Ok(outcome) => {
                let audio = expect_audio(outcome)?;
                let path = out_dir.join(format!("{day}.mp3"));
                std::fs::write(&path, audio.bytes())
                    .with_context(|| format!("cannot write {}", path.display()))?;
                println!("  {day}: {} bytes -> {}", audio.len(), path.display());
            }
            Err(e) => {
                report_failure(day.as_str(), e)?;
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} day(s) could not be narrated");
    }
    Ok(())
}

fn expect_audio(outcome: CacheOutcome) -> Result<AudioAsset> {
    match outcome.into_asset() {
        Some(MediaAsset::Audio(audio)) => Ok(audio),
        other => bail!("expected narration audio, got {other:?}"),
    }
}

// -----------------------------------------------------------------------
// fitplan illustrate
// -----------------------------------------------------------------------

/// A single item to illustrate instead of the whole day.
pub struct IllustrationTarget {
    pub category: ImageCategory,
    pub item: String,
}

/// Write illustrations (`<day>-<category>-<item>.png`) for one item or for
/// every exercise and meal of `day`.
pub async fn run_illustrate(
    config: &FitplanConfig,
    plan: Option<&str>,
    day: DayKey,
    target: Option<IllustrationTarget>,
    out_dir: &Path,
) -> Result<()> {
    let session = open_session(config, plan).await?;
    if !session.plan().is_some_and(|p| p.day(day).is_some()) {
        bail!("{day} is not in this plan");
    }
    ensure_dir(out_dir)?;

    let results = match target {
        Some(IllustrationTarget { category, item }) => {
            let key = MediaKey::illustration(day, category, &item);
            vec![(key, session.illustrate(day, category, &item).await)]
        }
        None => session.illustrate_day(day).await,
    };

    let mut failed = 0;
    for (key, result) in results {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                report_failure(&key.to_string(), e)?;
                failed += 1;
                continue;
            }
        };
        let Some(MediaAsset::Image(image)) = outcome.into_asset() else {
            bail!("expected an image for {key}");
        };
        let path = out_dir.join(image_file_name(&key));
        write_image(&image, &path)?;
        println!("  {key} -> {}", path.display());
    }

    if failed > 0 {
        bail!("{failed} illustration(s) failed");
    }
    Ok(())
}

fn write_image(image: &ImageAsset, path: &Path) -> Result<()> {
    let Some(bytes) = image.decode() else {
        bail!("upstream image is not a base64 data URL");
    };
    std::fs::write(path, bytes).with_context(|| format!("cannot write {}", path.display()))
}

fn image_file_name(key: &MediaKey) -> String {
    match key {
        MediaKey::Illustration {
            day,
            category,
            item,
        } => format!("{day}-{category}-{}.png", slug(item)),
        MediaKey::Narration { day, .. } => format!("{day}.png"),
    }
}

/// Lowercase ASCII words joined by `-`.
fn slug(text: &str) -> String {
    let words: Vec<String> = text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    if words.is_empty() {
        "item".to_string()
    } else {
        words.join("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_keeps_words_only() {
        assert_eq!(slug("Push-ups (knees)"), "push-ups-knees");
        assert_eq!(slug("  Overnight Oats & Berries "), "overnight-oats-berries");
        assert_eq!(slug("!!!"), "item");
    }

    #[test]
    fn image_names_carry_day_and_category() {
        let key = MediaKey::illustration(DayKey::Day3, ImageCategory::Meal, "Lentil Soup");
        assert_eq!(image_file_name(&key), "day3-meal-lentil-soup.png");
    }

    #[test]
    fn config_errors_abort() {
        let err = MediaError::UpstreamConfig {
            feature: "narration",
            variable: "DEEPGRAM_API_KEY",
        };
        assert!(report_failure("day1", err).is_err());
        let filtered = MediaError::ImageGen {
            reason: "upstream returned HTTP 400".into(),
            detail: Some("filtered".into()),
        };
        assert!(report_failure("day1", filtered).is_ok());
    }

    #[test]
    fn write_image_rejects_non_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.png");
        let err = write_image(&ImageAsset::new("https://example.com/x.png"), &path).unwrap_err();
        assert!(err.to_string().contains("data URL"));
        assert!(!path.exists());
    }
}

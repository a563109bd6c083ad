//! A plan being viewed: the profile, its current plan, and the media and
//! playback state derived from it.
//!
//! A session allows one generation at a time; a second request while one is
//! in flight fails with [`PlanError::Busy`]. Media is cached per session and
//! cleared whenever the plan is replaced. Dropping the session releases the
//! now-playing slot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use fitplan_store::models::{DayKey, SavedPlan, UserProfile, WeekPlan};
use fitplan_store::{PlanRepository, StoreError};

use crate::media::{
    CacheOutcome, IllustrationService, ImageCategory, MediaAsset, MediaCache, MediaError, MediaKey,
    NarrationService, NowPlaying, PlaybackEvent,
};
use crate::plan::{PlanError, PlanService};

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

/// The upstream-backed services a session draws on.
#[derive(Clone)]
pub struct SessionServices {
    pub plans: PlanService,
    pub narration: NarrationService,
    pub illustration: IllustrationService,
}

// ---------------------------------------------------------------------------
// Save indicator
// ---------------------------------------------------------------------------

/// How long `Saved` / `Error` stay visible before reverting to `Idle`.
pub const SAVE_STATUS_RESET: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error,
}

/// Transient save status. `Saved` and `Error` revert to `Idle` on their own.
#[derive(Debug)]
pub struct SaveIndicator {
    inner: Mutex<(SaveStatus, Instant)>,
    reset_after: Duration,
}

impl Default for SaveIndicator {
    fn default() -> Self {
        Self::with_reset_after(SAVE_STATUS_RESET)
    }
}

impl SaveIndicator {
    pub fn with_reset_after(reset_after: Duration) -> Self {
        Self {
            inner: Mutex::new((SaveStatus::Idle, Instant::now())),
            reset_after,
        }
    }

    fn lock(&self) -> MutexGuard<'_, (SaveStatus, Instant)> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn status(&self) -> SaveStatus {
        let (status, since) = *self.lock();
        match status {
            SaveStatus::Saved | SaveStatus::Error if since.elapsed() >= self.reset_after => {
                SaveStatus::Idle
            }
            other => other,
        }
    }

    pub fn set(&self, status: SaveStatus) {
        *self.lock() = (status, Instant::now());
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Errors from saving the session's plan.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("this plan is already saved")]
    AlreadySaved(Uuid),

    #[error("there is no plan to save yet")]
    NoPlan,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where the current plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOrigin {
    /// Freshly generated, not saved yet.
    Generated,
    /// Opened from, or already written to, the plan store.
    Saved(Uuid),
}

#[derive(Debug)]
struct Current {
    plan: Option<WeekPlan>,
    origin: PlanOrigin,
}

/// Interactive state around one profile and its plan.
pub struct PlanSession {
    services: SessionServices,
    store: Arc<dyn PlanRepository>,
    profile: UserProfile,
    current: Mutex<Current>,
    generating: AtomicBool,
    media: MediaCache,
    now_playing: NowPlaying,
    save_indicator: SaveIndicator,
}

impl PlanSession {
    /// A session for a profile with no plan yet.
    pub fn new(
        services: SessionServices,
        store: Arc<dyn PlanRepository>,
        profile: UserProfile,
    ) -> Self {
        Self {
            services,
            store,
            profile,
            current: Mutex::new(Current {
                plan: None,
                origin: PlanOrigin::Generated,
            }),
            generating: AtomicBool::new(false),
            media: MediaCache::new(),
            now_playing: NowPlaying::new(),
            save_indicator: SaveIndicator::default(),
        }
    }

    /// A session viewing a saved plan.
    pub fn from_saved(
        services: SessionServices,
        store: Arc<dyn PlanRepository>,
        saved: SavedPlan,
    ) -> Self {
        let session = Self::new(services, store, saved.user_data);
        *session.lock_current() = Current {
            plan: Some(saved.plan),
            origin: PlanOrigin::Saved(saved.id),
        };
        session
    }

    #[must_use]
    pub fn with_save_indicator(mut self, indicator: SaveIndicator) -> Self {
        self.save_indicator = indicator;
        self
    }

    fn lock_current(&self) -> MutexGuard<'_, Current> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn plan(&self) -> Option<WeekPlan> {
        self.lock_current().plan.clone()
    }

    pub fn origin(&self) -> PlanOrigin {
        self.lock_current().origin
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::SeqCst)
    }

    pub fn media(&self) -> &MediaCache {
        &self.media
    }

    pub fn now_playing(&self) -> &NowPlaying {
        &self.now_playing
    }

    pub fn save_status(&self) -> SaveStatus {
        self.save_indicator.status()
    }

    /// Generate (or regenerate) the plan for this session's profile.
    ///
    /// On failure the previous plan, if any, is kept.
    pub async fn generate(&self) -> Result<WeekPlan, PlanError> {
        if self.generating.swap(true, Ordering::SeqCst) {
            return Err(PlanError::Busy);
        }
        let _busy = BusyGuard(&self.generating);

        let plan = self.services.plans.generate_plan(&self.profile).await?;

        {
            let mut current = self.lock_current();
            current.plan = Some(plan.clone());
            current.origin = PlanOrigin::Generated;
        }
        self.media.clear();
        self.now_playing.release();
        info!(name = %self.profile.name, "plan replaced");
        Ok(plan)
    }

    /// Save the current plan to the store.
    pub async fn save(&self) -> Result<SavedPlan, SaveError> {
        let plan = {
            let current = self.lock_current();
            if let PlanOrigin::Saved(id) = current.origin {
                return Err(SaveError::AlreadySaved(id));
            }
            current.plan.clone().ok_or(SaveError::NoPlan)?
        };

        self.save_indicator.set(SaveStatus::Saving);
        match self.store.save(&self.profile, &plan).await {
            Ok(saved) => {
                self.save_indicator.set(SaveStatus::Saved);
                let mut current = self.lock_current();
                // A regeneration may have replaced the plan while saving.
                if current.plan.as_ref() == Some(&plan) {
                    current.origin = PlanOrigin::Saved(saved.id);
                }
                Ok(saved)
            }
            Err(e) => {
                warn!(error = %e, "failed to save plan");
                self.save_indicator.set(SaveStatus::Error);
                Err(e.into())
            }
        }
    }

    fn day_plan_text(&self, day: DayKey) -> Result<String, MediaError> {
        let current = self.lock_current();
        let day_plan = current
            .plan
            .as_ref()
            .and_then(|p| p.day(day))
            .ok_or_else(|| MediaError::tts(format!("{day} is not in this plan")))?;
        Ok(day_plan.narration_text())
    }

    /// Narration audio for `day`, generated once per narration text.
    pub async fn narrate_day(&self, day: DayKey) -> Result<CacheOutcome, MediaError> {
        let text = self.day_plan_text(day)?;
        let key = MediaKey::narration(day, &text);
        let narration = &self.services.narration;
        self.media
            .get_or_generate(key, || async move {
                narration
                    .synthesize_speech(&text)
                    .await
                    .map(MediaAsset::Audio)
            })
            .await
    }

    /// The listen button: pause the day if it is playing, otherwise make
    /// sure its narration exists and play it. Returns `None` while the
    /// narration is still being generated by another request.
    pub async fn listen(&self, day: DayKey) -> Result<Option<PlaybackEvent>, MediaError> {
        if self.now_playing.is_playing(day) {
            return Ok(Some(self.now_playing.toggle(day)));
        }
        match self.narrate_day(day).await? {
            CacheOutcome::Pending => {
                debug!(%day, "narration still in flight");
                Ok(None)
            }
            _ => Ok(Some(self.now_playing.toggle(day))),
        }
    }

    /// Illustration of one exercise or meal on `day`.
    pub async fn illustrate(
        &self,
        day: DayKey,
        category: ImageCategory,
        item: &str,
    ) -> Result<CacheOutcome, MediaError> {
        let key = MediaKey::illustration(day, category, item);
        let illustration = &self.services.illustration;
        self.media
            .get_or_generate(key, || async move {
                illustration
                    .generate_image(item, category)
                    .await
                    .map(MediaAsset::Image)
            })
            .await
    }

    /// Illustrate every exercise and meal of `day` concurrently. Individual
    /// failures are reported per item and do not stop the others.
    pub async fn illustrate_day(
        &self,
        day: DayKey,
    ) -> Vec<(MediaKey, Result<CacheOutcome, MediaError>)> {
        let items: Vec<(ImageCategory, String)> = {
            let current = self.lock_current();
            let Some(day_plan) = current.plan.as_ref().and_then(|p| p.day(day)) else {
                return Vec::new();
            };
            day_plan
                .exercise_plan
                .iter()
                .map(|e| (ImageCategory::Exercise, e.name.clone()))
                .chain(
                    day_plan
                        .diet_plan
                        .meals()
                        .map(|(_, m)| (ImageCategory::Meal, m.item.clone())),
                )
                .collect()
        };

        let tasks = items.iter().map(|(category, item)| async move {
            let key = MediaKey::illustration(day, *category, item);
            (key, self.illustrate(day, *category, item).await)
        });
        join_all(tasks).await
    }
}

impl Drop for PlanSession {
    fn drop(&mut self) {
        self.now_playing.release();
    }
}

impl std::fmt::Debug for PlanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanSession")
            .field("profile", &self.profile.name)
            .field("origin", &self.origin())
            .field("generating", &self.is_generating())
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight generation flag on every exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

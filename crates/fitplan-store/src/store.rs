//! The saved-plan repository.
//!
//! All saved plans live in one storage slot as a JSON array, most recent
//! first. Every mutation reads the full list, builds the new list in memory
//! and writes it back once, under a mutex so concurrent saves never lose an
//! update. Slot I/O runs on the blocking thread pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{SavedPlan, UserProfile, WeekPlan};
use crate::slot::{SlotError, StorageSlot};

/// Errors returned by plan store mutations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to persist saved plans: {0}")]
    Persistence(#[source] SlotError),

    #[error("failed to read saved plans: {0}")]
    Unreadable(#[source] SlotError),

    #[error("saved plan list is corrupt, refusing to overwrite it: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("failed to encode saved plans: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("storage task failed: {0}")]
    Task(#[source] tokio::task::JoinError),
}

/// Repository interface over the saved plan list.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// All saved plans, most recently saved first. Never fails: missing or
    /// unreadable storage yields an empty list.
    async fn list(&self) -> Vec<SavedPlan>;

    /// Look up a plan by id.
    async fn get(&self, id: Uuid) -> Option<SavedPlan>;

    /// The most recently saved plan.
    async fn latest(&self) -> Option<SavedPlan>;

    /// Save a new plan with a fresh id and the current timestamp.
    async fn save(&self, profile: &UserProfile, plan: &WeekPlan) -> Result<SavedPlan, StoreError>;

    /// Remove a plan. Unknown ids are a no-op. Returns the remaining list.
    async fn delete(&self, id: Uuid) -> Result<Vec<SavedPlan>, StoreError>;
}

/// [`PlanRepository`] backed by a [`StorageSlot`].
pub struct PlanStore<S> {
    slot: Arc<S>,
    write_lock: Mutex<()>,
}

impl<S: StorageSlot + 'static> PlanStore<S> {
    pub fn new(slot: S) -> Self {
        Self {
            slot: Arc::new(slot),
            write_lock: Mutex::new(()),
        }
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Run `f` against the slot on the blocking pool.
    async fn with_slot<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, StoreError> + Send + 'static,
    {
        let slot = Arc::clone(&self.slot);
        tokio::task::spawn_blocking(move || f(&slot))
            .await
            .map_err(StoreError::Task)?
    }

    /// Read the list, treating missing, unreadable, or corrupt storage as empty.
    async fn load_lenient(&self) -> Vec<SavedPlan> {
        match self.with_slot(load_strict::<S>).await {
            Ok(plans) => plans,
            Err(e) => {
                warn!(error = %e, "saved plans unavailable, treating as empty");
                Vec::new()
            }
        }
    }

    fn fresh_id(existing: &[SavedPlan]) -> Uuid {
        loop {
            let id = Uuid::new_v4();
            if existing.iter().all(|p| p.id != id) {
                return id;
            }
        }
    }
}

/// Read the list for a read-modify-write. Corrupt contents are an error
/// so a mutation never silently discards them.
fn load_strict<S: StorageSlot>(slot: &S) -> Result<Vec<SavedPlan>, StoreError> {
    let Some(raw) = slot.read().map_err(StoreError::Unreadable)? else {
        return Ok(Vec::new());
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&raw).map_err(StoreError::Corrupt)
}

fn persist<S: StorageSlot>(slot: &S, plans: &[SavedPlan]) -> Result<(), StoreError> {
    let encoded = serde_json::to_string(plans).map_err(StoreError::Encode)?;
    slot.write(&encoded).map_err(StoreError::Persistence)
}

#[async_trait]
impl<S: StorageSlot + 'static> PlanRepository for PlanStore<S> {
    async fn list(&self) -> Vec<SavedPlan> {
        let _guard = self.write_lock.lock().await;
        self.load_lenient().await
    }

    async fn get(&self, id: Uuid) -> Option<SavedPlan> {
        self.list().await.into_iter().find(|p| p.id == id)
    }

    async fn latest(&self) -> Option<SavedPlan> {
        self.list().await.into_iter().next()
    }

    async fn save(&self, profile: &UserProfile, plan: &WeekPlan) -> Result<SavedPlan, StoreError> {
        let _guard = self.write_lock.lock().await;

        let existing = self.with_slot(load_strict::<S>).await?;
        let saved = SavedPlan {
            id: Self::fresh_id(&existing),
            user_data: profile.clone(),
            plan: plan.clone(),
            generated_at: Utc::now(),
        };

        let mut updated = Vec::with_capacity(existing.len() + 1);
        updated.push(saved.clone());
        updated.extend(existing);
        let total = updated.len();
        self.with_slot(move |slot| persist(slot, &updated)).await?;

        debug!(id = %saved.id, total, "saved plan");
        Ok(saved)
    }

    async fn delete(&self, id: Uuid) -> Result<Vec<SavedPlan>, StoreError> {
        let _guard = self.write_lock.lock().await;

        let existing = self.with_slot(load_strict::<S>).await?;
        let before = existing.len();
        let remaining: Vec<SavedPlan> = existing.into_iter().filter(|p| p.id != id).collect();

        if remaining.len() == before {
            debug!(%id, "delete of unknown plan id is a no-op");
            return Ok(remaining);
        }

        let remaining = self
            .with_slot(move |slot| persist(slot, &remaining).map(|()| remaining))
            .await?;
        debug!(%id, total = remaining.len(), "deleted plan");
        Ok(remaining)
    }
}

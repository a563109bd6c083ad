//! Integration tests for the saved-plan store.
//!
//! Exercises save/get/list/delete/latest against both the file slot and the
//! in-memory slot, including quota failures and corrupt storage.

use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use fitplan_store::models::{DayKey, SavedPlan};
use fitplan_store::{MemorySlot, PlanRepository, PlanStore, SlotError, StorageSlot, StoreError};
use fitplan_test_utils::{sample_profile, sample_week_plan, temp_store};

#[tokio::test]
async fn save_then_get_roundtrips_profile_and_plan() {
    let (store, _dir) = temp_store();
    let profile = sample_profile();
    let plan = sample_week_plan();

    let saved = store.save(&profile, &plan).await.expect("save should succeed");
    let fetched = store.get(saved.id).await.expect("saved plan should be found");

    assert_eq!(fetched.user_data, profile);
    assert_eq!(fetched.plan, plan);
    assert_eq!(fetched.generated_at, saved.generated_at);
}

#[tokio::test]
async fn list_is_most_recent_first() {
    let (store, _dir) = temp_store();
    let profile = sample_profile();
    let plan = sample_week_plan();

    let first = store.save(&profile, &plan).await.unwrap();
    let second = store.save(&profile, &plan).await.unwrap();
    let third = store.save(&profile, &plan).await.unwrap();

    let ids: Vec<Uuid> = store.list().await.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);
    assert_eq!(store.latest().await.map(|p| p.id), Some(third.id));
}

#[tokio::test]
async fn ids_are_unique() {
    let (store, _dir) = temp_store();
    let profile = sample_profile();
    let plan = sample_week_plan();

    for _ in 0..10 {
        store.save(&profile, &plan).await.unwrap();
    }
    let mut ids: Vec<Uuid> = store.list().await.iter().map(|p| p.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}

#[tokio::test]
async fn empty_store_lists_nothing() {
    let (store, _dir) = temp_store();
    assert!(store.list().await.is_empty());
    assert!(store.latest().await.is_none());
    assert!(store.get(Uuid::new_v4()).await.is_none());
}

#[tokio::test]
async fn delete_removes_only_target() {
    let (store, _dir) = temp_store();
    let profile = sample_profile();
    let plan = sample_week_plan();

    let a = store.save(&profile, &plan).await.unwrap();
    let b = store.save(&profile, &plan).await.unwrap();
    let c = store.save(&profile, &plan).await.unwrap();

    let remaining = store.delete(b.id).await.unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|p| p.id != b.id));

    let ids: Vec<Uuid> = store.list().await.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![c.id, a.id]);
}

#[tokio::test]
async fn delete_unknown_id_is_noop() {
    let (store, _dir) = temp_store();
    let profile = sample_profile();
    let plan = sample_week_plan();

    store.save(&profile, &plan).await.unwrap();
    store.save(&profile, &plan).await.unwrap();
    let before = store.list().await;

    let remaining = store.delete(Uuid::new_v4()).await.unwrap();
    assert_eq!(remaining, before);
    assert_eq!(store.list().await, before);
}

#[tokio::test]
async fn quota_failure_leaves_existing_list_intact() {
    let profile = sample_profile();
    let plan = sample_week_plan();

    // Measure one encoded plan to size the quota for exactly one entry.
    let sizing = PlanStore::new(MemorySlot::new());
    sizing.save(&profile, &plan).await.unwrap();
    let one_plan_len = sizing.slot().contents().unwrap().len();

    let slot = MemorySlot::new().with_quota(one_plan_len + 16);
    let store = PlanStore::new(slot.clone());
    let first = store.save(&profile, &plan).await.unwrap();
    let before = slot.contents();

    let err = store.save(&profile, &plan).await.unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)), "got {err:?}");

    assert_eq!(slot.contents(), before);
    let ids: Vec<Uuid> = store.list().await.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![first.id]);
}

#[tokio::test]
async fn corrupt_storage_lists_empty_but_refuses_overwrite() {
    let slot = MemorySlot::with_contents("{not json");
    let store = PlanStore::new(slot.clone());

    assert!(store.list().await.is_empty());

    let err = store
        .save(&sample_profile(), &sample_week_plan())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)), "got {err:?}");
    assert_eq!(slot.contents().as_deref(), Some("{not json"));
}

#[tokio::test]
async fn concurrent_saves_do_not_lose_updates() {
    let store = Arc::new(PlanStore::new(MemorySlot::new()));
    let profile = sample_profile();
    let plan = sample_week_plan();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        let profile = profile.clone();
        let plan = plan.clone();
        handles.push(tokio::spawn(async move {
            store.save(&profile, &plan).await.unwrap()
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    assert_eq!(store.list().await.len(), 8);
}

#[tokio::test]
async fn stored_plan_with_missing_day_still_loads() {
    let profile = sample_profile();
    let mut plan = sample_week_plan();
    plan.days.remove(&DayKey::Day4);

    let slot = MemorySlot::new();
    let store = PlanStore::new(slot.clone());
    let saved = store.save(&profile, &plan).await.unwrap();

    let fetched = store.get(saved.id).await.unwrap();
    assert!(!fetched.plan.is_complete());
    assert_eq!(fetched.plan.missing_days(), vec![DayKey::Day4]);
}

#[tokio::test]
async fn file_format_uses_original_field_names() {
    let (store, dir) = temp_store();
    store
        .save(&sample_profile(), &sample_week_plan())
        .await
        .unwrap();

    let raw = std::fs::read_to_string(dir.path().join("fitnessPlans.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &json[0];
    assert!(entry.get("userData").is_some());
    assert!(entry.get("generatedAt").is_some());
    assert_eq!(entry["userData"]["dietaryPreference"], "vegan");
    assert!(entry["plan"].get("day1").is_some());

    let decoded: Vec<SavedPlan> = serde_json::from_str(&raw).unwrap();
    assert_eq!(decoded.len(), 1);
}

#[tokio::test]
async fn store_is_usable_as_trait_object() {
    let store: Box<dyn PlanRepository> = Box::new(PlanStore::new(MemorySlot::new()));
    let saved = store
        .save(&sample_profile(), &sample_week_plan())
        .await
        .unwrap();
    assert_eq!(store.list().await.len(), 1);
    assert!(store.get(saved.id).await.is_some());
}

#[test]
fn memory_slot_implements_storage_slot() {
    fn assert_slot<S: StorageSlot>(_: &S) {}
    assert_slot(&MemorySlot::new());
}

/// Slot whose reads block the calling thread.
struct SlowSlot {
    inner: MemorySlot,
    delay: Duration,
}

impl StorageSlot for SlowSlot {
    fn read(&self) -> Result<Option<String>, SlotError> {
        std::thread::sleep(self.delay);
        self.inner.read()
    }

    fn write(&self, contents: &str) -> Result<(), SlotError> {
        self.inner.write(contents)
    }
}

#[tokio::test(flavor = "current_thread")]
async fn slow_slot_does_not_stall_the_runtime() {
    let store = PlanStore::new(SlowSlot {
        inner: MemorySlot::new(),
        delay: Duration::from_millis(300),
    });
    let started = Instant::now();

    let (plans, timer_fired_after) = tokio::join!(store.list(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        started.elapsed()
    });

    assert!(plans.is_empty());
    assert!(
        timer_fired_after < Duration::from_millis(200),
        "timer waited {timer_fired_after:?} for the slot read"
    );
}

//! Session-scoped media cache with in-flight deduplication.
//!
//! Each key is either absent, in flight, or ready. A request for a key that
//! is in flight or ready never reaches the upstream again. Failed generations
//! leave the key absent so the user can retry.
//!
//! [`MediaCache::clear`] starts a new epoch. Generations already in flight
//! keep their marker until they finish, but their result is not stored.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::{MediaAsset, MediaError, MediaKey};

/// Cache entry state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
    InFlight,
    Ready(MediaAsset),
}

/// Result of asking the cache for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// This call generated the asset.
    Generated(MediaAsset),
    /// The asset was already cached.
    Cached(MediaAsset),
    /// Another caller is generating it; nothing was done.
    Pending,
}

impl CacheOutcome {
    pub fn asset(&self) -> Option<&MediaAsset> {
        match self {
            Self::Generated(a) | Self::Cached(a) => Some(a),
            Self::Pending => None,
        }
    }

    pub fn into_asset(self) -> Option<MediaAsset> {
        match self {
            Self::Generated(a) | Self::Cached(a) => Some(a),
            Self::Pending => None,
        }
    }
}

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<MediaKey, EntryState>,
    epoch: u64,
}

/// Media memoized for one plan view.
#[derive(Debug, Default)]
pub struct MediaCache {
    entries: Mutex<Entries>,
}

impl MediaCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self, key: &MediaKey) -> Option<EntryState> {
        self.lock().map.get(key).cloned()
    }

    /// The ready asset for `key`, if any.
    pub fn get(&self, key: &MediaKey) -> Option<MediaAsset> {
        match self.lock().map.get(key) {
            Some(EntryState::Ready(asset)) => Some(asset.clone()),
            _ => None,
        }
    }

    pub fn is_in_flight(&self, key: &MediaKey) -> bool {
        matches!(self.lock().map.get(key), Some(EntryState::InFlight))
    }

    /// Number of ready entries.
    pub fn ready_count(&self) -> usize {
        self.lock()
            .map
            .values()
            .filter(|e| matches!(e, EntryState::Ready(_)))
            .count()
    }

    /// Drop every ready entry (used when the plan being viewed changes).
    ///
    /// In-flight markers stay so the same key is never requested twice at
    /// once; their results are discarded when they complete.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.map.retain(|_, e| matches!(e, EntryState::InFlight));
        entries.epoch += 1;
    }

    /// Return the cached asset for `key`, or run `generate` to produce it.
    ///
    /// Only the first caller for an absent key runs `generate`; concurrent
    /// callers get [`CacheOutcome::Pending`]. If the returned future is
    /// dropped before completing, the key reverts to absent.
    pub async fn get_or_generate<F, Fut>(
        &self,
        key: MediaKey,
        generate: F,
    ) -> Result<CacheOutcome, MediaError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<MediaAsset, MediaError>>,
    {
        let epoch = {
            let mut entries = self.lock();
            match entries.map.get(&key) {
                Some(EntryState::Ready(asset)) => {
                    debug!(%key, "media cache hit");
                    return Ok(CacheOutcome::Cached(asset.clone()));
                }
                Some(EntryState::InFlight) => {
                    debug!(%key, "media already in flight");
                    return Ok(CacheOutcome::Pending);
                }
                None => {
                    entries.map.insert(key.clone(), EntryState::InFlight);
                }
            }
            entries.epoch
        };

        let guard = InFlightGuard {
            cache: self,
            key: &key,
            armed: true,
        };
        let result = generate().await;
        guard.disarm();

        let mut entries = self.lock();
        let stale = entries.epoch != epoch;
        match result {
            Ok(asset) if stale => {
                debug!(%key, "media generated for a cleared view; not cached");
                entries.map.remove(&key);
                Ok(CacheOutcome::Generated(asset))
            }
            Ok(asset) => {
                debug!(%key, "media generated");
                entries.map.insert(key, EntryState::Ready(asset.clone()));
                Ok(CacheOutcome::Generated(asset))
            }
            Err(e) => {
                debug!(%key, error = %e, "media generation failed");
                entries.map.remove(&key);
                Err(e)
            }
        }
    }
}

/// Removes an in-flight marker if generation is abandoned mid-way.
struct InFlightGuard<'a> {
    cache: &'a MediaCache,
    key: &'a MediaKey,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut entries = self.cache.lock();
        if matches!(entries.map.get(self.key), Some(EntryState::InFlight)) {
            entries.map.remove(self.key);
        }
    }
}

//! Saved-plan persistence for fitplan.
//!
//! Holds the domain models shared by every crate ([`models`]), the storage
//! slot abstraction ([`slot`]) and the [`PlanStore`] repository built on it.

pub mod config;
pub mod models;
pub mod slot;
pub mod store;

pub use config::StoreConfig;
pub use slot::{FileSlot, MemorySlot, SlotError, StorageSlot};
pub use store::{PlanRepository, PlanStore, StoreError};

/// Open the file-backed store described by `config`.
pub fn open(config: &StoreConfig) -> PlanStore<FileSlot> {
    PlanStore::new(FileSlot::new(config.path.clone()))
}

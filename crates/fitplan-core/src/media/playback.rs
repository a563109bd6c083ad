//! The single now-playing audio slot.
//!
//! Only one day's narration can be loaded at a time. Starting another day
//! stops the current one; toggling the loaded day pauses or resumes it.

use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use fitplan_store::models::DayKey;

/// What the slot currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Idle,
    Playing(DayKey),
    Paused(DayKey),
}

impl SlotState {
    pub fn day(self) -> Option<DayKey> {
        match self {
            Self::Idle => None,
            Self::Playing(d) | Self::Paused(d) => Some(d),
        }
    }
}

/// The transition a toggle caused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started(DayKey),
    Paused(DayKey),
    Resumed(DayKey),
    /// `stopped` was unloaded and `started` began playing.
    Switched { stopped: DayKey, started: DayKey },
}

/// Single-slot audio player state.
#[derive(Debug, Default)]
pub struct NowPlaying {
    state: Mutex<SlotState>,
}

impl NowPlaying {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> SlotState {
        *self.lock()
    }

    pub fn is_playing(&self, day: DayKey) -> bool {
        self.state() == SlotState::Playing(day)
    }

    /// Play, pause or resume `day`.
    pub fn toggle(&self, day: DayKey) -> PlaybackEvent {
        let mut state = self.lock();
        let (next, event) = match *state {
            SlotState::Idle => (SlotState::Playing(day), PlaybackEvent::Started(day)),
            SlotState::Playing(d) if d == day => (SlotState::Paused(day), PlaybackEvent::Paused(day)),
            SlotState::Paused(d) if d == day => {
                (SlotState::Playing(day), PlaybackEvent::Resumed(day))
            }
            SlotState::Playing(d) | SlotState::Paused(d) => (
                SlotState::Playing(day),
                PlaybackEvent::Switched {
                    stopped: d,
                    started: day,
                },
            ),
        };
        *state = next;
        debug!(?event, "now playing");
        event
    }

    /// Playback of `day` reached the end.
    pub fn finished(&self, day: DayKey) {
        let mut state = self.lock();
        if *state == SlotState::Playing(day) {
            *state = SlotState::Idle;
        }
    }

    /// Stop and unload whatever is in the slot. Returns the unloaded day.
    pub fn release(&self) -> Option<DayKey> {
        let mut state = self.lock();
        let day = state.day();
        *state = SlotState::Idle;
        if let Some(day) = day {
            debug!(%day, "released audio slot");
        }
        day
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_same_day_pauses_and_resumes() {
        let slot = NowPlaying::new();
        assert_eq!(slot.toggle(DayKey::Day1), PlaybackEvent::Started(DayKey::Day1));
        assert!(slot.is_playing(DayKey::Day1));
        assert_eq!(slot.toggle(DayKey::Day1), PlaybackEvent::Paused(DayKey::Day1));
        assert_eq!(slot.state(), SlotState::Paused(DayKey::Day1));
        assert_eq!(slot.toggle(DayKey::Day1), PlaybackEvent::Resumed(DayKey::Day1));
    }

    #[test]
    fn starting_another_day_stops_current() {
        let slot = NowPlaying::new();
        slot.toggle(DayKey::Day1);
        assert_eq!(
            slot.toggle(DayKey::Day3),
            PlaybackEvent::Switched {
                stopped: DayKey::Day1,
                started: DayKey::Day3
            }
        );
        assert!(slot.is_playing(DayKey::Day3));
        assert!(!slot.is_playing(DayKey::Day1));
    }

    #[test]
    fn release_frees_slot() {
        let slot = NowPlaying::new();
        assert_eq!(slot.release(), None);
        slot.toggle(DayKey::Day2);
        slot.toggle(DayKey::Day2);
        assert_eq!(slot.release(), Some(DayKey::Day2));
        assert_eq!(slot.state(), SlotState::Idle);
    }

    #[test]
    fn finished_only_clears_matching_day() {
        let slot = NowPlaying::new();
        slot.toggle(DayKey::Day4);
        slot.finished(DayKey::Day5);
        assert!(slot.is_playing(DayKey::Day4));
        slot.finished(DayKey::Day4);
        assert_eq!(slot.state(), SlotState::Idle);
    }
}

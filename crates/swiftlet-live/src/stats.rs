//! Per-session delivery accounting.

use serde::{Deserialize, Serialize};

/// Counters for one live session.
///
/// Every consumption tick is a presentation slot that ends up in exactly
/// one of the two counters: a frame was delivered, or the slot was missed.
/// A missed slot is never made up later; playback cannot rewind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Frames handed to the presentation side, one per non-empty tick.
    pub frames_delivered: u64,
    /// Ticks that found the ready-queue empty.
    pub frames_missed: u64,
}

impl SessionStats {
    /// Total presentation slots so far.
    pub fn total_slots(&self) -> u64 {
        self.frames_delivered + self.frames_missed
    }

    /// Share of slots that delivered a frame, in percent. `0.0` before the
    /// first tick.
    pub fn delivered_pct(&self) -> f64 {
        match self.total_slots() {
            0 => 0.0,
            total => self.frames_delivered as f64 * 100.0 / total as f64,
        }
    }

    /// Share of slots that went empty, in percent. `0.0` before the first
    /// tick.
    pub fn missed_pct(&self) -> f64 {
        match self.total_slots() {
            0 => 0.0,
            total => self.frames_missed as f64 * 100.0 / total as f64,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Progress at which a video counts as "almost watched"
pub const NEAR_COMPLETE_PERCENT: f64 = 90.0;
/// Progress at which a video counts as watched
pub const COMPLETE_PERCENT: f64 = 100.0;
/// How often embedded players are polled for their position
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle of the controller for the current content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerPhase {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Completed,
}

/// What the host UI reads to render the player
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    /// 0..=100
    pub progress_percent: f64,
}

impl PlaybackState {
    /// Move to `position_seconds`, keeping the percent consistent with it
    ///
    /// Positions are clamped into `[0, duration]` once the duration is known.
    pub fn set_position(&mut self, position_seconds: f64) {
        let position = if position_seconds.is_finite() {
            position_seconds.max(0.0)
        } else {
            0.0
        };
        self.position_seconds = if self.duration_seconds > 0.0 {
            position.min(self.duration_seconds)
        } else {
            position
        };
        self.progress_percent = progress_percent(self.position_seconds, self.duration_seconds);
    }

    /// Record the media duration; non-finite or non-positive values mean unknown
    ///
    /// Before the first position arrives the percent is left alone, so a
    /// percent restored from storage stays visible.
    pub fn set_duration(&mut self, duration_seconds: f64) {
        self.duration_seconds = if duration_seconds.is_finite() && duration_seconds > 0.0 {
            duration_seconds
        } else {
            0.0
        };
        if self.position_seconds > 0.0 {
            self.set_position(self.position_seconds);
        }
    }
}

/// `position / duration * 100`, or 0 while the duration is unknown
pub fn progress_percent(position_seconds: f64, duration_seconds: f64) -> f64 {
    if duration_seconds > 0.0 {
        position_seconds / duration_seconds * 100.0
    } else {
        0.0
    }
}

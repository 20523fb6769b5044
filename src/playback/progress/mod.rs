pub mod handle;

use crate::playback::state::{PlaybackState, PlayerPhase};
pub use handle::PlaybackProgressHandle;

/// Updates published by the playback service
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackProgress {
    StateChanged {
        content_id: Option<String>,
        phase: PlayerPhase,
        state: PlaybackState,
    },
    Progress {
        content_id: String,
        percent: f64,
    },
    NearComplete {
        content_id: String,
    },
    Completed {
        content_id: String,
    },
    Error {
        content_id: Option<String>,
        message: String,
    },
}

impl PlaybackProgress {
    /// Content item the update belongs to, if any
    pub fn content_id(&self) -> Option<&str> {
        match self {
            PlaybackProgress::StateChanged { content_id, .. }
            | PlaybackProgress::Error { content_id, .. } => content_id.as_deref(),
            PlaybackProgress::Progress { content_id, .. }
            | PlaybackProgress::NearComplete { content_id }
            | PlaybackProgress::Completed { content_id } => Some(content_id),
        }
    }
}

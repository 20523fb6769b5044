use crate::playback::adapter::{
    AdapterError, AdapterEvent, AdapterEventKind, AdapterEventSink, AdapterFactory, AdapterState,
    PlayerAdapter, TickSource,
};
use crate::playback::progress_store::ProgressStore;
use crate::playback::source::{PlaybackSource, SourceParseError};
use crate::playback::state::{PlaybackState, PlayerPhase, COMPLETE_PERCENT, NEAR_COMPLETE_PERCENT};
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{debug, error, info, warn};

/// Non-fatal playback failures surfaced to the host
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("Failed to initialize player: {0}")]
    AdapterInit(AdapterError),
    #[error("Playback command failed: {0}")]
    PlaybackCommand(AdapterError),
    #[error("{0}")]
    SourceParse(#[from] SourceParseError),
}

/// Host callbacks
pub trait PlaybackListener: Send {
    fn on_progress(&mut self, content_id: &str, percent: f64);
    fn on_near_complete(&mut self, _content_id: &str) {}
    fn on_complete(&mut self, content_id: &str);
    fn on_error(&mut self, error: &PlaybackError);
    fn on_state_changed(&mut self, _phase: PlayerPhase, _state: &PlaybackState) {}
}

/// Commands received while an embedded player is still loading
#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingCommand {
    Play,
    Pause,
    Seek(f64),
}

/// Drives one player at a time and keeps `PlaybackState` in step with it
///
/// Single-threaded: the owner feeds it host commands and the adapter events
/// that arrive on the channel whose sender it was built with. Each `load()`
/// starts a new generation; events from older generations are ignored.
pub struct PlaybackController {
    factory: Box<dyn AdapterFactory>,
    progress_store: Arc<dyn ProgressStore>,
    listener: Box<dyn PlaybackListener>,
    events_tx: tokio_mpsc::UnboundedSender<AdapterEvent>,
    generation: u64,
    adapter: Option<Box<dyn PlayerAdapter>>,
    content_id: Option<String>,
    phase: PlayerPhase,
    state: PlaybackState,
    pending: VecDeque<PendingCommand>,
    near_complete_notified: bool,
    completion_fired: bool,
    /// Play state a seek must end in, enforced once on the next reported state
    seek_intent: Option<bool>,
}

impl PlaybackController {
    pub fn new(
        factory: Box<dyn AdapterFactory>,
        progress_store: Arc<dyn ProgressStore>,
        listener: Box<dyn PlaybackListener>,
        events_tx: tokio_mpsc::UnboundedSender<AdapterEvent>,
    ) -> Self {
        Self {
            factory,
            progress_store,
            listener,
            events_tx,
            generation: 0,
            adapter: None,
            content_id: None,
            phase: PlayerPhase::Idle,
            state: PlaybackState::default(),
            pending: VecDeque::new(),
            near_complete_notified: false,
            completion_fired: false,
            seek_intent: None,
        }
    }

    pub fn phase(&self) -> PlayerPhase {
        self.phase
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }

    /// Classify `url` and load it; unrecognized URLs are played as direct files
    pub fn load_url(&mut self, content_id: impl Into<String>, url: &str) {
        let source = match PlaybackSource::parse(url) {
            Ok(source) => source,
            Err(e) => {
                warn!("{}, falling back to direct file playback", e);
                self.listener.on_error(&PlaybackError::SourceParse(e));
                PlaybackSource::DirectFile {
                    url: url.trim().to_string(),
                }
            }
        };
        self.load(content_id, source);
    }

    /// Switch to a new content item
    pub fn load(&mut self, content_id: impl Into<String>, source: PlaybackSource) {
        let content_id = content_id.into();
        self.release_adapter();
        self.generation += 1;
        self.pending.clear();
        self.state = PlaybackState::default();
        self.near_complete_notified = false;
        self.completion_fired = false;
        self.seek_intent = None;

        // Shown until the first position arrives; thresholds only react to positions
        if let Some(stored) = self.progress_store.read(&content_id) {
            let stored = f64::from(stored.min(100));
            debug!("Restored progress {}% for {}", stored, content_id);
            self.state.progress_percent = stored;
        }

        info!(
            "Loading {} ({:?}), generation {}",
            content_id, source, self.generation
        );
        self.content_id = Some(content_id);
        self.set_phase(PlayerPhase::Loading);

        let sink = AdapterEventSink::new(self.generation, self.events_tx.clone());
        match self.factory.create(&source, sink) {
            Ok(adapter) => {
                let ready = adapter.is_ready();
                let duration = adapter.duration();
                self.adapter = Some(adapter);
                if ready {
                    self.become_ready(duration);
                }
            }
            Err(e) => self.fail_init(e),
        }
    }

    /// Play if paused, pause if playing
    pub fn toggle_play_pause(&mut self) {
        let command = if self.state.is_playing {
            PendingCommand::Pause
        } else {
            PendingCommand::Play
        };

        match self.phase {
            PlayerPhase::Idle => {
                debug!("Ignoring play/pause, no source loaded");
            }
            PlayerPhase::Loading => {
                debug!("Player not ready, queueing {:?}", command);
                self.pending.push_back(command);
                self.state.is_playing = !self.state.is_playing;
                self.notify_state();
            }
            _ => {
                if let Err(e) = self.issue(command) {
                    warn!("Play/pause failed: {}", e);
                    self.listener.on_error(&PlaybackError::PlaybackCommand(e));
                }
            }
        }
    }

    /// Jump to `fraction` (0..=1) of the duration, keeping play/pause as it was
    pub fn seek(&mut self, fraction: f64) {
        if !fraction.is_finite() {
            warn!("Ignoring seek to non-finite fraction {}", fraction);
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);

        match self.phase {
            PlayerPhase::Idle => {
                debug!("Ignoring seek, no source loaded");
            }
            PlayerPhase::Loading => {
                debug!("Player not ready, queueing seek to {}", fraction);
                self.pending.push_back(PendingCommand::Seek(fraction));
            }
            _ => {
                if let Err(e) = self.issue(PendingCommand::Seek(fraction)) {
                    warn!("Seek failed: {}", e);
                    self.listener.on_error(&PlaybackError::PlaybackCommand(e));
                }
            }
        }
    }

    /// Apply a position reported by the adapter of `generation`
    pub fn on_position_tick(&mut self, generation: u64, position_seconds: f64) {
        if !self.is_current(generation) {
            return;
        }
        self.apply_position(position_seconds);
    }

    /// Route one adapter callback
    pub fn handle_event(&mut self, event: AdapterEvent) {
        if !self.is_current(event.generation) {
            return;
        }

        match event.kind {
            AdapterEventKind::Ready { duration_seconds } => {
                if self.phase != PlayerPhase::Loading {
                    debug!("Duplicate ready event for generation {}", event.generation);
                    return;
                }
                if let Some(adapter) = self.adapter.as_mut() {
                    adapter.on_ready();
                }
                self.become_ready(duration_seconds);
            }
            AdapterEventKind::InitFailed(message) => {
                if self.phase == PlayerPhase::Loading {
                    self.fail_init(AdapterError::Unavailable(message));
                } else {
                    warn!("Player reported an error after loading: {}", message);
                    self.listener.on_error(&PlaybackError::PlaybackCommand(
                        AdapterError::Command(message),
                    ));
                }
            }
            AdapterEventKind::DurationChanged(duration_seconds) => {
                self.state.set_duration(duration_seconds);
                self.notify_state();
            }
            AdapterEventKind::TimeUpdate(position_seconds) => {
                self.apply_position(position_seconds);
            }
            AdapterEventKind::PollTick => self.poll(),
            AdapterEventKind::StateChanged(state) => self.reconcile(state),
            AdapterEventKind::Ended => self.complete(),
        }
    }

    /// Release the player. Safe to call any number of times.
    pub fn dispose(&mut self) {
        if self.adapter.is_none() && self.phase == PlayerPhase::Idle {
            return;
        }
        self.release_adapter();
        // Anything still in flight for the released adapter is now stale
        self.generation += 1;
        self.pending.clear();
        self.seek_intent = None;
        self.state.is_playing = false;
        self.set_phase(PlayerPhase::Idle);
    }

    fn is_current(&self, generation: u64) -> bool {
        if generation != self.generation {
            debug!(
                "Ignoring stale callback from generation {} (current {})",
                generation, self.generation
            );
            return false;
        }
        if self.adapter.is_none() {
            debug!("Ignoring callback, no active player");
            return false;
        }
        true
    }

    fn release_adapter(&mut self) {
        if let Some(mut adapter) = self.adapter.take() {
            adapter.destroy();
        }
    }

    fn fail_init(&mut self, e: AdapterError) {
        error!("Failed to initialize player: {}", e);
        self.release_adapter();
        self.pending.clear();
        self.content_id = None;
        self.state = PlaybackState::default();
        self.set_phase(PlayerPhase::Idle);
        self.listener.on_error(&PlaybackError::AdapterInit(e));
    }

    fn become_ready(&mut self, duration_seconds: f64) {
        if duration_seconds > 0.0 {
            self.state.set_duration(duration_seconds);
        }
        // Queued commands flipped `is_playing` optimistically; replay sets it for real
        self.state.is_playing = false;
        self.set_phase(PlayerPhase::Ready);

        let pending: Vec<PendingCommand> = self.pending.drain(..).collect();
        if !pending.is_empty() {
            debug!("Replaying {} queued commands", pending.len());
        }
        for command in pending {
            if let Err(e) = self.issue(command) {
                warn!("Queued {:?} failed: {}", command, e);
                self.listener.on_error(&PlaybackError::PlaybackCommand(e));
            }
        }
    }

    fn issue(&mut self, command: PendingCommand) -> Result<(), AdapterError> {
        let adapter = self.adapter.as_mut().ok_or(AdapterError::Destroyed)?;

        match command {
            PendingCommand::Play => {
                adapter.play()?;
                self.seek_intent = None;
                self.state.is_playing = true;
                self.set_phase(PlayerPhase::Playing);
            }
            PendingCommand::Pause => {
                adapter.pause()?;
                self.seek_intent = None;
                self.state.is_playing = false;
                self.set_phase(PlayerPhase::Paused);
            }
            PendingCommand::Seek(fraction) => {
                let mut duration = self.state.duration_seconds;
                if duration <= 0.0 {
                    duration = adapter.duration();
                    self.state.set_duration(duration);
                }
                if duration <= 0.0 {
                    return Err(AdapterError::Command(
                        "cannot seek before the duration is known".to_string(),
                    ));
                }

                let target = fraction * duration;
                let was_playing = self.state.is_playing;
                adapter.seek_to(target)?;

                // Backends differ on whether seeking resumes playback. Embedded
                // players may only report the change later, so `reconcile`
                // enforces the same intent on the next reported state.
                let now_playing = adapter.state().is_playing();
                if was_playing && !now_playing {
                    adapter.play()?;
                } else if !was_playing && now_playing {
                    adapter.pause()?;
                }
                self.seek_intent = Some(was_playing);

                if self.phase == PlayerPhase::Completed {
                    let phase = if was_playing {
                        PlayerPhase::Playing
                    } else {
                        PlayerPhase::Paused
                    };
                    self.set_phase(phase);
                }
                self.state.set_position(target);
                self.report_position();
            }
        }
        Ok(())
    }

    fn poll(&mut self) {
        let Some(adapter) = self.adapter.as_ref() else {
            return;
        };
        if adapter.tick_source() != TickSource::Poll {
            return;
        }
        if matches!(self.phase, PlayerPhase::Idle | PlayerPhase::Loading) {
            return;
        }

        match adapter.current_time() {
            Ok(position) => self.apply_position(position),
            Err(e) => debug!("Position poll failed: {}", e),
        }
    }

    fn apply_position(&mut self, position_seconds: f64) {
        if let Some(adapter) = self.adapter.as_ref() {
            let duration = adapter.duration();
            if duration > 0.0 && duration != self.state.duration_seconds {
                self.state.set_duration(duration);
            }
        }

        // An idle player reporting the same spot carries no news, and would
        // overwrite restored progress with 0 before playback starts
        if !self.state.is_playing && position_seconds == self.state.position_seconds {
            return;
        }

        self.state.set_position(position_seconds);
        self.report_position();
    }

    /// Report the current position to the host and the store, then check thresholds
    fn report_position(&mut self) {
        let percent = self.state.progress_percent;
        let Some(content_id) = self.content_id.clone() else {
            return;
        };

        self.listener.on_progress(&content_id, percent);
        self.persist(&content_id, percent);
        self.notify_state();

        if percent >= NEAR_COMPLETE_PERCENT && !self.near_complete_notified {
            self.near_complete_notified = true;
            info!("{} is nearly complete ({:.0}%)", content_id, percent);
            self.listener.on_near_complete(&content_id);
        }

        if percent >= COMPLETE_PERCENT {
            self.complete();
        }
    }

    fn reconcile(&mut self, state: AdapterState) {
        if let Some(want_playing) = self.seek_intent {
            if matches!(state, AdapterState::Playing | AdapterState::Paused) {
                self.seek_intent = None;
                if want_playing != state.is_playing() {
                    debug!("Player changed play state across a seek, restoring it");
                    let command = if want_playing {
                        PendingCommand::Play
                    } else {
                        PendingCommand::Pause
                    };
                    if let Err(e) = self.issue(command) {
                        warn!("Restoring play state after seek failed: {}", e);
                        self.listener.on_error(&PlaybackError::PlaybackCommand(e));
                    }
                    return;
                }
            }
        }

        match state {
            AdapterState::Playing => {
                self.state.is_playing = true;
                if self.phase != PlayerPhase::Loading {
                    self.set_phase(PlayerPhase::Playing);
                }
            }
            AdapterState::Paused => {
                self.state.is_playing = false;
                if !matches!(self.phase, PlayerPhase::Loading | PlayerPhase::Completed) {
                    self.set_phase(PlayerPhase::Paused);
                }
            }
            AdapterState::Ended => self.complete(),
            AdapterState::Buffering | AdapterState::Unstarted => {}
        }
    }

    fn complete(&mut self) {
        self.seek_intent = None;
        if self.completion_fired {
            self.state.is_playing = false;
            if self.phase != PlayerPhase::Completed {
                self.set_phase(PlayerPhase::Completed);
            }
            return;
        }
        let Some(content_id) = self.content_id.clone() else {
            return;
        };

        self.completion_fired = true;
        self.near_complete_notified = true;
        self.state.is_playing = false;
        if self.state.duration_seconds > 0.0 {
            self.state.set_position(self.state.duration_seconds);
        } else {
            self.state.progress_percent = COMPLETE_PERCENT;
        }

        info!("{} completed", content_id);
        self.persist(&content_id, COMPLETE_PERCENT);
        self.set_phase(PlayerPhase::Completed);
        self.listener.on_complete(&content_id);
    }

    fn persist(&self, content_id: &str, percent: f64) {
        let percent = percent.round().clamp(0.0, 100.0) as u8;
        self.progress_store.write(content_id, percent);
    }

    fn set_phase(&mut self, phase: PlayerPhase) {
        if self.phase != phase {
            debug!("Player phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
        self.notify_state();
    }

    fn notify_state(&mut self) {
        self.listener.on_state_changed(self.phase, &self.state);
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.release_adapter();
    }
}

use crate::playback::direct::{DirectFileAdapter, MediaElementLoader};
use crate::playback::embedded::{EmbeddedPlayerLoader, EmbeddedStreamAdapter};
use crate::playback::source::PlaybackSource;
use thiserror::Error;
use tokio::sync::mpsc as tokio_mpsc;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error("Player API unavailable: {0}")]
    Unavailable(String),
    #[error("Player is not ready yet")]
    NotReady,
    #[error("Player command failed: {0}")]
    Command(String),
    #[error("Player has been destroyed")]
    Destroyed,
}

/// Playback state as reported by the underlying player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Unstarted,
    Buffering,
    Playing,
    Paused,
    Ended,
}

impl AdapterState {
    pub fn is_playing(&self) -> bool {
        matches!(self, AdapterState::Playing | AdapterState::Buffering)
    }
}

/// How position updates reach the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSource {
    /// Controller reads `current_time()` on every `PollTick`
    Poll,
    /// Player pushes `TimeUpdate` events itself
    Native,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEventKind {
    Ready { duration_seconds: f64 },
    InitFailed(String),
    DurationChanged(f64),
    TimeUpdate(f64),
    PollTick,
    StateChanged(AdapterState),
    Ended,
}

/// Callback from an adapter, stamped with the load generation that created it
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterEvent {
    pub generation: u64,
    pub kind: AdapterEventKind,
}

/// Sending half handed to an adapter (and to the host bridge behind it)
///
/// Every event carries the generation of the `load()` that built the
/// adapter, so the controller can drop callbacks from superseded players.
#[derive(Debug, Clone)]
pub struct AdapterEventSink {
    generation: u64,
    tx: tokio_mpsc::UnboundedSender<AdapterEvent>,
}

impl AdapterEventSink {
    pub fn new(generation: u64, tx: tokio_mpsc::UnboundedSender<AdapterEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns false once the controller side has gone away
    pub fn emit(&self, kind: AdapterEventKind) -> bool {
        self.tx
            .send(AdapterEvent {
                generation: self.generation,
                kind,
            })
            .is_ok()
    }

    pub fn ready(&self, duration_seconds: f64) -> bool {
        self.emit(AdapterEventKind::Ready { duration_seconds })
    }

    pub fn init_failed(&self, message: impl Into<String>) -> bool {
        self.emit(AdapterEventKind::InitFailed(message.into()))
    }

    pub fn duration_changed(&self, duration_seconds: f64) -> bool {
        self.emit(AdapterEventKind::DurationChanged(duration_seconds))
    }

    pub fn time_update(&self, position_seconds: f64) -> bool {
        self.emit(AdapterEventKind::TimeUpdate(position_seconds))
    }

    pub fn poll_tick(&self) -> bool {
        self.emit(AdapterEventKind::PollTick)
    }

    pub fn state_changed(&self, state: AdapterState) -> bool {
        self.emit(AdapterEventKind::StateChanged(state))
    }

    pub fn ended(&self) -> bool {
        self.emit(AdapterEventKind::Ended)
    }
}

/// Common control surface over the embedded and direct-file players
pub trait PlayerAdapter: Send {
    fn play(&mut self) -> Result<(), AdapterError>;
    fn pause(&mut self) -> Result<(), AdapterError>;
    fn seek_to(&mut self, seconds: f64) -> Result<(), AdapterError>;
    fn current_time(&self) -> Result<f64, AdapterError>;
    /// 0 while unknown
    fn duration(&self) -> f64;
    fn state(&self) -> AdapterState;
    /// Whether commands can be issued right away
    fn is_ready(&self) -> bool;
    fn tick_source(&self) -> TickSource;
    /// Called by the controller once the `Ready` event for this adapter arrived
    fn on_ready(&mut self) {}
    /// Stop timers, detach listeners, destroy player instances. Idempotent.
    fn destroy(&mut self);
}

/// Builds the adapter matching a source variant
pub trait AdapterFactory: Send {
    fn create(
        &self,
        source: &PlaybackSource,
        sink: AdapterEventSink,
    ) -> Result<Box<dyn PlayerAdapter>, AdapterError>;
}

/// Factory over the host's two player bridges
pub struct BridgeAdapterFactory {
    embedded_loader: Box<dyn EmbeddedPlayerLoader>,
    media_loader: Box<dyn MediaElementLoader>,
}

impl BridgeAdapterFactory {
    pub fn new(
        embedded_loader: Box<dyn EmbeddedPlayerLoader>,
        media_loader: Box<dyn MediaElementLoader>,
    ) -> Self {
        Self {
            embedded_loader,
            media_loader,
        }
    }
}

impl AdapterFactory for BridgeAdapterFactory {
    fn create(
        &self,
        source: &PlaybackSource,
        sink: AdapterEventSink,
    ) -> Result<Box<dyn PlayerAdapter>, AdapterError> {
        match source {
            PlaybackSource::EmbeddedStream { video_id } => {
                let player = self.embedded_loader.load(video_id, sink.clone())?;
                Ok(Box::new(EmbeddedStreamAdapter::new(player, sink)))
            }
            PlaybackSource::DirectFile { url } => {
                let element = self.media_loader.open(url, sink)?;
                Ok(Box::new(DirectFileAdapter::new(element)))
            }
        }
    }
}

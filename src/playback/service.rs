use crate::playback::adapter::{AdapterEvent, AdapterFactory};
use crate::playback::controller::{PlaybackController, PlaybackError, PlaybackListener};
use crate::playback::progress::{PlaybackProgress, PlaybackProgressHandle};
use crate::playback::progress_store::ProgressStore;
use crate::playback::source::PlaybackSource;
use crate::playback::state::{PlaybackState, PlayerPhase};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{debug, info};

/// Playback commands sent to the service
#[derive(Debug, Clone)]
pub enum PlaybackCommand {
    Load {
        content_id: String,
        source: PlaybackSource,
    },
    LoadUrl {
        content_id: String,
        url: String,
    },
    TogglePlayPause,
    /// Fraction of the duration, 0..=1
    Seek(f64),
    Dispose,
}

/// Handle to the playback service for sending commands
#[derive(Clone)]
pub struct PlaybackHandle {
    command_tx: tokio_mpsc::UnboundedSender<PlaybackCommand>,
    progress_handle: PlaybackProgressHandle,
}

impl PlaybackHandle {
    pub fn load(&self, content_id: impl Into<String>, source: PlaybackSource) {
        let _ = self.command_tx.send(PlaybackCommand::Load {
            content_id: content_id.into(),
            source,
        });
    }

    pub fn load_url(&self, content_id: impl Into<String>, url: impl Into<String>) {
        let _ = self.command_tx.send(PlaybackCommand::LoadUrl {
            content_id: content_id.into(),
            url: url.into(),
        });
    }

    pub fn toggle_play_pause(&self) {
        let _ = self.command_tx.send(PlaybackCommand::TogglePlayPause);
    }

    pub fn seek(&self, fraction: f64) {
        let _ = self.command_tx.send(PlaybackCommand::Seek(fraction));
    }

    pub fn dispose(&self) {
        let _ = self.command_tx.send(PlaybackCommand::Dispose);
    }

    pub fn subscribe_progress(&self) -> tokio_mpsc::UnboundedReceiver<PlaybackProgress> {
        self.progress_handle.subscribe_all()
    }

    pub fn subscribe_content(
        &self,
        content_id: impl Into<String>,
    ) -> tokio_mpsc::UnboundedReceiver<PlaybackProgress> {
        self.progress_handle.subscribe_content(content_id)
    }
}

/// Content item currently driven by the service
type CurrentContent = Arc<Mutex<Option<String>>>;

/// Forwards controller callbacks onto the progress channel
struct ChannelListener {
    progress_tx: tokio_mpsc::UnboundedSender<PlaybackProgress>,
    current: CurrentContent,
}

impl ChannelListener {
    fn publish(&self, progress: PlaybackProgress) {
        let _ = self.progress_tx.send(progress);
    }

    fn current(&self) -> Option<String> {
        self.current.lock().unwrap().clone()
    }
}

impl PlaybackListener for ChannelListener {
    fn on_progress(&mut self, content_id: &str, percent: f64) {
        self.publish(PlaybackProgress::Progress {
            content_id: content_id.to_string(),
            percent,
        });
    }

    fn on_near_complete(&mut self, content_id: &str) {
        self.publish(PlaybackProgress::NearComplete {
            content_id: content_id.to_string(),
        });
    }

    fn on_complete(&mut self, content_id: &str) {
        self.publish(PlaybackProgress::Completed {
            content_id: content_id.to_string(),
        });
    }

    fn on_error(&mut self, error: &PlaybackError) {
        self.publish(PlaybackProgress::Error {
            content_id: self.current(),
            message: error.to_string(),
        });
    }

    fn on_state_changed(&mut self, phase: PlayerPhase, state: &PlaybackState) {
        self.publish(PlaybackProgress::StateChanged {
            content_id: self.current(),
            phase,
            state: *state,
        });
    }
}

/// Runs a `PlaybackController` on one task
///
/// Host commands and adapter callbacks arrive on separate channels and are
/// handled one at a time, so the controller never sees concurrent updates.
pub struct PlaybackService {
    controller: PlaybackController,
    command_rx: tokio_mpsc::UnboundedReceiver<PlaybackCommand>,
    event_rx: tokio_mpsc::UnboundedReceiver<AdapterEvent>,
    current: CurrentContent,
}

impl PlaybackService {
    pub fn start(
        factory: Box<dyn AdapterFactory>,
        progress_store: Arc<dyn ProgressStore>,
        runtime_handle: tokio::runtime::Handle,
    ) -> PlaybackHandle {
        let (command_tx, command_rx) = tokio_mpsc::unbounded_channel();
        let (event_tx, event_rx) = tokio_mpsc::unbounded_channel();
        let (progress_tx, progress_rx) = tokio_mpsc::unbounded_channel();

        let progress_handle = PlaybackProgressHandle::new(progress_rx, runtime_handle.clone());

        let handle = PlaybackHandle {
            command_tx,
            progress_handle,
        };

        let current: CurrentContent = Arc::new(Mutex::new(None));
        let listener = ChannelListener {
            progress_tx,
            current: current.clone(),
        };
        let controller =
            PlaybackController::new(factory, progress_store, Box::new(listener), event_tx);

        let mut service = PlaybackService {
            controller,
            command_rx,
            event_rx,
            current,
        };
        runtime_handle.spawn(async move {
            service.run().await;
        });

        handle
    }

    async fn run(&mut self) {
        info!("PlaybackService started");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => {
                            info!("All playback handles dropped, shutting down");
                            break;
                        }
                    }
                }
                Some(event) = self.event_rx.recv() => {
                    self.controller.handle_event(event);
                }
            }
        }

        self.controller.dispose();
    }

    fn handle_command(&mut self, command: PlaybackCommand) {
        debug!("Playback command: {:?}", command);
        match command {
            PlaybackCommand::Load { content_id, source } => {
                self.set_current(Some(content_id.clone()));
                self.controller.load(content_id, source);
            }
            PlaybackCommand::LoadUrl { content_id, url } => {
                self.set_current(Some(content_id.clone()));
                self.controller.load_url(content_id, &url);
            }
            PlaybackCommand::TogglePlayPause => self.controller.toggle_play_pause(),
            PlaybackCommand::Seek(fraction) => self.controller.seek(fraction),
            PlaybackCommand::Dispose => self.controller.dispose(),
        }
        // A failed init clears the controller's content item
        let current = self.controller.content_id().map(str::to_string);
        self.set_current(current);
    }

    fn set_current(&self, content_id: Option<String>) {
        *self.current.lock().unwrap() = content_id;
    }
}

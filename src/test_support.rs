// Test support utilities for both unit and integration tests

use crate::playback::{
    AdapterError, AdapterEventSink, AdapterFactory, AdapterState, PlaybackError,
    PlaybackListener, PlaybackSource, PlaybackState, PlayerAdapter, PlayerPhase, TickSource,
};
use crate::storage::{MediaStorage, StorageError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock media storage for testing
///
/// Keeps uploads in memory instead of sending them to S3.
#[derive(Default)]
pub struct MockMediaStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockMediaStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl MediaStorage for MockMediaStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<String, StorageError> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        Ok(format!("https://media.test/{}", key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

/// What a fake player does to its play state when seeking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeekBehavior {
    #[default]
    KeepsState,
    /// Like a media element that pauses while seeking
    Pauses,
    /// Like an embedded player that starts playing after a seek
    Plays,
}

#[derive(Debug, Default)]
pub struct FakePlayerState {
    pub time: f64,
    pub duration: f64,
    pub playing: bool,
    pub fail_play: bool,
    pub fail_seek: bool,
    pub seek_behavior: SeekBehavior,
    pub destroyed: usize,
    /// Every command issued, e.g. "play", "pause", "seek 60"
    pub commands: Vec<String>,
    /// Sink handed to the most recently created adapter
    pub sink: Option<AdapterEventSink>,
    pub created: usize,
}

/// Scriptable player shared between a test and the adapters it creates
#[derive(Clone, Default)]
pub struct FakePlayer {
    state: Arc<Mutex<FakePlayerState>>,
}

impl FakePlayer {
    pub fn new(duration: f64) -> Self {
        let player = Self::default();
        player.state.lock().unwrap().duration = duration;
        player
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakePlayerState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn sink(&self) -> Option<AdapterEventSink> {
        self.with(|s| s.sink.clone())
    }

    pub fn commands(&self) -> Vec<String> {
        self.with(|s| s.commands.clone())
    }

    pub fn destroyed(&self) -> usize {
        self.with(|s| s.destroyed)
    }
}

pub struct FakeAdapter {
    player: FakePlayer,
    ready: bool,
    embedded: bool,
}

impl PlayerAdapter for FakeAdapter {
    fn play(&mut self) -> Result<(), AdapterError> {
        self.player.with(|s| {
            s.commands.push("play".to_string());
            if s.fail_play {
                return Err(AdapterError::Command("play blocked".to_string()));
            }
            s.playing = true;
            Ok(())
        })
    }

    fn pause(&mut self) -> Result<(), AdapterError> {
        self.player.with(|s| {
            s.commands.push("pause".to_string());
            s.playing = false;
            Ok(())
        })
    }

    fn seek_to(&mut self, seconds: f64) -> Result<(), AdapterError> {
        self.player.with(|s| {
            s.commands.push(format!("seek {}", seconds));
            if s.fail_seek {
                return Err(AdapterError::Command("seek rejected".to_string()));
            }
            s.time = seconds;
            match s.seek_behavior {
                SeekBehavior::KeepsState => {}
                SeekBehavior::Pauses => s.playing = false,
                SeekBehavior::Plays => s.playing = true,
            }
            Ok(())
        })
    }

    fn current_time(&self) -> Result<f64, AdapterError> {
        Ok(self.player.with(|s| s.time))
    }

    fn duration(&self) -> f64 {
        if self.ready {
            self.player.with(|s| s.duration)
        } else {
            0.0
        }
    }

    fn state(&self) -> AdapterState {
        if self.player.with(|s| s.playing) {
            AdapterState::Playing
        } else {
            AdapterState::Paused
        }
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn tick_source(&self) -> TickSource {
        if self.embedded {
            TickSource::Poll
        } else {
            TickSource::Native
        }
    }

    fn on_ready(&mut self) {
        self.ready = true;
    }

    fn destroy(&mut self) {
        self.player.with(|s| s.destroyed += 1);
    }
}

/// Builds `FakeAdapter`s: direct files are ready at once, embedded streams
/// wait for a `Ready` event sent through `FakePlayer::sink()`
#[derive(Clone, Default)]
pub struct FakeAdapterFactory {
    player: FakePlayer,
    fail_init: Arc<Mutex<bool>>,
}

impl FakeAdapterFactory {
    pub fn new(player: FakePlayer) -> Self {
        Self {
            player,
            fail_init: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set_fail_init(&self, fail: bool) {
        *self.fail_init.lock().unwrap() = fail;
    }
}

impl AdapterFactory for FakeAdapterFactory {
    fn create(
        &self,
        source: &PlaybackSource,
        sink: AdapterEventSink,
    ) -> Result<Box<dyn PlayerAdapter>, AdapterError> {
        self.player.with(|s| s.sink = Some(sink));
        if *self.fail_init.lock().unwrap() {
            return Err(AdapterError::Unavailable(
                "player script failed to load".to_string(),
            ));
        }

        let embedded = source.is_embedded();
        self.player.with(|s| {
            s.created += 1;
            s.time = 0.0;
            s.playing = false;
        });
        Ok(Box::new(FakeAdapter {
            player: self.player.clone(),
            ready: !embedded,
            embedded,
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent {
    Progress(String, f64),
    NearComplete(String),
    Complete(String),
    Error(PlaybackError),
    State(PlayerPhase, PlaybackState),
}

/// Listener that records every callback for later assertions
#[derive(Clone, Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<ListenerEvent>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn completions(&self) -> usize {
        self.count(|e| matches!(e, ListenerEvent::Complete(_)))
    }

    pub fn near_completions(&self) -> usize {
        self.count(|e| matches!(e, ListenerEvent::NearComplete(_)))
    }

    pub fn errors(&self) -> Vec<PlaybackError> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ListenerEvent::Error(error) => Some(error),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ListenerEvent::Progress(_, percent) => Some(percent),
                _ => None,
            })
            .collect()
    }

    fn count(&self, f: impl Fn(&ListenerEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| f(e)).count()
    }

    fn push(&self, event: ListenerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl PlaybackListener for RecordingListener {
    fn on_progress(&mut self, content_id: &str, percent: f64) {
        self.push(ListenerEvent::Progress(content_id.to_string(), percent));
    }

    fn on_near_complete(&mut self, content_id: &str) {
        self.push(ListenerEvent::NearComplete(content_id.to_string()));
    }

    fn on_complete(&mut self, content_id: &str) {
        self.push(ListenerEvent::Complete(content_id.to_string()));
    }

    fn on_error(&mut self, error: &PlaybackError) {
        self.push(ListenerEvent::Error(error.clone()));
    }

    fn on_state_changed(&mut self, phase: PlayerPhase, state: &PlaybackState) {
        self.push(ListenerEvent::State(phase, *state));
    }
}

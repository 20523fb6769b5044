use crate::playback::adapter::{
    AdapterError, AdapterEventSink, AdapterState, PlayerAdapter, TickSource,
};
use crate::playback::state::POLL_INTERVAL;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Player states as numbered by the streaming platform's iframe API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedPlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl EmbeddedPlayerState {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Unstarted),
            0 => Some(Self::Ended),
            1 => Some(Self::Playing),
            2 => Some(Self::Paused),
            3 => Some(Self::Buffering),
            5 => Some(Self::Cued),
            _ => None,
        }
    }
}

impl From<EmbeddedPlayerState> for AdapterState {
    fn from(state: EmbeddedPlayerState) -> Self {
        match state {
            EmbeddedPlayerState::Unstarted | EmbeddedPlayerState::Cued => AdapterState::Unstarted,
            EmbeddedPlayerState::Ended => AdapterState::Ended,
            EmbeddedPlayerState::Playing => AdapterState::Playing,
            EmbeddedPlayerState::Paused => AdapterState::Paused,
            EmbeddedPlayerState::Buffering => AdapterState::Buffering,
        }
    }
}

/// Host bridge to one embedded player instance
///
/// The host forwards the player's `onReady`, `onStateChange` and `onError`
/// callbacks into the sink it was given by the loader.
pub trait EmbeddedPlayerApi: Send {
    fn play_video(&mut self) -> Result<(), AdapterError>;
    fn pause_video(&mut self) -> Result<(), AdapterError>;
    fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool) -> Result<(), AdapterError>;
    fn current_time(&self) -> Result<f64, AdapterError>;
    fn duration(&self) -> f64;
    fn player_state(&self) -> EmbeddedPlayerState;
    fn destroy(&mut self);
}

/// Creates embedded player instances (loads the external player API on first use)
pub trait EmbeddedPlayerLoader: Send {
    fn load(
        &self,
        video_id: &str,
        sink: AdapterEventSink,
    ) -> Result<Box<dyn EmbeddedPlayerApi>, AdapterError>;
}

/// Adapter for videos hosted on the streaming platform
///
/// Not ready until the platform API reports readiness. Position is polled
/// once per `POLL_INTERVAL` after that; the poll task is aborted on `destroy()`.
pub struct EmbeddedStreamAdapter {
    player: Box<dyn EmbeddedPlayerApi>,
    sink: AdapterEventSink,
    ready: bool,
    destroyed: bool,
    poll_interval: Duration,
    poller: Option<JoinHandle<()>>,
}

impl EmbeddedStreamAdapter {
    pub fn new(player: Box<dyn EmbeddedPlayerApi>, sink: AdapterEventSink) -> Self {
        Self {
            player,
            sink,
            ready: false,
            destroyed: false,
            poll_interval: POLL_INTERVAL,
            poller: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    fn check_usable(&self) -> Result<(), AdapterError> {
        if self.destroyed {
            return Err(AdapterError::Destroyed);
        }
        if !self.ready {
            return Err(AdapterError::NotReady);
        }
        Ok(())
    }

    fn start_polling(&mut self) {
        if self.poller.is_some() {
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime available, embedded player position will not be polled");
                return;
            }
        };

        let sink = self.sink.clone();
        let poll_interval = self.poll_interval;
        self.poller = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !sink.poll_tick() {
                    debug!("Playback controller gone, stopping poll timer");
                    break;
                }
            }
        }));
        debug!(
            "Started position polling for generation {}",
            self.sink.generation()
        );
    }
}

impl PlayerAdapter for EmbeddedStreamAdapter {
    fn play(&mut self) -> Result<(), AdapterError> {
        self.check_usable()?;
        self.player.play_video()
    }

    fn pause(&mut self) -> Result<(), AdapterError> {
        self.check_usable()?;
        self.player.pause_video()
    }

    fn seek_to(&mut self, seconds: f64) -> Result<(), AdapterError> {
        self.check_usable()?;
        self.player.seek_to(seconds, true)
    }

    fn current_time(&self) -> Result<f64, AdapterError> {
        self.check_usable()?;
        self.player.current_time()
    }

    fn duration(&self) -> f64 {
        if !self.ready || self.destroyed {
            return 0.0;
        }
        let duration = self.player.duration();
        if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        }
    }

    fn state(&self) -> AdapterState {
        if !self.ready || self.destroyed {
            return AdapterState::Unstarted;
        }
        self.player.player_state().into()
    }

    fn is_ready(&self) -> bool {
        self.ready && !self.destroyed
    }

    fn tick_source(&self) -> TickSource {
        TickSource::Poll
    }

    fn on_ready(&mut self) {
        if self.destroyed {
            return;
        }
        self.ready = true;
        self.start_polling();
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        self.player.destroy();
        debug!(
            "Destroyed embedded player for generation {}",
            self.sink.generation()
        );
    }
}

impl Drop for EmbeddedStreamAdapter {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::adapter::AdapterEventKind;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc as tokio_mpsc;

    #[derive(Default)]
    struct Calls {
        played: usize,
        seeks: Vec<f64>,
        destroyed: usize,
    }

    struct StubPlayer {
        calls: Arc<Mutex<Calls>>,
    }

    impl EmbeddedPlayerApi for StubPlayer {
        fn play_video(&mut self) -> Result<(), AdapterError> {
            self.calls.lock().unwrap().played += 1;
            Ok(())
        }
        fn pause_video(&mut self) -> Result<(), AdapterError> {
            Ok(())
        }
        fn seek_to(&mut self, seconds: f64, _allow_seek_ahead: bool) -> Result<(), AdapterError> {
            self.calls.lock().unwrap().seeks.push(seconds);
            Ok(())
        }
        fn current_time(&self) -> Result<f64, AdapterError> {
            Ok(3.0)
        }
        fn duration(&self) -> f64 {
            240.0
        }
        fn player_state(&self) -> EmbeddedPlayerState {
            EmbeddedPlayerState::Cued
        }
        fn destroy(&mut self) {
            self.calls.lock().unwrap().destroyed += 1;
        }
    }

    fn adapter() -> (
        EmbeddedStreamAdapter,
        Arc<Mutex<Calls>>,
        tokio_mpsc::UnboundedReceiver<crate::playback::adapter::AdapterEvent>,
    ) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let adapter = EmbeddedStreamAdapter::new(
            Box::new(StubPlayer {
                calls: calls.clone(),
            }),
            AdapterEventSink::new(3, tx),
        )
        .with_poll_interval(Duration::from_millis(10));
        (adapter, calls, rx)
    }

    #[test]
    fn test_commands_rejected_before_ready() {
        let (mut adapter, calls, _rx) = adapter();
        assert!(!adapter.is_ready());
        assert_eq!(adapter.play(), Err(AdapterError::NotReady));
        assert_eq!(adapter.duration(), 0.0);
        assert_eq!(calls.lock().unwrap().played, 0);
    }

    #[tokio::test]
    async fn test_polls_after_ready_and_stops_on_destroy() {
        let (mut adapter, calls, mut rx) = adapter();
        adapter.on_ready();
        assert!(adapter.is_polling());

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("poll tick should arrive")
            .unwrap();
        assert_eq!(event.generation, 3);
        assert_eq!(event.kind, AdapterEventKind::PollTick);

        adapter.seek_to(30.0).unwrap();
        assert_eq!(calls.lock().unwrap().seeks, vec![30.0]);

        adapter.destroy();
        adapter.destroy();
        assert!(!adapter.is_polling());
        assert_eq!(calls.lock().unwrap().destroyed, 1);
        assert_eq!(adapter.play(), Err(AdapterError::Destroyed));

        // Drain anything sent before the abort, then expect silence
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_state_codes() {
        assert_eq!(
            EmbeddedPlayerState::from_code(1),
            Some(EmbeddedPlayerState::Playing)
        );
        assert_eq!(EmbeddedPlayerState::from_code(4), None);
        assert_eq!(
            AdapterState::from(EmbeddedPlayerState::Cued),
            AdapterState::Unstarted
        );
    }
}

use crate::playback::adapter::{
    AdapterError, AdapterEventSink, AdapterState, PlayerAdapter, TickSource,
};
use tracing::debug;

/// Host bridge to a native media element
///
/// The host wires the element's `timeupdate`, `loadedmetadata`, `play`,
/// `pause` and `ended` events to the sink it received from the loader and
/// removes those listeners in `detach()`.
pub trait MediaElement: Send {
    fn play(&mut self) -> Result<(), AdapterError>;
    fn pause(&mut self) -> Result<(), AdapterError>;
    fn set_current_time(&mut self, seconds: f64) -> Result<(), AdapterError>;
    fn current_time(&self) -> f64;
    /// NaN until metadata has loaded
    fn duration(&self) -> f64;
    fn paused(&self) -> bool;
    fn ended(&self) -> bool;
    fn detach(&mut self);
}

/// Opens a media element for a URL and attaches its event listeners
pub trait MediaElementLoader: Send {
    fn open(
        &self,
        url: &str,
        sink: AdapterEventSink,
    ) -> Result<Box<dyn MediaElement>, AdapterError>;
}

/// Adapter for videos served as plain files
pub struct DirectFileAdapter {
    element: Box<dyn MediaElement>,
    detached: bool,
}

impl DirectFileAdapter {
    pub fn new(element: Box<dyn MediaElement>) -> Self {
        Self {
            element,
            detached: false,
        }
    }

    fn check_attached(&self) -> Result<(), AdapterError> {
        if self.detached {
            Err(AdapterError::Destroyed)
        } else {
            Ok(())
        }
    }
}

impl PlayerAdapter for DirectFileAdapter {
    fn play(&mut self) -> Result<(), AdapterError> {
        self.check_attached()?;
        self.element.play()
    }

    fn pause(&mut self) -> Result<(), AdapterError> {
        self.check_attached()?;
        self.element.pause()
    }

    fn seek_to(&mut self, seconds: f64) -> Result<(), AdapterError> {
        self.check_attached()?;
        self.element.set_current_time(seconds)
    }

    fn current_time(&self) -> Result<f64, AdapterError> {
        self.check_attached()?;
        Ok(self.element.current_time())
    }

    fn duration(&self) -> f64 {
        let duration = self.element.duration();
        if !self.detached && duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        }
    }

    fn state(&self) -> AdapterState {
        if self.detached {
            AdapterState::Unstarted
        } else if self.element.ended() {
            AdapterState::Ended
        } else if self.element.paused() {
            AdapterState::Paused
        } else {
            AdapterState::Playing
        }
    }

    fn is_ready(&self) -> bool {
        !self.detached
    }

    fn tick_source(&self) -> TickSource {
        TickSource::Native
    }

    fn destroy(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;
        self.element.detach();
        debug!("Detached media element listeners");
    }
}

impl Drop for DirectFileAdapter {
    fn drop(&mut self) {
        self.destroy();
    }
}

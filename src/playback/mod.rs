pub mod adapter;
pub mod controller;
pub mod direct;
pub mod embedded;
pub mod progress;
pub mod progress_store;
pub mod service;
pub mod source;
pub mod state;

pub use adapter::{
    AdapterError, AdapterEvent, AdapterEventKind, AdapterEventSink, AdapterFactory, AdapterState,
    BridgeAdapterFactory, PlayerAdapter, TickSource,
};
pub use controller::{PlaybackController, PlaybackError, PlaybackListener};
pub use progress::{PlaybackProgress, PlaybackProgressHandle};
pub use progress_store::{JsonFileProgressStore, MemoryProgressStore, ProgressStore};
pub use service::{PlaybackHandle, PlaybackService};
pub use source::{PlaybackSource, SourceParseError};
pub use state::{PlaybackState, PlayerPhase};

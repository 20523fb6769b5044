// Library exports for the server binary, player clients and integration tests

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod platform;
pub mod playback;
pub mod storage;

// Test support (only available with test-utils feature)
#[cfg(feature = "test-utils")]
pub mod test_support;

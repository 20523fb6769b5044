mod admin;
mod error;
mod public;

pub use error::ApiError;

use crate::platform::PlatformManager;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use std::path::PathBuf;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// Largest multipart body accepted by the upload route
const MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

/// Shared by every handler
#[derive(Clone)]
pub struct ApiState {
    pub platform: PlatformManager,
}

/// Create the REST API router
///
/// With `media_dir` set, locally stored uploads are served under `/media`.
pub fn create_router(platform: PlatformManager, media_dir: Option<PathBuf>) -> Router {
    let state = ApiState { platform };

    let router = Router::new()
        .route("/api/health", get(public::health))
        .route("/api/auth/login", post(public::login))
        .route("/api/registrations", post(public::register))
        .route("/api/registrations/count", get(public::registration_count))
        .route("/api/registrations/check", get(public::check_registration))
        .route("/api/contact", post(public::contact))
        .route("/api/videos", get(public::list_videos))
        .route("/api/videos/:id/source", get(public::video_source))
        .route(
            "/api/admin/registrations",
            get(admin::list_registrations).post(admin::create_registration),
        )
        .route(
            "/api/admin/registrations/:id",
            patch(admin::update_registration),
        )
        .route(
            "/api/admin/messages",
            get(admin::list_messages).post(admin::create_message),
        )
        .route(
            "/api/admin/messages/:id",
            patch(admin::update_message).delete(admin::delete_message),
        )
        .route(
            "/api/admin/videos",
            get(admin::list_videos).post(admin::create_video),
        )
        .route(
            "/api/admin/videos/:id",
            patch(admin::update_video).delete(admin::delete_video),
        )
        .route("/api/admin/videos/:id/stream", get(admin::stream_video))
        .route("/api/admin/videos/:id/preview", get(admin::preview_video))
        .route(
            "/api/admin/settings",
            get(admin::get_settings).put(admin::update_settings),
        )
        .route("/api/admin/dashboard/stats", get(admin::dashboard_stats))
        .route(
            "/api/upload",
            post(admin::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        );

    let router = match media_dir {
        Some(dir) => router.nest_service("/media", ServeDir::new(dir)),
        None => router,
    };

    router.layer(CorsLayer::permissive()).with_state(state)
}

use crate::api::error::ApiError;
use crate::api::ApiState;
use crate::platform::{ContactRequest, LoginRequest, RegisterRequest};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn login(
    State(state): State<ApiState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let user = state.platform.login(request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "user": user,
    })))
}

pub async fn register(
    State(state): State<ApiState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let registration = state.platform.register(request).await?;
    Ok(Json(json!({
        "message": "Registration successful",
        "user": registration,
    })))
}

pub async fn registration_count(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.platform.seat_count().await?))
}

pub async fn check_registration(
    State(state): State<ApiState>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let email = query
        .email
        .ok_or_else(|| ApiError::BadRequest("Email is required".to_string()))?;
    let is_registered = state.platform.check_registered(&email).await?;
    Ok(Json(json!({ "isRegistered": is_registered })))
}

pub async fn contact(
    State(state): State<ApiState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let message = state.platform.submit_contact(request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Message sent successfully",
        "messageId": message.id,
    })))
}

pub async fn list_videos(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.platform.list_videos().await?))
}

/// How a player should open this video
pub async fn video_source(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let source = state.platform.playback_source(&id).await?;
    debug!("Video {} plays as {:?}", id, source);
    Ok(Json(json!({ "id": id, "source": source })))
}

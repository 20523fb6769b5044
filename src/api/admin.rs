use crate::api::error::ApiError;
use crate::api::ApiState;
use crate::platform::{
    AdminRegistrationRequest, ContactRequest, ReadUpdate, SettingsUpdate, StatusUpdate,
    VideoRequest,
};
use crate::storage::UploadKind;
use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;

// Registrations

pub async fn list_registrations(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.platform.list_registrations().await?))
}

pub async fn create_registration(
    State(state): State<ApiState>,
    payload: Result<Json<AdminRegistrationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let registration = state.platform.create_registration(request).await?;
    Ok(Json(json!({
        "message": "Registration submitted successfully",
        "registrationId": registration.id,
    })))
}

pub async fn update_registration(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(update) = payload?;
    let registration = state.platform.update_registration_status(&id, update).await?;
    Ok(Json(json!({
        "message": "Registration status updated successfully",
        "registration": registration,
    })))
}

// Messages

pub async fn list_messages(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.platform.list_messages().await?))
}

pub async fn create_message(
    State(state): State<ApiState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let message = state.platform.create_message(request).await?;
    Ok(Json(json!({
        "message": "Message sent successfully",
        "messageId": message.id,
    })))
}

pub async fn update_message(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<ReadUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(update) = payload?;
    let message = state.platform.set_message_read(&id, update).await?;
    Ok(Json(json!({
        "message": "Message updated successfully",
        "data": message,
    })))
}

pub async fn delete_message(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.platform.delete_message(&id).await?;
    Ok(Json(json!({ "message": "Message deleted successfully" })))
}

// Videos

pub async fn list_videos(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.platform.list_videos().await?))
}

pub async fn create_video(
    State(state): State<ApiState>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let video = state.platform.create_video(request).await?;
    Ok(Json(json!({
        "message": "Video created successfully",
        "videoId": video.id,
    })))
}

pub async fn update_video(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let video = state.platform.update_video(&id, request).await?;
    Ok(Json(json!({
        "message": "Video updated successfully",
        "video": video,
    })))
}

pub async fn delete_video(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.platform.delete_video(&id).await?;
    Ok(Json(json!({ "message": "Video deleted successfully" })))
}

pub async fn stream_video(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let url = state.platform.stream_url(&id).await?;
    Ok(Json(json!({ "url": url })))
}

pub async fn preview_video(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.platform.preview(&id).await?))
}

// Settings and dashboard

pub async fn get_settings(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.platform.get_settings().await?))
}

pub async fn update_settings(
    State(state): State<ApiState>,
    payload: Result<Json<SettingsUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(update) = payload?;
    let settings = state.platform.update_settings(update).await?;
    Ok(Json(json!({
        "message": "Settings updated successfully",
        "settings": settings,
    })))
}

pub async fn dashboard_stats(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.platform.dashboard_stats().await?))
}

// Uploads

/// Multipart form with `file`, `fileName` and `type` (thumbnail | video)
pub async fn upload(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut kind: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                if file_name.is_none() {
                    file_name = field.file_name().map(str::to_string);
                }
                file = Some(field.bytes().await?.to_vec());
            }
            Some("fileName") => file_name = Some(field.text().await?),
            Some("type") => kind = Some(field.text().await?),
            _ => {}
        }
    }

    let (Some(file), Some(file_name), Some(kind)) = (file, file_name, kind) else {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    };
    let kind = UploadKind::parse(kind.trim()).ok_or_else(|| {
        ApiError::BadRequest("type must be \"thumbnail\" or \"video\"".to_string())
    })?;

    info!("Upload of {} ({} bytes)", file_name, file.len());
    let stored = state.platform.upload_media(kind, &file_name, &file).await?;
    Ok(Json(stored))
}

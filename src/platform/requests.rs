use crate::db::{DbRegistration, SiteSettings};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Public sign-up form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub event_type: Option<String>,
    /// The form sends either a number or a string
    pub attendees: Option<Value>,
    pub password: Option<String>,
    pub special_requirements: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub subscribe: Option<bool>,
}

/// Registration entered from the admin console
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminRegistrationRequest {
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub ticket_type: Option<String>,
    pub event_type: Option<String>,
    pub attendees: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// Create body, or a partial update where every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration: Option<Value>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReadUpdate {
    pub read: Option<bool>,
}

/// Settings edit; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsUpdate {
    pub site_name: Option<String>,
    pub site_description: Option<String>,
    pub contact_email: Option<String>,
    pub maintenance_mode: Option<bool>,
    pub allow_uploads: Option<bool>,
    pub allowed_file_types: Option<String>,
    pub max_file_size: Option<u64>,
    pub allow_registrations: Option<bool>,
    pub enable_comments: Option<bool>,
    pub enable_ratings: Option<bool>,
    pub featured_videos_limit: Option<u32>,
}

impl SettingsUpdate {
    pub(crate) fn apply(self, settings: &mut SiteSettings) {
        if let Some(value) = self.site_name {
            settings.site_name = value;
        }
        if let Some(value) = self.site_description {
            settings.site_description = value;
        }
        if let Some(value) = self.contact_email {
            settings.contact_email = value;
        }
        if let Some(value) = self.maintenance_mode {
            settings.maintenance_mode = value;
        }
        if let Some(value) = self.allow_uploads {
            settings.allow_uploads = value;
        }
        if let Some(value) = self.allowed_file_types {
            settings.allowed_file_types = value;
        }
        if let Some(value) = self.max_file_size {
            settings.max_file_size = value;
        }
        if let Some(value) = self.allow_registrations {
            settings.allow_registrations = value;
        }
        if let Some(value) = self.enable_comments {
            settings.enable_comments = value;
        }
        if let Some(value) = self.enable_ratings {
            settings.enable_ratings = value;
        }
        if let Some(value) = self.featured_videos_limit {
            settings.featured_videos_limit = value;
        }
    }
}

/// Who logged in. Registrations are serialized without their password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub email: String,
    pub role: String,
    pub is_registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<DbRegistration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeatCount {
    pub total: u32,
    pub registered: u32,
    pub remaining: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationStats {
    pub total: i64,
    pub accepted: i64,
    pub pending: i64,
    pub rejected: i64,
    pub today: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageStats {
    pub total: i64,
    pub unread: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoStats {
    pub total: i64,
    pub featured: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub registrations: RegistrationStats,
    pub messages: MessageStats,
    pub videos: VideoStats,
    pub recent_registrations: Vec<DbRegistration>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPreview {
    pub url: String,
    pub title: String,
    pub description: String,
    pub duration: Option<String>,
    pub thumbnail_url: Option<String>,
    pub category: String,
    pub featured: bool,
    pub updated_at: DateTime<Utc>,
}

/// Trimmed, non-empty text or None
pub(crate) fn text(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Numbers and strings alike as text; null, empty and other shapes as None
pub(crate) fn loose_text(value: &Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

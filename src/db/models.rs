use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// String constants for SQL DEFAULT clauses (keep in sync with as_str())
pub(crate) const STATUS_PENDING: &str = "pending";
const STATUS_APPROVED: &str = "approved";
const STATUS_REJECTED: &str = "rejected";

pub(crate) const DEFAULT_TICKET_TYPE: &str = "standard";
pub(crate) const DEFAULT_ROLE: &str = "user";

/// Review state of a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => STATUS_PENDING,
            RegistrationStatus::Approved => STATUS_APPROVED,
            RegistrationStatus::Rejected => STATUS_REJECTED,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            STATUS_PENDING => Some(RegistrationStatus::Pending),
            STATUS_APPROVED => Some(RegistrationStatus::Approved),
            STATUS_REJECTED => Some(RegistrationStatus::Rejected),
            _ => None,
        }
    }
}

/// Event sign-up, either self-service (with a password) or entered by an admin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DbRegistration {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub event_type: Option<String>,
    pub attendees: Option<String>,
    pub special_requirements: String,
    pub dietary_restrictions: String,
    pub subscribe: bool,
    pub organization: Option<String>,
    /// Argon2 PHC string from `auth::hash_password`; never serialized
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub status: RegistrationStatus,
    pub ticket_type: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbRegistration {
    pub fn new(full_name: &str, email: &str, phone: &str) -> Self {
        let now = Utc::now();
        DbRegistration {
            id: Uuid::new_v4().to_string(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            event_type: None,
            attendees: None,
            special_requirements: String::new(),
            dietary_restrictions: String::new(),
            subscribe: false,
            organization: None,
            password_hash: None,
            status: RegistrationStatus::Pending,
            ticket_type: DEFAULT_TICKET_TYPE.to_string(),
            role: DEFAULT_ROLE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Message left through the contact form or by an admin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DbMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbMessage {
    pub fn new(name: &str, email: &str, subject: &str, message: &str) -> Self {
        let now = Utc::now();
        DbMessage {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
            read: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Library entry; `video_url` is either a streaming-platform link or a file URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DbVideo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    /// Free-form, as entered by the admin (e.g. "12:30")
    pub duration: Option<String>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbVideo {
    pub fn new(title: &str, description: &str, category: &str, video_url: &str) -> Self {
        let now = Utc::now();
        DbVideo {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            video_url: video_url.to_string(),
            thumbnail_url: None,
            duration: None,
            featured: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Site-wide settings, stored as a single document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    pub site_name: String,
    pub site_description: String,
    pub contact_email: String,
    pub maintenance_mode: bool,
    pub allow_uploads: bool,
    /// Comma separated extensions
    pub allowed_file_types: String,
    /// Megabytes
    pub max_file_size: u64,
    pub allow_registrations: bool,
    pub enable_comments: bool,
    pub enable_ratings: bool,
    pub featured_videos_limit: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        SiteSettings {
            site_name: "Video Platform".to_string(),
            site_description: "Your video sharing platform".to_string(),
            contact_email: "admin@example.com".to_string(),
            maintenance_mode: false,
            allow_uploads: true,
            allowed_file_types: "mp4,webm,mov,jpg,jpeg,png,webp".to_string(),
            max_file_size: 100,
            allow_registrations: true,
            enable_comments: true,
            enable_ratings: true,
            featured_videos_limit: 6,
            updated_at: None,
        }
    }
}

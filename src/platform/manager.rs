use crate::auth::{hash_password, verify_password, AdminCredentials, AuthError};
use crate::db::{
    Database, DbMessage, DbRegistration, DbVideo, RegistrationStatus, SiteSettings,
};
use crate::playback::PlaybackSource;
use crate::platform::requests::*;
use crate::storage::{MediaStorageManager, StorageError, StoredMedia, UploadKind};
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_TOTAL_SEATS: u32 = 100;
const DEFAULT_SUBJECT: &str = "No Subject";
const RECENT_REGISTRATIONS: i64 = 5;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Validation(String),
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("User already registered")]
    AlreadyRegistered,
    #[error("Registrations are closed")]
    RegistrationClosed,
    #[error("Uploads are disabled")]
    UploadsDisabled,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid status value")]
    InvalidStatus,
}

/// Fail with every missing field named, in the order given
fn require(fields: &[(&'static str, bool)]) -> Result<(), PlatformError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PlatformError::MissingFields(missing))
    }
}

/// Business operations behind the HTTP API
///
/// Handles:
/// - Registrations, seat counting and login
/// - Contact messages
/// - The video library and what players need to play an entry
/// - Site settings, dashboard numbers and media uploads
#[derive(Debug, Clone)]
pub struct PlatformManager {
    database: Database,
    storage: MediaStorageManager,
    admin: Option<AdminCredentials>,
    total_seats: u32,
}

impl PlatformManager {
    pub fn new(database: Database, storage: MediaStorageManager) -> Self {
        PlatformManager {
            database,
            storage,
            admin: None,
            total_seats: DEFAULT_TOTAL_SEATS,
        }
    }

    pub fn with_admin(mut self, admin: Option<AdminCredentials>) -> Self {
        self.admin = admin;
        self
    }

    pub fn with_total_seats(mut self, total_seats: u32) -> Self {
        self.total_seats = total_seats;
        self
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    // Registrations

    /// Self-service sign-up
    pub async fn register(&self, request: RegisterRequest) -> Result<DbRegistration, PlatformError> {
        let attendees = loose_text(&request.attendees);
        require(&[
            ("email", text(&request.email).is_some()),
            ("phone", text(&request.phone).is_some()),
            ("eventType", text(&request.event_type).is_some()),
            ("attendees", attendees.is_some()),
            ("password", request.password.as_deref().is_some_and(|p| !p.is_empty())),
            ("fullName", text(&request.full_name).is_some()),
        ])?;

        if !self.get_settings().await?.allow_registrations {
            return Err(PlatformError::RegistrationClosed);
        }

        let email = text(&request.email).unwrap_or_default();
        if self.database.get_registration_by_email(email).await?.is_some() {
            return Err(PlatformError::AlreadyRegistered);
        }

        let mut registration = DbRegistration::new(
            text(&request.full_name).unwrap_or_default(),
            email,
            text(&request.phone).unwrap_or_default(),
        );
        registration.event_type = text(&request.event_type).map(str::to_string);
        registration.attendees = attendees;
        registration.special_requirements = request.special_requirements.unwrap_or_default();
        registration.dietary_restrictions = request.dietary_restrictions.unwrap_or_default();
        registration.subscribe = request.subscribe.unwrap_or(false);
        registration.password_hash = match request.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        self.database.insert_registration(&registration).await?;
        info!("New registration {} ({})", registration.id, registration.email);
        Ok(registration)
    }

    pub async fn check_registered(&self, email: &str) -> Result<bool, PlatformError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(PlatformError::Validation("Email is required".to_string()));
        }
        Ok(self.database.get_registration_by_email(email).await?.is_some())
    }

    pub async fn seat_count(&self) -> Result<SeatCount, PlatformError> {
        let registered = self.database.count_registrations().await?;
        let registered = u32::try_from(registered.max(0)).unwrap_or(u32::MAX);
        Ok(SeatCount {
            total: self.total_seats,
            registered,
            remaining: self.total_seats.saturating_sub(registered),
        })
    }

    /// Newest first
    pub async fn list_registrations(&self) -> Result<Vec<DbRegistration>, PlatformError> {
        Ok(self.database.get_registrations().await?)
    }

    /// Registration entered by an admin; no password, so it cannot log in
    pub async fn create_registration(
        &self,
        request: AdminRegistrationRequest,
    ) -> Result<DbRegistration, PlatformError> {
        let name = text(&request.name).or(text(&request.full_name));
        require(&[
            ("name", name.is_some()),
            ("email", text(&request.email).is_some()),
            ("phone", text(&request.phone).is_some()),
            ("organization", text(&request.organization).is_some()),
        ])?;

        let email = text(&request.email).unwrap_or_default();
        if self.database.get_registration_by_email(email).await?.is_some() {
            return Err(PlatformError::AlreadyRegistered);
        }

        let mut registration = DbRegistration::new(
            name.unwrap_or_default(),
            email,
            text(&request.phone).unwrap_or_default(),
        );
        registration.organization = text(&request.organization).map(str::to_string);
        registration.event_type = text(&request.event_type).map(str::to_string);
        registration.attendees = loose_text(&request.attendees);
        if let Some(ticket_type) = text(&request.ticket_type) {
            registration.ticket_type = ticket_type.to_string();
        }

        self.database.insert_registration(&registration).await?;
        info!("Admin added registration {}", registration.id);
        Ok(registration)
    }

    pub async fn update_registration_status(
        &self,
        id: &str,
        update: StatusUpdate,
    ) -> Result<DbRegistration, PlatformError> {
        let status = update
            .status
            .as_deref()
            .and_then(RegistrationStatus::parse)
            .ok_or(PlatformError::InvalidStatus)?;

        if !self.database.update_registration_status(id, status).await? {
            return Err(PlatformError::NotFound("Registration"));
        }
        info!("Registration {} is now {}", id, status.as_str());

        self.database
            .get_registration_by_id(id)
            .await?
            .ok_or(PlatformError::NotFound("Registration"))
    }

    // Auth

    /// Admin credentials first, then registered users
    pub async fn login(&self, request: LoginRequest) -> Result<AuthenticatedUser, PlatformError> {
        let (Some(email), Some(password)) = (text(&request.email), request.password.as_deref())
        else {
            return Err(PlatformError::Validation(
                "Email and password are required".to_string(),
            ));
        };
        if password.is_empty() {
            return Err(PlatformError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        if let Some(admin) = &self.admin {
            if admin.matches(email, password) {
                info!("Admin login");
                return Ok(AuthenticatedUser {
                    email: admin.email().to_string(),
                    role: "admin".to_string(),
                    is_registered: true,
                    registration: None,
                });
            }
        }

        let registration = self
            .database
            .get_registration_by_email(email)
            .await?
            .ok_or(PlatformError::InvalidCredentials)?;

        let valid = registration
            .password_hash
            .as_deref()
            .is_some_and(|stored| verify_password(password, stored));
        if !valid {
            warn!("Failed login for {}", email);
            return Err(PlatformError::InvalidCredentials);
        }

        Ok(AuthenticatedUser {
            email: registration.email.clone(),
            role: registration.role.clone(),
            is_registered: true,
            registration: Some(registration),
        })
    }

    // Messages

    /// Public contact form; the subject is optional
    pub async fn submit_contact(&self, request: ContactRequest) -> Result<DbMessage, PlatformError> {
        require(&[
            ("name", text(&request.name).is_some()),
            ("email", text(&request.email).is_some()),
            ("message", text(&request.message).is_some()),
        ])?;
        self.insert_message(&request).await
    }

    /// Message entered from the admin console; the subject is required
    pub async fn create_message(&self, request: ContactRequest) -> Result<DbMessage, PlatformError> {
        require(&[
            ("name", text(&request.name).is_some()),
            ("email", text(&request.email).is_some()),
            ("subject", text(&request.subject).is_some()),
            ("message", text(&request.message).is_some()),
        ])?;
        self.insert_message(&request).await
    }

    async fn insert_message(&self, request: &ContactRequest) -> Result<DbMessage, PlatformError> {
        let message = DbMessage::new(
            text(&request.name).unwrap_or_default(),
            text(&request.email).unwrap_or_default(),
            text(&request.subject).unwrap_or(DEFAULT_SUBJECT),
            text(&request.message).unwrap_or_default(),
        );
        self.database.insert_message(&message).await?;
        info!("New message {} from {}", message.id, message.email);
        Ok(message)
    }

    pub async fn list_messages(&self) -> Result<Vec<DbMessage>, PlatformError> {
        Ok(self.database.get_messages().await?)
    }

    pub async fn set_message_read(
        &self,
        id: &str,
        update: ReadUpdate,
    ) -> Result<DbMessage, PlatformError> {
        let read = update
            .read
            .ok_or_else(|| PlatformError::MissingFields(vec!["read"]))?;
        if !self.database.update_message_read(id, read).await? {
            return Err(PlatformError::NotFound("Message"));
        }
        self.database
            .get_message_by_id(id)
            .await?
            .ok_or(PlatformError::NotFound("Message"))
    }

    pub async fn delete_message(&self, id: &str) -> Result<(), PlatformError> {
        if !self.database.delete_message(id).await? {
            return Err(PlatformError::NotFound("Message"));
        }
        info!("Deleted message {}", id);
        Ok(())
    }

    // Videos

    pub async fn list_videos(&self) -> Result<Vec<DbVideo>, PlatformError> {
        Ok(self.database.get_videos().await?)
    }

    pub async fn get_video(&self, id: &str) -> Result<DbVideo, PlatformError> {
        self.database
            .get_video_by_id(id)
            .await?
            .ok_or(PlatformError::NotFound("Video"))
    }

    pub async fn create_video(&self, request: VideoRequest) -> Result<DbVideo, PlatformError> {
        require(&[
            ("title", text(&request.title).is_some()),
            ("description", text(&request.description).is_some()),
            ("category", text(&request.category).is_some()),
            ("videoUrl", text(&request.video_url).is_some()),
        ])?;

        let mut video = DbVideo::new(
            text(&request.title).unwrap_or_default(),
            text(&request.description).unwrap_or_default(),
            text(&request.category).unwrap_or_default(),
            text(&request.video_url).unwrap_or_default(),
        );
        video.thumbnail_url = text(&request.thumbnail_url).map(str::to_string);
        video.duration = loose_text(&request.duration);
        video.featured = request.featured.unwrap_or(false);

        self.database.insert_video(&video).await?;
        info!("Added video {} ({})", video.id, video.title);
        Ok(video)
    }

    /// Apply the fields present in `request`; empty strings are rejected
    pub async fn update_video(
        &self,
        id: &str,
        request: VideoRequest,
    ) -> Result<DbVideo, PlatformError> {
        let mut video = self.get_video(id).await?;

        let mut blank = Vec::new();
        for (name, value) in [
            ("title", &request.title),
            ("description", &request.description),
            ("category", &request.category),
            ("videoUrl", &request.video_url),
        ] {
            if value.is_some() && text(value).is_none() {
                blank.push(name);
            }
        }
        if !blank.is_empty() {
            return Err(PlatformError::MissingFields(blank));
        }

        if let Some(title) = text(&request.title) {
            video.title = title.to_string();
        }
        if let Some(description) = text(&request.description) {
            video.description = description.to_string();
        }
        if let Some(category) = text(&request.category) {
            video.category = category.to_string();
        }
        if let Some(video_url) = text(&request.video_url) {
            video.video_url = video_url.to_string();
        }
        if request.thumbnail_url.is_some() {
            video.thumbnail_url = text(&request.thumbnail_url).map(str::to_string);
        }
        if request.duration.is_some() {
            video.duration = loose_text(&request.duration);
        }
        if let Some(featured) = request.featured {
            video.featured = featured;
        }
        video.updated_at = Utc::now();

        if !self.database.update_video(&video).await? {
            return Err(PlatformError::NotFound("Video"));
        }
        Ok(video)
    }

    pub async fn delete_video(&self, id: &str) -> Result<(), PlatformError> {
        if !self.database.delete_video(id).await? {
            return Err(PlatformError::NotFound("Video"));
        }
        info!("Deleted video {}", id);
        Ok(())
    }

    pub async fn stream_url(&self, id: &str) -> Result<String, PlatformError> {
        let video = self.get_video(id).await?;
        if video.video_url.trim().is_empty() {
            return Err(PlatformError::NotFound("Video URL"));
        }
        Ok(video.video_url)
    }

    pub async fn preview(&self, id: &str) -> Result<VideoPreview, PlatformError> {
        let video = self.get_video(id).await?;
        if video.video_url.trim().is_empty() {
            return Err(PlatformError::NotFound("Video URL"));
        }
        Ok(VideoPreview {
            url: video.video_url,
            title: video.title,
            description: video.description,
            duration: video.duration,
            thumbnail_url: video.thumbnail_url,
            category: video.category,
            featured: video.featured,
            updated_at: video.updated_at,
        })
    }

    /// Which player a client should build for this video
    pub async fn playback_source(&self, id: &str) -> Result<PlaybackSource, PlatformError> {
        let url = self.stream_url(id).await?;
        Ok(PlaybackSource::detect(&url))
    }

    // Settings

    /// Stored settings, or the defaults before the first save
    pub async fn get_settings(&self) -> Result<SiteSettings, PlatformError> {
        Ok(self.database.get_settings().await?.unwrap_or_default())
    }

    pub async fn update_settings(
        &self,
        update: SettingsUpdate,
    ) -> Result<SiteSettings, PlatformError> {
        if text(&update.site_name).is_none() || text(&update.contact_email).is_none() {
            return Err(PlatformError::Validation(
                "Site name and contact email are required".to_string(),
            ));
        }

        let mut settings = self.get_settings().await?;
        update.apply(&mut settings);
        settings.updated_at = Some(Utc::now());
        self.database.save_settings(&settings).await?;
        info!("Settings updated");
        Ok(settings)
    }

    // Dashboard

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, PlatformError> {
        let midnight = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or_else(Utc::now);

        Ok(DashboardStats {
            registrations: RegistrationStats {
                total: self.database.count_registrations().await?,
                accepted: self
                    .database
                    .count_registrations_by_status(RegistrationStatus::Approved)
                    .await?,
                pending: self
                    .database
                    .count_registrations_by_status(RegistrationStatus::Pending)
                    .await?,
                rejected: self
                    .database
                    .count_registrations_by_status(RegistrationStatus::Rejected)
                    .await?,
                today: self.database.count_registrations_since(&midnight).await?,
            },
            messages: MessageStats {
                total: self.database.count_messages().await?,
                unread: self.database.count_unread_messages().await?,
            },
            videos: VideoStats {
                total: self.database.count_videos().await?,
                featured: self.database.count_featured_videos().await?,
            },
            recent_registrations: self
                .database
                .get_recent_registrations(RECENT_REGISTRATIONS)
                .await?,
        })
    }

    // Uploads

    pub async fn upload_media(
        &self,
        kind: UploadKind,
        file_name: &str,
        data: &[u8],
    ) -> Result<StoredMedia, PlatformError> {
        if file_name.trim().is_empty() || data.is_empty() {
            return Err(PlatformError::Validation("Missing required fields".to_string()));
        }

        let settings = self.get_settings().await?;
        if !settings.allow_uploads {
            return Err(PlatformError::UploadsDisabled);
        }
        let max_bytes = settings.max_file_size.saturating_mul(1024 * 1024);
        if max_bytes > 0 && data.len() as u64 > max_bytes {
            return Err(PlatformError::Validation(format!(
                "File exceeds the {} MB limit",
                settings.max_file_size
            )));
        }

        let stored = self.storage.upload(kind, file_name, data).await?;
        info!("Uploaded {} as {}", file_name, stored.file_id);
        Ok(stored)
    }
}

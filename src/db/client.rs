use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::db::models::*;

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically
fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
}

fn registration_from_row(row: &SqliteRow) -> Result<DbRegistration, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = RegistrationStatus::parse(&status).unwrap_or(RegistrationStatus::Pending);
    Ok(DbRegistration {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        event_type: row.try_get("event_type")?,
        attendees: row.try_get("attendees")?,
        special_requirements: row.try_get("special_requirements")?,
        dietary_restrictions: row.try_get("dietary_restrictions")?,
        subscribe: row.try_get("subscribe")?,
        organization: row.try_get("organization")?,
        password_hash: row.try_get("password_hash")?,
        status,
        ticket_type: row.try_get("ticket_type")?,
        role: row.try_get("role")?,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    })
}

fn message_from_row(row: &SqliteRow) -> Result<DbMessage, sqlx::Error> {
    Ok(DbMessage {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        subject: row.try_get("subject")?,
        message: row.try_get("message")?,
        read: row.try_get("read")?,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    })
}

fn video_from_row(row: &SqliteRow) -> Result<DbVideo, sqlx::Error> {
    Ok(DbVideo {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        video_url: row.try_get("video_url")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        duration: row.try_get("duration")?,
        featured: row.try_get("featured")?,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    })
}

impl Database {
    /// Initialize database connection and create tables
    pub async fn new(database_path: &str) -> Result<Self, sqlx::Error> {
        // Use sqlite:// with ?mode=rwc to create if it doesn't exist
        let database_url = format!("sqlite://{}?mode=rwc", database_path);
        info!("Connecting to {}", database_url);
        let pool = SqlitePool::connect(&database_url).await?;

        let db = Database { pool };
        db.create_tables().await?;
        Ok(db)
    }

    /// Private in-memory database, mostly for tests
    pub async fn new_in_memory() -> Result<Self, sqlx::Error> {
        // Every connection to :memory: is its own database, so keep exactly one
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let db = Database { pool };
        db.create_tables().await?;
        Ok(db)
    }

    /// Create all necessary tables
    async fn create_tables(&self) -> Result<(), sqlx::Error> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS registrations (
                id TEXT PRIMARY KEY,
                full_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                phone TEXT NOT NULL,
                event_type TEXT,
                attendees TEXT,
                special_requirements TEXT NOT NULL DEFAULT '',
                dietary_restrictions TEXT NOT NULL DEFAULT '',
                subscribe BOOLEAN NOT NULL DEFAULT FALSE,
                organization TEXT,
                password_hash TEXT,
                status TEXT NOT NULL DEFAULT '{}',
                ticket_type TEXT NOT NULL DEFAULT '{}',
                role TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            STATUS_PENDING, DEFAULT_TICKET_TYPE, DEFAULT_ROLE
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                subject TEXT NOT NULL,
                message TEXT NOT NULL,
                read BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS videos (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                video_url TEXT NOT NULL,
                thumbnail_url TEXT,
                duration TEXT,
                featured BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Single row holding the settings document as JSON
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_registrations_created_at ON registrations (created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages (created_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_videos_created_at ON videos (created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // Registrations

    pub async fn insert_registration(
        &self,
        registration: &DbRegistration,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO registrations (
                id, full_name, email, phone, event_type, attendees,
                special_requirements, dietary_restrictions, subscribe,
                organization, password_hash, status, ticket_type, role,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&registration.id)
        .bind(&registration.full_name)
        .bind(&registration.email)
        .bind(&registration.phone)
        .bind(&registration.event_type)
        .bind(&registration.attendees)
        .bind(&registration.special_requirements)
        .bind(&registration.dietary_restrictions)
        .bind(registration.subscribe)
        .bind(&registration.organization)
        .bind(&registration.password_hash)
        .bind(registration.status.as_str())
        .bind(&registration.ticket_type)
        .bind(&registration.role)
        .bind(timestamp(&registration.created_at))
        .bind(timestamp(&registration.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_registration_by_id(
        &self,
        id: &str,
    ) -> Result<Option<DbRegistration>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM registrations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(registration_from_row).transpose()
    }

    pub async fn get_registration_by_email(
        &self,
        email: &str,
    ) -> Result<Option<DbRegistration>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM registrations WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(registration_from_row).transpose()
    }

    /// All registrations, newest first
    pub async fn get_registrations(&self) -> Result<Vec<DbRegistration>, sqlx::Error> {
        self.get_recent_registrations(-1).await
    }

    /// Newest `limit` registrations (negative for all)
    pub async fn get_recent_registrations(
        &self,
        limit: i64,
    ) -> Result<Vec<DbRegistration>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT * FROM registrations ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(registration_from_row).collect()
    }

    /// Returns false when no registration has this id
    pub async fn update_registration_status(
        &self,
        id: &str,
        status: RegistrationStatus,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE registrations SET status = ?, updated_at = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(timestamp(&Utc::now()))
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_registrations(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM registrations")
            .fetch_one(&self.pool)
            .await?;
        row.try_get("count")
    }

    pub async fn count_registrations_by_status(
        &self,
        status: RegistrationStatus,
    ) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM registrations WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        row.try_get("count")
    }

    pub async fn count_registrations_since(
        &self,
        since: &DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM registrations WHERE created_at >= ?")
            .bind(timestamp(since))
            .fetch_one(&self.pool)
            .await?;
        row.try_get("count")
    }

    // Messages

    pub async fn insert_message(&self, message: &DbMessage) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO messages (
                id, name, email, subject, message, read, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.subject)
        .bind(&message.message)
        .bind(message.read)
        .bind(timestamp(&message.created_at))
        .bind(timestamp(&message.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All messages, newest first
    pub async fn get_messages(&self) -> Result<Vec<DbMessage>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM messages ORDER BY created_at DESC, rowid DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(message_from_row).collect()
    }

    pub async fn get_message_by_id(&self, id: &str) -> Result<Option<DbMessage>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(message_from_row).transpose()
    }

    pub async fn update_message_read(&self, id: &str, read: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE messages SET read = ?, updated_at = ? WHERE id = ?")
            .bind(read)
            .bind(timestamp(&Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_message(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_messages(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM messages")
            .fetch_one(&self.pool)
            .await?;
        row.try_get("count")
    }

    pub async fn count_unread_messages(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM messages WHERE read = FALSE")
            .fetch_one(&self.pool)
            .await?;
        row.try_get("count")
    }

    // Videos

    pub async fn insert_video(&self, video: &DbVideo) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO videos (
                id, title, description, category, video_url, thumbnail_url,
                duration, featured, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&video.id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.category)
        .bind(&video.video_url)
        .bind(&video.thumbnail_url)
        .bind(&video.duration)
        .bind(video.featured)
        .bind(timestamp(&video.created_at))
        .bind(timestamp(&video.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All videos, newest first
    pub async fn get_videos(&self) -> Result<Vec<DbVideo>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM videos ORDER BY created_at DESC, rowid DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(video_from_row).collect()
    }

    pub async fn get_video_by_id(&self, id: &str) -> Result<Option<DbVideo>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM videos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(video_from_row).transpose()
    }

    /// Overwrite every editable column; returns false for an unknown id
    pub async fn update_video(&self, video: &DbVideo) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE videos SET
                title = ?, description = ?, category = ?, video_url = ?,
                thumbnail_url = ?, duration = ?, featured = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.category)
        .bind(&video.video_url)
        .bind(&video.thumbnail_url)
        .bind(&video.duration)
        .bind(video.featured)
        .bind(timestamp(&video.updated_at))
        .bind(&video.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_video(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_videos(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM videos")
            .fetch_one(&self.pool)
            .await?;
        row.try_get("count")
    }

    pub async fn count_featured_videos(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM videos WHERE featured = TRUE")
            .fetch_one(&self.pool)
            .await?;
        row.try_get("count")
    }

    // Settings

    /// Stored settings, or None before the first save
    pub async fn get_settings(&self) -> Result<Option<SiteSettings>, sqlx::Error> {
        let row = sqlx::query("SELECT data FROM settings WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let data: String = row.try_get("data")?;
                let settings =
                    serde_json::from_str(&data).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
                Ok(Some(settings))
            }
            None => Ok(None),
        }
    }

    pub async fn save_settings(&self, settings: &SiteSettings) -> Result<(), sqlx::Error> {
        let data = serde_json::to_string(settings).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let updated_at = settings.updated_at.unwrap_or_else(Utc::now);

        sqlx::query(
            r#"
            INSERT INTO settings (id, data, updated_at) VALUES (1, ?, ?)
            ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
            "#,
        )
        .bind(data)
        .bind(timestamp(&updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_registrations_newest_first() {
        let db = Database::new_in_memory().await.unwrap();

        let mut older = DbRegistration::new("Ada", "ada@example.com", "555-0100");
        older.created_at = Utc::now() - Duration::hours(2);
        let newer = DbRegistration::new("Grace", "grace@example.com", "555-0101");

        db.insert_registration(&older).await.unwrap();
        db.insert_registration(&newer).await.unwrap();

        let all = db.get_registrations().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].email, "grace@example.com");

        let recent = db.get_recent_registrations(1).await.unwrap();
        assert_eq!(recent.len(), 1);

        let since = Utc::now() - Duration::hours(1);
        assert_eq!(db.count_registrations_since(&since).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_violates_constraint() {
        let db = Database::new_in_memory().await.unwrap();
        db.insert_registration(&DbRegistration::new("A", "same@example.com", "1"))
            .await
            .unwrap();
        let duplicate = DbRegistration::new("B", "same@example.com", "2");
        assert!(db.insert_registration(&duplicate).await.is_err());
    }

    #[tokio::test]
    async fn test_status_update_reports_missing_rows() {
        let db = Database::new_in_memory().await.unwrap();
        let registration = DbRegistration::new("Ada", "ada@example.com", "555-0100");
        db.insert_registration(&registration).await.unwrap();

        assert!(db
            .update_registration_status(&registration.id, RegistrationStatus::Approved)
            .await
            .unwrap());
        assert!(!db
            .update_registration_status("missing", RegistrationStatus::Approved)
            .await
            .unwrap());
        assert_eq!(
            db.count_registrations_by_status(RegistrationStatus::Approved)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_settings_upsert() {
        let db = Database::new_in_memory().await.unwrap();
        assert_eq!(db.get_settings().await.unwrap(), None);

        let mut settings = SiteSettings::default();
        db.save_settings(&settings).await.unwrap();
        settings.site_name = "Lecture Hall".to_string();
        db.save_settings(&settings).await.unwrap();

        let stored = db.get_settings().await.unwrap().unwrap();
        assert_eq!(stored.site_name, "Lecture Hall");
    }
}

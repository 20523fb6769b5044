#![cfg(feature = "test-utils")]

mod support;
use serde_json::json;

use crate::support::PlatformFixture;
use lectern::db::RegistrationStatus;
use lectern::platform::{
    LoginRequest, PlatformError, RegisterRequest, SettingsUpdate, StatusUpdate, VideoRequest,
};
use lectern::storage::UploadKind;

fn sign_up(email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        full_name: Some("Ada Lovelace".to_string()),
        email: Some(email.to_string()),
        phone: Some("555-0101".to_string()),
        event_type: Some("conference".to_string()),
        attendees: Some(json!("1")),
        password: Some(password.to_string()),
        ..Default::default()
    }
}

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: Some(email.to_string()),
        password: Some(password.to_string()),
    }
}

fn settings(update: impl FnOnce(&mut SettingsUpdate)) -> SettingsUpdate {
    let mut settings = SettingsUpdate {
        site_name: Some("Lectern".to_string()),
        contact_email: Some("hello@lectern.test".to_string()),
        ..Default::default()
    };
    update(&mut settings);
    settings
}

#[tokio::test]
async fn test_sign_up_review_and_login() {
    let fixture = PlatformFixture::new().await;
    let platform = &fixture.platform;

    let registration = platform
        .register(sign_up("ada@lectern.test", "analytical-engine"))
        .await
        .unwrap();
    assert_eq!(registration.status, RegistrationStatus::Pending);
    assert!(platform.check_registered("ada@lectern.test").await.unwrap());

    // Stored as a salted hash, never as given
    let stored = platform
        .database()
        .get_registration_by_email("ada@lectern.test")
        .await
        .unwrap()
        .unwrap();
    let hash = stored.password_hash.unwrap();
    assert!(!hash.contains("analytical-engine"));

    let approved = platform
        .update_registration_status(
            &registration.id,
            StatusUpdate {
                status: Some("approved".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(approved.status, RegistrationStatus::Approved);

    let user = platform
        .login(login("ada@lectern.test", "analytical-engine"))
        .await
        .unwrap();
    assert_eq!(user.role, "user");
    assert_eq!(
        user.registration.unwrap().status,
        RegistrationStatus::Approved
    );

    let err = platform
        .login(login("ada@lectern.test", "wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::InvalidCredentials));
}

#[tokio::test]
async fn test_admin_entered_registration_cannot_log_in() {
    let fixture = PlatformFixture::new().await;
    let platform = &fixture.platform;

    platform
        .create_registration(lectern::platform::AdminRegistrationRequest {
            full_name: Some("Grace Hopper".to_string()),
            email: Some("grace@lectern.test".to_string()),
            phone: Some("555-0100".to_string()),
            organization: Some("Navy".to_string()),
            ticket_type: Some("vip".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let err = platform
        .login(login("grace@lectern.test", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Validation(_)));

    let err = platform
        .login(login("grace@lectern.test", "anything"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::InvalidCredentials));

    // Same email through the public form is a duplicate
    let err = platform
        .register(sign_up("grace@lectern.test", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::AlreadyRegistered));
}

#[tokio::test]
async fn test_closed_registrations() {
    let fixture = PlatformFixture::new().await;
    let platform = &fixture.platform;

    platform
        .update_settings(settings(|s| s.allow_registrations = Some(false)))
        .await
        .unwrap();

    let err = platform
        .register(sign_up("ada@lectern.test", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::RegistrationClosed));
    assert_eq!(platform.seat_count().await.unwrap().registered, 0);

    platform
        .update_settings(settings(|s| s.allow_registrations = Some(true)))
        .await
        .unwrap();
    platform
        .register(sign_up("ada@lectern.test", "pw"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_remaining_seats_never_negative() {
    let fixture = PlatformFixture::new().await;
    let platform = &fixture.platform;

    for i in 0..5 {
        platform
            .register(sign_up(&format!("student{}@lectern.test", i), "pw"))
            .await
            .unwrap();
    }

    let seats = platform.seat_count().await.unwrap();
    assert_eq!(seats.total, 3);
    assert_eq!(seats.registered, 5);
    assert_eq!(seats.remaining, 0);
}

#[tokio::test]
async fn test_settings_update_keeps_unspecified_fields() {
    let fixture = PlatformFixture::new().await;
    let platform = &fixture.platform;

    platform
        .update_settings(settings(|s| s.featured_videos_limit = Some(12)))
        .await
        .unwrap();
    let saved = platform
        .update_settings(settings(|s| s.enable_comments = Some(false)))
        .await
        .unwrap();

    assert_eq!(saved.featured_videos_limit, 12);
    assert!(!saved.enable_comments);
    assert!(saved.enable_ratings);
    assert_eq!(platform.get_settings().await.unwrap(), saved);
}

#[tokio::test]
async fn test_uploads_follow_settings() {
    let fixture = PlatformFixture::new().await;
    let platform = &fixture.platform;

    platform
        .update_settings(settings(|s| s.allow_uploads = Some(false)))
        .await
        .unwrap();
    let err = platform
        .upload_media(UploadKind::Video, "lecture.mp4", b"bytes")
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::UploadsDisabled));
    assert!(fixture.storage.is_empty());

    platform
        .update_settings(settings(|s| {
            s.allow_uploads = Some(true);
            s.max_file_size = Some(1);
        }))
        .await
        .unwrap();

    let too_big = vec![0u8; 1024 * 1024 + 1];
    let err = platform
        .upload_media(UploadKind::Video, "lecture.mp4", &too_big)
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Validation(_)));

    let stored = platform
        .upload_media(UploadKind::Thumbnail, "cover.png", &[1, 2, 3])
        .await
        .unwrap();
    assert!(stored.file_id.starts_with("thumbnails/"));
    assert_eq!(fixture.storage.get(&stored.file_id), Some(vec![1, 2, 3]));

    let err = platform
        .upload_media(UploadKind::Thumbnail, "empty.png", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Validation(_)));
}

#[tokio::test]
async fn test_playback_source_follows_video_url() {
    let fixture = PlatformFixture::new().await;
    let platform = &fixture.platform;

    let video = platform
        .create_video(VideoRequest {
            title: Some("Borrowing".to_string()),
            description: Some("Shared and mutable references".to_string()),
            category: Some("rust".to_string()),
            video_url: Some("https://www.youtube.com/embed/dQw4w9WgXcQ".to_string()),
            duration: Some(json!(754)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(video.duration.as_deref(), Some("754"));

    let source = platform.playback_source(&video.id).await.unwrap();
    assert!(source.is_embedded());

    platform
        .update_video(
            &video.id,
            VideoRequest {
                video_url: Some("/media/videos/borrowing.mp4".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let source = platform.playback_source(&video.id).await.unwrap();
    assert_eq!(
        source,
        lectern::playback::PlaybackSource::DirectFile {
            url: "/media/videos/borrowing.mp4".to_string()
        }
    );

    let err = platform.playback_source("missing").await.unwrap_err();
    assert!(matches!(err, PlatformError::NotFound("Video")));
}

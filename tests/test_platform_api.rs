#![cfg(feature = "test-utils")]

mod support;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::support::PlatformFixture;
use lectern::api::create_router;

const BOUNDARY: &str = "lectern-test-boundary";

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    read_json(response).await
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::GET, uri, None).await
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, Method::POST, uri, Some(body)).await
}

async fn patch(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, Method::PATCH, uri, Some(body)).await
}

async fn delete(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::DELETE, uri, None).await
}

async fn setup() -> (Router, PlatformFixture) {
    let fixture = PlatformFixture::new().await;
    let router = create_router(fixture.platform.clone(), None);
    (router, fixture)
}

fn sign_up(email: &str) -> Value {
    json!({
        "fullName": "Ada Lovelace",
        "email": email,
        "phone": "+44 20 7946 0000",
        "eventType": "workshop",
        "attendees": 2,
        "password": "analytical-engine",
        "subscribe": true,
    })
}

fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn upload(router: &Router, parts: &[(&str, Option<&str>, &str)]) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    read_json(response).await
}

#[tokio::test]
async fn test_health() {
    let (router, _fixture) = setup().await;
    let (status, body) = get(&router, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_then_duplicate() {
    let (router, _fixture) = setup().await;

    let (status, body) = post(&router, "/api/registrations", sign_up("ada@lectern.test")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Registration successful");
    assert_eq!(body["user"]["email"], "ada@lectern.test");
    assert_eq!(body["user"]["attendees"], "2");
    assert_eq!(body["user"]["status"], "pending");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password").is_none());

    let (status, body) = post(&router, "/api/registrations", sign_up("ada@lectern.test")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User already registered");
}

#[tokio::test]
async fn test_register_names_missing_fields() {
    let (router, _fixture) = setup().await;

    let (status, body) = post(
        &router,
        "/api/registrations",
        json!({ "email": "ada@lectern.test", "fullName": "Ada Lovelace" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Missing required fields: phone, eventType, attendees, password"
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (router, _fixture) = setup().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = read_json(router.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_seat_count_and_check() {
    let (router, _fixture) = setup().await;

    let (_, body) = get(&router, "/api/registrations/count").await;
    assert_eq!(body, json!({ "total": 3, "registered": 0, "remaining": 3 }));

    post(&router, "/api/registrations", sign_up("ada@lectern.test")).await;

    let (_, body) = get(&router, "/api/registrations/count").await;
    assert_eq!(body, json!({ "total": 3, "registered": 1, "remaining": 2 }));

    let (status, body) = get(&router, "/api/registrations/check?email=ada@lectern.test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isRegistered"], true);

    let (_, body) = get(&router, "/api/registrations/check?email=grace@lectern.test").await;
    assert_eq!(body["isRegistered"], false);

    let (status, _) = get(&router, "/api/registrations/check").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_admin_and_registered_user() {
    let (router, _fixture) = setup().await;
    post(&router, "/api/registrations", sign_up("ada@lectern.test")).await;

    let (status, body) = post(
        &router,
        "/api/auth/login",
        json!({ "email": "admin@lectern.test", "password": "correct horse" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["role"], "admin");

    let (status, body) = post(
        &router,
        "/api/auth/login",
        json!({ "email": "ada@lectern.test", "password": "analytical-engine" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["role"], "user");
    assert_eq!(body["user"]["isRegistered"], true);
    assert_eq!(body["user"]["registration"]["fullName"], "Ada Lovelace");
    assert!(!body.to_string().contains("analytical-engine"));
    assert!(body["user"]["registration"].get("passwordHash").is_none());

    let (status, body) = post(
        &router,
        "/api/auth/login",
        json!({ "email": "ada@lectern.test", "password": "difference-engine" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, _) = post(
        &router,
        "/api/auth/login",
        json!({ "email": "nobody@lectern.test", "password": "x" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(&router, "/api/auth/login", json!({ "email": "ada@lectern.test" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_and_admin_messages() {
    let (router, _fixture) = setup().await;

    let (status, body) = post(
        &router,
        "/api/contact",
        json!({ "name": "Grace", "email": "grace@lectern.test", "message": "Is there parking?" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let message_id = body["messageId"].as_str().unwrap().to_string();

    let (status, _) = post(
        &router,
        "/api/admin/messages",
        json!({ "name": "Grace", "email": "grace@lectern.test", "message": "No subject" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = get(&router, "/api/admin/messages").await;
    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["subject"], "No Subject");
    assert_eq!(messages[0]["read"], false);

    let uri = format!("/api/admin/messages/{}", message_id);
    let (status, body) = patch(&router, &uri, json!({ "read": true })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["read"], true);

    let (status, _) = patch(&router, &uri, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = delete(&router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Message deleted successfully");

    let (status, body) = delete(&router, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Message not found");
}

#[tokio::test]
async fn test_registration_status_updates() {
    let (router, _fixture) = setup().await;

    let (status, body) = post(
        &router,
        "/api/admin/registrations",
        json!({
            "name": "Grace Hopper",
            "email": "grace@lectern.test",
            "phone": "555-0100",
            "organization": "Navy",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["registrationId"].as_str().unwrap().to_string();
    let uri = format!("/api/admin/registrations/{}", id);

    let (status, body) = patch(&router, &uri, json!({ "status": "approved" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["registration"]["status"], "approved");
    assert_eq!(body["registration"]["organization"], "Navy");

    let (status, body) = patch(&router, &uri, json!({ "status": "maybe" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid status value");

    let (status, _) = patch(
        &router,
        "/api/admin/registrations/does-not-exist",
        json!({ "status": "rejected" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get(&router, "/api/admin/registrations").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_video_library() {
    let (router, _fixture) = setup().await;

    let (status, body) = post(
        &router,
        "/api/admin/videos",
        json!({
            "title": "Ownership in depth",
            "description": "Moves, borrows and lifetimes",
            "category": "rust",
            "videoUrl": "https://youtu.be/dQw4w9WgXcQ",
            "duration": "42:00",
            "featured": true,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Video created successfully");
    let id = body["videoId"].as_str().unwrap().to_string();

    let (status, body) = post(&router, "/api/admin/videos", json!({ "title": "Untitled" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Missing required fields: description, category, videoUrl"
    );

    let (_, body) = get(&router, "/api/videos").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["featured"], true);

    let (status, body) = get(&router, &format!("/api/videos/{}/source", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["source"],
        json!({ "kind": "embedded_stream", "video_id": "dQw4w9WgXcQ" })
    );

    let uri = format!("/api/admin/videos/{}", id);
    let (status, body) = patch(
        &router,
        &uri,
        json!({ "videoUrl": "https://cdn.lectern.test/ownership.mp4", "featured": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["video"]["title"], "Ownership in depth");
    assert_eq!(body["video"]["featured"], false);

    let (status, _) = patch(&router, &uri, json!({ "title": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = get(&router, &format!("/api/videos/{}/source", id)).await;
    assert_eq!(
        body["source"],
        json!({ "kind": "direct_file", "url": "https://cdn.lectern.test/ownership.mp4" })
    );

    let (_, body) = get(&router, &format!("{}/stream", uri)).await;
    assert_eq!(body["url"], "https://cdn.lectern.test/ownership.mp4");

    let (status, body) = get(&router, &format!("{}/preview", uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Ownership in depth");
    assert_eq!(body["duration"], "42:00");

    let (status, _) = delete(&router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&router, &format!("{}/stream", uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&router, &format!("/api/videos/{}/source", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_settings_defaults_and_update() {
    let (router, _fixture) = setup().await;

    let (status, body) = get(&router, "/api/admin/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["siteName"], "Video Platform");
    assert_eq!(body["allowRegistrations"], true);
    assert_eq!(body["maxFileSize"], 100);

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/admin/settings",
        Some(json!({ "siteName": "Lectern" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Site name and contact email are required");

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/admin/settings",
        Some(json!({
            "siteName": "Lectern",
            "contactEmail": "hello@lectern.test",
            "maintenanceMode": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["settings"]["siteName"], "Lectern");
    assert_eq!(body["settings"]["maintenanceMode"], true);
    assert_eq!(body["settings"]["siteDescription"], "Your video sharing platform");

    let (_, body) = get(&router, "/api/admin/settings").await;
    assert_eq!(body["contactEmail"], "hello@lectern.test");
    assert!(body["updatedAt"].is_string());
}

#[tokio::test]
async fn test_dashboard_stats() {
    let (router, _fixture) = setup().await;

    for email in ["a@lectern.test", "b@lectern.test", "c@lectern.test"] {
        post(&router, "/api/registrations", sign_up(email)).await;
    }
    let (_, registrations) = get(&router, "/api/admin/registrations").await;
    let first_id = registrations[0]["id"].as_str().unwrap().to_string();
    patch(
        &router,
        &format!("/api/admin/registrations/{}", first_id),
        json!({ "status": "approved" }),
    )
    .await;

    post(
        &router,
        "/api/contact",
        json!({ "name": "Grace", "email": "grace@lectern.test", "message": "Hello" }),
    )
    .await;

    let (status, body) = get(&router, "/api/admin/dashboard/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["registrations"]["total"], 3);
    assert_eq!(body["registrations"]["accepted"], 1);
    assert_eq!(body["registrations"]["pending"], 2);
    assert_eq!(body["registrations"]["rejected"], 0);
    assert_eq!(body["registrations"]["today"], 3);
    assert_eq!(body["messages"], json!({ "total": 1, "unread": 1 }));
    assert_eq!(body["videos"], json!({ "total": 0, "featured": 0 }));
    assert_eq!(body["recentRegistrations"].as_array().unwrap().len(), 3);
    assert_eq!(body["recentRegistrations"][0]["email"], "c@lectern.test");
}

#[tokio::test]
async fn test_upload_stores_media() {
    let (router, fixture) = setup().await;

    let (status, body) = upload(
        &router,
        &[
            ("file", Some("intro.mp4"), "fake video bytes"),
            ("fileName", None, "Week 1 intro.mp4"),
            ("type", None, "video"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Week_1_intro.mp4");

    let file_id = body["fileId"].as_str().unwrap();
    assert!(file_id.starts_with("videos/"));
    assert!(file_id.ends_with("_Week_1_intro.mp4"));
    assert_eq!(body["url"], format!("https://media.test/{}", file_id));
    assert_eq!(fixture.storage.get(file_id).unwrap(), b"fake video bytes");
}

#[tokio::test]
async fn test_upload_validation() {
    let (router, fixture) = setup().await;

    let (status, body) = upload(&router, &[("file", Some("thumb.png"), "png")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    let (status, _) = upload(
        &router,
        &[
            ("file", Some("thumb.png"), "png"),
            ("type", None, "poster"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = upload(
        &router,
        &[
            ("file", Some("thumb.png"), "png"),
            ("type", None, "thumbnail"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["fileId"].as_str().unwrap().starts_with("thumbnails/"));
    assert_eq!(fixture.storage.len(), 1);
}

use lectern::api;
use lectern::config::Config;
use lectern::db::Database;
use lectern::platform::PlatformManager;
use lectern::storage::{LocalMediaStorage, MediaStorageManager};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Use RUST_LOG env var if set, otherwise default to info level
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let database_path = config
        .database_path
        .to_str()
        .ok_or("Database path is not valid UTF-8")?;
    let database = Database::new(database_path).await?;

    let (storage, media_dir) = match &config.s3 {
        Some(s3) => (MediaStorageManager::new_s3(s3.clone()).await?, None),
        None => {
            let media_dir = config.media_path()?;
            let public_url = config
                .public_media_url
                .clone()
                .unwrap_or_else(|| "/media".to_string());
            let local = LocalMediaStorage::new(&media_dir, public_url).await?;
            (
                MediaStorageManager::from_storage(Arc::new(local)),
                Some(media_dir),
            )
        }
    };

    if config.admin.is_none() {
        info!("No admin credentials configured, admin login disabled");
    }

    let platform = PlatformManager::new(database, storage)
        .with_admin(config.admin.clone())
        .with_total_seats(config.total_seats);

    let router = api::create_router(platform, media_dir);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;

    Ok(())
}

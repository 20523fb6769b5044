#![allow(dead_code)]

use lectern::db::Database;
use lectern::platform::PlatformManager;
use lectern::storage::MediaStorageManager;
use lectern::test_support::MockMediaStorage;
use std::sync::Arc;
use tempfile::TempDir;

/// Initialize tracing for tests with proper test output handling
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Platform over a fresh on-disk database and in-memory media storage
pub struct PlatformFixture {
    pub platform: PlatformManager,
    pub storage: Arc<MockMediaStorage>,
    _temp_dir: TempDir,
}

impl PlatformFixture {
    pub async fn new() -> Self {
        tracing_init();

        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("lectern.db");
        let database = Database::new(db_path.to_str().unwrap()).await.unwrap();

        let storage = Arc::new(MockMediaStorage::new());
        let manager = MediaStorageManager::from_storage(storage.clone());

        let platform = PlatformManager::new(database, manager)
            .with_admin(Some(
                lectern::auth::AdminCredentials::new("admin@lectern.test", "correct horse")
                    .unwrap(),
            ))
            .with_total_seats(3);

        PlatformFixture {
            platform,
            storage,
            _temp_dir: temp_dir,
        }
    }
}

#![allow(dead_code)]

use civictrack::storage::SqliteStorage;
use tempfile::TempDir;

pub mod fixtures;

pub fn test_db() -> SqliteStorage {
    SqliteStorage::open_memory().expect("failed to create test database")
}

pub fn test_db_with_dir() -> (SqliteStorage, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let db_path = dir.path().join(".civictrack").join("civictrack.db");
    std::fs::create_dir_all(db_path.parent().unwrap()).unwrap();
    let storage = SqliteStorage::open(&db_path).expect("failed to create test database");
    (storage, dir)
}

#![allow(dead_code)]

use std::time::Duration;

use diesel::{prelude::*, SqliteConnection};
use kanban::{
    config::DatabaseConfig,
    db::{connection::Database, models::Column, schema::board_columns},
};
use tempfile::TempDir;

/// A migrated database in a temporary directory, removed on drop.
pub struct TestDb {
    pub db: Database,
    _dir: TempDir,
}

pub fn test_db() -> TestDb {
    test_db_with_pool(2)
}

pub fn test_db_with_pool(pool_size: u32) -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: dir.path().join("kanban.sqlite3").to_string_lossy().into_owned(),
        pool_size,
        busy_timeout: Duration::from_secs(30),
    };
    let db = Database::connect(&config).unwrap();
    db.migrate().unwrap();
    TestDb { db, _dir: dir }
}

/// Columns of a board, sorted by order.
pub fn board_columns(conn: &mut SqliteConnection, board_id: &str) -> Vec<Column> {
    board_columns::table
        .filter(board_columns::board_id.eq(board_id))
        .order(board_columns::order.asc())
        .select(Column::as_select())
        .load(conn)
        .unwrap()
}

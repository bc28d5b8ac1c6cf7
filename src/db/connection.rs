use std::time::Duration;

use diesel::{
    connection::SimpleConnection,
    r2d2::{ConnectionManager, CustomizeConnection},
    SqliteConnection,
};
use r2d2::Pool;
use tracing::info;

use crate::{config::DatabaseConfig, db::schema::SCHEMA, error::ApiError};

pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

/// Pragmas every pooled connection needs: cascading deletes and a busy
/// timeout so that a second writer waits for `BEGIN IMMEDIATE` instead of failing.
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout.as_millis()
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

fn init_pool(config: &DatabaseConfig) -> Result<SqlitePool, r2d2::Error> {
    let manager = ConnectionManager::<SqliteConnection>::new(&config.url);
    Pool::builder()
        .max_size(config.pool_size)
        .connection_customizer(Box::new(ConnectionOptions {
            busy_timeout: config.busy_timeout,
        }))
        .build(manager)
}

/// Cloneable handle to the connection pool.
///
/// Diesel is synchronous, so every call runs on tokio's blocking pool with
/// its own pooled connection.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn connect(config: &DatabaseConfig) -> Result<Self, ApiError> {
        let pool = init_pool(config)?;
        Ok(Self { pool })
    }

    /// Creates missing tables and indexes.
    pub fn migrate(&self) -> Result<(), ApiError> {
        let mut pooled = self.pool.get()?;
        let conn: &mut SqliteConnection = &mut pooled;
        conn.batch_execute("PRAGMA journal_mode = WAL;")?;
        conn.batch_execute(SCHEMA)?;
        info!("Database schema ready");
        Ok(())
    }

    /// Runs `f` with a pooled connection on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut *conn)
        })
        .await?
    }

    /// Checks out a connection on the current thread. For startup and tests.
    pub fn connection(
        &self,
    ) -> Result<r2d2::PooledConnection<ConnectionManager<SqliteConnection>>, ApiError> {
        Ok(self.pool.get()?)
    }
}

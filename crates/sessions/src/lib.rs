//! Per-user session state and its storage backends.

pub mod error;
pub mod session;
pub mod sqlite;
pub mod store;

pub use {
    error::{Error, Result},
    session::{Role, Session, SessionState, TranscriptEntry},
    sqlite::SqliteSessionStore,
    store::{MemorySessionStore, SessionStore},
};

/// Create the `courier_sessions` table.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

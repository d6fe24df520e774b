//! SQLite-backed session store.
//!
//! Each session is one JSON row keyed by user id, so schema changes to
//! [`Session`] need no migration as long as new fields default.

use {async_trait::async_trait, courier_common::Context, sqlx::SqlitePool, tracing::debug};

use crate::{Result, session::Session, store::SessionStore};

pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `path` and run migrations.
    pub async fn open(path: &std::path::Path) -> Result<Self> {
        let options = sqlx::sqlite::SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        crate::run_migrations(&pool).await?;
        debug!(path = %path.display(), "session database ready");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, user_id: &str) -> Result<Session> {
        let row = sqlx::query_scalar::<_, String>(
            "SELECT data FROM courier_sessions WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(data) => serde_json::from_str(&data)
                .with_context(|| format!("corrupt session row for user {user_id}")),
            None => {
                let session = Session::new(user_id);
                self.set(&session).await?;
                Ok(session)
            },
        }
    }

    async fn set(&self, session: &Session) -> Result<()> {
        let data = serde_json::to_string(session)?;
        sqlx::query(
            r#"INSERT INTO courier_sessions (user_id, data, updated_at)
               VALUES (?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                 data = excluded.data,
                 updated_at = excluded.updated_at"#,
        )
        .bind(&session.user_id)
        .bind(data)
        .bind(courier_common::time::unix_now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM courier_sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

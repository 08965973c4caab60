use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};

use crate::{
    models::session::{Principal, SessionState},
    types::SessionId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Loads a session that has not yet expired at `now`.
    async fn find(
        &self,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionState>, sqlx::Error>;

    /// Inserts or replaces the stored state.
    async fn save(&self, session: &SessionState) -> Result<(), sqlx::Error>;

    async fn delete(&self, id: SessionId) -> Result<(), sqlx::Error>;

    /// Removes rows whose lifetime ended before `now`; returns the count.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error>;
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: SessionId,
    principal: Option<Json<Principal>>,
    csrf_token: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for SessionState {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            principal: row.principal.map(|Json(principal)| principal),
            csrf_token: row.csrf_token,
            created_at: row.created_at,
            expires_at: row.expires_at,
            destroyed: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn find(
        &self,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionState>, sqlx::Error> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, principal, csrf_token, created_at, expires_at
            FROM sessions
            WHERE id = $1 AND expires_at > $2
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SessionState::from))
    }

    async fn save(&self, session: &SessionState) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, principal, csrf_token, created_at, expires_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (id) DO UPDATE
            SET principal = EXCLUDED.principal,
                csrf_token = EXCLUDED.csrf_token,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
            "#,
        )
        .bind(session.id)
        .bind(session.principal.as_ref().map(Json))
        .bind(&session.csrf_token)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map(|_| ())
    }

    async fn delete(&self, id: SessionId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|_| ())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

//! Session repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use vocalis_core::error::{AppError, ErrorKind};
use vocalis_core::result::AppResult;
use vocalis_entity::session::{NewSession, Session};

use crate::store::SessionRegistry;

/// PostgreSQL-backed session registry.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRegistry for SessionRepository {
    async fn create(&self, session: NewSession) -> AppResult<Session> {
        sqlx::query_as::<_, Session>(
            "INSERT INTO user_sessions (id, user_id, token_id, expires_at, source_address, client_agent) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(session.user_id)
        .bind(session.token_id)
        .bind(session.expires_at)
        .bind(&session.source_address)
        .bind(&session.client_agent)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("user_sessions_token_id_key") =>
            {
                AppError::conflict("Token id already recorded")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create session", e),
        })
    }

    async fn find_by_token_id(&self, token_id: Uuid) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM user_sessions WHERE token_id = $1")
            .bind(token_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find session by token", e)
            })
    }

    async fn deactivate(&self, token_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_active = FALSE WHERE token_id = $1 AND is_active",
        )
        .bind(token_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to deactivate session", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn deactivate_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_active = FALSE WHERE user_id = $1 AND is_active",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to deactivate user sessions", e)
        })?;
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to purge expired sessions", e)
            })?;
        Ok(result.rows_affected())
    }
}

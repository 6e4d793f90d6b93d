//! User repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use vocalis_core::error::{AppError, ErrorKind};
use vocalis_core::result::AppResult;
use vocalis_entity::user::{NewUser, User, UserFilter, UserRole};

use crate::store::{LockoutPolicy, LoginFailure, UserStore};

/// PostgreSQL-backed user store.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map unique-constraint violations to conflicts, everything else to a
/// database error.
fn map_write_error(e: sqlx::Error, context: &'static str) -> AppError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.constraint() {
            Some("users_username_key") => {
                return AppError::conflict("Username already registered");
            }
            Some("users_email_key") => return AppError::conflict("Email already registered"),
            _ => {}
        }
    }
    AppError::with_source(ErrorKind::Database, context, e)
}

#[async_trait]
impl UserStore for UserRepository {
    async fn insert(&self, user: NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, email, password_hash, role, status, \
             first_name, last_name, profile_picture, settings) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.status)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.profile_picture)
        .bind(&user.settings)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to create user"))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by username", e)
            })
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    async fn list(&self, filter: UserFilter, limit: i64, offset: i64) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users \
             WHERE ($1::user_role IS NULL OR role = $1) \
               AND ($2::user_status IS NULL OR status = $2) \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4",
        )
        .bind(filter.role)
        .bind(filter.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list users", e))
    }

    async fn count_by_role(&self, role: UserRole) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count users by role", e)
            })
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET username = $2, email = $3, role = $4, status = $5, \
             first_name = $6, last_name = $7, profile_picture = $8, settings = $9, \
             updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.status)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.profile_picture)
        .bind(&user.settings)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to update user"))?
        .ok_or_else(|| AppError::not_found("User not found"))
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, failed_login_attempts = 0, \
             locked_until = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to set password", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete user", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_login_failure(
        &self,
        id: Uuid,
        policy: LockoutPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<LoginFailure> {
        // Row lock plus the re-checked WHERE clause serialize concurrent failures.
        let row: Option<(i32, Option<DateTime<Utc>>)> = sqlx::query_as(
            "UPDATE users SET \
               failed_login_attempts = CASE WHEN failed_login_attempts + 1 >= $2 \
                 THEN 0 ELSE failed_login_attempts + 1 END, \
               locked_until = CASE WHEN failed_login_attempts + 1 >= $2 \
                 THEN $3 ELSE NULL END, \
               updated_at = $4 \
             WHERE id = $1 AND (locked_until IS NULL OR locked_until <= $4) \
             RETURNING failed_login_attempts, locked_until",
        )
        .bind(id)
        .bind(policy.threshold)
        .bind(now + policy.duration)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record login failure", e)
        })?;

        Ok(match row {
            None => LoginFailure::Skipped,
            Some((_, Some(until))) => LoginFailure::LockedOut { until },
            Some((attempts, None)) => LoginFailure::Counted { attempts },
        })
    }

    async fn record_login_success(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET failed_login_attempts = 0, locked_until = NULL, \
             last_login = $2, updated_at = $2 \
             WHERE id = $1 AND (locked_until IS NULL OR locked_until <= $2) \
             RETURNING *",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record login success", e)
        })
    }
}

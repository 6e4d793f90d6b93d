//! Storage abstractions for users and sessions.
//!
//! Services depend on these traits rather than on a concrete backend so
//! the PostgreSQL repositories and the in-memory store are interchangeable.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use vocalis_core::result::AppResult;
use vocalis_entity::session::{NewSession, Session};
use vocalis_entity::user::{NewUser, User, UserFilter, UserRole};

/// Per-account lockout thresholds applied when recording failed logins.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    /// Failures that trigger a lock.
    pub threshold: i32,
    /// How long a lock lasts.
    pub duration: Duration,
}

/// Outcome of recording one failed login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    /// The failure was counted; the account is not locked.
    Counted {
        /// Consecutive failures so far.
        attempts: i32,
    },
    /// This failure reached the threshold and locked the account.
    LockedOut {
        /// When the lock lifts.
        until: DateTime<Utc>,
    },
    /// Nothing was recorded: the account is already locked or gone.
    Skipped,
}

/// Persistence of user accounts.
///
/// Implementations must enforce uniqueness of username and email and
/// report violations as `Conflict` errors.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user.
    async fn insert(&self, user: NewUser) -> AppResult<User>;

    /// Find a user by primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by exact username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// List users, newest first.
    async fn list(&self, filter: UserFilter, limit: i64, offset: i64) -> AppResult<Vec<User>>;

    /// Count users holding a role.
    async fn count_by_role(&self, role: UserRole) -> AppResult<i64>;

    /// Write back the profile, role, and status fields of a user.
    async fn update(&self, user: &User) -> AppResult<User>;

    /// Replace the password hash and clear lockout state.
    async fn set_password(&self, id: Uuid, password_hash: &str) -> AppResult<bool>;

    /// Delete a user and, through the schema, all of their sessions.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Atomically count a failed login, locking the account at the threshold.
    ///
    /// Accounts locked at `now` are left untouched, so concurrent callers
    /// produce at most one lockout transition.
    async fn record_login_failure(
        &self,
        id: Uuid,
        policy: LockoutPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<LoginFailure>;

    /// Atomically clear lockout state and stamp `last_login`.
    ///
    /// Returns `None` if the account became locked in the meantime.
    async fn record_login_success(&self, id: Uuid, now: DateTime<Utc>)
    -> AppResult<Option<User>>;
}

/// Persistence of issued access-token sessions.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Record a newly issued token.
    async fn create(&self, session: NewSession) -> AppResult<Session>;

    /// Look up the session of a token id.
    async fn find_by_token_id(&self, token_id: Uuid) -> AppResult<Option<Session>>;

    /// Deactivate one session. Returns whether it was active.
    async fn deactivate(&self, token_id: Uuid) -> AppResult<bool>;

    /// Deactivate every session of a user. Returns how many were active.
    async fn deactivate_all_for_user(&self, user_id: Uuid) -> AppResult<u64>;

    /// Remove sessions whose expiry is at or before `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

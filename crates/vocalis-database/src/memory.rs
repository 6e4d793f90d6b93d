//! In-memory user store and session registry.
//!
//! Both tables live behind one mutex so that user deletion cascades to
//! sessions exactly like the foreign key does in PostgreSQL, and so that
//! every trait operation is atomic.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use vocalis_core::error::AppError;
use vocalis_core::result::AppResult;
use vocalis_entity::session::{NewSession, Session};
use vocalis_entity::user::{NewUser, User, UserFilter, UserRole};

use crate::store::{LockoutPolicy, LoginFailure, SessionRegistry, UserStore};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Session>,
}

impl Tables {
    fn check_unique(&self, id: Uuid, username: &str, email: &str) -> AppResult<()> {
        for other in self.users.values().filter(|u| u.id != id) {
            if other.username == username {
                return Err(AppError::conflict("Username already registered"));
            }
            if other.email.eq_ignore_ascii_case(email) {
                return Err(AppError::conflict("Email already registered"));
            }
        }
        Ok(())
    }
}

/// Shared in-memory implementation of [`UserStore`] and [`SessionRegistry`].
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, active or not.
    pub async fn session_count(&self) -> usize {
        self.tables.lock().await.sessions.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.tables.lock().await;
        let id = Uuid::new_v4();
        tables.check_unique(id, &user.username, &user.email)?;

        let now = Utc::now();
        let record = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            status: user.status,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_picture: user.profile_picture,
            settings: user.settings,
            failed_login_attempts: 0,
            locked_until: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self, filter: UserFilter, limit: i64, offset: i64) -> AppResult<Vec<User>> {
        let tables = self.tables.lock().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_by_role(&self, role: UserRole) -> AppResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().filter(|u| u.role == role).count() as i64)
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        let mut tables = self.tables.lock().await;
        tables.check_unique(user.id, &user.username, &user.email)?;
        let existing = tables
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::not_found("User not found"))?;

        existing.username = user.username.clone();
        existing.email = user.email.clone();
        existing.role = user.role;
        existing.status = user.status;
        existing.first_name = user.first_name.clone();
        existing.last_name = user.last_name.clone();
        existing.profile_picture = user.profile_picture.clone();
        existing.settings = user.settings.clone();
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(false);
        };
        user.password_hash = password_hash.to_string();
        user.failed_login_attempts = 0;
        user.locked_until = None;
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.sessions.retain(|_, s| s.user_id != id);
        Ok(true)
    }

    async fn record_login_failure(
        &self,
        id: Uuid,
        policy: LockoutPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<LoginFailure> {
        let mut tables = self.tables.lock().await;
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(LoginFailure::Skipped);
        };
        if user.is_locked_at(now) {
            return Ok(LoginFailure::Skipped);
        }

        user.updated_at = now;
        let attempts = user.failed_login_attempts + 1;
        if attempts >= policy.threshold {
            let until = now + policy.duration;
            user.failed_login_attempts = 0;
            user.locked_until = Some(until);
            Ok(LoginFailure::LockedOut { until })
        } else {
            user.failed_login_attempts = attempts;
            user.locked_until = None;
            Ok(LoginFailure::Counted { attempts })
        }
    }

    async fn record_login_success(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        let mut tables = self.tables.lock().await;
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if user.is_locked_at(now) {
            return Ok(None);
        }
        user.failed_login_attempts = 0;
        user.locked_until = None;
        user.last_login = Some(now);
        user.updated_at = now;
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl SessionRegistry for MemoryStore {
    async fn create(&self, session: NewSession) -> AppResult<Session> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&session.user_id) {
            return Err(AppError::not_found("User not found"));
        }
        if tables.sessions.contains_key(&session.token_id) {
            return Err(AppError::conflict("Token id already recorded"));
        }
        let record = Session {
            id: Uuid::new_v4(),
            user_id: session.user_id,
            token_id: session.token_id,
            expires_at: session.expires_at,
            created_at: Utc::now(),
            source_address: session.source_address,
            client_agent: session.client_agent,
            is_active: true,
        };
        tables.sessions.insert(record.token_id, record.clone());
        Ok(record)
    }

    async fn find_by_token_id(&self, token_id: Uuid) -> AppResult<Option<Session>> {
        Ok(self.tables.lock().await.sessions.get(&token_id).cloned())
    }

    async fn deactivate(&self, token_id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(match tables.sessions.get_mut(&token_id) {
            Some(session) if session.is_active => {
                session.is_active = false;
                true
            }
            _ => false,
        })
    }

    async fn deactivate_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let mut changed = 0;
        for session in tables
            .sessions
            .values_mut()
            .filter(|s| s.user_id == user_id && s.is_active)
        {
            session.is_active = false;
            changed += 1;
        }
        Ok(changed)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.expires_at > now);
        Ok((before - tables.sessions.len()) as u64)
    }
}

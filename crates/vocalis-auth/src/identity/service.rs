//! Account lifecycle and credential authentication.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use vocalis_core::config::{AuthConfig, BootstrapConfig};
use vocalis_core::error::AppError;
use vocalis_core::result::AppResult;
use vocalis_core::secret::generate_secret;
use vocalis_database::store::{LockoutPolicy, LoginFailure, UserStore};
use vocalis_entity::user::{NewUser, User, UserFilter, UserRole, UserStatus};

use crate::password::PasswordHasher;

/// Default page size for user listings.
pub const DEFAULT_LIST_LIMIT: i64 = 100;

/// Largest page size for user listings.
pub const MAX_LIST_LIMIT: i64 = 1000;

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plaintext password; hashed before it is stored.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Assigned role.
    pub role: UserRole,
    /// Initial status.
    pub status: UserStatus,
}

impl NewAccount {
    /// A self-registered account: role `user`, status `active`.
    pub fn registration(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role: UserRole::User,
            status: UserStatus::Active,
        }
    }
}

/// What happened during one login attempt.
#[derive(Debug, Clone)]
pub enum LoginAttempt {
    /// Credentials matched; lockout state was cleared.
    Succeeded(User),
    /// No account matches the identifier.
    UnknownIdentifier,
    /// The account is locked; the password was not checked.
    Locked,
    /// The account status does not allow login.
    Inactive,
    /// The password did not match.
    WrongPassword(LoginFailure),
}

/// Manages user accounts and verifies credentials.
#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    lockout: LockoutPolicy,
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService")
            .field("lockout", &self.lockout)
            .finish()
    }
}

impl IdentityService {
    /// Creates a new identity service.
    pub fn new(users: Arc<dyn UserStore>, hasher: PasswordHasher, lockout: LockoutPolicy) -> Self {
        Self {
            users,
            hasher,
            lockout,
        }
    }

    /// Creates a service with hashing costs and lockout policy from configuration.
    ///
    /// A threshold or lockout duration outside the configured bounds is a
    /// `Configuration` error.
    pub fn from_config(users: Arc<dyn UserStore>, config: &AuthConfig) -> AppResult<Self> {
        config.validate()?;
        let threshold = i32::try_from(config.max_failed_attempts)
            .map_err(|_| AppError::configuration("auth.max_failed_attempts is out of range"))?;
        let duration = i64::try_from(config.lockout_duration_minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .ok_or_else(|| AppError::configuration("auth.lockout_duration_minutes is out of range"))?;
        let lockout = LockoutPolicy {
            threshold,
            duration,
        };
        Ok(Self::new(users, PasswordHasher::from_config(config)?, lockout))
    }

    /// Creates an account, hashing its password first.
    pub async fn create(&self, account: NewAccount) -> AppResult<User> {
        let email = account.email.trim().to_lowercase();
        self.ensure_available(None, &account.username, &email).await?;

        let password_hash = self.hash(account.password).await?;
        let user = self
            .users
            .insert(NewUser {
                username: account.username,
                email,
                password_hash,
                role: account.role,
                status: account.status,
                first_name: account.first_name,
                last_name: account.last_name,
                profile_picture: None,
                settings: serde_json::json!({}),
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, role = %user.role, "User created");
        Ok(user)
    }

    /// Finds a user by id.
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        self.users.find_by_id(id).await
    }

    /// Finds a user by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.users.find_by_username(username).await
    }

    /// Finds a user by email.
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.users.find_by_email(email).await
    }

    /// Lists users newest first. `limit` is clamped to `1..=MAX_LIST_LIMIT`.
    pub async fn list(
        &self,
        filter: UserFilter,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> AppResult<Vec<User>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        self.users.list(filter, limit, offset).await
    }

    /// Persists profile, role, and status changes.
    pub async fn update(&self, mut user: User) -> AppResult<User> {
        user.email = user.email.trim().to_lowercase();
        self.ensure_available(Some(user.id), &user.username, &user.email)
            .await?;
        let updated = self.users.update(&user).await?;
        info!(user_id = %updated.id, "User updated");
        Ok(updated)
    }

    /// Replaces a user's password and clears lockout state.
    pub async fn change_password(&self, id: Uuid, new_password: &str) -> AppResult<()> {
        let password_hash = self.hash(new_password.to_string()).await?;
        if !self.users.set_password(id, &password_hash).await? {
            return Err(AppError::not_found("User not found"));
        }
        info!(user_id = %id, "Password changed");
        Ok(())
    }

    /// Deletes a user and all of their sessions. Returns whether it existed.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let deleted = self.users.delete(id).await?;
        if deleted {
            info!(user_id = %id, "User deleted");
        }
        Ok(deleted)
    }

    /// Checks a password against a user's stored hash.
    pub async fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        let hash = user.password_hash.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))
    }

    /// Authenticates by username or email.
    ///
    /// Unknown identifiers, locked or inactive accounts, and wrong passwords
    /// are all reported as `None`.
    pub async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
        source_address: &str,
    ) -> AppResult<Option<User>> {
        self.authenticate_at(identifier, password, source_address, Utc::now())
            .await
    }

    /// [`Self::authenticate`] evaluated at a given instant.
    pub async fn authenticate_at(
        &self,
        identifier: &str,
        password: &str,
        source_address: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        match self.attempt_login(identifier, password, source_address, now).await? {
            LoginAttempt::Succeeded(user) => Ok(Some(user)),
            _ => Ok(None),
        }
    }

    /// Runs one login attempt and reports its detailed outcome.
    pub async fn attempt_login(
        &self,
        identifier: &str,
        password: &str,
        source_address: &str,
        now: DateTime<Utc>,
    ) -> AppResult<LoginAttempt> {
        let user = match self.users.find_by_username(identifier).await? {
            Some(user) => Some(user),
            None => self.users.find_by_email(identifier).await?,
        };
        let Some(user) = user else {
            info!(source = %source_address, "Login attempt for unknown identifier");
            return Ok(LoginAttempt::UnknownIdentifier);
        };

        if user.is_locked_at(now) {
            warn!(user_id = %user.id, source = %source_address, "Login attempt on locked account");
            return Ok(LoginAttempt::Locked);
        }
        if !user.status.can_login() {
            info!(user_id = %user.id, status = %user.status, "Login attempt on inactive account");
            return Ok(LoginAttempt::Inactive);
        }

        if !self.verify_password(&user, password).await? {
            let failure = self
                .users
                .record_login_failure(user.id, self.lockout, now)
                .await?;
            match failure {
                LoginFailure::LockedOut { until } => warn!(
                    user_id = %user.id,
                    source = %source_address,
                    locked_until = %until,
                    "Account locked after repeated failed logins"
                ),
                LoginFailure::Counted { attempts } => info!(
                    user_id = %user.id,
                    source = %source_address,
                    attempts,
                    "Failed login"
                ),
                LoginFailure::Skipped => {}
            }
            return Ok(LoginAttempt::WrongPassword(failure));
        }

        match self.users.record_login_success(user.id, now).await? {
            Some(user) => {
                info!(user_id = %user.id, source = %source_address, "User logged in");
                Ok(LoginAttempt::Succeeded(user))
            }
            None => Ok(LoginAttempt::Locked),
        }
    }

    /// Creates an administrator when none exists.
    ///
    /// Returns the generated password of the new account, if one was created.
    pub async fn ensure_default_admin(&self, config: &BootstrapConfig) -> AppResult<Option<String>> {
        if !config.create_default_admin || self.users.count_by_role(UserRole::Admin).await? > 0 {
            return Ok(None);
        }

        let password = generate_secret();
        let account = NewAccount {
            username: config.admin_username.clone(),
            email: config.admin_email.clone(),
            password: password.clone(),
            first_name: "System".to_string(),
            last_name: "Administrator".to_string(),
            role: UserRole::Admin,
            status: UserStatus::Active,
        };
        let admin = self.create(account).await?;
        warn!(
            user_id = %admin.id,
            username = %admin.username,
            "Created default administrator; its one-time password is printed on stdout. Change it immediately"
        );
        Ok(Some(password))
    }

    async fn hash(&self, password: String) -> AppResult<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
    }

    async fn ensure_available(
        &self,
        id: Option<Uuid>,
        username: &str,
        email: &str,
    ) -> AppResult<()> {
        if let Some(existing) = self.users.find_by_username(username).await? {
            if Some(existing.id) != id {
                return Err(AppError::conflict("Username already registered"));
            }
        }
        if let Some(existing) = self.users.find_by_email(email).await? {
            if Some(existing.id) != id {
                return Err(AppError::conflict("Email already registered"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocalis_core::error::ErrorKind;
    use vocalis_database::MemoryStore;

    fn service(store: &MemoryStore) -> IdentityService {
        IdentityService::new(
            Arc::new(store.clone()),
            PasswordHasher::with_params(1024, 1, 1).unwrap(),
            LockoutPolicy {
                threshold: 5,
                duration: Duration::minutes(30),
            },
        )
    }

    fn alice() -> NewAccount {
        NewAccount::registration("alice", "Alice@Example.com", "Alice#2024", "Alice", "Liddell")
    }

    #[tokio::test]
    async fn create_hashes_password_and_normalizes_email() {
        let store = MemoryStore::new();
        let user = service(&store).create(alice()).await.unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.status, UserStatus::Active);
        assert_ne!(user.password_hash, "Alice#2024");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    fn cheap_auth_config() -> AuthConfig {
        AuthConfig {
            hash_memory_kib: 1024,
            hash_iterations: 1,
            hash_parallelism: 1,
            ..AuthConfig::default()
        }
    }

    #[test]
    fn from_config_rejects_out_of_range_lockout() {
        let store = MemoryStore::new();
        let config = AuthConfig {
            max_failed_attempts: u32::MAX,
            ..cheap_auth_config()
        };
        let err = IdentityService::from_config(Arc::new(store.clone()), &config).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);

        let config = AuthConfig {
            lockout_duration_minutes: u64::MAX,
            ..cheap_auth_config()
        };
        let err = IdentityService::from_config(Arc::new(store), &config).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn configured_threshold_locks_after_that_many_failures() {
        let store = MemoryStore::new();
        let config = AuthConfig {
            max_failed_attempts: 3,
            ..cheap_auth_config()
        };
        let identity = IdentityService::from_config(Arc::new(store.clone()), &config).unwrap();
        identity.create(alice()).await.unwrap();

        for _ in 0..2 {
            let user = identity.authenticate("alice", "Wrong#Pass1", "10.0.0.1").await.unwrap();
            assert!(user.is_none());
        }
        // Two failures stay below the threshold.
        assert!(
            identity
                .authenticate("alice", "Alice#2024", "10.0.0.1")
                .await
                .unwrap()
                .is_some()
        );

        for _ in 0..3 {
            identity.authenticate("alice", "Wrong#Pass1", "10.0.0.1").await.unwrap();
        }
        assert!(
            identity
                .authenticate("alice", "Alice#2024", "10.0.0.1")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let store = MemoryStore::new();
        let identity = service(&store);
        identity.create(alice()).await.unwrap();

        let err = identity.create(alice()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let mut same_email = alice();
        same_email.username = "alice2".into();
        let err = identity.create(same_email).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn authenticates_by_username_or_email() {
        let store = MemoryStore::new();
        let identity = service(&store);
        identity.create(alice()).await.unwrap();

        let by_name = identity.authenticate("alice", "Alice#2024", "10.0.0.1").await.unwrap();
        assert!(by_name.is_some_and(|u| u.last_login.is_some()));
        let by_email = identity
            .authenticate("alice@example.com", "Alice#2024", "10.0.0.1")
            .await
            .unwrap();
        assert!(by_email.is_some());
        assert!(identity.authenticate("nobody", "Alice#2024", "10.0.0.1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn inactive_account_cannot_authenticate() {
        let store = MemoryStore::new();
        let identity = service(&store);
        let mut account = alice();
        account.status = UserStatus::Suspended;
        identity.create(account).await.unwrap();

        let outcome = identity
            .attempt_login("alice", "Alice#2024", "10.0.0.1", Utc::now())
            .await
            .unwrap();
        assert!(matches!(outcome, LoginAttempt::Inactive));
    }

    #[tokio::test]
    async fn sixth_attempt_fails_until_lock_expires() {
        let store = MemoryStore::new();
        let identity = service(&store);
        identity.create(alice()).await.unwrap();
        let now = Utc::now();

        for _ in 0..5 {
            let user = identity
                .authenticate_at("alice", "wrong", "10.0.0.1", now)
                .await
                .unwrap();
            assert!(user.is_none());
        }

        let locked = identity
            .attempt_login("alice", "Alice#2024", "10.0.0.1", now + Duration::minutes(1))
            .await
            .unwrap();
        assert!(matches!(locked, LoginAttempt::Locked));

        let still_locked = identity
            .authenticate_at("alice", "Alice#2024", "10.0.0.1", now + Duration::minutes(29))
            .await
            .unwrap();
        assert!(still_locked.is_none());

        let unlocked = identity
            .authenticate_at("alice", "Alice#2024", "10.0.0.1", now + Duration::minutes(31))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unlocked.failed_login_attempts, 0);
        assert!(unlocked.locked_until.is_none());
    }

    #[tokio::test]
    async fn success_resets_failure_counter() {
        let store = MemoryStore::new();
        let identity = service(&store);
        let user = identity.create(alice()).await.unwrap();
        let now = Utc::now();

        for _ in 0..4 {
            identity.authenticate_at("alice", "wrong", "ip", now).await.unwrap();
        }
        identity.authenticate_at("alice", "Alice#2024", "ip", now).await.unwrap().unwrap();
        let stored = identity.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_attempts, 0);

        // Four more failures must not lock: the counter started over.
        for _ in 0..4 {
            identity.authenticate_at("alice", "wrong", "ip", now).await.unwrap();
        }
        assert!(identity.authenticate_at("alice", "Alice#2024", "ip", now).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_failures_lock_exactly_once() {
        let store = MemoryStore::new();
        let identity = service(&store);
        let user = identity.create(alice()).await.unwrap();
        let now = Utc::now();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let identity = identity.clone();
            handles.push(tokio::spawn(async move {
                identity.attempt_login("alice", "wrong", "10.0.0.9", now).await.unwrap()
            }));
        }

        let mut lockouts = 0;
        let mut counted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                LoginAttempt::WrongPassword(LoginFailure::LockedOut { .. }) => lockouts += 1,
                LoginAttempt::WrongPassword(LoginFailure::Counted { .. }) => counted += 1,
                LoginAttempt::WrongPassword(LoginFailure::Skipped) | LoginAttempt::Locked => {}
                other => panic!("unexpected outcome: {other:?}"),
            }
        }

        assert_eq!(lockouts, 1);
        assert_eq!(counted, 4);
        let stored = identity.get_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.is_locked_at(now));
        assert_eq!(stored.failed_login_attempts, 0);
    }

    #[tokio::test]
    async fn change_password_resets_lock_and_swaps_credentials() {
        let store = MemoryStore::new();
        let identity = service(&store);
        let user = identity.create(alice()).await.unwrap();
        let now = Utc::now();
        for _ in 0..5 {
            identity.authenticate_at("alice", "wrong", "ip", now).await.unwrap();
        }

        identity.change_password(user.id, "Rabbit#Hole7").await.unwrap();

        assert!(identity.authenticate_at("alice", "Alice#2024", "ip", now).await.unwrap().is_none());
        assert!(identity.authenticate_at("alice", "Rabbit#Hole7", "ip", now).await.unwrap().is_some());

        let err = identity.change_password(Uuid::new_v4(), "Rabbit#Hole7").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn update_detects_conflicts() {
        let store = MemoryStore::new();
        let identity = service(&store);
        identity.create(alice()).await.unwrap();
        let mut bob = identity
            .create(NewAccount::registration("bob", "bob@example.com", "Bob#12345", "Bob", "B"))
            .await
            .unwrap();

        bob.username = "alice".into();
        assert_eq!(identity.update(bob.clone()).await.unwrap_err().kind, ErrorKind::Conflict);

        bob.username = "bob".into();
        bob.first_name = "Robert".into();
        let updated = identity.update(bob).await.unwrap();
        assert_eq!(updated.first_name, "Robert");
    }

    #[tokio::test]
    async fn list_clamps_limit() {
        let store = MemoryStore::new();
        let identity = service(&store);
        identity.create(alice()).await.unwrap();
        let users = identity.list(UserFilter::default(), Some(0), Some(-3)).await.unwrap();
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn default_admin_created_once() {
        let store = MemoryStore::new();
        let identity = service(&store);
        let config = BootstrapConfig::default();

        let password = identity.ensure_default_admin(&config).await.unwrap().unwrap();
        let admin = identity
            .authenticate("admin", &password, "127.0.0.1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, UserRole::Admin);

        assert!(identity.ensure_default_admin(&config).await.unwrap().is_none());
    }
}

//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The persisted record of one issued access token.
///
/// Created at token issuance; deactivated on logout, logout-all, or
/// password change. A token is usable only while its session is active
/// and unexpired.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// The `jti` claim of the access token.
    pub token_id: Uuid,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// When the session was created (login time).
    pub created_at: DateTime<Utc>,
    /// Client address the token was issued to.
    pub source_address: Option<String>,
    /// User-Agent header value.
    pub client_agent: Option<String>,
    /// False once revoked.
    pub is_active: bool,
}

impl Session {
    /// Check whether the session admits its token at the given instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }
}

/// Data required to record a new session.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// The owning user.
    pub user_id: Uuid,
    /// The `jti` of the issued access token.
    pub token_id: Uuid,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
    /// Client address.
    pub source_address: Option<String>,
    /// User-Agent header.
    pub client_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn validity_requires_active_and_unexpired() {
        let now = Utc::now();
        let mut session = Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_id: Uuid::new_v4(),
            expires_at: now + Duration::hours(1),
            created_at: now,
            source_address: Some("127.0.0.1".into()),
            client_agent: None,
            is_active: true,
        };
        assert!(session.is_valid_at(now));
        assert!(!session.is_valid_at(now + Duration::hours(2)));
        session.is_active = false;
        assert!(!session.is_valid_at(now));
    }
}

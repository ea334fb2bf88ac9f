//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session token (uuid v4)
    pub id: String,
    /// Owning user
    pub user_id: i64,
    /// Expiry timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Default session lifetime in days
    pub const LIFETIME_DAYS: i64 = 7;

    /// Create a new session for a user with the default lifetime
    pub fn new(user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + chrono::Duration::days(Self::LIFETIME_DAYS),
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_not_expired() {
        let session = Session::new(1);
        assert!(!session.is_expired());
        assert_eq!(session.user_id, 1);
        assert!(!session.id.is_empty());
    }

    #[test]
    fn test_expired_session() {
        let mut session = Session::new(1);
        session.expires_at = Utc::now() - chrono::Duration::hours(1);
        assert!(session.is_expired());
    }

    #[test]
    fn test_session_ids_unique() {
        let a = Session::new(1);
        let b = Session::new(1);
        assert_ne!(a.id, b.id);
    }
}

//! Admin session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Sessions live for seven days
pub const SESSION_TTL_DAYS: i64 = 7;

/// Server-side session, keyed by an opaque token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session token (uuid v4)
    pub id: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Start a fresh session for `user_id`
    pub fn issue(user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_sets_seven_day_expiry() {
        let session = Session::issue(3);
        assert_eq!(session.user_id, 3);
        assert!(!session.is_expired());
        assert_eq!(
            (session.expires_at - session.created_at).num_days(),
            SESSION_TTL_DAYS
        );
        assert!(uuid::Uuid::parse_str(&session.id).is_ok());
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(Session::issue(1).id, Session::issue(1).id);
    }

    #[test]
    fn test_is_expired() {
        let mut session = Session::issue(1);
        session.expires_at = Utc::now() - Duration::seconds(1);
        assert!(session.is_expired());
    }
}

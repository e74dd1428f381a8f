//! Session model
//!
//! A `Session` is the signed-in identity the rest of the app routes on. The
//! wire types here mirror the JSON the auth service returns for users and
//! sessions; only the fields the app needs are required.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The signed-in identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Stable user identifier
    pub user_id: String,
    /// Name shown in the UI
    pub display_name: String,
    /// Email address used to sign in
    pub email: String,
    /// When the server will stop honouring the session, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a session with no known expiry
    pub fn new(
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            email: email.into(),
            expires_at: None,
        }
    }

    /// Set the expiry
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the session is past its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }

    /// Whether the session is past its expiry
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// User record as returned by the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    /// User id
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Email address
    pub email: String,
    /// Whether the email has been verified
    #[serde(default)]
    pub email_verified: bool,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Server-side session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Session token
    pub token: String,
    /// Owner of the session
    #[serde(default)]
    pub user_id: Option<String>,
    /// Expiry timestamp
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Body of sign-in and sign-up responses
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for the new session; absent when the server defers sign-in
    #[serde(default)]
    pub token: Option<String>,
    /// The authenticated user
    pub user: AuthUser,
}

/// Body of the session lookup response (the whole body may be `null`)
#[derive(Debug, Clone, Deserialize)]
pub struct SessionLookup {
    /// Session record
    pub session: SessionRecord,
    /// Owner of the session
    pub user: AuthUser,
}

impl From<&AuthUser> for Session {
    fn from(user: &AuthUser) -> Self {
        Session::new(user.id.clone(), user.name.clone(), user.email.clone())
    }
}

impl From<&SessionLookup> for Session {
    fn from(lookup: &SessionLookup) -> Self {
        let session = Session::from(&lookup.user);
        match lookup.session.expires_at {
            Some(expiry) => session.with_expiry(expiry),
            None => session,
        }
    }
}

/// Credentials persisted between launches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Bearer token
    pub token: String,
    /// Last known session for offline display
    pub session: Session,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let session = Session::new("u1", "Alice", "alice@example.com");
        assert!(!session.is_expired_at(now));

        let expired = session.clone().with_expiry(now - Duration::seconds(1));
        assert!(expired.is_expired_at(now));

        let valid = session.with_expiry(now + Duration::hours(1));
        assert!(!valid.is_expired_at(now));
    }

    #[test]
    fn test_auth_response_parsing() {
        let json = r#"{
            "token": "tok_abc",
            "user": {
                "id": "user_1",
                "name": "Alice",
                "email": "alice@example.com",
                "emailVerified": true,
                "image": null,
                "createdAt": "2025-01-01T00:00:00.000Z"
            }
        }"#;

        let response: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.token.as_deref(), Some("tok_abc"));
        assert!(response.user.email_verified);

        let session = Session::from(&response.user);
        assert_eq!(session.user_id, "user_1");
        assert_eq!(session.display_name, "Alice");
        assert_eq!(session.email, "alice@example.com");
    }

    #[test]
    fn test_session_lookup_parsing() {
        let json = r#"{
            "session": {
                "token": "tok_abc",
                "userId": "user_1",
                "expiresAt": "2030-01-01T00:00:00Z"
            },
            "user": { "id": "user_1", "name": "Alice", "email": "alice@example.com" }
        }"#;

        let lookup: Option<SessionLookup> = serde_json::from_str(json).unwrap();
        let session = Session::from(&lookup.unwrap());
        assert!(session.expires_at.is_some());

        let none: Option<SessionLookup> = serde_json::from_str("null").unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_stored_session_serialization() {
        let stored = StoredSession {
            token: "tok".to_string(),
            session: Session::new("u1", "Alice", "alice@example.com"),
        };

        let json = serde_json::to_string(&stored).unwrap();
        assert!(json.contains("displayName"));
        assert!(!json.contains("expiresAt"));

        let back: StoredSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stored);
    }
}

//! RemoteAuthGateway - the HTTP-backed `AuthGateway`
//!
//! Talks to the auth service's JSON endpoints, keeps the bearer token in a
//! `SecureStore`, and carries the password-reset ticket between the send,
//! verify and reset steps.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use auth_client::{AuthGateway, ClientConfig, RemoteAuthGateway, SignInCredentials};
//! use storage::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("https://api.outfitplanner.app")?;
//!     let gateway = RemoteAuthGateway::new(config, Arc::new(MemoryStore::new()))?;
//!
//!     let credentials = SignInCredentials {
//!         email: "user@test.com".to_string(),
//!         password: "validpass".to_string(),
//!     };
//!     let session = gateway.sign_in(&credentials).await?;
//!     println!("Signed in as: {}", session.display_name);
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use storage::SecureStore;
use tokio::sync::{Mutex, RwLock};

use crate::config::ClientConfig;
use crate::gateway::{
    AuthGateway, GatewayError, GatewayErrorKind, GatewayResult, SignInCredentials, SignUpDetails,
};
use crate::http::{ApiRequest, HttpClient};
use crate::session::{AuthResponse, Session, SessionLookup, StoredSession};

/// Secure-store item holding the bearer token
const TOKEN_ITEM: &str = "session_token";

/// Secure-store item holding the cached session
const SESSION_ITEM: &str = "session";

/// OTP purpose understood by the service for password resets
const RESET_OTP_TYPE: &str = "forget-password";

#[derive(Serialize)]
struct SignInBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SendOtpBody<'a> {
    email: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Serialize)]
struct CheckOtpBody<'a> {
    email: &'a str,
    otp: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Serialize)]
struct ResetPasswordBody<'a> {
    email: &'a str,
    otp: &'a str,
    password: &'a str,
}

/// Progress of a password reset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum ResetTicket {
    #[default]
    None,
    CodeSent { email: String },
    Verified { email: String, code: String },
}

/// `AuthGateway` backed by the remote auth service
pub struct RemoteAuthGateway {
    client: HttpClient,
    store: Arc<dyn SecureStore>,
    token: RwLock<Option<String>>,
    reset: Mutex<ResetTicket>,
}

impl RemoteAuthGateway {
    /// Create a gateway with no credentials loaded
    ///
    /// Call [`RemoteAuthGateway::restore`] to pick up a persisted session.
    pub fn new(config: ClientConfig, store: Arc<dyn SecureStore>) -> crate::Result<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
            store,
            token: RwLock::new(None),
            reset: Mutex::new(ResetTicket::None),
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        self.client.config()
    }

    /// Whether a bearer token is currently held
    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Resume a persisted session
    ///
    /// Loads the stored token and asks the service whether it is still good.
    /// A token the service no longer honours is dropped. Network failures keep
    /// the token and report the last cached session so the app can start
    /// offline.
    pub async fn restore(&self) -> crate::Result<Option<Session>> {
        let key = self.config().storage_key(TOKEN_ITEM);
        let Some(token) = self.store.get(&key).await? else {
            return Ok(None);
        };

        *self.token.write().await = Some(token);

        match self.current_session().await {
            Ok(Some(session)) => {
                self.persist(&session).await?;
                Ok(Some(session))
            }
            Ok(None) => {
                tracing::info!("stored session is no longer valid, clearing credentials");
                self.clear_credentials().await?;
                Ok(None)
            }
            Err(e) if e.kind() == GatewayErrorKind::Network => {
                tracing::warn!(error = %e, "could not validate stored session, using cached copy");
                self.cached_session().await
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored session rejected, clearing credentials");
                self.clear_credentials().await?;
                Ok(None)
            }
        }
    }

    async fn cached_session(&self) -> crate::Result<Option<Session>> {
        let key = self.config().storage_key(SESSION_ITEM);
        match self.store.get(&key).await? {
            Some(json) => {
                let stored: StoredSession = serde_json::from_str(&json)?;
                Ok(Some(stored.session))
            }
            None => Ok(None),
        }
    }

    async fn persist(&self, session: &Session) -> crate::Result<()> {
        let Some(token) = self.token.read().await.clone() else {
            return Ok(());
        };

        let stored = StoredSession { token: token.clone(), session: session.clone() };
        self.store
            .set(&self.config().storage_key(TOKEN_ITEM), &token)
            .await?;
        self.store
            .set(
                &self.config().storage_key(SESSION_ITEM),
                &serde_json::to_string(&stored)?,
            )
            .await?;
        Ok(())
    }

    async fn clear_credentials(&self) -> crate::Result<()> {
        *self.token.write().await = None;
        self.store.delete(&self.config().storage_key(TOKEN_ITEM)).await?;
        self.store.delete(&self.config().storage_key(SESSION_ITEM)).await?;
        Ok(())
    }

    async fn establish(&self, response: AuthResponse) -> GatewayResult<Session> {
        let token = response.token.ok_or_else(|| {
            GatewayError::new(GatewayErrorKind::InvalidResponse)
                .with_detail("response carried no session token")
        })?;

        let session = Session::from(&response.user);
        *self.token.write().await = Some(token);

        if let Err(e) = self.persist(&session).await {
            // The session is live on the server; failing to cache it only costs a re-login
            tracing::warn!(error = %e, "failed to persist session credentials");
        }

        Ok(session)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> GatewayResult<serde_json::Value> {
        let request = ApiRequest::post(path)
            .json_body(body)
            .map_err(|e| GatewayError::new(GatewayErrorKind::InvalidResponse).with_detail(e.to_string()))?;
        Ok(self.client.send(request).await?.data)
    }
}

#[async_trait]
impl AuthGateway for RemoteAuthGateway {
    async fn sign_in(&self, credentials: &SignInCredentials) -> GatewayResult<Session> {
        let request = ApiRequest::post("sign-in/email")
            .json_body(&SignInBody {
                email: &credentials.email,
                password: &credentials.password,
            })
            .map_err(|e| GatewayError::new(GatewayErrorKind::InvalidResponse).with_detail(e.to_string()))?;

        let response = self.client.send::<AuthResponse>(request).await?;
        let session = self.establish(response.data).await?;
        tracing::info!(user_id = %session.user_id, "signed in");
        Ok(session)
    }

    async fn sign_up(&self, details: &SignUpDetails) -> GatewayResult<Session> {
        let request = ApiRequest::post("sign-up/email")
            .json_body(&SignUpBody {
                name: &details.name,
                email: &details.email,
                password: &details.password,
            })
            .map_err(|e| GatewayError::new(GatewayErrorKind::InvalidResponse).with_detail(e.to_string()))?;

        let response = self.client.send::<AuthResponse>(request).await?;
        let session = self.establish(response.data).await?;
        tracing::info!(user_id = %session.user_id, "account created");
        Ok(session)
    }

    async fn send_reset_code(&self, email: &str) -> GatewayResult<()> {
        self.post(
            "email-otp/send-verification-otp",
            &SendOtpBody { email, kind: RESET_OTP_TYPE },
        )
        .await?;

        *self.reset.lock().await = ResetTicket::CodeSent { email: email.to_string() };
        Ok(())
    }

    async fn resend_reset_code(&self) -> GatewayResult<()> {
        let email = match &*self.reset.lock().await {
            ResetTicket::CodeSent { email } | ResetTicket::Verified { email, .. } => email.clone(),
            ResetTicket::None => {
                return Err(GatewayError::rejected(
                    "Request a reset code before asking for a new one",
                ))
            }
        };

        self.send_reset_code(&email).await
    }

    async fn verify_code(&self, code: &str) -> GatewayResult<()> {
        let email = match &*self.reset.lock().await {
            ResetTicket::CodeSent { email } | ResetTicket::Verified { email, .. } => email.clone(),
            ResetTicket::None => {
                return Err(GatewayError::rejected("Request a reset code first"))
            }
        };

        self.post(
            "email-otp/check-verification-otp",
            &CheckOtpBody { email: &email, otp: code, kind: RESET_OTP_TYPE },
        )
        .await?;

        *self.reset.lock().await = ResetTicket::Verified { email, code: code.to_string() };
        Ok(())
    }

    async fn adopt_reset(&self, email: &str, code: &str) -> GatewayResult<()> {
        *self.reset.lock().await = ResetTicket::Verified {
            email: email.to_string(),
            code: code.to_string(),
        };
        Ok(())
    }

    async fn reset_password(&self, new_password: &str) -> GatewayResult<()> {
        let (email, code) = match &*self.reset.lock().await {
            ResetTicket::Verified { email, code } => (email.clone(), code.clone()),
            _ => return Err(GatewayError::rejected("Verify your reset code first")),
        };

        self.post(
            "email-otp/reset-password",
            &ResetPasswordBody { email: &email, otp: &code, password: new_password },
        )
        .await?;

        *self.reset.lock().await = ResetTicket::None;
        tracing::info!("password reset completed");
        Ok(())
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        let token = self.token.read().await.clone();
        let request = ApiRequest::post("sign-out").bearer(token.as_deref());

        match self.client.send::<serde_json::Value>(request).await {
            Ok(_) => {}
            // The token is already dead on the server; finish locally
            Err(e) if e.status() == 401 => {
                tracing::debug!("sign-out with an expired token");
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = self.clear_credentials().await {
            tracing::warn!(error = %e, "failed to clear stored credentials");
        }
        tracing::info!("signed out");
        Ok(())
    }

    async fn current_session(&self) -> GatewayResult<Option<Session>> {
        let token = self.token.read().await.clone();
        if token.is_none() {
            return Ok(None);
        }

        let request = ApiRequest::get("get-session").bearer(token.as_deref());
        match self.client.send::<Option<SessionLookup>>(request).await {
            Ok(response) => Ok(response.data.as_ref().map(Session::from)),
            Err(e) if e.status() == 401 => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::MemoryStore;

    fn gateway() -> (RemoteAuthGateway, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
        (RemoteAuthGateway::new(config, store.clone()).unwrap(), store)
    }

    #[tokio::test]
    async fn test_new_gateway_has_no_session() {
        let (gateway, _store) = gateway();
        assert!(!gateway.has_token().await);
        assert!(gateway.current_session().await.unwrap().is_none());
        assert!(gateway.restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_verify_without_code_is_rejected() {
        let (gateway, _store) = gateway();
        let err = gateway.verify_code("123456").await.unwrap_err();
        assert_eq!(err.kind(), GatewayErrorKind::Rejected);
        assert!(err.message().is_some());
    }

    #[tokio::test]
    async fn test_reset_without_verification_is_rejected() {
        let (gateway, _store) = gateway();
        *gateway.reset.lock().await = ResetTicket::CodeSent { email: "a@b.co".to_string() };

        let err = gateway.reset_password("newpassword").await.unwrap_err();
        assert_eq!(err.kind(), GatewayErrorKind::Rejected);
    }

    #[tokio::test]
    async fn test_resend_without_send_is_rejected() {
        let (gateway, _store) = gateway();
        let err = gateway.resend_reset_code().await.unwrap_err();
        assert_eq!(err.kind(), GatewayErrorKind::Rejected);
    }

    #[tokio::test]
    async fn test_establish_requires_token() {
        let (gateway, store) = gateway();
        let response: AuthResponse = serde_json::from_str(
            r#"{"token": null, "user": {"id": "u1", "name": "A", "email": "a@b.co"}}"#,
        )
        .unwrap();

        let err = gateway.establish(response).await.unwrap_err();
        assert_eq!(err.kind(), GatewayErrorKind::InvalidResponse);
        assert!(err.message().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_establish_persists_credentials() {
        let (gateway, store) = gateway();
        let response: AuthResponse = serde_json::from_str(
            r#"{"token": "tok_1", "user": {"id": "u1", "name": "A", "email": "a@b.co"}}"#,
        )
        .unwrap();

        let session = gateway.establish(response).await.unwrap();
        assert_eq!(session.user_id, "u1");
        assert!(gateway.has_token().await);
        assert_eq!(
            store.get("outfitplanner_session_token").await.unwrap(),
            Some("tok_1".to_string())
        );
        assert!(store.get("outfitplanner_session").await.unwrap().is_some());
    }
}

//! Session state shared across screens
//!
//! `SessionObserver` is the single holder of the signed-in identity. Screens
//! read it and subscribe to it; only `SessionBoundGateway` writes it: once at
//! startup with the restored session, then after each successful sign-in,
//! sign-up or sign-out, so the new value is visible to every observer before
//! the caller gets the result back.

use async_trait::async_trait;
use auth_client::{
    AuthGateway, GatewayError, GatewayResult, Session, SignInCredentials, SignUpDetails,
};
use std::sync::Arc;
use tokio::sync::watch;

/// Session-related errors
#[derive(Debug, thiserror::Error)]
pub enum SessionStateError {
    /// Gateway error while refreshing the session
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// No current session
    #[error("No current session")]
    NoCurrentSession,
}

/// Result type for session state operations
pub type Result<T> = std::result::Result<T, SessionStateError>;

/// Process-wide view of the signed-in identity
///
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct SessionObserver {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl SessionObserver {
    /// Create a signed-out observer
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// The current session
    ///
    /// A session past its expiry reads as signed out.
    pub fn current(&self) -> Option<Session> {
        self.tx
            .borrow()
            .as_ref()
            .filter(|session| !session.is_expired())
            .cloned()
    }

    /// Whether someone is signed in
    pub fn is_signed_in(&self) -> bool {
        self.current().is_some()
    }

    /// The current session, or an error when signed out
    pub fn require(&self) -> Result<Session> {
        self.current().ok_or(SessionStateError::NoCurrentSession)
    }

    /// Register for change notifications
    ///
    /// The receiver starts at the current value; every publish marks it changed.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    fn publish(&self, session: Option<Session>) {
        match &session {
            Some(s) => tracing::debug!(user_id = %s.user_id, "session published"),
            None => tracing::debug!("session cleared"),
        }
        self.tx.send_replace(session);
    }
}

impl Default for SessionObserver {
    fn default() -> Self {
        Self::new()
    }
}

/// Gateway decorator that keeps a `SessionObserver` in step with the service
pub struct SessionBoundGateway<G> {
    inner: G,
    observer: SessionObserver,
}

impl<G: AuthGateway> SessionBoundGateway<G> {
    /// Bind a gateway to an observer
    pub fn new(inner: G, observer: SessionObserver) -> Self {
        Self { inner, observer }
    }

    /// Bind a gateway and publish the session restored from persisted
    /// credentials at startup (`None` when nothing was restored)
    pub fn restored(inner: G, observer: SessionObserver, session: Option<Session>) -> Self {
        observer.publish(session);
        Self { inner, observer }
    }

    /// The observer this gateway publishes to
    pub fn observer(&self) -> &SessionObserver {
        &self.observer
    }

    /// The wrapped gateway
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Ask the service for the current session and publish it
    pub async fn refresh(&self) -> Result<Option<Session>> {
        let session = self.inner.current_session().await?;
        self.observer.publish(session.clone());
        Ok(session)
    }
}

#[async_trait]
impl<G: AuthGateway> AuthGateway for SessionBoundGateway<G> {
    async fn sign_in(&self, credentials: &SignInCredentials) -> GatewayResult<Session> {
        let session = self.inner.sign_in(credentials).await?;
        self.observer.publish(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, details: &SignUpDetails) -> GatewayResult<Session> {
        let session = self.inner.sign_up(details).await?;
        self.observer.publish(Some(session.clone()));
        Ok(session)
    }

    async fn send_reset_code(&self, email: &str) -> GatewayResult<()> {
        self.inner.send_reset_code(email).await
    }

    async fn resend_reset_code(&self) -> GatewayResult<()> {
        self.inner.resend_reset_code().await
    }

    async fn verify_code(&self, code: &str) -> GatewayResult<()> {
        self.inner.verify_code(code).await
    }

    async fn adopt_reset(&self, email: &str, code: &str) -> GatewayResult<()> {
        self.inner.adopt_reset(email, code).await
    }

    async fn reset_password(&self, new_password: &str) -> GatewayResult<()> {
        self.inner.reset_password(new_password).await
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        self.inner.sign_out().await?;
        self.observer.publish(None);
        Ok(())
    }

    async fn current_session(&self) -> GatewayResult<Option<Session>> {
        self.inner.current_session().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_client::testing::{credentials, errors, sessions, GatewayCall, ScriptedGateway};
    use auth_client::MockAuthGateway;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_observer_starts_signed_out() {
        let observer = SessionObserver::new();
        assert!(observer.current().is_none());
        assert!(!observer.is_signed_in());
        assert!(matches!(observer.require(), Err(SessionStateError::NoCurrentSession)));
    }

    #[test]
    fn test_expired_session_reads_as_signed_out() {
        let observer = SessionObserver::new();
        let an_hour_ago = SystemTime::now() - Duration::from_secs(3600);
        let expired = sessions::alice().with_expiry(an_hour_ago.into());
        observer.publish(Some(expired));
        assert!(!observer.is_signed_in());
    }

    #[tokio::test]
    async fn test_sign_in_publishes_before_returning() {
        let observer = SessionObserver::new();
        let mut rx = observer.subscribe();
        let gateway = SessionBoundGateway::new(ScriptedGateway::new(), observer.clone());

        let session = gateway.sign_in(&credentials::valid()).await.unwrap();

        // Already visible, no await needed
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref(), Some(&session));
        assert_eq!(observer.current(), Some(session));
    }

    #[tokio::test]
    async fn test_failed_sign_in_leaves_session_untouched() {
        let observer = SessionObserver::new();
        let scripted = ScriptedGateway::new();
        scripted.fail(GatewayCall::SignIn, errors::invalid_credentials());
        let gateway = SessionBoundGateway::new(scripted, observer.clone());
        let rx = observer.subscribe();

        assert!(gateway.sign_in(&credentials::valid()).await.is_err());
        assert!(!rx.has_changed().unwrap());
        assert!(!observer.is_signed_in());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let observer = SessionObserver::new();
        let gateway = SessionBoundGateway::new(ScriptedGateway::new(), observer.clone());

        gateway.sign_up(&credentials::new_account()).await.unwrap();
        assert!(observer.is_signed_in());

        gateway.sign_out().await.unwrap();
        assert!(!observer.is_signed_in());
    }

    #[tokio::test]
    async fn test_failed_sign_out_keeps_session() {
        let observer = SessionObserver::new();
        let scripted = ScriptedGateway::new();
        let gateway = SessionBoundGateway::new(scripted, observer.clone());
        gateway.sign_in(&credentials::valid()).await.unwrap();

        gateway.inner().fail(GatewayCall::SignOut, errors::network());
        assert!(gateway.sign_out().await.is_err());
        assert!(observer.is_signed_in());
    }

    #[tokio::test]
    async fn test_reset_operations_do_not_touch_session() {
        let mut mock = MockAuthGateway::new();
        mock.expect_verify_code().times(1).returning(|_| Ok(()));
        mock.expect_send_reset_code().times(1).returning(|_| Ok(()));

        let observer = SessionObserver::new();
        let rx = observer.subscribe();
        let gateway = SessionBoundGateway::new(mock, observer);

        gateway.send_reset_code("user@test.com").await.unwrap();
        gateway.verify_code("123456").await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_restored_then_refresh() {
        let observer = SessionObserver::new();
        let scripted = ScriptedGateway::new().with_session(sessions::bob());
        let gateway =
            SessionBoundGateway::restored(scripted, observer.clone(), Some(sessions::alice()));
        assert_eq!(observer.current(), Some(sessions::alice()));

        let refreshed = gateway.refresh().await.unwrap();
        assert_eq!(refreshed, Some(sessions::bob()));
        assert_eq!(observer.current(), Some(sessions::bob()));
    }
}

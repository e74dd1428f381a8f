//! The authentication gateway boundary
//!
//! `AuthGateway` is everything the auth screens need from the remote service.
//! Screens never talk HTTP directly: they get a gateway (remote, demo, or a
//! test double) and turn its results into submission state.

use async_trait::async_trait;
use std::sync::Arc;

use crate::http::HttpError;
use crate::session::Session;

/// Broad class of a gateway failure
///
/// The workflow layer only surfaces `GatewayError::message`, but keeps the kind
/// so retry policy can be specialised later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// No usable response (connection, timeout, rate limit, gateway errors)
    Network,
    /// The service understood and refused the request (bad credentials, wrong code)
    Rejected,
    /// The service failed internally
    Server,
    /// The service answered with something we could not interpret
    InvalidResponse,
    /// The operation is not available on this gateway
    Unsupported,
}

/// Failure reported by an `AuthGateway` operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    kind: GatewayErrorKind,
    status: Option<u16>,
    code: Option<String>,
    message: Option<String>,
    detail: Option<String>,
}

impl GatewayError {
    /// Create an error of the given kind with no details
    pub fn new(kind: GatewayErrorKind) -> Self {
        Self { kind, status: None, code: None, message: None, detail: None }
    }

    /// A refusal carrying a user-facing message
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Rejected).with_message(message)
    }

    /// A network failure with a diagnostic detail (never shown to users)
    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Network).with_detail(detail)
    }

    /// An operation this gateway does not implement
    pub fn unsupported(operation: &str) -> Self {
        Self::new(GatewayErrorKind::Unsupported)
            .with_detail(format!("{operation} is not supported by this gateway"))
    }

    /// Attach a user-facing message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach a diagnostic detail
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach a machine-readable code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Failure class
    pub fn kind(&self) -> GatewayErrorKind {
        self.kind
    }

    /// HTTP status, when the failure came from a response
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Machine-readable code from the service
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Human-readable reason from the service, if it gave one
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }

    /// Diagnostic detail for logs
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Whether resubmitting unchanged input could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, GatewayErrorKind::Network | GatewayErrorKind::Server)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} gateway error", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " ({status})")?;
        }
        if let Some(text) = self.message().or(self.detail()) {
            write!(f, ": {text}")?;
        }
        Ok(())
    }
}

impl std::error::Error for GatewayError {}

impl From<HttpError> for GatewayError {
    fn from(err: HttpError) -> Self {
        let kind = match err.status() {
            _ if err.is_decode_error() => GatewayErrorKind::InvalidResponse,
            _ if err.is_network_error() => GatewayErrorKind::Network,
            400..=499 => GatewayErrorKind::Rejected,
            500..=599 => GatewayErrorKind::Server,
            _ => GatewayErrorKind::InvalidResponse,
        };

        Self {
            kind,
            status: (err.status() != 0).then_some(err.status()),
            code: err.code().map(str::to_string),
            message: err.message().map(str::to_string),
            detail: err.detail().map(str::to_string),
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Sign-in input
#[derive(Clone, PartialEq, Eq)]
pub struct SignInCredentials {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

impl std::fmt::Debug for SignInCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sign-up input
#[derive(Clone, PartialEq, Eq)]
pub struct SignUpDetails {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

impl std::fmt::Debug for SignUpDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpDetails")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Remote authentication service boundary
///
/// Sign-in, sign-up and sign-out are the only operations that change who is
/// signed in. The password-reset operations form a flow: `send_reset_code`
/// picks the account, `verify_code` proves ownership, `reset_password` sets
/// the new password. `adopt_reset` hands a gateway a reset whose code was
/// checked somewhere else, so its `reset_password` can finish it.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Sign in with email and password
    async fn sign_in(&self, credentials: &SignInCredentials) -> GatewayResult<Session>;

    /// Create an account and sign in to it
    async fn sign_up(&self, details: &SignUpDetails) -> GatewayResult<Session>;

    /// Email a password-reset code
    async fn send_reset_code(&self, email: &str) -> GatewayResult<()>;

    /// Email a fresh code for the reset already in progress
    async fn resend_reset_code(&self) -> GatewayResult<()>;

    /// Check a reset code
    async fn verify_code(&self, code: &str) -> GatewayResult<()>;

    /// Take over a reset for `email` whose `code` was already verified
    async fn adopt_reset(&self, email: &str, code: &str) -> GatewayResult<()>;

    /// Set a new password for the verified reset
    async fn reset_password(&self, new_password: &str) -> GatewayResult<()>;

    /// End the current session
    async fn sign_out(&self) -> GatewayResult<()>;

    /// Look up the session the service currently honours
    async fn current_session(&self) -> GatewayResult<Option<Session>>;
}

#[async_trait]
impl<T: AuthGateway + ?Sized> AuthGateway for Arc<T> {
    async fn sign_in(&self, credentials: &SignInCredentials) -> GatewayResult<Session> {
        (**self).sign_in(credentials).await
    }

    async fn sign_up(&self, details: &SignUpDetails) -> GatewayResult<Session> {
        (**self).sign_up(details).await
    }

    async fn send_reset_code(&self, email: &str) -> GatewayResult<()> {
        (**self).send_reset_code(email).await
    }

    async fn resend_reset_code(&self) -> GatewayResult<()> {
        (**self).resend_reset_code().await
    }

    async fn verify_code(&self, code: &str) -> GatewayResult<()> {
        (**self).verify_code(code).await
    }

    async fn adopt_reset(&self, email: &str, code: &str) -> GatewayResult<()> {
        (**self).adopt_reset(email, code).await
    }

    async fn reset_password(&self, new_password: &str) -> GatewayResult<()> {
        (**self).reset_password(new_password).await
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        (**self).sign_out().await
    }

    async fn current_session(&self) -> GatewayResult<Option<Session>> {
        (**self).current_session().await
    }
}

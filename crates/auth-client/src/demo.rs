//! Demo password-reset flow
//!
//! The app ships with a reset flow whose code delivery does not reach the
//! service: sending a code always works after a short delay and only
//! [`DEMO_RESET_CODE`] verifies. Setting the new password is real: the demo
//! hands the email and the verified code to the wrapped gateway through
//! [`AuthGateway::adopt_reset`] and forwards `reset_password` to it, so the
//! service has the final say. Every other operation forwards unchanged.
//!
//! This is a stand-in for a real OTP backend and must not be treated as
//! authoritative.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::gateway::{
    AuthGateway, GatewayError, GatewayResult, SignInCredentials, SignUpDetails,
};
use crate::session::Session;

/// The only code the demo flow accepts
pub const DEMO_RESET_CODE: &str = "123456";

/// Simulated round-trip time of the demo operations
pub const DEMO_LATENCY: Duration = Duration::from_millis(1500);

/// Message returned for any other code
pub const INVALID_CODE_MESSAGE: &str = "Invalid OTP code. Please try again.";

/// Message returned when a new password is chosen before a code verified
pub const NOT_VERIFIED_MESSAGE: &str = "Verify your reset code first";

/// What the demo knows about the reset in progress
#[derive(Debug, Default)]
struct DemoTicket {
    email: Option<String>,
    verified_code: Option<String>,
}

/// Gateway decorator that fakes reset-code delivery and checking
#[derive(Debug)]
pub struct DemoResetFlow<G> {
    inner: G,
    latency: Duration,
    accepted_code: String,
    ticket: Mutex<DemoTicket>,
}

impl<G: AuthGateway> DemoResetFlow<G> {
    /// Wrap a gateway
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            latency: DEMO_LATENCY,
            accepted_code: DEMO_RESET_CODE.to_string(),
            ticket: Mutex::new(DemoTicket::default()),
        }
    }

    /// Set the simulated latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Set the code that verifies
    pub fn with_accepted_code(mut self, code: impl Into<String>) -> Self {
        self.accepted_code = code.into();
        self
    }

    /// The wrapped gateway
    pub fn inner(&self) -> &G {
        &self.inner
    }

    async fn simulate(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl<G: AuthGateway> AuthGateway for DemoResetFlow<G> {
    async fn sign_in(&self, credentials: &SignInCredentials) -> GatewayResult<Session> {
        self.inner.sign_in(credentials).await
    }

    async fn sign_up(&self, details: &SignUpDetails) -> GatewayResult<Session> {
        self.inner.sign_up(details).await
    }

    async fn send_reset_code(&self, email: &str) -> GatewayResult<()> {
        tracing::debug!(%email, "demo reset code requested");
        self.simulate().await;
        *self.ticket.lock().await = DemoTicket {
            email: Some(email.to_string()),
            verified_code: None,
        };
        Ok(())
    }

    async fn resend_reset_code(&self) -> GatewayResult<()> {
        self.simulate().await;
        Ok(())
    }

    async fn verify_code(&self, code: &str) -> GatewayResult<()> {
        self.simulate().await;
        if code != self.accepted_code {
            return Err(GatewayError::rejected(INVALID_CODE_MESSAGE));
        }
        self.ticket.lock().await.verified_code = Some(code.to_string());
        Ok(())
    }

    async fn adopt_reset(&self, email: &str, code: &str) -> GatewayResult<()> {
        *self.ticket.lock().await = DemoTicket {
            email: Some(email.to_string()),
            verified_code: Some(code.to_string()),
        };
        Ok(())
    }

    async fn reset_password(&self, new_password: &str) -> GatewayResult<()> {
        let (email, code) = {
            let ticket = self.ticket.lock().await;
            match (&ticket.email, &ticket.verified_code) {
                (Some(email), Some(code)) => (email.clone(), code.clone()),
                _ => return Err(GatewayError::rejected(NOT_VERIFIED_MESSAGE)),
            }
        };

        self.inner.adopt_reset(&email, &code).await?;
        self.inner.reset_password(new_password).await?;
        *self.ticket.lock().await = DemoTicket::default();
        Ok(())
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        self.inner.sign_out().await
    }

    async fn current_session(&self) -> GatewayResult<Option<Session>> {
        self.inner.current_session().await
    }
}

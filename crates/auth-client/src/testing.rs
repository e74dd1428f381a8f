//! Test doubles and fixtures for code built on `AuthGateway`
//!
//! `ScriptedGateway` answers every operation from a per-operation queue of
//! results (falling back to success), records each call, and can hold every
//! answer behind a fixed latency so overlapping submissions can be observed
//! under tokio's paused clock.

#![allow(dead_code)] // Not every fixture is used by every test target

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::gateway::{
    AuthGateway, GatewayError, GatewayErrorKind, GatewayResult, SignInCredentials, SignUpDetails,
};
use crate::session::Session;

/// Gateway operation, as recorded by `ScriptedGateway`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayCall {
    /// `sign_in`
    SignIn,
    /// `sign_up`
    SignUp,
    /// `send_reset_code`
    SendResetCode,
    /// `resend_reset_code`
    ResendResetCode,
    /// `verify_code`
    VerifyCode,
    /// `adopt_reset`
    AdoptReset,
    /// `reset_password`
    ResetPassword,
    /// `sign_out`
    SignOut,
    /// `current_session`
    CurrentSession,
}

#[derive(Default)]
struct Script {
    session: Option<Session>,
    sessions: HashMap<GatewayCall, VecDeque<GatewayResult<Session>>>,
    units: HashMap<GatewayCall, VecDeque<GatewayResult<()>>>,
    calls: Vec<(GatewayCall, String)>,
}

/// Scripted `AuthGateway` for tests
#[derive(Default)]
pub struct ScriptedGateway {
    latency: Duration,
    script: Mutex<Script>,
}

impl ScriptedGateway {
    /// A gateway where every operation succeeds immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every answer
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Start with a signed-in session
    pub fn with_session(self, session: Session) -> Self {
        self.script.lock().unwrap().session = Some(session);
        self
    }

    /// Queue the next `sign_in` result
    pub fn push_sign_in(&self, result: GatewayResult<Session>) -> &Self {
        self.push_session(GatewayCall::SignIn, result)
    }

    /// Queue the next `sign_up` result
    pub fn push_sign_up(&self, result: GatewayResult<Session>) -> &Self {
        self.push_session(GatewayCall::SignUp, result)
    }

    /// Queue the next result of an operation that returns nothing
    ///
    /// Panics for `SignIn`, `SignUp` and `CurrentSession`.
    pub fn push(&self, call: GatewayCall, result: GatewayResult<()>) -> &Self {
        assert!(
            !matches!(
                call,
                GatewayCall::SignIn | GatewayCall::SignUp | GatewayCall::CurrentSession
            ),
            "{call:?} returns a session; use push_sign_in or push_sign_up"
        );
        self.script
            .lock()
            .unwrap()
            .units
            .entry(call)
            .or_default()
            .push_back(result);
        self
    }

    /// Queue a failure for the next call of any operation
    pub fn fail(&self, call: GatewayCall, error: GatewayError) -> &Self {
        match call {
            GatewayCall::SignIn | GatewayCall::SignUp => self.push_session(call, Err(error)),
            GatewayCall::CurrentSession => {
                panic!("current_session reads the scripted session; use with_session")
            }
            _ => self.push(call, Err(error)),
        }
    }

    fn push_session(&self, call: GatewayCall, result: GatewayResult<Session>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .sessions
            .entry(call)
            .or_default()
            .push_back(result);
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.script.lock().unwrap().calls.iter().map(|(c, _)| *c).collect()
    }

    /// How many times an operation was called
    pub fn call_count(&self, call: GatewayCall) -> usize {
        self.script
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(c, _)| *c == call)
            .count()
    }

    /// The argument of the most recent call of an operation
    ///
    /// Sign-in and sign-up record the email; the reset operations record the
    /// email, code or new password they were given.
    pub fn last_argument(&self, call: GatewayCall) -> Option<String> {
        self.script
            .lock()
            .unwrap()
            .calls
            .iter()
            .rev()
            .find(|(c, _)| *c == call)
            .map(|(_, arg)| arg.clone())
    }

    /// The session the gateway currently considers signed in
    pub fn session(&self) -> Option<Session> {
        self.script.lock().unwrap().session.clone()
    }

    async fn answer_session(
        &self,
        call: GatewayCall,
        argument: String,
        default: impl FnOnce() -> Session,
    ) -> GatewayResult<Session> {
        let scripted = {
            let mut script = self.script.lock().unwrap();
            script.calls.push((call, argument));
            script.sessions.get_mut(&call).and_then(VecDeque::pop_front)
        };

        self.wait().await;

        let result = scripted.unwrap_or_else(|| Ok(default()));
        if let Ok(session) = &result {
            self.script.lock().unwrap().session = Some(session.clone());
        }
        result
    }

    async fn answer(&self, call: GatewayCall, argument: String) -> GatewayResult<()> {
        let scripted = {
            let mut script = self.script.lock().unwrap();
            script.calls.push((call, argument));
            script.units.get_mut(&call).and_then(VecDeque::pop_front)
        };

        self.wait().await;
        scripted.unwrap_or(Ok(()))
    }

    async fn wait(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl AuthGateway for ScriptedGateway {
    async fn sign_in(&self, credentials: &SignInCredentials) -> GatewayResult<Session> {
        let email = credentials.email.clone();
        self.answer_session(GatewayCall::SignIn, email.clone(), || sessions::for_email(&email))
            .await
    }

    async fn sign_up(&self, details: &SignUpDetails) -> GatewayResult<Session> {
        let (name, email) = (details.name.clone(), details.email.clone());
        self.answer_session(GatewayCall::SignUp, email.clone(), || {
            Session::new(format!("user-{email}"), name, email.clone())
        })
        .await
    }

    async fn send_reset_code(&self, email: &str) -> GatewayResult<()> {
        self.answer(GatewayCall::SendResetCode, email.to_string()).await
    }

    async fn resend_reset_code(&self) -> GatewayResult<()> {
        self.answer(GatewayCall::ResendResetCode, String::new()).await
    }

    async fn verify_code(&self, code: &str) -> GatewayResult<()> {
        self.answer(GatewayCall::VerifyCode, code.to_string()).await
    }

    async fn adopt_reset(&self, email: &str, code: &str) -> GatewayResult<()> {
        self.answer(GatewayCall::AdoptReset, format!("{email} {code}")).await
    }

    async fn reset_password(&self, new_password: &str) -> GatewayResult<()> {
        self.answer(GatewayCall::ResetPassword, new_password.to_string()).await
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        let result = self.answer(GatewayCall::SignOut, String::new()).await;
        if result.is_ok() {
            self.script.lock().unwrap().session = None;
        }
        result
    }

    async fn current_session(&self) -> GatewayResult<Option<Session>> {
        self.script
            .lock()
            .unwrap()
            .calls
            .push((GatewayCall::CurrentSession, String::new()));
        Ok(self.session())
    }
}

/// Test sessions
pub mod sessions {
    use super::*;

    /// Alice's session
    pub fn alice() -> Session {
        Session::new("user-alice", "Alice", "alice@example.com")
    }

    /// Bob's session
    pub fn bob() -> Session {
        Session::new("user-bob", "Bob", "bob@example.com")
    }

    /// Session for an arbitrary email (name is the local part)
    pub fn for_email(email: &str) -> Session {
        let name = email.split('@').next().unwrap_or(email);
        Session::new(format!("user-{email}"), name, email)
    }
}

/// Test credentials
pub mod credentials {
    use super::*;

    /// Credentials that pass form validation
    pub fn valid() -> SignInCredentials {
        SignInCredentials {
            email: "user@test.com".to_string(),
            password: "validpass".to_string(),
        }
    }

    /// Sign-up details that pass form validation
    pub fn new_account() -> SignUpDetails {
        SignUpDetails {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "supersecret".to_string(),
        }
    }
}

/// Test gateway errors
pub mod errors {
    use super::*;

    /// The service refused the credentials
    pub fn invalid_credentials() -> GatewayError {
        GatewayError::rejected("Invalid email or password").with_code("INVALID_EMAIL_OR_PASSWORD")
    }

    /// The account already exists
    pub fn user_exists() -> GatewayError {
        GatewayError::rejected("User already exists").with_code("USER_ALREADY_EXISTS")
    }

    /// Connection failure with no user-facing message
    pub fn network() -> GatewayError {
        GatewayError::network("connection refused")
    }

    /// Server failure with no user-facing message
    pub fn server() -> GatewayError {
        GatewayError::new(GatewayErrorKind::Server)
    }
}

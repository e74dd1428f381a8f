//! Authentication operations
//!
//! Each screen of the auth flow is a `FormWorkflowController` over one of the
//! operations below. They differ only in their fields, the gateway call and
//! where success leads.
//!
//! | operation       | fields                                   | on success                      |
//! |-----------------|------------------------------------------|---------------------------------|
//! | `SignIn`        | email, password                          | replace with main area          |
//! | `SignUp`        | name, email, password, confirm_password  | replace with main area          |
//! | `SendResetCode` | email                                    | push code entry after 2 s       |
//! | `VerifyCode`    | code                                     | replace with new-password entry |
//! | `ResetPassword` | password, confirm_password               | replace with sign-in            |
//! | `SignOut`       | none                                     | replace with sign-in            |
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use app_core::auth::{SignIn, SignInController};
//! use app_core::intent::navigation_channel;
//! use app_core::scope::ScreenScope;
//! use auth_client::AuthGateway;
//!
//! async fn login(gateway: Arc<dyn AuthGateway>) {
//!     let (sink, mut intents) = navigation_channel();
//!     let screen = SignInController::new(SignIn, gateway, sink, ScreenScope::mount("login"));
//!
//!     screen.set_field("email", "user@test.com").unwrap();
//!     screen.set_field("password", "validpass").unwrap();
//!     screen.submit().await;
//!
//!     if let Ok(intent) = intents.try_recv() {
//!         println!("navigate to {:?}", intent.destination);
//!     }
//! }
//! ```

use async_trait::async_trait;
use auth_client::{AuthGateway, GatewayResult, SignInCredentials, SignUpDetails};
use std::time::Duration;

use crate::intent::Destination;
use crate::validation::{FieldSpec, ValidatedFields, ValidationSchema};
use crate::workflow::{AuthOperation, FormWorkflowController, SuccessNavigation};

/// Field names shared by the auth forms
pub mod fields {
    /// Display name
    pub const NAME: &str = "name";
    /// Email address
    pub const EMAIL: &str = "email";
    /// Password (or new password)
    pub const PASSWORD: &str = "password";
    /// Password confirmation
    pub const CONFIRM_PASSWORD: &str = "confirm_password";
    /// Reset code
    pub const CODE: &str = "code";
}

/// Minimum password length for new passwords
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Length of a reset code
pub const RESET_CODE_LENGTH: usize = 6;

/// Pause between "code sent" and the code entry screen
pub const CODE_SENT_NAVIGATION_DELAY: Duration = Duration::from_secs(2);

fn email_field(f: FieldSpec) -> FieldSpec {
    f.required("Email is required")
        .email("Please enter a valid email address")
}

fn new_password_field(f: FieldSpec) -> FieldSpec {
    f.required("Password is required").min_length(
        MIN_PASSWORD_LENGTH,
        format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
    )
}

fn confirm_password_field(f: FieldSpec) -> FieldSpec {
    f.required("Please confirm your password")
        .matches(fields::PASSWORD, "Passwords don't match")
}

// ===== Sign in =====

/// Sign in with email and password
#[derive(Debug, Clone, Copy, Default)]
pub struct SignIn;

#[async_trait]
impl AuthOperation for SignIn {
    type Payload = SignInCredentials;

    fn name(&self) -> &'static str {
        "sign_in"
    }

    fn schema(&self) -> ValidationSchema {
        // Existing passwords predate the length rule, so only presence is checked
        ValidationSchema::new()
            .field(fields::EMAIL, email_field)
            .field(fields::PASSWORD, |f| f.required("Password is required"))
    }

    fn payload(&self, input: &ValidatedFields) -> SignInCredentials {
        SignInCredentials {
            email: input.take(fields::EMAIL),
            password: input.take(fields::PASSWORD),
        }
    }

    async fn perform(
        &self,
        gateway: &dyn AuthGateway,
        credentials: &SignInCredentials,
    ) -> GatewayResult<()> {
        gateway.sign_in(credentials).await.map(|_| ())
    }

    fn on_success(&self) -> Option<SuccessNavigation> {
        Some(SuccessNavigation::replace(Destination::MainArea))
    }

    fn fallback_message(&self) -> &'static str {
        "Failed to sign in"
    }
}

// ===== Sign up =====

/// Create an account
#[derive(Debug, Clone, Copy, Default)]
pub struct SignUp;

#[async_trait]
impl AuthOperation for SignUp {
    type Payload = SignUpDetails;

    fn name(&self) -> &'static str {
        "sign_up"
    }

    fn schema(&self) -> ValidationSchema {
        ValidationSchema::new()
            .field(fields::NAME, |f| f.required("Name is required"))
            .field(fields::EMAIL, email_field)
            .field(fields::PASSWORD, new_password_field)
            .field(fields::CONFIRM_PASSWORD, confirm_password_field)
    }

    fn payload(&self, input: &ValidatedFields) -> SignUpDetails {
        SignUpDetails {
            name: input.get(fields::NAME).trim().to_string(),
            email: input.take(fields::EMAIL),
            password: input.take(fields::PASSWORD),
        }
    }

    async fn perform(&self, gateway: &dyn AuthGateway, details: &SignUpDetails) -> GatewayResult<()> {
        gateway.sign_up(details).await.map(|_| ())
    }

    fn on_success(&self) -> Option<SuccessNavigation> {
        Some(SuccessNavigation::replace(Destination::MainArea))
    }

    fn fallback_message(&self) -> &'static str {
        "Failed to sign up"
    }
}

// ===== Password reset =====

/// Email a reset code
#[derive(Debug, Clone, Copy, Default)]
pub struct SendResetCode;

#[async_trait]
impl AuthOperation for SendResetCode {
    type Payload = String;

    fn name(&self) -> &'static str {
        "send_reset_code"
    }

    fn schema(&self) -> ValidationSchema {
        ValidationSchema::new().field(fields::EMAIL, email_field)
    }

    fn payload(&self, input: &ValidatedFields) -> String {
        input.take(fields::EMAIL)
    }

    async fn perform(&self, gateway: &dyn AuthGateway, email: &String) -> GatewayResult<()> {
        gateway.send_reset_code(email).await
    }

    fn on_success(&self) -> Option<SuccessNavigation> {
        Some(SuccessNavigation::push(Destination::VerifyCode).after(CODE_SENT_NAVIGATION_DELAY))
    }

    fn fallback_message(&self) -> &'static str {
        "Failed to send reset code"
    }
}

/// Check a reset code
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyCode;

#[async_trait]
impl AuthOperation for VerifyCode {
    type Payload = String;

    fn name(&self) -> &'static str {
        "verify_code"
    }

    fn schema(&self) -> ValidationSchema {
        ValidationSchema::new().field(fields::CODE, |f| {
            f.required("Please enter the verification code")
                .exact_length(
                    RESET_CODE_LENGTH,
                    format!("Code must be {RESET_CODE_LENGTH} digits"),
                )
                .digits("Code must contain only digits")
        })
    }

    fn payload(&self, input: &ValidatedFields) -> String {
        input.take(fields::CODE)
    }

    async fn perform(&self, gateway: &dyn AuthGateway, code: &String) -> GatewayResult<()> {
        gateway.verify_code(code).await
    }

    fn on_success(&self) -> Option<SuccessNavigation> {
        Some(SuccessNavigation::replace(Destination::ResetPassword))
    }

    fn fallback_message(&self) -> &'static str {
        "Failed to verify OTP"
    }
}

/// Set a new password after verification
#[derive(Debug, Clone, Copy, Default)]
pub struct ResetPassword;

#[async_trait]
impl AuthOperation for ResetPassword {
    type Payload = String;

    fn name(&self) -> &'static str {
        "reset_password"
    }

    fn schema(&self) -> ValidationSchema {
        ValidationSchema::new()
            .field(fields::PASSWORD, new_password_field)
            .field(fields::CONFIRM_PASSWORD, confirm_password_field)
    }

    fn payload(&self, input: &ValidatedFields) -> String {
        input.take(fields::PASSWORD)
    }

    async fn perform(&self, gateway: &dyn AuthGateway, password: &String) -> GatewayResult<()> {
        gateway.reset_password(password).await
    }

    fn on_success(&self) -> Option<SuccessNavigation> {
        Some(SuccessNavigation::replace(Destination::SignIn))
    }

    fn fallback_message(&self) -> &'static str {
        "Failed to reset password"
    }
}

// ===== Sign out =====

/// End the session (settings screen)
#[derive(Debug, Clone, Copy, Default)]
pub struct SignOut;

#[async_trait]
impl AuthOperation for SignOut {
    type Payload = ();

    fn name(&self) -> &'static str {
        "sign_out"
    }

    fn schema(&self) -> ValidationSchema {
        ValidationSchema::new()
    }

    fn payload(&self, _fields: &ValidatedFields) {}

    async fn perform(&self, gateway: &dyn AuthGateway, _payload: &()) -> GatewayResult<()> {
        gateway.sign_out().await
    }

    fn on_success(&self) -> Option<SuccessNavigation> {
        Some(SuccessNavigation::replace(Destination::SignIn))
    }

    fn fallback_message(&self) -> &'static str {
        "Failed to sign out"
    }
}

/// Sign-in screen controller
pub type SignInController = FormWorkflowController<SignIn>;
/// Sign-up screen controller
pub type SignUpController = FormWorkflowController<SignUp>;
/// Forgot-password screen controller
pub type SendResetCodeController = FormWorkflowController<SendResetCode>;
/// New-password screen controller
pub type ResetPasswordController = FormWorkflowController<ResetPassword>;
/// Sign-out action controller
pub type SignOutController = FormWorkflowController<SignOut>;

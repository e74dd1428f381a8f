//! Core application logic for Outfit Planner
//!
//! This crate contains the auth screens' business logic: declarative form
//! validation, the reusable form workflow controller, the concrete sign-in,
//! sign-up, password-reset and sign-out operations, screen lifetimes and
//! navigation intents.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod forms;
pub mod intent;
pub mod otp;
pub mod scope;
pub mod validation;
pub mod workflow;

pub use auth::{
    ResetPassword, ResetPasswordController, SendResetCode, SendResetCodeController, SignIn,
    SignInController, SignOut, SignOutController, SignUp, SignUpController, VerifyCode,
};
pub use forms::{Form, FormError, FormField};
pub use intent::{
    navigation_channel, Destination, NavigationIntent, NavigationMode, NavigationReceiver,
    NavigationSink,
};
pub use otp::{OtpScreen, ResendCode};
pub use scope::{DeferredAction, ScreenScope};
pub use validation::{
    FieldErrors, FieldSpec, FieldValues, Rule, ValidatedFields, ValidationResult, ValidationSchema,
};
pub use workflow::{
    AuthOperation, FailureSource, FormWorkflowController, SubmitOutcome, SuccessNavigation,
};

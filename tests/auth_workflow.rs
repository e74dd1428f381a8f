//! Auth Workflow Integration Tests
//!
//! End-to-end tests of the auth screens: form validation, the submission state
//! machine, session publication and navigation, across the crates.

use std::sync::Arc;
use std::time::Duration;

use app_core::auth::{
    fields, ResetPassword, ResetPasswordController, SendResetCode, SendResetCodeController,
    SignIn, SignInController, SignOut, SignOutController, SignUp, SignUpController,
    CODE_SENT_NAVIGATION_DELAY,
};
use app_core::intent::{navigation_channel, Destination, NavigationMode, NavigationReceiver};
use app_core::otp::OtpScreen;
use app_core::scope::ScreenScope;
use app_core::workflow::SubmitOutcome;
use app_state::{SessionBoundGateway, SessionObserver, SubmissionState};
use app_ui::{AuthGate, NavigationOutcome, Navigator, Route};
use auth_client::demo::INVALID_CODE_MESSAGE;
use auth_client::testing::{errors, sessions, GatewayCall, ScriptedGateway};
use auth_client::{AuthGateway, DemoResetFlow, GatewayError};

struct Harness {
    scripted: Arc<ScriptedGateway>,
    gateway: Arc<dyn AuthGateway>,
    session: SessionObserver,
}

impl Harness {
    fn new(scripted: ScriptedGateway) -> Self {
        let scripted = Arc::new(scripted);
        let session = SessionObserver::new();
        let gateway: Arc<dyn AuthGateway> =
            Arc::new(SessionBoundGateway::new(scripted.clone(), session.clone()));
        Self { scripted, gateway, session }
    }

    /// Scripted service behind the demo reset flow, with no simulated latency
    fn with_demo_reset() -> Self {
        let scripted = Arc::new(ScriptedGateway::new());
        let session = SessionObserver::new();
        let demo = DemoResetFlow::new(scripted.clone()).with_latency(Duration::ZERO);
        let gateway: Arc<dyn AuthGateway> = Arc::new(SessionBoundGateway::new(demo, session.clone()));
        Self { scripted, gateway, session }
    }

    fn sign_in(&self) -> (SignInController, NavigationReceiver) {
        let (sink, rx) = navigation_channel();
        let screen = SignInController::new(SignIn, self.gateway.clone(), sink, ScreenScope::mount("login"));
        (screen, rx)
    }
}

// =============================================================================
// Sign-in / Sign-up
// =============================================================================

#[tokio::test]
async fn test_sign_in_scenario() {
    let harness = Harness::new(ScriptedGateway::new());
    let (screen, mut intents) = harness.sign_in();

    screen.set_field(fields::EMAIL, "user@test.com").unwrap();
    screen.set_field(fields::PASSWORD, "validpass").unwrap();

    assert_eq!(screen.submit().await, SubmitOutcome::Succeeded);
    assert_eq!(screen.state(), SubmissionState::Succeeded);
    assert_eq!(screen.field(fields::EMAIL).as_deref(), Some(""));
    assert_eq!(screen.field(fields::PASSWORD).as_deref(), Some(""));

    let intent = intents.try_recv().unwrap();
    assert_eq!(intent.destination, Destination::MainArea);
    assert_eq!(intent.mode, NavigationMode::Replace);
    assert!(intents.try_recv().is_err());

    let session = harness.session.current().unwrap();
    assert_eq!(session.email, "user@test.com");
}

#[tokio::test]
async fn test_session_published_before_navigation() {
    let harness = Harness::new(ScriptedGateway::new());
    let (screen, mut intents) = harness.sign_in();
    let mut navigator = Navigator::new(AuthGate::new(harness.session.clone()));
    assert_eq!(navigator.current(), Route::Login);

    screen.set_field(fields::EMAIL, "user@test.com").unwrap();
    screen.set_field(fields::PASSWORD, "validpass").unwrap();
    screen.submit().await;

    // The gate sees the new session when the intent arrives
    assert_eq!(
        navigator.drain(&mut intents),
        vec![NavigationOutcome::Navigated(Route::Home)]
    );
    assert_eq!(navigator.stack().routes(), vec![Route::Home]);
}

#[tokio::test]
async fn test_invalid_sign_in_never_reaches_gateway() {
    let harness = Harness::new(ScriptedGateway::new());
    let (screen, mut intents) = harness.sign_in();

    screen.set_field(fields::EMAIL, "not-an-email").unwrap();
    let outcome = screen.submit().await;

    let SubmitOutcome::Invalid(errors) = outcome else {
        panic!("expected validation errors, got {outcome:?}");
    };
    assert!(errors.contains_key(fields::EMAIL));
    assert!(errors.contains_key(fields::PASSWORD));
    assert_eq!(harness.scripted.calls().len(), 0);
    assert_eq!(screen.state(), SubmissionState::Idle);
    assert!(intents.try_recv().is_err());
    assert!(!harness.session.is_signed_in());
}

#[tokio::test]
async fn test_rejected_sign_in_keeps_fields() {
    let harness = Harness::new(ScriptedGateway::new());
    harness.scripted.fail(GatewayCall::SignIn, errors::invalid_credentials());
    let (screen, mut intents) = harness.sign_in();

    screen.set_field(fields::EMAIL, "user@test.com").unwrap();
    screen.set_field(fields::PASSWORD, "wrongpass").unwrap();

    let SubmitOutcome::Failed(message) = screen.submit().await else {
        panic!("expected failure");
    };
    assert_eq!(screen.error(), Some(message));
    assert_eq!(screen.field(fields::EMAIL).as_deref(), Some("user@test.com"));
    assert_eq!(screen.field(fields::PASSWORD).as_deref(), Some("wrongpass"));
    assert!(intents.try_recv().is_err());
    assert!(!harness.session.is_signed_in());

    // Retry from Failed
    assert_eq!(screen.submit().await, SubmitOutcome::Succeeded);
    assert!(harness.session.is_signed_in());
}

#[tokio::test(start_paused = true)]
async fn test_double_tap_signs_in_once() {
    let harness = Harness::new(ScriptedGateway::new().with_latency(Duration::from_secs(2)));
    let (screen, mut intents) = harness.sign_in();
    screen.set_field(fields::EMAIL, "user@test.com").unwrap();
    screen.set_field(fields::PASSWORD, "validpass").unwrap();

    let (first, second, third) = tokio::join!(screen.submit(), screen.submit(), screen.submit());

    assert_eq!(first, SubmitOutcome::Succeeded);
    assert_eq!(second, SubmitOutcome::Ignored);
    assert_eq!(third, SubmitOutcome::Ignored);
    assert_eq!(harness.scripted.call_count(GatewayCall::SignIn), 1);
    assert!(intents.try_recv().is_ok());
    assert!(intents.try_recv().is_err());
}

#[tokio::test]
async fn test_sign_up_validation_and_success() {
    let harness = Harness::new(ScriptedGateway::new());
    let (sink, mut intents) = navigation_channel();
    let screen =
        SignUpController::new(SignUp, harness.gateway.clone(), sink, ScreenScope::mount("signup"));

    screen.set_field(fields::NAME, "  Alice ").unwrap();
    screen.set_field(fields::EMAIL, "alice@example.com").unwrap();
    screen.set_field(fields::PASSWORD, "supersecret").unwrap();
    screen.set_field(fields::CONFIRM_PASSWORD, "supersecreT").unwrap();

    let SubmitOutcome::Invalid(errors) = screen.submit().await else {
        panic!("mismatched confirmation must not submit");
    };
    assert_eq!(errors.len(), 1);
    assert!(errors.contains_key(fields::CONFIRM_PASSWORD));
    assert_eq!(harness.scripted.call_count(GatewayCall::SignUp), 0);

    screen.set_field(fields::CONFIRM_PASSWORD, "supersecret").unwrap();
    assert_eq!(screen.submit().await, SubmitOutcome::Succeeded);
    assert_eq!(
        harness.scripted.last_argument(GatewayCall::SignUp).as_deref(),
        Some("alice@example.com")
    );
    assert_eq!(intents.try_recv().unwrap().destination, Destination::MainArea);
    assert!(harness.session.is_signed_in());
}

// =============================================================================
// Password reset
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_reset_flow_end_to_end() {
    let harness = Harness::with_demo_reset();
    let mut navigator = Navigator::new(AuthGate::new(harness.session.clone()));
    navigator.push(Route::ForgotPassword);

    // Request a code; navigation waits for the confirmation delay
    let (sink, mut intents) = navigation_channel();
    let forgot = SendResetCodeController::new(
        SendResetCode,
        harness.gateway.clone(),
        sink.clone(),
        ScreenScope::mount("forgot-password"),
    );
    forgot.set_field(fields::EMAIL, "user@test.com").unwrap();
    assert_eq!(forgot.submit().await, SubmitOutcome::Succeeded);
    assert!(intents.try_recv().is_err());

    tokio::time::sleep(CODE_SENT_NAVIGATION_DELAY + Duration::from_millis(10)).await;
    assert_eq!(
        navigator.drain(&mut intents),
        vec![NavigationOutcome::Navigated(Route::VerifyOtp)]
    );

    // Enter the code
    let otp = OtpScreen::new(harness.gateway.clone(), sink.clone(), ScreenScope::mount("verify-otp"));
    otp.set_code("123456").unwrap();
    assert_eq!(otp.submit().await, SubmitOutcome::Succeeded);
    assert_eq!(
        navigator.drain(&mut intents),
        vec![NavigationOutcome::Navigated(Route::ResetPassword)]
    );

    // Choose a new password
    let reset = ResetPasswordController::new(
        ResetPassword,
        harness.gateway.clone(),
        sink,
        ScreenScope::mount("reset-password"),
    );
    reset.set_field(fields::PASSWORD, "newpassword").unwrap();
    reset.set_field(fields::CONFIRM_PASSWORD, "newpassword").unwrap();
    assert_eq!(reset.submit().await, SubmitOutcome::Succeeded);
    assert_eq!(
        navigator.drain(&mut intents),
        vec![NavigationOutcome::Navigated(Route::Login)]
    );
    assert!(!harness.session.is_signed_in());

    // The new password went to the service with the verified reset
    assert_eq!(
        harness.scripted.last_argument(GatewayCall::AdoptReset).as_deref(),
        Some("user@test.com 123456")
    );
    assert_eq!(
        harness.scripted.last_argument(GatewayCall::ResetPassword).as_deref(),
        Some("newpassword")
    );
}

#[tokio::test]
async fn test_reset_rejected_by_service_stays_on_screen() {
    let harness = Harness::with_demo_reset();
    harness.scripted.fail(
        GatewayCall::ResetPassword,
        GatewayError::rejected("Password was used recently"),
    );
    let (sink, mut intents) = navigation_channel();

    harness.gateway.send_reset_code("user@test.com").await.unwrap();
    harness.gateway.verify_code("123456").await.unwrap();

    let reset = ResetPasswordController::new(
        ResetPassword,
        harness.gateway.clone(),
        sink,
        ScreenScope::mount("reset-password"),
    );
    reset.set_field(fields::PASSWORD, "newpassword").unwrap();
    reset.set_field(fields::CONFIRM_PASSWORD, "newpassword").unwrap();

    assert_eq!(
        reset.submit().await,
        SubmitOutcome::Failed("Password was used recently".to_string())
    );
    assert!(intents.try_recv().is_err());
    assert_eq!(reset.field(fields::PASSWORD).as_deref(), Some("newpassword"));
}

#[tokio::test(start_paused = true)]
async fn test_leaving_before_code_sent_delay_cancels_navigation() {
    let harness = Harness::with_demo_reset();
    let (sink, mut intents) = navigation_channel();
    let scope = ScreenScope::mount("forgot-password");
    let forgot =
        SendResetCodeController::new(SendResetCode, harness.gateway.clone(), sink, scope.clone());

    forgot.set_field(fields::EMAIL, "user@test.com").unwrap();
    assert_eq!(forgot.submit().await, SubmitOutcome::Succeeded);

    tokio::time::sleep(Duration::from_millis(500)).await;
    scope.unmount();
    tokio::time::sleep(CODE_SENT_NAVIGATION_DELAY * 2).await;

    assert!(intents.try_recv().is_err());
}

#[tokio::test]
async fn test_otp_scenario() {
    let harness = Harness::with_demo_reset();
    let (sink, mut intents) = navigation_channel();
    let otp = OtpScreen::new(harness.gateway.clone(), sink, ScreenScope::mount("verify-otp"));

    otp.set_code("000000").unwrap();
    assert_eq!(
        otp.submit().await,
        SubmitOutcome::Failed(INVALID_CODE_MESSAGE.to_string())
    );
    assert!(otp.is_invalid());
    assert!(intents.try_recv().is_err());

    otp.set_code("123456").unwrap();
    assert_eq!(otp.submit().await, SubmitOutcome::Succeeded);
    assert!(!otp.is_invalid());
    assert_eq!(intents.try_recv().unwrap().destination, Destination::ResetPassword);
}

#[tokio::test]
async fn test_resend_is_idempotent() {
    let harness = Harness::with_demo_reset();
    let (sink, _intents) = navigation_channel();
    let otp = OtpScreen::new(harness.gateway.clone(), sink, ScreenScope::mount("verify-otp"));

    otp.set_code("999999").unwrap();
    otp.submit().await;
    assert!(otp.error().is_some());

    for _ in 0..3 {
        otp.resend().await;
        assert_eq!(otp.state(), SubmissionState::Idle);
        assert!(otp.error().is_none());
        assert!(!otp.is_invalid());
    }
}

#[tokio::test]
async fn test_code_with_letters_is_rejected_locally() {
    let harness = Harness::with_demo_reset();
    let (sink, _intents) = navigation_channel();
    let otp = OtpScreen::new(harness.gateway.clone(), sink, ScreenScope::mount("verify-otp"));

    otp.set_code("12a456").unwrap();
    assert!(matches!(otp.submit().await, SubmitOutcome::Invalid(_)));
    assert!(!otp.is_invalid());
    assert_eq!(otp.state(), SubmissionState::Idle);
}

// =============================================================================
// Sign-out
// =============================================================================

#[tokio::test]
async fn test_sign_out_returns_to_login() {
    let harness = Harness::new(ScriptedGateway::new().with_session(sessions::alice()));
    let bound = SessionBoundGateway::new(harness.scripted.clone(), harness.session.clone());
    bound.refresh().await.unwrap();
    assert!(harness.session.is_signed_in());

    let mut navigator = Navigator::new(AuthGate::new(harness.session.clone()));
    navigator.push(Route::Settings);

    let (sink, mut intents) = navigation_channel();
    let sign_out =
        SignOutController::new(SignOut, harness.gateway.clone(), sink, ScreenScope::mount("settings"));
    assert_eq!(sign_out.submit().await, SubmitOutcome::Succeeded);

    assert!(!harness.session.is_signed_in());
    assert_eq!(
        navigator.drain(&mut intents),
        vec![NavigationOutcome::Navigated(Route::Login)]
    );
    assert_eq!(navigator.stack().routes(), vec![Route::Login]);
}

#[tokio::test]
async fn test_failed_sign_out_stays_signed_in() {
    let harness = Harness::new(ScriptedGateway::new().with_session(sessions::bob()));
    let bound = SessionBoundGateway::new(harness.scripted.clone(), harness.session.clone());
    bound.refresh().await.unwrap();
    harness
        .scripted
        .fail(GatewayCall::SignOut, GatewayError::rejected("Could not sign out"));

    let (sink, mut intents) = navigation_channel();
    let sign_out =
        SignOutController::new(SignOut, harness.gateway.clone(), sink, ScreenScope::mount("settings"));

    assert_eq!(
        sign_out.submit().await,
        SubmitOutcome::Failed("Could not sign out".to_string())
    );
    assert!(harness.session.is_signed_in());
    assert!(intents.try_recv().is_err());
}

//! Reset-code entry screen
//!
//! The screen runs two independent workflows: verifying the typed code, and
//! resending a fresh code. Each has its own submission state, so a resend
//! never waits on a verify and vice versa.
//!
//! Resending always returns the verify workflow to a clean slate (`Idle`, no
//! error, no highlight, empty code) before asking for a new code. A verify
//! still in flight at that point is abandoned and its answer is ignored; a new
//! verify is not sent until that answer has arrived.

use async_trait::async_trait;
use auth_client::{AuthGateway, GatewayResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

use app_state::SubmissionState;

use crate::auth::{fields, VerifyCode, RESET_CODE_LENGTH};
use crate::forms::FormError;
use crate::intent::NavigationSink;
use crate::scope::ScreenScope;
use crate::validation::{ValidatedFields, ValidationSchema};
use crate::workflow::{AuthOperation, FormWorkflowController, SubmitOutcome, SuccessNavigation};

/// Ask for a fresh reset code (stays on the screen)
#[derive(Debug, Clone, Copy, Default)]
pub struct ResendCode;

#[async_trait]
impl AuthOperation for ResendCode {
    type Payload = ();

    fn name(&self) -> &'static str {
        "resend_reset_code"
    }

    fn schema(&self) -> ValidationSchema {
        ValidationSchema::new()
    }

    fn payload(&self, _input: &ValidatedFields) {}

    async fn perform(&self, gateway: &dyn AuthGateway, _payload: &()) -> GatewayResult<()> {
        gateway.resend_reset_code().await
    }

    fn on_success(&self) -> Option<SuccessNavigation> {
        None
    }

    fn fallback_message(&self) -> &'static str {
        "Failed to resend code"
    }
}

/// Controller for the reset-code entry screen
pub struct OtpScreen {
    verify: FormWorkflowController<VerifyCode>,
    resend: FormWorkflowController<ResendCode>,
    invalid: AtomicBool,
}

impl OtpScreen {
    /// Create the screen's controllers
    pub fn new(gateway: Arc<dyn AuthGateway>, navigation: NavigationSink, scope: ScreenScope) -> Self {
        Self {
            verify: FormWorkflowController::new(
                VerifyCode,
                gateway.clone(),
                navigation.clone(),
                scope.clone(),
            ),
            resend: FormWorkflowController::new(ResendCode, gateway, navigation, scope),
            invalid: AtomicBool::new(false),
        }
    }

    /// Update the typed code
    pub fn set_code(&self, code: impl Into<String>) -> Result<(), FormError> {
        self.verify.set_field(fields::CODE, code)
    }

    /// The typed code
    pub fn code(&self) -> String {
        self.verify.field(fields::CODE).unwrap_or_default()
    }

    /// Whether the verify button is enabled
    pub fn can_submit(&self) -> bool {
        !self.verify.is_busy() && self.code().graphemes(true).count() == RESET_CODE_LENGTH
    }

    /// Whether the code input should be highlighted as wrong
    pub fn is_invalid(&self) -> bool {
        self.invalid.load(Ordering::Acquire)
    }

    /// Verify state
    pub fn state(&self) -> SubmissionState {
        self.verify.state()
    }

    /// Verify error message
    pub fn error(&self) -> Option<String> {
        self.verify.error()
    }

    /// Resend state
    pub fn resend_state(&self) -> SubmissionState {
        self.resend.state()
    }

    /// Resend error message
    pub fn resend_error(&self) -> Option<String> {
        self.resend.error()
    }

    /// The verify workflow
    pub fn verify_controller(&self) -> &FormWorkflowController<VerifyCode> {
        &self.verify
    }

    /// The resend workflow
    pub fn resend_controller(&self) -> &FormWorkflowController<ResendCode> {
        &self.resend
    }

    /// Verify the typed code
    pub async fn submit(&self) -> SubmitOutcome {
        if self.verify.is_busy() {
            return SubmitOutcome::Ignored;
        }

        self.invalid.store(false, Ordering::Release);
        let outcome = self.verify.submit().await;
        if matches!(outcome, SubmitOutcome::Failed(_)) {
            self.invalid.store(true, Ordering::Release);
        }
        outcome
    }

    /// Start over with a fresh code
    ///
    /// The verify workflow is reset regardless of its state; the returned
    /// outcome is that of the resend request.
    pub async fn resend(&self) -> SubmitOutcome {
        self.verify.cancel();
        self.invalid.store(false, Ordering::Release);
        tracing::debug!("reset code resend requested");
        self.resend.submit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{navigation_channel, Destination, NavigationReceiver};
    use auth_client::demo::INVALID_CODE_MESSAGE;
    use auth_client::testing::{errors, GatewayCall, ScriptedGateway};
    use auth_client::DemoResetFlow;
    use std::time::Duration;

    fn screen(gateway: Arc<dyn AuthGateway>) -> (OtpScreen, NavigationReceiver) {
        let (sink, rx) = navigation_channel();
        (OtpScreen::new(gateway, sink, ScreenScope::mount("verify-otp")), rx)
    }

    fn demo() -> Arc<dyn AuthGateway> {
        Arc::new(DemoResetFlow::new(ScriptedGateway::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_code_verifies() {
        let (otp, mut rx) = screen(demo());
        otp.set_code("123456").unwrap();
        assert!(otp.can_submit());

        assert_eq!(otp.submit().await, SubmitOutcome::Succeeded);
        assert!(!otp.is_invalid());
        assert_eq!(otp.code(), "");

        let intent = rx.try_recv().unwrap();
        assert_eq!(intent.destination, Destination::ResetPassword);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_code_is_flagged() {
        let (otp, mut rx) = screen(demo());
        otp.set_code("654321").unwrap();

        assert_eq!(otp.submit().await, SubmitOutcome::Failed(INVALID_CODE_MESSAGE.to_string()));
        assert_eq!(otp.state(), SubmissionState::Failed(INVALID_CODE_MESSAGE.to_string()));
        assert_eq!(otp.error().as_deref(), Some(INVALID_CODE_MESSAGE));
        assert!(otp.is_invalid());
        assert_eq!(otp.code(), "654321");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_can_submit_needs_six_characters() {
        let (otp, _rx) = screen(demo());
        assert!(!otp.can_submit());
        otp.set_code("12345").unwrap();
        assert!(!otp.can_submit());
        otp.set_code("1234567").unwrap();
        assert!(!otp.can_submit());
    }

    #[tokio::test(start_paused = true)]
    async fn test_can_submit_false_while_verifying() {
        let (otp, _rx) = screen(demo());
        otp.set_code("123456").unwrap();

        let (outcome, during) = tokio::join!(otp.submit(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            otp.can_submit()
        });
        assert!(!during);
        assert_eq!(outcome, SubmitOutcome::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resend_resets_from_any_state() {
        let (otp, _rx) = screen(demo());

        // From Failed
        otp.set_code("000000").unwrap();
        otp.submit().await;
        assert!(otp.is_invalid());

        assert_eq!(otp.resend().await, SubmitOutcome::Succeeded);
        assert_eq!(otp.state(), SubmissionState::Idle);
        assert!(otp.error().is_none());
        assert!(!otp.is_invalid());
        assert_eq!(otp.code(), "");

        // From Idle, twice
        otp.resend().await;
        otp.resend().await;
        assert_eq!(otp.state(), SubmissionState::Idle);
        assert!(otp.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resend_during_verify_discards_verify() {
        let gateway = Arc::new(ScriptedGateway::new().with_latency(Duration::from_secs(1)));
        let (otp, mut rx) = screen(gateway.clone());
        otp.set_code("123456").unwrap();

        let (verify, resend) = tokio::join!(otp.submit(), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            otp.resend().await
        });

        assert_eq!(verify, SubmitOutcome::Discarded);
        assert_eq!(resend, SubmitOutcome::Succeeded);
        assert_eq!(otp.state(), SubmissionState::Idle);
        assert!(rx.try_recv().is_err());
        assert_eq!(gateway.call_count(GatewayCall::VerifyCode), 1);
        assert_eq!(gateway.call_count(GatewayCall::ResendResetCode), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_second_verify_while_abandoned_one_is_out() {
        let gateway = Arc::new(ScriptedGateway::new().with_latency(Duration::from_secs(1)));
        let (otp, _rx) = screen(gateway.clone());
        otp.set_code("123456").unwrap();

        let (verify, resend, retry) = tokio::join!(
            otp.submit(),
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                otp.resend().await
            },
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                otp.set_code("123456").unwrap();
                let enabled = otp.can_submit();
                (enabled, otp.submit().await)
            }
        );

        assert_eq!(verify, SubmitOutcome::Discarded);
        assert_eq!(resend, SubmitOutcome::Succeeded);
        assert_eq!(retry, (false, SubmitOutcome::Ignored));
        assert_eq!(gateway.call_count(GatewayCall::VerifyCode), 1);

        // Once the abandoned answer is in, the fresh code goes out
        assert!(otp.can_submit());
        assert_eq!(otp.submit().await, SubmitOutcome::Succeeded);
        assert_eq!(gateway.call_count(GatewayCall::VerifyCode), 2);
    }

    #[tokio::test]
    async fn test_resend_failure_is_separate() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.fail(GatewayCall::ResendResetCode, errors::network());
        let (otp, _rx) = screen(gateway);

        assert_eq!(
            otp.resend().await,
            SubmitOutcome::Failed("Failed to resend code".to_string())
        );
        assert_eq!(otp.resend_error().as_deref(), Some("Failed to resend code"));
        assert_eq!(otp.state(), SubmissionState::Idle);
        assert!(otp.error().is_none());
        assert!(!otp.is_invalid());
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_not_blocked_by_resend() {
        let gateway = Arc::new(ScriptedGateway::new().with_latency(Duration::from_secs(1)));
        let (otp, _rx) = screen(gateway.clone());

        let (resend, verify) = tokio::join!(otp.resend(), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            otp.set_code("123456").unwrap();
            otp.submit().await
        });

        assert_eq!(resend, SubmitOutcome::Succeeded);
        assert_eq!(verify, SubmitOutcome::Succeeded);
    }
}

//! Form workflow controller
//!
//! `FormWorkflowController` is the one reusable piece behind every auth
//! screen. It is parameterised by an [`AuthOperation`], which supplies the
//! validation schema, the typed payload, the gateway call, the success
//! destination and the fallback failure message.
//!
//! A submission runs in this order:
//!
//! 1. Ignored outright while another attempt of the same controller is in
//!    flight, including one abandoned by a reset whose call has not returned.
//! 2. The form is validated locally; field errors never reach the gateway.
//! 3. The submission cell moves to `Submitting` and the gateway is called.
//! 4. If the screen was torn down (or the attempt reset) in the meantime, the
//!    completion is dropped without touching any state.
//! 5. Success clears the form and emits one navigation intent, possibly after
//!    a delay. Failure records the gateway message (or the fallback) and keeps
//!    the form as typed.

use async_trait::async_trait;
use auth_client::{AuthGateway, GatewayErrorKind, GatewayResult};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use app_state::{SubmissionCell, SubmissionState};

use crate::forms::{Form, FormError, FormField};
use crate::intent::{Destination, NavigationIntent, NavigationMode, NavigationSink};
use crate::scope::ScreenScope;
use crate::validation::{FieldErrors, FieldValues, ValidatedFields, ValidationResult, ValidationSchema};

/// Where a successful operation navigates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuccessNavigation {
    /// Target
    pub destination: Destination,
    /// Push or replace
    pub mode: NavigationMode,
    /// Wait before navigating (lets a confirmation message be read)
    pub delay: Duration,
}

impl SuccessNavigation {
    /// Navigate immediately, replacing the current screen
    pub fn replace(destination: Destination) -> Self {
        Self { destination, mode: NavigationMode::Replace, delay: Duration::ZERO }
    }

    /// Navigate immediately, pushing on top of the current screen
    pub fn push(destination: Destination) -> Self {
        Self { destination, mode: NavigationMode::Push, delay: Duration::ZERO }
    }

    /// Navigate after `delay`
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One user-facing auth action
#[async_trait]
pub trait AuthOperation: Send + Sync + 'static {
    /// Typed input built from validated fields
    type Payload: Send + Sync;

    /// Operation name for logs
    fn name(&self) -> &'static str;

    /// Fields and rules of the form
    fn schema(&self) -> ValidationSchema;

    /// Build the payload from validated fields
    fn payload(&self, fields: &ValidatedFields) -> Self::Payload;

    /// Call the gateway
    async fn perform(&self, gateway: &dyn AuthGateway, payload: &Self::Payload)
        -> GatewayResult<()>;

    /// Navigation after success, if any
    fn on_success(&self) -> Option<SuccessNavigation>;

    /// Message shown when the gateway gives no reason
    fn fallback_message(&self) -> &'static str;
}

/// Where the last failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSource {
    /// Local validation; see the field errors
    Validation,
    /// The gateway, with its failure class
    Gateway(GatewayErrorKind),
}

/// Result of one `submit` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; the gateway was not contacted
    Invalid(FieldErrors),
    /// Another attempt was in flight; nothing happened
    Ignored,
    /// The gateway call succeeded
    Succeeded,
    /// The gateway call failed with this user-facing message
    Failed(String),
    /// The completion arrived after teardown or reset and was dropped
    Discarded,
}

#[derive(Debug, Default)]
struct Feedback {
    message: Option<String>,
    source: Option<FailureSource>,
    field_errors: FieldErrors,
}

/// Validation, submission state and one gateway operation for one screen
pub struct FormWorkflowController<O: AuthOperation> {
    operation: O,
    schema: ValidationSchema,
    gateway: Arc<dyn AuthGateway>,
    submission: SubmissionCell,
    form: Mutex<Form>,
    feedback: Mutex<Feedback>,
    navigation: NavigationSink,
    scope: ScreenScope,
}

impl<O: AuthOperation> FormWorkflowController<O> {
    /// Create a controller for a mounted screen
    pub fn new(
        operation: O,
        gateway: Arc<dyn AuthGateway>,
        navigation: NavigationSink,
        scope: ScreenScope,
    ) -> Self {
        let schema = operation.schema();
        let form = Form::for_schema(&schema);
        Self {
            operation,
            schema,
            gateway,
            submission: SubmissionCell::new(),
            form: Mutex::new(form),
            feedback: Mutex::new(Feedback::default()),
            navigation,
            scope,
        }
    }

    /// The operation
    pub fn operation(&self) -> &O {
        &self.operation
    }

    /// The validation schema
    pub fn schema(&self) -> &ValidationSchema {
        &self.schema
    }

    /// The screen scope
    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    // ===== Form =====

    /// Update a field as the user types
    ///
    /// A failed attempt folds back to `Idle` on the next edit; the error
    /// message stays until the next submit.
    pub fn set_field(&self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        self.form.lock().set(name, value)?;
        self.submission.clear_outcome();
        Ok(())
    }

    /// A field's current text
    pub fn field(&self, name: &str) -> Option<String> {
        self.form.lock().value(name).map(str::to_string)
    }

    /// Snapshot of every field's text
    pub fn values(&self) -> FieldValues {
        self.form.lock().values()
    }

    /// Snapshot of every field
    pub fn fields(&self) -> Vec<FormField> {
        self.form.lock().fields().to_vec()
    }

    // ===== Observable state =====

    /// Current submission state
    pub fn state(&self) -> SubmissionState {
        self.submission.state()
    }

    /// Watch submission state changes
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.submission.subscribe()
    }

    /// Whether an attempt is in flight
    pub fn is_submitting(&self) -> bool {
        self.submission.state().is_submitting()
    }

    /// Whether a gateway call is out, including one abandoned by a reset
    pub fn is_busy(&self) -> bool {
        self.submission.is_busy()
    }

    /// Message of the last gateway failure, for inline display
    pub fn error(&self) -> Option<String> {
        self.feedback.lock().message.clone()
    }

    /// Source of the last failure
    pub fn failure_source(&self) -> Option<FailureSource> {
        self.feedback.lock().source
    }

    /// Field errors from the last validation run
    pub fn field_errors(&self) -> FieldErrors {
        self.feedback.lock().field_errors.clone()
    }

    /// One field's error from the last validation run
    pub fn field_error(&self, name: &str) -> Option<String> {
        self.feedback.lock().field_errors.get(name).cloned()
    }

    // ===== Actions =====

    /// Set the given fields, then submit
    ///
    /// Every key must be a declared field; fields not given keep their text.
    pub async fn submit_with(&self, values: &FieldValues) -> Result<SubmitOutcome, FormError> {
        {
            let mut form = self.form.lock();
            if let Some(unknown) = values.keys().find(|k| !self.schema.declares(k)) {
                return Err(FormError::UnknownField(unknown.clone()));
            }
            for (name, value) in values {
                form.set(name, value.clone())?;
            }
        }
        Ok(self.submit().await)
    }

    /// Submit the form as currently typed
    pub async fn submit(&self) -> SubmitOutcome {
        let operation = self.operation.name();

        if !self.scope.is_mounted() {
            return SubmitOutcome::Discarded;
        }

        if self.is_busy() {
            tracing::debug!(operation, "submit ignored, attempt in flight");
            return SubmitOutcome::Ignored;
        }

        let values = self.form.lock().values();
        let fields = match self.schema.validate(&values) {
            ValidationResult::Valid(fields) => fields,
            ValidationResult::Invalid(errors) => {
                self.form.lock().mark_validated(&errors);
                self.submission.clear_outcome();
                *self.feedback.lock() = Feedback {
                    message: None,
                    source: Some(FailureSource::Validation),
                    field_errors: errors.clone(),
                };
                tracing::debug!(operation, fields = errors.len(), "validation failed");
                return SubmitOutcome::Invalid(errors);
            }
        };

        let attempt = match self.submission.try_begin() {
            Ok(attempt) => attempt,
            Err(_) => {
                tracing::debug!(operation, "submit ignored, attempt in flight");
                return SubmitOutcome::Ignored;
            }
        };

        self.form.lock().mark_validated(&FieldErrors::new());
        *self.feedback.lock() = Feedback::default();

        let payload = self.operation.payload(&fields);
        let result = self.operation.perform(self.gateway.as_ref(), &payload).await;

        if !self.scope.is_mounted() {
            self.submission.release(attempt);
            tracing::debug!(operation, screen = %self.scope.name(), "completion after unmount dropped");
            return SubmitOutcome::Discarded;
        }

        match result {
            Ok(()) => {
                if self.submission.succeed(attempt).is_err() {
                    tracing::debug!(operation, "stale completion dropped");
                    return SubmitOutcome::Discarded;
                }
                tracing::info!(operation, "auth operation succeeded");

                self.form.lock().clear();
                if let Some(next) = self.operation.on_success() {
                    self.navigate(next);
                }
                SubmitOutcome::Succeeded
            }
            Err(err) => {
                let message = err
                    .message()
                    .unwrap_or(self.operation.fallback_message())
                    .to_string();

                if self.submission.fail(attempt, message.clone()).is_err() {
                    tracing::debug!(operation, "stale completion dropped");
                    return SubmitOutcome::Discarded;
                }
                tracing::warn!(operation, error = %err, "auth operation failed");

                let mut feedback = self.feedback.lock();
                feedback.message = Some(message.clone());
                feedback.source = Some(FailureSource::Gateway(err.kind()));
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Return to `Idle` and clear every error
    ///
    /// An attempt in flight is abandoned; its completion will be discarded,
    /// and new submits are ignored until it arrives. The form text is kept.
    pub fn reset(&self) {
        self.submission.reset();
        *self.feedback.lock() = Feedback::default();
    }

    /// Abandon the form: clear the fields and reset
    pub fn cancel(&self) {
        self.form.lock().clear();
        self.reset();
    }

    fn navigate(&self, next: SuccessNavigation) {
        let intent = NavigationIntent::new(next.destination, next.mode);

        if next.delay.is_zero() {
            self.navigation.emit(intent);
            return;
        }

        let sink = self.navigation.clone();
        if self.scope.schedule(next.delay, move || sink.emit(intent)).is_none() {
            tracing::debug!(screen = %self.scope.name(), "delayed navigation skipped after unmount");
        }
    }
}

//! Composition root
//!
//! `OutfitPlanner` wires the secure store, the remote gateway, the optional
//! demo reset flow and the session observer together, and hands out screen
//! controllers that all share the one session-publishing gateway.

use anyhow::Context;
use std::sync::Arc;

use app_core::auth::{
    ResetPassword, ResetPasswordController, SendResetCode, SendResetCodeController, SignIn,
    SignInController, SignOut, SignOutController, SignUp, SignUpController,
};
use app_core::intent::NavigationSink;
use app_core::otp::OtpScreen;
use app_core::scope::ScreenScope;
use app_state::{SessionBoundGateway, SessionObserver};
use app_ui::{AuthGate, Navigator, Route};
use auth_client::{AuthGateway, DemoResetFlow, RemoteAuthGateway, Session};
use storage::{FileStore, SecureStore, StoreConfig};

use crate::config::AppConfig;

type SharedGateway = SessionBoundGateway<Arc<dyn AuthGateway>>;

/// The assembled application
pub struct OutfitPlanner {
    config: AppConfig,
    gateway: Arc<SharedGateway>,
    session: SessionObserver,
}

impl OutfitPlanner {
    /// Open the session store and assemble the application
    pub async fn bootstrap(config: AppConfig) -> anyhow::Result<Self> {
        let store = FileStore::open(StoreConfig::new(&config.store_path))
            .await
            .with_context(|| format!("failed to open session store {}", config.store_path.display()))?;
        Self::with_store(config, Arc::new(store)).await
    }

    /// Assemble the application over an existing store
    ///
    /// A persisted session is validated against the service and published
    /// before this returns, so the first navigation decision already sees it.
    pub async fn with_store(config: AppConfig, store: Arc<dyn SecureStore>) -> anyhow::Result<Self> {
        let remote = Arc::new(
            RemoteAuthGateway::new(config.client.clone(), store)
                .context("failed to build auth gateway")?,
        );
        let restored = remote
            .restore()
            .await
            .context("failed to restore persisted session")?;

        let inner: Arc<dyn AuthGateway> = if config.demo_reset {
            Arc::new(DemoResetFlow::new(remote))
        } else {
            remote
        };

        let session = SessionObserver::new();
        let gateway = Arc::new(SessionBoundGateway::restored(inner, session.clone(), restored));

        tracing::info!(
            signed_in = session.is_signed_in(),
            demo_reset = config.demo_reset,
            "outfit planner ready"
        );

        Ok(Self { config, gateway, session })
    }

    /// The configuration in use
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The session observer
    pub fn session(&self) -> &SessionObserver {
        &self.session
    }

    /// The gateway every screen uses
    pub fn gateway(&self) -> Arc<dyn AuthGateway> {
        self.gateway.clone()
    }

    /// Ask the service who is signed in and publish the answer
    pub async fn refresh_session(&self) -> anyhow::Result<Option<Session>> {
        Ok(self.gateway.refresh().await?)
    }

    /// A navigator gated on this application's session
    pub fn navigator(&self) -> Navigator {
        Navigator::new(AuthGate::new(self.session.clone()))
    }

    // ===== Screens =====

    /// Sign-in screen
    pub fn sign_in_screen(&self, navigation: NavigationSink) -> SignInController {
        SignInController::new(SignIn, self.gateway(), navigation, Self::mount(Route::Login))
    }

    /// Sign-up screen
    pub fn sign_up_screen(&self, navigation: NavigationSink) -> SignUpController {
        SignUpController::new(SignUp, self.gateway(), navigation, Self::mount(Route::Signup))
    }

    /// Forgot-password screen
    pub fn forgot_password_screen(&self, navigation: NavigationSink) -> SendResetCodeController {
        SendResetCodeController::new(
            SendResetCode,
            self.gateway(),
            navigation,
            Self::mount(Route::ForgotPassword),
        )
    }

    /// Reset-code entry screen
    pub fn verify_code_screen(&self, navigation: NavigationSink) -> OtpScreen {
        OtpScreen::new(self.gateway(), navigation, Self::mount(Route::VerifyOtp))
    }

    /// New-password screen
    pub fn reset_password_screen(&self, navigation: NavigationSink) -> ResetPasswordController {
        ResetPasswordController::new(
            ResetPassword,
            self.gateway(),
            navigation,
            Self::mount(Route::ResetPassword),
        )
    }

    /// Sign-out action of the settings screen
    pub fn sign_out_action(&self, navigation: NavigationSink) -> SignOutController {
        SignOutController::new(SignOut, self.gateway(), navigation, Self::mount(Route::Settings))
    }

    fn mount(route: Route) -> ScreenScope {
        ScreenScope::mount(route.to_path())
    }
}

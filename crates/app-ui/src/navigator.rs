//! Applying navigation intents
//!
//! The [`Navigator`] is the only place that moves the navigation stack. Every
//! move passes through the [`AuthGate`], which reads the latest session, so a
//! signed-out user can never land on a drawer screen. Intents are applied at
//! most once per id; the last [`APPLIED_HISTORY`] ids are remembered.

use std::collections::{HashSet, VecDeque};

use app_core::intent::{Destination, NavigationIntent, NavigationMode, NavigationReceiver};
use app_state::SessionObserver;
use thiserror::Error;

use crate::navigation::{DrawerTab, NavigationStack, Route, RouteGroup, Router};

/// Navigation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// Nothing to go back to
    #[error("Already at the root of the stack")]
    AtRoot,

    /// Deep link did not match any route
    #[error("No route for path: {0}")]
    UnknownPath(String),
}

/// Result type for navigation operations
pub type Result<T> = std::result::Result<T, NavigationError>;

// =============================================================================
// Auth Gate
// =============================================================================

/// Decision of the auth gate for one route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The route may be shown
    Allow(Route),
    /// The route is protected and nobody is signed in
    Redirect {
        /// What was asked for
        requested: Route,
        /// Where the user is sent instead
        to: Route,
    },
}

impl GateDecision {
    /// The route that will actually be shown
    pub fn route(&self) -> Route {
        match self {
            GateDecision::Allow(route) => *route,
            GateDecision::Redirect { to, .. } => *to,
        }
    }
}

/// Guards protected routes using the latest session
#[derive(Debug, Clone)]
pub struct AuthGate {
    session: SessionObserver,
}

impl AuthGate {
    /// Create a gate over a session observer
    pub fn new(session: SessionObserver) -> Self {
        Self { session }
    }

    /// The observed session
    pub fn session(&self) -> &SessionObserver {
        &self.session
    }

    /// Decide whether `route` may be shown right now
    pub fn check(&self, route: Route) -> GateDecision {
        if route.requires_auth() && !self.session.is_signed_in() {
            GateDecision::Redirect { requested: route, to: Route::Login }
        } else {
            GateDecision::Allow(route)
        }
    }

    /// The route to show for `route`
    pub fn resolve(&self, route: Route) -> Route {
        self.check(route).route()
    }
}

// =============================================================================
// Navigator
// =============================================================================

/// Map a workflow destination to its screen
pub fn route_for(destination: Destination) -> Route {
    match destination {
        Destination::MainArea => Route::Home,
        Destination::SignIn => Route::Login,
        Destination::VerifyCode => Route::VerifyOtp,
        Destination::ResetPassword => Route::ResetPassword,
    }
}

/// What applying an intent did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The stack moved to this route
    Navigated(Route),
    /// The target was protected; the stack moved to the sign-in screen
    Redirected {
        /// What was asked for
        requested: Route,
        /// Where the stack moved
        to: Route,
    },
    /// The intent was applied before; nothing happened
    Duplicate,
}

/// How many applied intent ids are remembered for duplicate detection
///
/// Ids are not applied in creation order (delayed intents arrive late), so
/// the history is a window of recent ids rather than a high-water mark.
pub const APPLIED_HISTORY: usize = 256;

/// Recently applied intent ids, oldest first
#[derive(Debug, Default)]
struct AppliedIds {
    order: VecDeque<u64>,
    ids: HashSet<u64>,
}

impl AppliedIds {
    /// Record `id`; false if it is already in the history
    fn insert(&mut self, id: u64) -> bool {
        if !self.ids.insert(id) {
            return false;
        }
        self.order.push_back(id);
        if self.order.len() > APPLIED_HISTORY {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        true
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Owns the navigation stack and applies navigation intents
pub struct Navigator {
    gate: AuthGate,
    router: Router,
    stack: NavigationStack,
    applied: AppliedIds,
}

impl Navigator {
    /// Create a navigator starting at home, or at sign-in when signed out
    pub fn new(gate: AuthGate) -> Self {
        let start = gate.resolve(Route::Home);
        Self {
            gate,
            router: Router::new(),
            stack: NavigationStack::new(start),
            applied: AppliedIds::default(),
        }
    }

    /// The current route
    pub fn current(&self) -> Route {
        self.stack.current()
    }

    /// The navigation stack
    pub fn stack(&self) -> &NavigationStack {
        &self.stack
    }

    /// The auth gate
    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    /// The drawer tab of the current route, if any
    pub fn active_tab(&self) -> Option<DrawerTab> {
        self.current().tab()
    }

    /// Apply a navigation intent, at most once per intent id
    pub fn apply(&mut self, intent: &NavigationIntent) -> NavigationOutcome {
        if !self.applied.insert(intent.id) {
            tracing::debug!(id = intent.id, "duplicate navigation intent ignored");
            return NavigationOutcome::Duplicate;
        }

        let outcome = self.go(route_for(intent.destination), intent.mode);
        tracing::debug!(id = intent.id, ?outcome, "navigation intent applied");
        outcome
    }

    /// Apply every intent already queued on `intents`
    pub fn drain(&mut self, intents: &mut NavigationReceiver) -> Vec<NavigationOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(intent) = intents.try_recv() {
            outcomes.push(self.apply(&intent));
        }
        outcomes
    }

    /// Wait for the next intent and apply it
    ///
    /// Returns `None` once every sender is gone.
    pub async fn next(&mut self, intents: &mut NavigationReceiver) -> Option<NavigationOutcome> {
        let intent = intents.recv().await?;
        Some(self.apply(&intent))
    }

    /// Push a route (user tapped a link)
    pub fn push(&mut self, route: Route) -> NavigationOutcome {
        self.go(route, NavigationMode::Push)
    }

    /// Replace the current route
    pub fn replace(&mut self, route: Route) -> NavigationOutcome {
        self.go(route, NavigationMode::Replace)
    }

    /// Open a deep link
    pub fn open_path(&mut self, path: &str) -> Result<NavigationOutcome> {
        match self.router.match_path(path) {
            Route::NotFound if path.trim_matches('/') != "not-found" => {
                self.stack.push(Route::NotFound);
                Err(NavigationError::UnknownPath(path.to_string()))
            }
            route => Ok(self.push(route)),
        }
    }

    /// Switch drawer tab, resetting the stack to the tab's root
    pub fn switch_tab(&mut self, tab: DrawerTab) -> NavigationOutcome {
        let decision = self.gate.check(tab.root_route());
        self.stack.reset(decision.route());
        Self::outcome(decision)
    }

    /// Go back one screen
    pub fn go_back(&mut self) -> Result<Route> {
        if !self.stack.pop() {
            return Err(NavigationError::AtRoot);
        }
        Ok(self.current())
    }

    /// Re-check the current route against the latest session
    ///
    /// Called when the session changes; a signed-out user on a protected
    /// screen is sent to sign-in with a fresh stack.
    pub fn revalidate(&mut self) -> Option<NavigationOutcome> {
        match self.gate.check(self.current()) {
            GateDecision::Allow(_) => None,
            decision => {
                tracing::debug!(?decision, "session lost on protected route");
                self.stack.reset(decision.route());
                Some(Self::outcome(decision))
            }
        }
    }

    fn go(&mut self, requested: Route, mode: NavigationMode) -> NavigationOutcome {
        let decision = self.gate.check(requested);
        let target = decision.route();

        // Entering another group starts a fresh stack, so back never crosses
        // between signed-out and signed-in screens.
        let crosses = target.group() != RouteGroup::Shared
            && self.current().group() != RouteGroup::Shared
            && target.group() != self.current().group();

        if crosses || matches!(decision, GateDecision::Redirect { .. }) {
            self.stack.reset(target);
        } else {
            match mode {
                NavigationMode::Push => self.stack.push(target),
                NavigationMode::Replace => self.stack.replace(target),
            }
        }

        Self::outcome(decision)
    }

    fn outcome(decision: GateDecision) -> NavigationOutcome {
        match decision {
            GateDecision::Allow(route) => NavigationOutcome::Navigated(route),
            GateDecision::Redirect { requested, to } => {
                NavigationOutcome::Redirected { requested, to }
            }
        }
    }
}

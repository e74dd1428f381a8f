//! Navigation system for Outfit Planner
//!
//! This module provides the route table with deep-link parsing, the drawer
//! tabs and the navigation stack. Applying navigation intents and gating
//! protected routes lives in [`crate::navigator`].

use serde::{Deserialize, Serialize};

// =============================================================================
// Route Definitions
// =============================================================================

/// All routes in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    // Auth stack
    /// Sign-in screen
    Login,
    /// Create account
    Signup,
    /// Request a reset code
    ForgotPassword,
    /// Enter the reset code
    VerifyOtp,
    /// Choose a new password
    ResetPassword,

    // Drawer
    /// Home
    #[default]
    Home,
    /// Wardrobe browser
    Wardrobe,
    /// Outfit list
    Outfits,
    /// Favorite outfits
    OutfitsFavorites,
    /// AI outfit pick
    OutfitsAiPick,
    /// Settings
    Settings,
    /// Edit profile settings
    SettingsEdit,
    /// Premium upsell
    SettingsPremium,

    // Error
    /// Not found
    NotFound,
}

/// Which navigator group a route belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteGroup {
    /// Signed-out screens
    Auth,
    /// Signed-in drawer screens
    Drawer,
    /// Screens reachable from anywhere
    Shared,
}

impl Route {
    /// Every route, in table order
    pub const ALL: [Route; 14] = [
        Route::Login,
        Route::Signup,
        Route::ForgotPassword,
        Route::VerifyOtp,
        Route::ResetPassword,
        Route::Home,
        Route::Wardrobe,
        Route::Outfits,
        Route::OutfitsFavorites,
        Route::OutfitsAiPick,
        Route::Settings,
        Route::SettingsEdit,
        Route::SettingsPremium,
        Route::NotFound,
    ];

    /// Canonical path, as used in deep links
    pub fn to_path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::ForgotPassword => "/forgot-password",
            Route::VerifyOtp => "/verify-otp",
            Route::ResetPassword => "/reset-password",
            Route::Home => "/",
            Route::Wardrobe => "/wardrobe",
            Route::Outfits => "/outfits",
            Route::OutfitsFavorites => "/outfits/favorites",
            Route::OutfitsAiPick => "/outfits/ai-pick",
            Route::Settings => "/settings",
            Route::SettingsEdit => "/settings/edit-settings",
            Route::SettingsPremium => "/settings/premium",
            Route::NotFound => "/not-found",
        }
    }

    /// The group this route belongs to
    pub fn group(&self) -> RouteGroup {
        match self {
            Route::Login
            | Route::Signup
            | Route::ForgotPassword
            | Route::VerifyOtp
            | Route::ResetPassword => RouteGroup::Auth,
            Route::NotFound => RouteGroup::Shared,
            _ => RouteGroup::Drawer,
        }
    }

    /// Check if this route requires a signed-in session
    pub fn requires_auth(&self) -> bool {
        self.group() == RouteGroup::Drawer
    }

    /// The drawer tab this route is shown under
    pub fn tab(&self) -> Option<DrawerTab> {
        match self {
            Route::Home => Some(DrawerTab::Home),
            Route::Wardrobe => Some(DrawerTab::Wardrobe),
            Route::Outfits | Route::OutfitsFavorites | Route::OutfitsAiPick => {
                Some(DrawerTab::Outfits)
            }
            Route::Settings | Route::SettingsEdit | Route::SettingsPremium => {
                Some(DrawerTab::Settings)
            }
            _ => None,
        }
    }

    /// Header title
    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Sign In",
            Route::Signup => "Create Account",
            Route::ForgotPassword => "Forgot Password",
            Route::VerifyOtp => "Verify Code",
            Route::ResetPassword => "Reset Password",
            Route::Home => "Home",
            Route::Wardrobe => "Wardrobe",
            Route::Outfits => "Outfits",
            Route::OutfitsFavorites => "Favorites",
            Route::OutfitsAiPick => "AI Pick",
            Route::Settings => "Settings",
            Route::SettingsEdit => "Edit Profile",
            Route::SettingsPremium => "Premium",
            Route::NotFound => "Not Found",
        }
    }
}

// =============================================================================
// Drawer Tabs
// =============================================================================

/// Drawer entries of the signed-in area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DrawerTab {
    /// Home
    #[default]
    Home,
    /// Wardrobe
    Wardrobe,
    /// Outfits
    Outfits,
    /// Settings
    Settings,
}

impl DrawerTab {
    /// Route the tab opens on
    pub fn root_route(&self) -> Route {
        match self {
            DrawerTab::Home => Route::Home,
            DrawerTab::Wardrobe => Route::Wardrobe,
            DrawerTab::Outfits => Route::Outfits,
            DrawerTab::Settings => Route::Settings,
        }
    }

    /// Icon name in the drawer
    pub fn icon(&self) -> &'static str {
        match self {
            DrawerTab::Home => "home-outline",
            DrawerTab::Wardrobe => "checkroom",
            DrawerTab::Outfits => "shirt-outline",
            DrawerTab::Settings => "settings-outline",
        }
    }

    /// Drawer label
    pub fn label(&self) -> &'static str {
        match self {
            DrawerTab::Home => "Home",
            DrawerTab::Wardrobe => "Wardrobe",
            DrawerTab::Outfits => "Outfits",
            DrawerTab::Settings => "Settings",
        }
    }

    /// Get all tabs in drawer order
    pub fn all() -> [DrawerTab; 4] {
        [DrawerTab::Home, DrawerTab::Wardrobe, DrawerTab::Outfits, DrawerTab::Settings]
    }
}

// =============================================================================
// Navigation Stack
// =============================================================================

/// One screen instance on the stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEntry {
    /// The route
    pub route: Route,
    /// Distinguishes repeated visits to the same route
    pub key: String,
}

impl StackEntry {
    /// Fresh entry with a new key
    pub fn new(route: Route) -> Self {
        Self { route, key: uuid::Uuid::new_v4().to_string() }
    }
}

/// Navigation stack; never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationStack {
    /// Bottom entry
    root: StackEntry,
    /// Entries above the root (bottom to top)
    above: Vec<StackEntry>,
}

impl NavigationStack {
    /// Stack holding only `root`
    pub fn new(root: Route) -> Self {
        Self { root: StackEntry::new(root), above: Vec::new() }
    }

    /// Open `route` above the current screen
    pub fn push(&mut self, route: Route) {
        self.above.push(StackEntry::new(route));
    }

    /// Pop the top route (returns false at root)
    pub fn pop(&mut self) -> bool {
        self.above.pop().is_some()
    }

    /// Drop everything above the root
    pub fn pop_to_root(&mut self) {
        self.above.clear();
    }

    /// Swap the top screen for `route`
    pub fn replace(&mut self, route: Route) {
        *self.current_entry_mut() = StackEntry::new(route);
    }

    /// Discard the stack and start over at `route`
    pub fn reset(&mut self, route: Route) {
        self.root = StackEntry::new(route);
        self.above.clear();
    }

    /// Route on top
    pub fn current(&self) -> Route {
        self.current_entry().route
    }

    /// Entry on top
    pub fn current_entry(&self) -> &StackEntry {
        self.above.last().unwrap_or(&self.root)
    }

    fn current_entry_mut(&mut self) -> &mut StackEntry {
        match self.above.last_mut() {
            Some(entry) => entry,
            None => &mut self.root,
        }
    }

    /// The root route
    pub fn root(&self) -> Route {
        self.root.route
    }

    /// Whether anything sits above the root
    pub fn can_go_back(&self) -> bool {
        !self.above.is_empty()
    }

    /// Number of entries, root included
    pub fn depth(&self) -> usize {
        self.above.len() + 1
    }

    /// Routes from bottom to top
    pub fn routes(&self) -> Vec<Route> {
        std::iter::once(&self.root).chain(&self.above).map(|e| e.route).collect()
    }
}

// =============================================================================
// Router
// =============================================================================

/// URL router for parsing deep-link paths to routes
pub struct Router {
    /// Path segments per route
    patterns: Vec<(Vec<&'static str>, Route)>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a router over every route
    pub fn new() -> Self {
        let patterns = Route::ALL
            .iter()
            .map(|route| (Self::segments(route.to_path()), *route))
            .collect();
        Self { patterns }
    }

    fn segments(path: &str) -> Vec<&str> {
        path.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Resolve a deep-link path
    ///
    /// Query strings, fragments and trailing slashes are ignored. Unknown
    /// paths match [`Route::NotFound`].
    pub fn match_path(&self, path: &str) -> Route {
        let pathname = path.split(['?', '#']).next().unwrap_or_default();
        let segments = Self::segments(pathname);

        self.patterns
            .iter()
            .find(|(pattern, _)| *pattern == segments)
            .map(|(_, route)| *route)
            .unwrap_or(Route::NotFound)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_to_path() {
        assert_eq!(Route::Home.to_path(), "/");
        assert_eq!(Route::VerifyOtp.to_path(), "/verify-otp");
        assert_eq!(Route::OutfitsAiPick.to_path(), "/outfits/ai-pick");
    }

    #[test]
    fn test_route_requires_auth() {
        assert!(Route::Home.requires_auth());
        assert!(Route::SettingsPremium.requires_auth());
        assert!(!Route::Login.requires_auth());
        assert!(!Route::ResetPassword.requires_auth());
        assert!(!Route::NotFound.requires_auth());
    }

    #[test]
    fn test_router_matches_every_route() {
        let router = Router::new();
        for route in Route::ALL {
            assert_eq!(router.match_path(route.to_path()), route);
        }
    }

    #[test]
    fn test_router_ignores_query_and_trailing_slash() {
        let router = Router::new();
        assert_eq!(router.match_path("/outfits/favorites/"), Route::OutfitsFavorites);
        assert_eq!(router.match_path("/login?redirect=%2Fwardrobe"), Route::Login);
        assert_eq!(router.match_path(""), Route::Home);
    }

    #[test]
    fn test_router_not_found() {
        let router = Router::new();
        assert_eq!(router.match_path("/outfits/unknown"), Route::NotFound);
        assert_eq!(router.match_path("/profile/alice"), Route::NotFound);
    }

    #[test]
    fn test_drawer_tabs() {
        for tab in DrawerTab::all() {
            assert_eq!(tab.root_route().tab(), Some(tab));
        }
        assert_eq!(Route::OutfitsAiPick.tab(), Some(DrawerTab::Outfits));
        assert_eq!(Route::Login.tab(), None);
    }

    #[test]
    fn test_navigation_stack_push_pop() {
        let mut stack = NavigationStack::new(Route::Login);
        assert_eq!(stack.depth(), 1);
        assert!(!stack.can_go_back());

        stack.push(Route::ForgotPassword);
        stack.push(Route::VerifyOtp);
        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.current(), Route::VerifyOtp);

        assert!(stack.pop());
        assert_eq!(stack.current(), Route::ForgotPassword);

        stack.pop_to_root();
        assert_eq!(stack.current(), Route::Login);

        // Can't pop past root
        assert!(!stack.pop());
    }

    #[test]
    fn test_navigation_stack_replace() {
        let mut stack = NavigationStack::new(Route::Login);
        stack.replace(Route::Signup);
        assert_eq!(stack.routes(), vec![Route::Signup]);

        stack.push(Route::VerifyOtp);
        let key = stack.current_entry().key.clone();
        stack.replace(Route::ResetPassword);
        assert_eq!(stack.routes(), vec![Route::Signup, Route::ResetPassword]);
        assert_ne!(stack.current_entry().key, key);
    }

    #[test]
    fn test_route_serialization() {
        let json = serde_json::to_string(&Route::OutfitsAiPick).unwrap();
        assert_eq!(json, r#""outfits-ai-pick""#);
        let parsed: Route = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Route::OutfitsAiPick);
    }

    #[test]
    fn test_route_title() {
        assert_eq!(Route::Home.title(), "Home");
        assert_eq!(Route::Login.title(), "Sign In");
    }
}

//! Navigation layer for Outfit Planner
//!
//! This crate maps the auth workflows' navigation intents onto screens: the
//! route table of the auth stack and the signed-in drawer, deep-link parsing,
//! the navigation stack, and the auth gate that keeps protected screens out
//! of reach without a session.
//!
//! # Modules
//!
//! - [`navigation`] - Routes, router, drawer tabs and the navigation stack
//! - [`navigator`] - Auth gate and the intent-applying navigator
//!
//! # Example
//!
//! ```rust
//! use app_state::SessionObserver;
//! use app_ui::{AuthGate, Navigator, Route};
//!
//! let navigator = Navigator::new(AuthGate::new(SessionObserver::new()));
//! assert_eq!(navigator.current(), Route::Login);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod navigation;
pub mod navigator;

pub use navigation::{DrawerTab, NavigationStack, Route, RouteGroup, Router, StackEntry};
pub use navigator::{
    route_for, AuthGate, GateDecision, NavigationError, NavigationOutcome, Navigator,
};

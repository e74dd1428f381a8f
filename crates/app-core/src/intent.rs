//! One-shot navigation intents
//!
//! Controllers never navigate themselves. On success they emit a
//! `NavigationIntent` carrying a process-unique id; the navigator applies each
//! id at most once, so a duplicated intent cannot navigate twice.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

static NEXT_INTENT_ID: AtomicU64 = AtomicU64::new(1);

/// Where an auth workflow sends the user next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// The authenticated area (drawer home)
    MainArea,
    /// The sign-in screen
    SignIn,
    /// The reset-code entry screen
    VerifyCode,
    /// The new-password screen
    ResetPassword,
}

/// How the destination is entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    /// On top of the current screen (back returns here)
    Push,
    /// Instead of the current screen
    Replace,
}

/// A request to navigate, applied at most once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationIntent {
    /// Process-unique id
    pub id: u64,
    /// Target
    pub destination: Destination,
    /// Push or replace
    pub mode: NavigationMode,
}

impl NavigationIntent {
    /// Create an intent with a fresh id
    pub fn new(destination: Destination, mode: NavigationMode) -> Self {
        Self {
            id: NEXT_INTENT_ID.fetch_add(1, Ordering::Relaxed),
            destination,
            mode,
        }
    }
}

/// Sending side of the navigation channel, handed to controllers
#[derive(Debug, Clone)]
pub struct NavigationSink {
    tx: mpsc::UnboundedSender<NavigationIntent>,
}

impl NavigationSink {
    /// Emit an intent
    ///
    /// An intent emitted after the navigator is gone is dropped.
    pub fn emit(&self, intent: NavigationIntent) {
        tracing::debug!(id = intent.id, destination = ?intent.destination, mode = ?intent.mode, "navigation intent");
        if self.tx.send(intent).is_err() {
            tracing::debug!("navigation receiver closed, intent dropped");
        }
    }
}

/// Receiving side of the navigation channel
pub type NavigationReceiver = mpsc::UnboundedReceiver<NavigationIntent>;

/// Create a navigation channel
pub fn navigation_channel() -> (NavigationSink, NavigationReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NavigationSink { tx }, rx)
}

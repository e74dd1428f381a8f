//! Screen lifetime and deferred actions
//!
//! A `ScreenScope` is created when a screen mounts and torn down when it
//! unmounts. Controllers check it before applying a gateway completion, and
//! deferred actions scheduled through it are aborted on teardown and re-check
//! liveness right before running.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};

#[derive(Debug)]
struct ScopeInner {
    name: String,
    mounted: AtomicBool,
    deferred: Mutex<Vec<JoinHandle<()>>>,
}

/// Liveness of one mounted screen
///
/// Clones share the same lifetime.
#[derive(Debug, Clone)]
pub struct ScreenScope {
    inner: Arc<ScopeInner>,
}

impl ScreenScope {
    /// Mount a screen
    pub fn mount(name: impl Into<String>) -> Self {
        let name = name.into();
        tracing::debug!(screen = %name, "screen mounted");
        Self {
            inner: Arc::new(ScopeInner {
                name,
                mounted: AtomicBool::new(true),
                deferred: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Screen name (for logs)
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether the screen is still mounted
    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::Acquire)
    }

    /// Tear the screen down, aborting pending deferred actions
    ///
    /// Idempotent.
    pub fn unmount(&self) {
        if !self.inner.mounted.swap(false, Ordering::AcqRel) {
            return;
        }

        let pending: Vec<_> = std::mem::take(&mut *self.inner.deferred.lock());
        for handle in &pending {
            handle.abort();
        }
        tracing::debug!(screen = %self.inner.name, aborted = pending.len(), "screen unmounted");
    }

    /// Run `action` once after `delay`, unless the screen is gone by then
    ///
    /// Returns `None` when the screen is already unmounted. Must be called
    /// from within a tokio runtime.
    pub fn schedule<F>(&self, delay: Duration, action: F) -> Option<DeferredAction>
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.is_mounted() {
            return None;
        }

        let scope = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if scope.is_mounted() {
                action();
            } else {
                tracing::debug!(screen = %scope.name(), "deferred action skipped after unmount");
            }
        });

        let abort = handle.abort_handle();
        let mut deferred = self.inner.deferred.lock();
        deferred.retain(|h| !h.is_finished());
        deferred.push(handle);

        // Lost a race with unmount: make sure the task cannot outlive the screen
        if !self.is_mounted() {
            abort.abort();
        }

        Some(DeferredAction { abort })
    }

    /// Number of deferred actions not yet finished
    pub fn pending(&self) -> usize {
        self.inner
            .deferred
            .lock()
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }
}

/// Handle to a scheduled deferred action
#[derive(Debug)]
pub struct DeferredAction {
    abort: AbortHandle,
}

impl DeferredAction {
    /// Cancel the action if it has not run yet
    pub fn cancel(&self) {
        self.abort.abort();
    }

    /// Whether the action ran, was cancelled or was aborted
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

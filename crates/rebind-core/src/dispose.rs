#![forbid(unsafe_code)]

//! The [`Disposable`] capability and [`AutoDispose`], a closure-backed
//! disposable.
//!
//! Anything that needs teardown — a subscription, a timer, an observation
//! token — is adapted into [`Disposable`]: a single idempotent `dispose()`
//! operation. Reactive frameworks are not referenced directly; an RAII guard
//! from any of them adapts in one line:
//!
//! ```
//! use rebind_core::dispose::AutoDispose;
//!
//! let guard = String::from("some subscription guard");
//! let disposable = AutoDispose::new(move || drop(guard));
//! ```
//!
//! # Invariants
//!
//! 1. `dispose()` is idempotent: the wrapped action fires at most once, no
//!    matter how many times (or from how many threads) `dispose()` is called.
//! 2. Dropping an [`AutoDispose`] that was never disposed fires the action
//!    exactly once.
//! 3. A re-entrant `dispose()` from inside the action itself is a no-op, not
//!    a deadlock: the action is detached from the slot before it runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

// Import tracing macros (no-op when tracing feature is disabled).
#[cfg(feature = "tracing")]
use crate::logging::trace;
#[cfg(not(feature = "tracing"))]
use crate::trace;

// ─── Metrics counters ────────────────────────────────────────────────────────

/// Total number of cleanup actions fired through [`AutoDispose`].
static DISPOSALS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Read the total fired-cleanup count (for diagnostics/telemetry).
#[must_use]
pub fn disposals_total() -> u64 {
    DISPOSALS_TOTAL.load(Ordering::Relaxed)
}

// ─── Disposable ──────────────────────────────────────────────────────────────

/// A resource exposing a single idempotent release operation.
///
/// Implementations must tolerate concurrent and repeated calls: the first
/// `dispose()` performs the cleanup, every later call is a no-op.
pub trait Disposable: Send + Sync {
    /// Perform the underlying cleanup. Idempotent.
    fn dispose(&self);
}

impl<T: Disposable + ?Sized> Disposable for Box<T> {
    fn dispose(&self) {
        (**self).dispose();
    }
}

impl<T: Disposable + ?Sized> Disposable for Arc<T> {
    fn dispose(&self) {
        (**self).dispose();
    }
}

// ─── AutoDispose ─────────────────────────────────────────────────────────────

/// Wraps a cleanup closure as a [`Disposable`].
///
/// The closure fires on the first `dispose()` call or, if never disposed
/// explicitly, when the `AutoDispose` is dropped. Holders keep it alive for
/// as long as the underlying resource should stay registered.
pub struct AutoDispose {
    /// `None` once the action has fired.
    action: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl AutoDispose {
    /// Wrap `action` so it runs exactly once on dispose or drop.
    #[must_use]
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            action: Mutex::new(Some(Box::new(action))),
        }
    }

    /// Whether the wrapped action has already fired.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Detach the action under the lock; run it (if armed) after releasing.
    fn fire(action: Option<Box<dyn FnOnce() + Send>>) {
        if let Some(action) = action {
            trace!("auto-dispose action firing");
            action();
            DISPOSALS_TOTAL.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Disposable for AutoDispose {
    fn dispose(&self) {
        let action = self
            .action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Self::fire(action);
    }
}

impl Drop for AutoDispose {
    fn drop(&mut self) {
        let action = self
            .action
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Self::fire(action);
    }
}

impl std::fmt::Debug for AutoDispose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoDispose")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

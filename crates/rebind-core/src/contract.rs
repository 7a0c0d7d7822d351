#![forbid(unsafe_code)]

//! Contract-violation reporting with a one-shot test override.
//!
//! Misusing an owner — rebinding a strict owner, reading a model before the
//! first bind — is a programmer error, not a recoverable condition. By
//! default a violation panics with the offending call site. Tests install a
//! one-shot override to observe the violation instead of terminating:
//!
//! ```
//! use rebind_core::contract;
//!
//! contract::override_violation_once(|v| {
//!     eprintln!("caught: {v}");
//! });
//! // The next violation calls the closure and auto-uninstalls it;
//! // the one after that panics again.
//! ```
//!
//! This is process-wide mutable test-seam state, not a production API.
//!
//! # Invariants
//!
//! 1. The default handler panics; it never returns.
//! 2. An installed override is consumed by exactly one violation, then the
//!    default handler is back in force.
//! 3. Installing a new override replaces an unconsumed one.

use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;

// Import tracing macros (no-op when tracing feature is disabled).
#[cfg(feature = "tracing")]
use crate::logging::warn;
#[cfg(not(feature = "tracing"))]
use crate::warn;

// ─── Metrics counters ────────────────────────────────────────────────────────

/// Total number of contract violations reported.
static VIOLATIONS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Read the total violation count (for diagnostics/telemetry).
#[must_use]
pub fn violations_total() -> u64 {
    VIOLATIONS_TOTAL.load(Ordering::Relaxed)
}

// ─── Violation ───────────────────────────────────────────────────────────────

/// Details of a single contract violation, handed to an override handler.
#[derive(Debug, Clone)]
pub struct Violation {
    message: String,
    location: &'static Location<'static>,
}

impl Violation {
    /// Human-readable description of the violated contract.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Call site that triggered the violation.
    #[must_use]
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (at {}:{})",
            self.message,
            self.location.file(),
            self.location.line()
        )
    }
}

// ─── Handler seam ────────────────────────────────────────────────────────────

type Handler = Box<dyn Fn(&Violation) + Send + Sync>;

/// One-shot override slot. `swap(None)` on each violation gives the
/// install-fire-uninstall lifecycle without a save/restore stack.
static OVERRIDE: ArcSwapOption<Handler> = ArcSwapOption::const_empty();

/// Report a contract violation.
///
/// Consumes the installed override if there is one; otherwise panics with the
/// message and caller location.
#[track_caller]
pub fn violation(message: impl Into<String>) {
    let violation = Violation {
        message: message.into(),
        location: Location::caller(),
    };
    VIOLATIONS_TOTAL.fetch_add(1, Ordering::Relaxed);

    if let Some(handler) = OVERRIDE.swap(None) {
        warn!("contract violation intercepted by test override");
        (*handler)(&violation);
        return;
    }
    panic!("contract violation: {violation}");
}

/// Install a handler consumed by the next [`violation`], in place of the
/// default panic. Auto-uninstalls after firing once.
pub fn override_violation_once(handler: impl Fn(&Violation) + Send + Sync + 'static) {
    OVERRIDE.store(Some(Arc::new(Box::new(handler))));
}

/// Suppress the next [`violation`] entirely: it is still counted, but the
/// caller proceeds as if the contract held.
pub fn suppress_violation_once() {
    override_violation_once(|_| {});
}

/// The override slot is process-wide; every test that reports a violation or
/// installs an override holds this lock for its duration.
#[cfg(test)]
pub(crate) static TEST_SEAM: std::sync::Mutex<()> = std::sync::Mutex::new(());

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::Mutex;

    use super::TEST_SEAM as SEAM;

    #[test]
    fn default_handler_panics_with_message() {
        let _guard = SEAM.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let result = catch_unwind(AssertUnwindSafe(|| {
            violation("owner rebound");
        }));
        let payload = result.unwrap_err();
        let text = payload
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert!(text.contains("contract violation"));
        assert!(text.contains("owner rebound"));
    }

    #[test]
    fn override_fires_once_then_uninstalls() {
        let _guard = SEAM.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        override_violation_once(move |v| {
            seen_clone.lock().unwrap().push(v.message().to_string());
        });

        violation("first");
        assert_eq!(*seen.lock().unwrap(), vec!["first".to_string()]);

        // Override consumed: the next violation panics again.
        let result = catch_unwind(AssertUnwindSafe(|| {
            violation("second");
        }));
        assert!(result.is_err());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn suppress_swallows_exactly_one_violation() {
        let _guard = SEAM.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        suppress_violation_once();
        violation("swallowed");

        let result = catch_unwind(AssertUnwindSafe(|| {
            violation("not swallowed");
        }));
        assert!(result.is_err());
    }

    #[test]
    fn violation_carries_the_call_site() {
        let _guard = SEAM.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let seen = Arc::new(Mutex::new(String::new()));
        let seen_clone = Arc::clone(&seen);
        override_violation_once(move |v| {
            *seen_clone.lock().unwrap() = format!("{v}");
        });

        violation("located");
        let text = seen.lock().unwrap().clone();
        assert!(text.contains("located"));
        assert!(text.contains("contract.rs"));
    }

    #[test]
    fn violations_are_counted() {
        let _guard = SEAM.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let before = violations_total();
        suppress_violation_once();
        violation("counted");
        assert!(violations_total() > before);
    }
}

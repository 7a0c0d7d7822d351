#![forbid(unsafe_code)]

//! [`DisposeBag`]: an ordered registry of [`Disposable`]s released together.
//!
//! A bag collects every disposable a binding callback registers while a view
//! model is active, and guarantees they are all released exactly once — on an
//! explicit `dispose()`, or when the last handle to the bag is dropped.
//!
//! # Design
//!
//! `DisposeBag` is a cheaply cloneable handle over shared, reference-counted
//! state. The owner engine keeps one handle in its slot storage; the binding
//! callback receives another. All clones refer to the same registry.
//!
//! # Invariants
//!
//! 1. Disposables are released in registration order.
//! 2. `dispose()` is idempotent: the second and later calls are no-ops.
//! 3. After release, the bag never silently retains: an `add()` on a released
//!    bag disposes the incoming item immediately.
//! 4. Dropping the last handle of an unreleased bag releases its contents
//!    exactly once.
//! 5. Re-entrant `add`/`dispose` from inside a cleanup action is safe: the
//!    collection is detached from the lock before iteration.
//!
//! # Failure Modes
//!
//! - **Panicking cleanup action**: caught and logged; the remaining
//!   disposables in the batch are still released. Never re-raised to the
//!   caller.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use crate::dispose::Disposable;

// Import tracing macros (no-op when tracing feature is disabled).
#[cfg(feature = "tracing")]
use crate::logging::{trace, warn};
#[cfg(not(feature = "tracing"))]
use crate::{trace, warn};

// ─── Inner shared state ──────────────────────────────────────────────────────

struct BagState {
    items: Vec<Box<dyn Disposable>>,
    released: bool,
}

struct BagInner {
    state: Mutex<BagState>,
}

impl BagInner {
    /// Detach the collection under the lock, then release outside it.
    fn release(&self) {
        let items = {
            let mut state = self
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if state.released {
                return;
            }
            state.released = true;
            std::mem::take(&mut state.items)
        };
        release_all(items);
    }
}

impl Drop for BagInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if !state.released {
            state.released = true;
            release_all(std::mem::take(&mut state.items));
        }
    }
}

/// Release a detached batch in registration order, isolating panics so one
/// failing action cannot starve the rest of the batch.
fn release_all(items: Vec<Box<dyn Disposable>>) {
    trace!(count = items.len(), "releasing dispose bag");
    for item in items {
        if catch_unwind(AssertUnwindSafe(|| item.dispose())).is_err() {
            warn!("dispose action panicked; continuing with remaining disposables");
        }
    }
}

// ─── DisposeBag ──────────────────────────────────────────────────────────────

/// Ordered registry of disposables, released together.
///
/// Cloning produces another handle to the **same** registry.
///
/// ```
/// use rebind_core::bag::DisposeBag;
/// use rebind_core::dispose::AutoDispose;
///
/// let bag = DisposeBag::new();
/// bag.add(AutoDispose::new(|| println!("released")));
/// bag.dispose(); // prints "released"
/// bag.dispose(); // no-op
/// ```
#[derive(Clone)]
pub struct DisposeBag {
    inner: Arc<BagInner>,
}

impl DisposeBag {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BagInner {
                state: Mutex::new(BagState {
                    items: Vec::new(),
                    released: false,
                }),
            }),
        }
    }

    /// Register a disposable. Never runs it immediately — unless the bag was
    /// already released, in which case the item is disposed on the spot
    /// rather than silently retained.
    pub fn add(&self, disposable: impl Disposable + 'static) {
        let mut state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if state.released {
            // Outside the lock: the item's action may re-enter this bag.
            drop(state);
            trace!("add on released bag; disposing item immediately");
            disposable.dispose();
        } else {
            state.items.push(Box::new(disposable));
        }
    }

    /// Register a plain closure as a one-shot cleanup action.
    pub fn add_fn(&self, action: impl FnOnce() + Send + 'static) {
        self.add(crate::dispose::AutoDispose::new(action));
    }

    /// Whether the bag has been released.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .released
    }

    /// Number of disposables currently held (zero after release).
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .len()
    }

    /// Whether the bag currently holds no disposables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release every held disposable in registration order. Idempotent.
    pub fn dispose(&self) {
        self.inner.release();
    }
}

impl Disposable for DisposeBag {
    fn dispose(&self) {
        self.inner.release();
    }
}

impl Default for DisposeBag {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DisposeBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposeBag")
            .field("len", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

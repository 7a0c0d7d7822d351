#![forbid(unsafe_code)]

//! Owner contracts: a generic binding engine plus the [`NonReusableOwner`]
//! and [`ReusableOwner`] traits.
//!
//! An owner (screen, cell, row) embeds a [`ModelSlot`] holding its current
//! view model and the [`DisposeBag`] collecting everything that model's
//! presentation logic registers. Binding a new model *rotates* the bag:
//! the previous bag is force-released before the binding callback runs, so
//! resources of the prior model are guaranteed torn down before the new one
//! starts registering its own.
//!
//! # Design
//!
//! One engine, two policies ([`RebindPolicy`]): the strict flavor treats a
//! second bind (and a read before the first bind) as a contract violation;
//! the reusable flavor allows any number of rebinds and an explicit
//! [`ModelSlot::clear`]. The traits are thin ergonomic wrappers over the
//! engine, mirroring the two host-facing contracts.
//!
//! # Invariants
//!
//! 1. Bag rotation completes — previous bag released, fresh bag stored —
//!    before the binding callback observes the new model.
//! 2. `clear()` rotates unconditionally but never invokes the callback.
//! 3. Slot mutation (model + bag swap) is serialized per owner; the binding
//!    callback runs outside that critical section so it may read the slot or
//!    register into the bag.
//! 4. A strict slot never transitions back to unbound.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rebind_core::bag::DisposeBag;
//! use rebind_core::owner::{ModelSlot, NonReusableOwner};
//!
//! struct Greeting {
//!     identifier: String,
//! }
//!
//! struct Screen {
//!     slot: ModelSlot<Greeting>,
//! }
//!
//! impl NonReusableOwner for Screen {
//!     type Model = Greeting;
//!
//!     fn model_slot(&self) -> &ModelSlot<Greeting> {
//!         &self.slot
//!     }
//!
//!     fn model_bound(&self, model: &Greeting, _bag: &DisposeBag) {
//!         println!("model was set {}", model.identifier);
//!     }
//! }
//!
//! let screen = Screen { slot: ModelSlot::strict() };
//! screen.set_model(Arc::new(Greeting { identifier: "correctly".into() }));
//! ```

use std::any::Any;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::bag::DisposeBag;
use crate::contract;
use crate::storage::{Key, Slots};

// Import tracing macros (no-op when tracing feature is disabled).
#[cfg(feature = "tracing")]
use crate::logging::trace;
#[cfg(not(feature = "tracing"))]
use crate::trace;

// ─── Slot keys ───────────────────────────────────────────────────────────────

const MODEL_KEY: Key = Key::new("rebind.owner.model");
const BAG_KEY: Key = Key::new("rebind.owner.bag");

// ─── Metrics counters ────────────────────────────────────────────────────────

/// Total number of bag rotations across all owners.
static ROTATIONS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Read the total bag-rotation count (for diagnostics/telemetry).
#[must_use]
pub fn rotations_total() -> u64 {
    ROTATIONS_TOTAL.load(Ordering::Relaxed)
}

// ─── RebindPolicy ────────────────────────────────────────────────────────────

/// Rebinding discipline of a [`ModelSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebindPolicy {
    /// One bind for the owner's lifetime; a second bind or a read before the
    /// first bind is a contract violation.
    Strict,
    /// Any number of rebinds; the model may be absent at any time.
    Reusable,
}

// ─── ModelSlot ───────────────────────────────────────────────────────────────

/// Per-owner binding engine: the current model, its dispose bag, and the
/// rotation discipline.
///
/// Owners embed one slot and expose it through [`NonReusableOwner`] or
/// [`ReusableOwner`]; the slot can equally be driven directly.
pub struct ModelSlot<M> {
    policy: RebindPolicy,
    slots: Slots,
    /// Serializes the mutation section of bind/clear/reconfigure.
    op_lock: Mutex<()>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Any + Send + Sync> ModelSlot<M> {
    /// Create a slot with the strict (bind-once) policy.
    #[must_use]
    pub fn strict() -> Self {
        Self::with_policy(RebindPolicy::Strict)
    }

    /// Create a slot with the reusable policy.
    #[must_use]
    pub fn reusable() -> Self {
        Self::with_policy(RebindPolicy::Reusable)
    }

    /// Create a slot with an explicit policy.
    #[must_use]
    pub fn with_policy(policy: RebindPolicy) -> Self {
        Self {
            policy,
            slots: Slots::new(),
            op_lock: Mutex::new(()),
            _model: PhantomData,
        }
    }

    /// The slot's rebinding discipline.
    #[must_use]
    pub fn policy(&self) -> RebindPolicy {
        self.policy
    }

    /// Swap in a fresh bag. Caller holds the op lock; the detached previous
    /// bag is returned so it can be released outside the critical section.
    fn rotate(&self) -> (Option<Arc<DisposeBag>>, DisposeBag) {
        let previous = self.slots.get::<DisposeBag>(BAG_KEY);
        let bag = DisposeBag::new();
        self.slots.set(BAG_KEY, Some(Arc::new(bag.clone())));
        ROTATIONS_TOTAL.fetch_add(1, Ordering::Relaxed);
        (previous, bag)
    }

    /// Bind `model`, rotating the bag and invoking `f(&model, &bag)`.
    ///
    /// Under [`RebindPolicy::Strict`], binding an already-bound slot is a
    /// contract violation. If the violation is suppressed, the bind proceeds:
    /// the bag rotates, the model is overwritten, and the callback fires.
    #[track_caller]
    pub fn bind(&self, model: Arc<M>, f: impl FnOnce(&M, &DisposeBag)) {
        let (previous, bag) = {
            let _guard = self.op_lock.lock().unwrap_or_else(PoisonError::into_inner);
            if self.policy == RebindPolicy::Strict && self.slots.contains(MODEL_KEY) {
                contract::violation(
                    "strict owner rebound; use a reusable owner for recycled views",
                );
            }
            self.slots.set(MODEL_KEY, Some(Arc::clone(&model)));
            self.rotate()
        };
        if let Some(previous) = previous {
            trace!("releasing previous bag before rebinding");
            previous.dispose();
        }
        f(&model, &bag);
    }

    /// Clear the model, rotating the bag (forced cleanup) without invoking
    /// any callback.
    pub fn clear(&self) {
        let previous = {
            let _guard = self.op_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.slots.set::<M>(MODEL_KEY, None);
            self.rotate().0
        };
        if let Some(previous) = previous {
            previous.dispose();
        }
    }

    /// Re-invoke the binding callback with the current model and a freshly
    /// rotated bag.
    ///
    /// Useful for delayed configuration, e.g. starting the model's work once
    /// the owning view is actually visible. On an unbound reusable slot this
    /// is a no-op; on an unbound strict slot it is a contract violation.
    #[track_caller]
    pub fn reconfigure(&self, f: impl FnOnce(&M, &DisposeBag)) {
        let model = match self.try_model() {
            Some(model) => model,
            None => {
                if self.policy == RebindPolicy::Strict {
                    contract::violation("reconfigure on an owner that was never bound");
                }
                return;
            }
        };
        let (previous, bag) = {
            let _guard = self.op_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.rotate()
        };
        if let Some(previous) = previous {
            previous.dispose();
        }
        f(&model, &bag);
    }

    /// The bound model.
    ///
    /// Reading before the first bind is a contract violation; there is no
    /// value to return, so this panics even when the violation is suppressed.
    #[track_caller]
    #[must_use]
    pub fn model(&self) -> Arc<M> {
        match self.try_model() {
            Some(model) => model,
            None => {
                contract::violation("model read before the first bind");
                panic!("model read before the first bind (violation suppressed)");
            }
        }
    }

    /// The bound model, if any. Never asserts.
    #[must_use]
    pub fn try_model(&self) -> Option<Arc<M>> {
        self.slots.get::<M>(MODEL_KEY)
    }

    /// Whether a model has been bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.try_model().is_some()
    }

    /// The current bag, if a rotation has happened.
    #[must_use]
    pub fn bag(&self) -> Option<DisposeBag> {
        self.slots
            .get::<DisposeBag>(BAG_KEY)
            .map(|bag| (*bag).clone())
    }
}

impl<M> std::fmt::Debug for ModelSlot<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSlot")
            .field("policy", &self.policy)
            .field("bound", &self.slots.contains(MODEL_KEY))
            .finish()
    }
}

// ─── NonReusableOwner ────────────────────────────────────────────────────────

/// Owner whose model is bound exactly once for its lifetime.
///
/// Implementers embed a [`ModelSlot`] constructed with [`ModelSlot::strict`]
/// and implement [`model_bound`](Self::model_bound); everything else is
/// provided. Rebinding, or reading the model before the first bind, is a
/// contract violation (see [`crate::contract`]).
pub trait NonReusableOwner {
    /// The bound view-model type.
    type Model: Any + Send + Sync;

    /// The embedded binding engine. Must be constructed strict.
    fn model_slot(&self) -> &ModelSlot<Self::Model>;

    /// Invoked after each bind with the new model and its fresh bag.
    /// Register every subscription the model's presentation logic creates
    /// into `bag`.
    fn model_bound(&self, model: &Self::Model, bag: &DisposeBag);

    /// Bind the model. A second call violates the owner contract.
    #[track_caller]
    fn set_model(&self, model: Arc<Self::Model>) {
        self.model_slot()
            .bind(model, |model, bag| self.model_bound(model, bag));
    }

    /// The bound model. Violates the contract when read before the first
    /// bind.
    #[track_caller]
    #[must_use]
    fn model(&self) -> Arc<Self::Model> {
        self.model_slot().model()
    }

    /// The bound model, if any. Never asserts (test-facing probe).
    #[must_use]
    fn try_model(&self) -> Option<Arc<Self::Model>> {
        self.model_slot().try_model()
    }

    /// Whether a model has been bound.
    #[must_use]
    fn has_model(&self) -> bool {
        self.model_slot().is_bound()
    }

    /// Re-invoke [`model_bound`](Self::model_bound) with the current model
    /// and a freshly rotated bag.
    #[track_caller]
    fn reconfigure(&self) {
        self.model_slot()
            .reconfigure(|model, bag| self.model_bound(model, bag));
    }
}

// ─── ReusableOwner ───────────────────────────────────────────────────────────

/// Owner that is rebound many times, e.g. a recycled list cell.
///
/// Implementers embed a [`ModelSlot`] constructed with
/// [`ModelSlot::reusable`]. Every `set_model` — including `set_model(None)` —
/// rotates the bag, so resources registered for the previous model are
/// released before the new model binds.
pub trait ReusableOwner {
    /// The bound view-model type.
    type Model: Any + Send + Sync;

    /// The embedded binding engine. Must be constructed reusable.
    fn model_slot(&self) -> &ModelSlot<Self::Model>;

    /// Invoked after each non-empty bind with the new model and its fresh
    /// bag. Not invoked for `set_model(None)`.
    fn model_bound(&self, model: &Self::Model, bag: &DisposeBag);

    /// Reset owner-local UI state for recycling.
    ///
    /// Never called by the engine — requiring it forces implementers to
    /// consider what a recycled owner must clear besides its subscriptions.
    fn prepare_for_reuse(&self);

    /// Bind a new model, or clear with `None`. The previous bag is released
    /// unconditionally; the callback fires only for `Some`.
    fn set_model(&self, model: Option<Arc<Self::Model>>) {
        match model {
            Some(model) => self
                .model_slot()
                .bind(model, |model, bag| self.model_bound(model, bag)),
            None => self.model_slot().clear(),
        }
    }

    /// The bound model, if any.
    #[must_use]
    fn model(&self) -> Option<Arc<Self::Model>> {
        self.model_slot().try_model()
    }

    /// Re-invoke [`model_bound`](Self::model_bound) with the current model
    /// and a freshly rotated bag. No-op while unbound.
    fn reconfigure(&self) {
        self.model_slot()
            .reconfigure(|model, bag| self.model_bound(model, bag));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

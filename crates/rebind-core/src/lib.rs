#![forbid(unsafe_code)]

//! Core: view-model binding lifecycle, dispose bags, and owner contracts.
//!
//! Owners (screens, cells, rows) hold a replaceable view model; everything
//! the model's presentation logic registers — subscriptions, timers,
//! observation tokens — lands in a [`DisposeBag`] that is force-released on
//! every rebind and on owner teardown. See [`owner`] for the two owner
//! contracts and [`contract`] for the violation test seam.

pub mod bag;
pub mod contract;
pub mod dispose;
pub mod owner;
pub mod storage;

pub use bag::DisposeBag;
pub use dispose::{AutoDispose, Disposable};
pub use owner::{ModelSlot, NonReusableOwner, RebindPolicy, ReusableOwner};
pub use storage::{Key, Policy, Slots};

/// Structured logging via `tracing` when the feature is enabled.
#[cfg(feature = "tracing")]
pub(crate) mod logging {
    pub(crate) use tracing::{trace, warn};
}

// No-op fallbacks so call sites never cfg themselves.
#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

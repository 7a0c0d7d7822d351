#![forbid(unsafe_code)]

//! Rebind public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub use rebind_core::{bag, contract, dispose, owner, storage};

pub mod prelude {
    pub use rebind_core::bag::DisposeBag;
    pub use rebind_core::dispose::{AutoDispose, Disposable};
    pub use rebind_core::owner::{ModelSlot, NonReusableOwner, RebindPolicy, ReusableOwner};
    pub use rebind_core::storage::{Key, Policy, Slots};
}

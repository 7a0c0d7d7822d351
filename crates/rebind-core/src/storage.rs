#![forbid(unsafe_code)]

//! [`Slots`]: typed per-instance storage with a retain/copy policy.
//!
//! An owner embeds a `Slots` and attaches arbitrary typed values to itself
//! under stable [`Key`]s, without declaring a field per value. Absence is a
//! first-class state: a slot that was never set (or was cleared) reads back
//! as `None`, and so does a slot read at the wrong type.
//!
//! # Design
//!
//! Values are stored as `Arc<dyn Any + Send + Sync>` behind one mutex, so an
//! owner can use its slots through `&self`. Entries live exactly as long as
//! the owning `Slots` — the owner's own lifetime reclaims them, no weak-map
//! machinery needed.
//!
//! The copy policy duplicates at store time: [`Slots::set_with`] under
//! [`Policy::Copy`] stores a fresh clone of the value, so a later `get`
//! returns an instance distinct from the caller's. Types without a `Clone`
//! impl can only use the retain path ([`Slots::set`]).

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

// ─── Key ─────────────────────────────────────────────────────────────────────

/// Stable identifier for one slot. Distinct names address distinct slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(&'static str);

impl Key {
    /// Create a key from a stable, unique name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The key's name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// How [`Slots::set_with`] stores a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Store the caller's handle; `get` returns the same instance.
    Retain,
    /// Store a duplicate; `get` returns a logically equal, distinct instance.
    Copy,
}

// ─── Slots ───────────────────────────────────────────────────────────────────

/// Typed key-value side storage an owner embeds.
pub struct Slots {
    map: Mutex<HashMap<Key, Arc<dyn Any + Send + Sync>, ahash::RandomState>>,
}

impl Slots {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: Mutex::new(HashMap::default()),
        }
    }

    /// Store `value` under `key` with retain semantics, or clear the slot
    /// when `value` is `None`.
    pub fn set<T: Any + Send + Sync>(&self, key: Key, value: Option<Arc<T>>) {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        match value {
            Some(v) => {
                map.insert(key, v);
            }
            None => {
                map.remove(&key);
            }
        }
    }

    /// Store `value` under `key` with an explicit policy.
    ///
    /// `Policy::Copy` stores a duplicate of the value; `Policy::Retain`
    /// stores the caller's handle. Clearing (`value` = `None`) never attempts
    /// to duplicate.
    pub fn set_with<T: Any + Send + Sync + Clone>(
        &self,
        key: Key,
        value: Option<Arc<T>>,
        policy: Policy,
    ) {
        let stored = match (value, policy) {
            (None, _) => None,
            (Some(v), Policy::Retain) => Some(v),
            (Some(v), Policy::Copy) => Some(Arc::new(v.as_ref().clone())),
        };
        self.set(key, stored);
    }

    /// Read the slot at `key` as a `T`.
    ///
    /// Returns `None` when the slot is empty **or** holds a value of another
    /// type — a mismatched read is absence, never an error.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, key: Key) -> Option<Arc<T>> {
        let map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = Arc::clone(map.get(&key)?);
        entry.downcast::<T>().ok()
    }

    /// Whether any value is stored under `key` (regardless of type).
    #[must_use]
    pub fn contains(&self, key: Key) -> bool {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&key)
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no slots are occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Slots {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Slots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slots").field("len", &self.len()).finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

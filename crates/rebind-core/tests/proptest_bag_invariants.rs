//! Property-based invariant tests for the dispose registry.
//!
//! These tests verify invariants of `DisposeBag` that must hold for **any**
//! interleaving of `add` and `dispose`:
//!
//! 1. Every added action fires exactly once.
//! 2. Actions added before the first dispose fire at dispose time, in
//!    registration order.
//! 3. Actions added after the dispose fire immediately.
//! 4. A second dispose adds no invocations.
//! 5. Dropping a never-disposed bag fires everything pending, in order.

use proptest::prelude::*;
use rebind_core::bag::DisposeBag;
use std::sync::{Arc, Mutex};

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum BagOp {
    Add,
    Dispose,
}

fn ops() -> impl Strategy<Value = Vec<BagOp>> {
    proptest::collection::vec(
        prop_oneof![3 => Just(BagOp::Add), 1 => Just(BagOp::Dispose)],
        0..64,
    )
}

/// Replay `ops` against a real bag while simulating the expected firing
/// trace, then compare.
fn replay(ops: &[BagOp]) -> (Vec<usize>, Vec<usize>) {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let bag = DisposeBag::new();

    let mut next_id = 0usize;
    let mut pending = Vec::new();
    let mut disposed = false;
    let mut expected = Vec::new();

    for op in ops {
        match op {
            BagOp::Add => {
                let id = next_id;
                next_id += 1;
                let fired = Arc::clone(&fired);
                bag.add_fn(move || fired.lock().unwrap().push(id));

                if disposed {
                    expected.push(id);
                } else {
                    pending.push(id);
                }
            }
            BagOp::Dispose => {
                bag.dispose();
                if !disposed {
                    disposed = true;
                    expected.append(&mut pending);
                }
            }
        }
    }

    // Dropping the last handle releases whatever is still pending.
    drop(bag);
    expected.append(&mut pending);

    let fired = fired.lock().unwrap().clone();
    (fired, expected)
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn every_action_fires_exactly_once_in_order(ops in ops()) {
        let (fired, expected) = replay(&ops);
        prop_assert_eq!(
            fired, expected,
            "firing trace diverged for op sequence {:?}", ops
        );
    }

    #[test]
    fn add_only_sequences_fire_on_drop_in_order(count in 0usize..64) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        {
            let bag = DisposeBag::new();
            for id in 0..count {
                let fired = Arc::clone(&fired);
                bag.add_fn(move || fired.lock().unwrap().push(id));
            }
            prop_assert_eq!(bag.len(), count);
        }
        let fired = fired.lock().unwrap().clone();
        prop_assert_eq!(fired, (0..count).collect::<Vec<_>>());
    }

    #[test]
    fn repeated_dispose_never_refires(count in 0usize..32, extra_disposes in 1usize..5) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let bag = DisposeBag::new();
        for id in 0..count {
            let fired = Arc::clone(&fired);
            bag.add_fn(move || fired.lock().unwrap().push(id));
        }

        for _ in 0..extra_disposes {
            bag.dispose();
        }
        drop(bag);

        let fired = fired.lock().unwrap().clone();
        prop_assert_eq!(fired, (0..count).collect::<Vec<_>>());
    }
}

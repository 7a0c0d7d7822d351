//! Property-based invariant tests for the reusable owner state machine.
//!
//! For **any** sequence of `set(model)`, `set(none)`, and `reconfigure`:
//!
//! 1. The callback fires only for non-empty sets (and reconfigures while
//!    bound).
//! 2. Each bound generation's resources are released exactly once, strictly
//!    before the next generation's callback.
//! 3. Clearing releases the current generation without a callback.
//! 4. Dropping the owner releases the final generation.

use proptest::prelude::*;
use rebind_core::bag::DisposeBag;
use rebind_core::owner::{ModelSlot, ReusableOwner};
use std::sync::{Arc, Mutex};

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum OwnerOp {
    Set(u32),
    Clear,
    Reconfigure,
}

fn ops() -> impl Strategy<Value = Vec<OwnerOp>> {
    proptest::collection::vec(
        prop_oneof![
            3 => (1u32..=9).prop_map(OwnerOp::Set),
            1 => Just(OwnerOp::Clear),
            1 => Just(OwnerOp::Reconfigure),
        ],
        0..48,
    )
}

struct CellModel {
    identifier: u32,
}

struct RecycledCell {
    slot: ModelSlot<CellModel>,
    events: Arc<Mutex<Vec<String>>>,
}

impl ReusableOwner for RecycledCell {
    type Model = CellModel;

    fn model_slot(&self) -> &ModelSlot<CellModel> {
        &self.slot
    }

    fn model_bound(&self, model: &CellModel, bag: &DisposeBag) {
        self.events
            .lock()
            .unwrap()
            .push(format!("bind {}", model.identifier));

        let events = Arc::clone(&self.events);
        let id = model.identifier;
        bag.add_fn(move || events.lock().unwrap().push(format!("dispose {id}")));
    }

    fn prepare_for_reuse(&self) {}
}

/// Replay `ops` against a real owner while simulating the expected event
/// trace, then compare.
fn replay(ops: &[OwnerOp]) -> (Vec<String>, Vec<String>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let cell = RecycledCell {
        slot: ModelSlot::reusable(),
        events: Arc::clone(&events),
    };

    // `armed` tracks which generation's cleanup the current bag holds.
    let mut armed: Option<u32> = None;
    let mut expected = Vec::new();

    for op in ops {
        match op {
            OwnerOp::Set(id) => {
                cell.set_model(Some(Arc::new(CellModel { identifier: *id })));
                if let Some(prev) = armed {
                    expected.push(format!("dispose {prev}"));
                }
                expected.push(format!("bind {id}"));
                armed = Some(*id);
            }
            OwnerOp::Clear => {
                cell.set_model(None);
                if let Some(prev) = armed.take() {
                    expected.push(format!("dispose {prev}"));
                }
            }
            OwnerOp::Reconfigure => {
                cell.reconfigure();
                if let Some(current) = armed {
                    expected.push(format!("dispose {current}"));
                    expected.push(format!("bind {current}"));
                }
            }
        }
    }

    drop(cell);
    if let Some(last) = armed {
        expected.push(format!("dispose {last}"));
    }

    let events = events.lock().unwrap().clone();
    (events, expected)
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn event_trace_matches_the_state_machine(ops in ops()) {
        let (events, expected) = replay(&ops);
        prop_assert_eq!(
            events, expected,
            "event trace diverged for op sequence {:?}", ops
        );
    }

    #[test]
    fn model_reflects_the_last_set(ops in ops()) {
        let cell = RecycledCell {
            slot: ModelSlot::reusable(),
            events: Arc::new(Mutex::new(Vec::new())),
        };

        let mut current: Option<u32> = None;
        for op in &ops {
            match op {
                OwnerOp::Set(id) => {
                    cell.set_model(Some(Arc::new(CellModel { identifier: *id })));
                    current = Some(*id);
                }
                OwnerOp::Clear => {
                    cell.set_model(None);
                    current = None;
                }
                OwnerOp::Reconfigure => cell.reconfigure(),
            }
        }

        prop_assert_eq!(cell.model().map(|m| m.identifier), current);
    }
}

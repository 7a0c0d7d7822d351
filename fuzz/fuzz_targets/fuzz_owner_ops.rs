#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rebind_core::bag::DisposeBag;
use rebind_core::owner::ModelSlot;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Arbitrary, Debug)]
enum FuzzOp {
    Set(u8),
    Clear,
    Reconfigure,
    Probe,
    AddToCurrentBag,
    DisposeCurrentBag,
}

fuzz_target!(|ops: Vec<FuzzOp>| {
    let slot: ModelSlot<u8> = ModelSlot::reusable();
    let armed = Arc::new(AtomicU64::new(0));
    let fired = Arc::new(AtomicU64::new(0));

    let arm = |bag: &DisposeBag| {
        armed.fetch_add(1, Ordering::SeqCst);
        let fired = Arc::clone(&fired);
        bag.add_fn(move || {
            fired.fetch_add(1, Ordering::SeqCst);
        });
    };

    for op in ops {
        match op {
            FuzzOp::Set(v) => slot.bind(Arc::new(v), |_, bag| arm(bag)),
            FuzzOp::Clear => slot.clear(),
            FuzzOp::Reconfigure => slot.reconfigure(|_, bag| arm(bag)),
            FuzzOp::Probe => {
                let _ = slot.try_model();
                let _ = slot.is_bound();
            }
            FuzzOp::AddToCurrentBag => {
                if let Some(bag) = slot.bag() {
                    arm(&bag);
                }
            }
            FuzzOp::DisposeCurrentBag => {
                if let Some(bag) = slot.bag() {
                    bag.dispose();
                }
            }
        }
    }

    drop(slot);
    // Every armed cleanup must have fired exactly once by teardown.
    assert_eq!(armed.load(Ordering::SeqCst), fired.load(Ordering::SeqCst));
});

//! Property-based invariant tests for the notification cascade.
//!
//! These verify cascade invariants that must hold for **any** path and
//! value:
//!
//! 1. A changing `set` reaches the root watcher exactly once.
//! 2. Repeating the same `set` notifies nothing.
//! 3. Every registered prefix level fires exactly once per mutation, in
//!    exact-path → ancestors → root order.
//! 4. Sequence mutations notify the sequence path once, regardless of how
//!    many elements move.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use reflow_store::{Path, Store};
use serde_json::{Value, json};

// ── Helpers ─────────────────────────────────────────────────────────────

/// A key segment that cannot collide with an index segment.
fn key_segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,5}"
}

/// A path of 1..=4 key segments.
fn path() -> impl Strategy<Value = Path> {
    proptest::collection::vec(key_segment(), 1..=4)
        .prop_map(|segments| Path::from_segments(segments))
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
    ]
}

proptest! {
    // ═════════════════════════════════════════════════════════════════════
    // 1 + 2. Root watcher fires once per change, never on a repeat
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn root_sees_each_change_exactly_once(path in path(), value in scalar()) {
        let store = Store::default();
        let hits = Rc::new(RefCell::new(0u32));
        let hits_clone = Rc::clone(&hits);
        let _sub = store.watch_root(move |_, _| *hits_clone.borrow_mut() += 1);

        let changed = store.set(path.clone(), value.clone());
        // The document started empty, so the first write always lands.
        prop_assert!(changed);
        prop_assert_eq!(*hits.borrow(), 1);

        // Writing the identical value again is a no-op.
        let changed = store.set(path, value);
        prop_assert!(!changed);
        prop_assert_eq!(*hits.borrow(), 1);
    }

    // ═════════════════════════════════════════════════════════════════════
    // 3. Every prefix level fires once, ordered leaf-to-root
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn each_prefix_level_fires_once_in_order(path in path(), value in scalar()) {
        let store = Store::default();
        let order: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

        let mut subs = Vec::new();
        let mut levels = vec![path.key()];
        levels.extend(path.ancestors().map(|prefix| prefix.key()));
        for level in &levels {
            let order = Rc::clone(&order);
            let tag = level.clone();
            subs.push(store.watch(level.as_str(), move |_, _| {
                order.borrow_mut().push(tag.clone());
            }));
        }

        store.set(path, value);

        // Exact path first, each ancestor after, root last — once each.
        prop_assert_eq!(&*order.borrow(), &levels);
    }

    // ═════════════════════════════════════════════════════════════════════
    // 4. Sequence mutations collapse to one notification
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn sequence_mutations_notify_once(values in proptest::collection::vec(scalar(), 0..8)) {
        let store = Store::new(json!({"items": []}));
        let hits = Rc::new(RefCell::new(0u32));
        let hits_clone = Rc::clone(&hits);
        let _sub = store.watch("items", move |_, _| *hits_clone.borrow_mut() += 1);

        let mut expected = 0u32;
        for value in &values {
            store.push("items", value.clone());
            expected += 1;
            prop_assert_eq!(*hits.borrow(), expected);
        }

        store.reverse("items");
        expected += 1;
        prop_assert_eq!(*hits.borrow(), expected);

        let removed = store.splice("items", 0, values.len(), Vec::new()).unwrap();
        prop_assert_eq!(removed.len(), values.len());
        expected += 1;
        prop_assert_eq!(*hits.borrow(), expected);
    }
}

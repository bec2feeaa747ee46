#![forbid(unsafe_code)]

//! Lazy computed values derived from [`Store`] paths.
//!
//! # Design
//!
//! [`Computed<T>`] wraps a compute function and its cached result in shared,
//! reference-counted storage. The value declares the store paths it depends
//! on; when any of them notifies, the cached value is invalidated (marked
//! dirty). The next call to [`get()`](Computed::get) recomputes and caches
//! the result. This layers memoized derivation on top of the store's
//! subscriber registry without adding any store-side machinery.
//!
//! # Invariants
//!
//! 1. `get()` always returns a value consistent with the current document
//!    state of all declared dependency paths.
//! 2. The compute function is called at most once per dirty cycle
//!    (memoization).
//! 3. If no dependency has notified, `get()` returns the cached value in
//!    O(1).
//! 4. Version increments by exactly 1 per recomputation.
//!
//! # Failure Modes
//!
//! - **Undeclared dependency**: a path the compute function reads but never
//!   declared does not invalidate the cache; the value goes stale until a
//!   declared dependency notifies or `invalidate()` is called.
//! - **Store dropped**: the subscriptions become inert; the computed value
//!   retains its last cached result and never becomes dirty again.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::path::Path;
use crate::store::{Store, Subscription};

/// Shared interior for [`Computed<T>`].
struct ComputedInner<T> {
    /// The computation function, reading through the store.
    compute: Box<dyn Fn(&Store) -> T>,
    /// Cached result (None only before first computation).
    cached: Option<T>,
    /// Whether the cached value is stale.
    dirty: Cell<bool>,
    /// Monotonically increasing version, bumped on each recomputation.
    version: u64,
    /// Subscription guards keeping dependency callbacks alive.
    _subscriptions: Vec<Subscription>,
}

/// A lazily-evaluated, memoized value derived from store paths.
///
/// Cloning a `Computed` creates a new handle to the **same** inner state.
pub struct Computed<T> {
    store: Store,
    inner: Rc<RefCell<ComputedInner<T>>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Computed")
            .field("cached", &inner.cached)
            .field("dirty", &inner.dirty.get())
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Clone + 'static> Computed<T> {
    /// Create a computed value over the given dependency paths.
    ///
    /// The compute function reads whatever it needs through the store; any
    /// notification at (or under a prefix relationship with) a declared
    /// path marks the cache dirty.
    pub fn new(
        store: &Store,
        dependencies: impl IntoIterator<Item = impl Into<Path>>,
        compute: impl Fn(&Store) -> T + 'static,
    ) -> Self {
        let inner = Rc::new(RefCell::new(ComputedInner {
            compute: Box::new(compute),
            cached: None,
            dirty: Cell::new(true), // Dirty initially — will compute on first get().
            version: 0,
            _subscriptions: Vec::new(),
        }));

        let subscriptions: Vec<Subscription> = dependencies
            .into_iter()
            .map(|path| {
                let weak_inner = Rc::downgrade(&inner);
                store.watch(path, move |_, _| {
                    if let Some(strong) = weak_inner.upgrade() {
                        strong.borrow().dirty.set(true);
                    }
                })
            })
            .collect();
        inner.borrow_mut()._subscriptions = subscriptions;

        Self {
            store: store.clone(),
            inner,
        }
    }

    /// Get the current value, recomputing if any dependency has notified.
    ///
    /// Returns a clone of the cached value.
    #[must_use]
    pub fn get(&self) -> T {
        self.refresh();
        self.inner
            .borrow()
            .cached
            .as_ref()
            .expect("cached is always Some after refresh")
            .clone()
    }

    /// Access the current value by reference without cloning.
    ///
    /// Forces recomputation if dirty.
    ///
    /// # Panics
    ///
    /// Panics if the closure attempts to call `get()` on the same
    /// `Computed` (re-entrant borrow).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.refresh();
        let inner = self.inner.borrow();
        f(inner
            .cached
            .as_ref()
            .expect("cached is always Some after refresh"))
    }

    /// Whether the cached value is stale.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.borrow().dirty.get()
    }

    /// Force invalidation of the cached value. The next `get()` will
    /// recompute.
    pub fn invalidate(&self) {
        self.inner.borrow().dirty.set(true);
    }

    /// Current version number. Increments by 1 on each recomputation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    fn refresh(&self) {
        let needs_compute = {
            let inner = self.inner.borrow();
            inner.dirty.get() || inner.cached.is_none()
        };
        if !needs_compute {
            return;
        }
        // Only an immutable borrow is held while the function runs, so a
        // dependency notification during compute can still mark the dirty
        // flag (it lives in a Cell).
        let new_value = (self.inner.borrow().compute)(&self.store);
        let mut inner = self.inner.borrow_mut();
        inner.cached = Some(new_value);
        inner.dirty.set(false);
        inner.version += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn single_path_computed() {
        let store = Store::new(json!({"n": 10}));
        let doubled = Computed::new(&store, ["n"], |s| {
            s.get("n").and_then(|v| v.as_i64()).unwrap_or(0) * 2
        });

        assert_eq!(doubled.get(), 20);
        assert_eq!(doubled.version(), 1);

        store.set("n", 5);
        assert!(doubled.is_dirty());
        assert_eq!(doubled.get(), 10);
        assert_eq!(doubled.version(), 2);
    }

    #[test]
    fn multi_path_computed() {
        let store = Store::new(json!({"width": 10, "height": 20}));
        let area = Computed::new(&store, ["width", "height"], |s| {
            let w = s.get("width").and_then(|v| v.as_i64()).unwrap_or(0);
            let h = s.get("height").and_then(|v| v.as_i64()).unwrap_or(0);
            w * h
        });

        assert_eq!(area.get(), 200);

        store.set("width", 5);
        assert_eq!(area.get(), 100);

        store.set("height", 30);
        assert_eq!(area.get(), 150);
    }

    #[test]
    fn memoization() {
        let store = Store::new(json!({"n": 10}));
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let computed = Computed::new(&store, ["n"], move |s| {
            count_clone.set(count_clone.get() + 1);
            s.get("n").and_then(|v| v.as_i64()).unwrap_or(0)
        });

        assert_eq!(computed.get(), 10);
        assert_eq!(count.get(), 1);

        // Cached — no recompute.
        assert_eq!(computed.get(), 10);
        assert_eq!(count.get(), 1);

        store.set("n", 20);
        assert_eq!(computed.get(), 20);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn nested_mutation_dirties_prefix_dependency() {
        // A dependency on "table" sees mutations at "table.columns.0".
        let store = Store::new(json!({"table": {"columns": [{"name": "id"}]}}));
        let first_column = Computed::new(&store, ["table"], |s| {
            s.get("table.columns.0.name")
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_default()
        });

        assert_eq!(first_column.get(), "id");

        store.set("table.columns.0.name", "title");
        assert!(first_column.is_dirty());
        assert_eq!(first_column.get(), "title");
    }

    #[test]
    fn noop_set_leaves_cache_clean() {
        let store = Store::new(json!({"n": 42}));
        let computed = Computed::new(&store, ["n"], |s| {
            s.get("n").and_then(|v| v.as_i64()).unwrap_or(0)
        });

        let _ = computed.get();
        store.set("n", 42); // No-op — store will not notify.
        assert!(!computed.is_dirty());
        assert_eq!(computed.version(), 1);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let store = Store::new(json!({"n": 5}));
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let computed = Computed::new(&store, ["n"], move |s| {
            count_clone.set(count_clone.get() + 1);
            s.get("n").and_then(|v| v.as_i64()).unwrap_or(0)
        });

        assert_eq!(computed.get(), 5);
        computed.invalidate();
        assert!(computed.is_dirty());
        assert_eq!(computed.get(), 5);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn clone_shares_state() {
        let store = Store::new(json!({"n": 10}));
        let first = Computed::new(&store, ["n"], |s| {
            s.get("n").and_then(|v| v.as_i64()).unwrap_or(0) + 1
        });
        let second = first.clone();

        assert_eq!(first.get(), 11);
        assert_eq!(second.get(), 11);
        assert_eq!(second.version(), 1);

        store.set("n", 20);
        assert_eq!(second.get(), 21);
        assert_eq!(first.version(), 2);
    }

    #[test]
    fn with_access() {
        let store = Store::new(json!({"items": [1, 2, 3]}));
        let sum = Computed::new(&store, ["items"], |s| {
            s.with("items", |value| {
                value
                    .and_then(Value::as_array)
                    .map(|items| items.iter().filter_map(Value::as_i64).sum::<i64>())
                    .unwrap_or(0)
            })
        });

        assert_eq!(sum.with(|total| *total), 6);

        store.push("items", 4);
        assert_eq!(sum.get(), 10);
    }

    #[test]
    fn sequence_mutation_dirties_dependency() {
        let store = Store::new(json!({"items": ["a"]}));
        let len = Computed::new(&store, ["items"], |s| {
            s.get("items").and_then(|v| v.as_array().map(Vec::len)).unwrap_or(0)
        });

        assert_eq!(len.get(), 1);
        store.push("items", "b");
        assert!(len.is_dirty());
        assert_eq!(len.get(), 2);
    }
}

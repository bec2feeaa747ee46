#![forbid(unsafe_code)]

//! Path-observable document store.
//!
//! [`Store`] wraps a JSON document and delivers change notifications scoped
//! by navigation path, without getter/setter boilerplate on the consumer
//! side. There is no interception magic: every write flows through one
//! mutation gateway (`set`, `delete`, and the sequence operations), which
//! both mutates the document and runs the notification cascade. Watchers
//! register against a normalized path key and receive the value now at the
//! mutated path.
//!
//! # Design
//!
//! `Store` uses `Rc<RefCell<..>>` for single-threaded shared ownership;
//! cloning a handle shares the same document and registry. Callbacks are
//! collected before invocation so a watcher may freely mutate the store or
//! manage subscriptions re-entrantly.
//!
//! # Invariants
//!
//! 1. Each mutation triggers exactly one cascade: the exact path, then every
//!    strictly shorter prefix (closest ancestor first), then the root. A
//!    callback registered at several of those levels runs at most once.
//! 2. Within one path level, callbacks run in registration order.
//! 3. Setting a value equal to the current value notifies nothing.
//! 4. A sequence-mutating operation notifies once, at the sequence's own
//!    path, never per element.
//! 5. Deleting a missing target notifies nothing.
//! 6. Unsubscribing is idempotent and never affects other subscribers; a
//!    subscription removed during a cascade stops receiving calls from the
//!    next mutation on.
//!
//! # Failure Modes
//!
//! The store raises no errors of its own. Malformed paths read as `None`;
//! writes create missing intermediate maps and ignore unreachable targets
//! (out-of-range indices, scalar intermediates). A watcher that mutates the
//! path it observes can cascade re-entrantly; the recursion budget cuts the
//! cascade off past a fixed bound instead of recursing without limit.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use serde_json::Value;

use crate::path::{Path, Segment};

/// Re-entrant cascades deeper than this are cut off.
const MAX_CASCADE_DEPTH: u32 = 32;

/// Shared callback type for [`Store::watch_fn`].
///
/// The first argument is the value now at the mutated path (`None` when the
/// path no longer resolves), the second the mutated path itself.
pub type WatchFn = Rc<dyn Fn(Option<&Value>, &Path)>;

struct WatcherEntry {
    id: u64,
    callback: WatchFn,
}

struct Inner {
    root: Value,
    watchers: AHashMap<String, Vec<WatcherEntry>>,
    next_watcher: u64,
    cascade_depth: Cell<u32>,
}

/// A cloneable handle to a path-observable document.
#[derive(Clone)]
pub struct Store {
    inner: Rc<RefCell<Inner>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Store")
            .field("root", &inner.root)
            .field("watched_paths", &inner.watchers.len())
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Value::Object(serde_json::Map::new()))
    }
}

impl Store {
    /// Wrap an initial document. Any value is accepted; no validation.
    #[must_use]
    pub fn new(initial: Value) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                root: initial,
                watchers: AHashMap::new(),
                next_watcher: 0,
                cascade_depth: Cell::new(0),
            })),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Resolve a path against the current document, cloning the value.
    ///
    /// Returns `None` if any intermediate segment is missing.
    #[must_use]
    pub fn get(&self, path: impl Into<Path>) -> Option<Value> {
        let path = path.into();
        resolve(&self.inner.borrow().root, &path).cloned()
    }

    /// Access the value at a path by reference, without cloning.
    pub fn with<R>(&self, path: impl Into<Path>, f: impl FnOnce(Option<&Value>) -> R) -> R {
        let path = path.into();
        let inner = self.inner.borrow();
        f(resolve(&inner.root, &path))
    }

    /// Clone of the whole document.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        self.inner.borrow().root.clone()
    }

    /// Number of callbacks currently registered for a path.
    #[must_use]
    pub fn watcher_count(&self, path: impl Into<Path>) -> usize {
        let key = path.into().key();
        self.inner
            .borrow()
            .watchers
            .get(&key)
            .map_or(0, Vec::len)
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Register a callback for changes at (or below) a path.
    ///
    /// An empty path subscribes to the root: every mutation reaches it. The
    /// returned [`Subscription`] unsubscribes explicitly or on drop.
    pub fn watch(
        &self,
        path: impl Into<Path>,
        callback: impl Fn(Option<&Value>, &Path) + 'static,
    ) -> Subscription {
        self.watch_fn(path, Rc::new(callback))
    }

    /// Register a callback for every mutation (root subscription).
    pub fn watch_root(&self, callback: impl Fn(Option<&Value>, &Path) + 'static) -> Subscription {
        self.watch(Path::root(), callback)
    }

    /// Register a shared callback handle.
    ///
    /// Registering one `Rc` clone at several path levels is supported; the
    /// cascade still invokes it at most once per mutation.
    pub fn watch_fn(&self, path: impl Into<Path>, callback: WatchFn) -> Subscription {
        let key = path.into().key();
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_watcher;
        inner.next_watcher += 1;
        inner
            .watchers
            .entry(key.clone())
            .or_default()
            .push(WatcherEntry { id, callback });
        Subscription {
            inner: Rc::downgrade(&self.inner),
            key,
            id,
            active: Cell::new(true),
        }
    }

    // -----------------------------------------------------------------------
    // Mutation gateway
    // -----------------------------------------------------------------------

    /// Assign a value at a path.
    ///
    /// Missing intermediate maps are created; an index one past the end of a
    /// sequence appends. Assigning a value equal to the current one is a
    /// no-op. Returns whether the document changed (and a cascade ran).
    pub fn set(&self, path: impl Into<Path>, value: impl Into<Value>) -> bool {
        let path = path.into();
        let value = value.into();
        let changed = {
            let mut inner = self.inner.borrow_mut();
            if path.is_root() {
                if inner.root == value {
                    false
                } else {
                    inner.root = value;
                    true
                }
            } else {
                write(&mut inner.root, &path, value)
            }
        };
        if changed {
            self.notify(path);
        }
        changed
    }

    /// Remove the value at a path.
    ///
    /// Notifies only if the target existed. Removing a sequence element
    /// shifts the elements after it.
    pub fn delete(&self, path: impl Into<Path>) -> bool {
        let path = path.into();
        let existed = {
            let mut inner = self.inner.borrow_mut();
            remove(&mut inner.root, &path).is_some()
        };
        if existed {
            self.notify(path);
        }
        existed
    }

    /// Append to the sequence at a path.
    pub fn push(&self, path: impl Into<Path>, value: impl Into<Value>) -> bool {
        let value = value.into();
        self.mutate_sequence(path, |items| {
            items.push(value);
        })
        .is_some()
    }

    /// Remove and return the last element of the sequence at a path.
    pub fn pop(&self, path: impl Into<Path>) -> Option<Value> {
        self.mutate_sequence(path, Vec::pop).flatten()
    }

    /// Remove and return the first element of the sequence at a path.
    pub fn shift(&self, path: impl Into<Path>) -> Option<Value> {
        self.mutate_sequence(path, |items| {
            if items.is_empty() {
                None
            } else {
                Some(items.remove(0))
            }
        })
        .flatten()
    }

    /// Prepend to the sequence at a path.
    pub fn unshift(&self, path: impl Into<Path>, value: impl Into<Value>) -> bool {
        let value = value.into();
        self.mutate_sequence(path, |items| {
            items.insert(0, value);
        })
        .is_some()
    }

    /// Remove `delete_count` elements at `start` and insert `insert` there.
    ///
    /// `start` and `delete_count` are clamped to the sequence bounds. Returns
    /// the removed elements, or `None` if the path is not a sequence.
    pub fn splice(
        &self,
        path: impl Into<Path>,
        start: usize,
        delete_count: usize,
        insert: Vec<Value>,
    ) -> Option<Vec<Value>> {
        self.mutate_sequence(path, |items| {
            let start = start.min(items.len());
            let end = (start + delete_count).min(items.len());
            items.splice(start..end, insert).collect()
        })
    }

    /// Sort the sequence at a path with a comparator.
    pub fn sort_by(
        &self,
        path: impl Into<Path>,
        compare: impl FnMut(&Value, &Value) -> std::cmp::Ordering,
    ) -> bool {
        let mut compare = compare;
        self.mutate_sequence(path, |items| items.sort_by(&mut compare))
            .is_some()
    }

    /// Reverse the sequence at a path.
    pub fn reverse(&self, path: impl Into<Path>) -> bool {
        self.mutate_sequence(path, |items| items.reverse()).is_some()
    }

    /// Run one structural operation on the sequence at `path`, then fire a
    /// single notification at the sequence's own path.
    ///
    /// Intermediate indices are not individually meaningful after a
    /// structural change, so per-element paths are never notified. Returns
    /// `None` (and stays silent) if the path does not hold a sequence.
    fn mutate_sequence<R>(
        &self,
        path: impl Into<Path>,
        op: impl FnOnce(&mut Vec<Value>) -> R,
    ) -> Option<R> {
        let path = path.into();
        let result = {
            let mut inner = self.inner.borrow_mut();
            match resolve_mut(&mut inner.root, &path) {
                Some(Value::Array(items)) => Some(op(items)),
                _ => None,
            }
        };
        if result.is_some() {
            self.notify(path);
        }
        result
    }

    // -----------------------------------------------------------------------
    // Notification cascade
    // -----------------------------------------------------------------------

    /// Run the notification cascade for an explicit path.
    ///
    /// Fires the exact path's callbacks, then each strictly shorter prefix
    /// (closest ancestor first), then the root's, each callback at most once,
    /// passing the value currently at the mutated path. Called by the
    /// mutation gateway; independently callable for out-of-band changes.
    pub fn notify(&self, path: impl Into<Path>) {
        let path = path.into();
        let callbacks = {
            let inner = self.inner.borrow();
            if inner.cascade_depth.get() >= MAX_CASCADE_DEPTH {
                #[cfg(feature = "tracing")]
                tracing::warn!(path = %path, "notification cascade cut at recursion bound");
                return;
            }
            let mut keys = Vec::with_capacity(path.len() + 1);
            keys.push(path.key());
            keys.extend(path.ancestors().map(|prefix| prefix.key()));
            let mut seen: Vec<*const ()> = Vec::new();
            let mut callbacks: Vec<WatchFn> = Vec::new();
            for key in &keys {
                if let Some(entries) = inner.watchers.get(key) {
                    for entry in entries {
                        let identity = Rc::as_ptr(&entry.callback).cast::<()>();
                        if !seen.contains(&identity) {
                            seen.push(identity);
                            callbacks.push(Rc::clone(&entry.callback));
                        }
                    }
                }
            }
            callbacks
        };
        if callbacks.is_empty() {
            return;
        }
        let value = {
            let inner = self.inner.borrow();
            resolve(&inner.root, &path).cloned()
        };
        let depth = self.inner.borrow().cascade_depth.get();
        self.inner.borrow().cascade_depth.set(depth + 1);
        for callback in &callbacks {
            callback(value.as_ref(), &path);
        }
        self.inner.borrow().cascade_depth.set(depth);
    }
}

/// Guard for a registered watcher.
///
/// Unsubscribes explicitly via [`unsubscribe`](Self::unsubscribe) or
/// automatically on drop. Both are idempotent.
pub struct Subscription {
    inner: Weak<RefCell<Inner>>,
    key: String,
    id: u64,
    active: Cell<bool>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.key)
            .field("active", &self.active.get())
            .finish()
    }
}

impl Subscription {
    /// Remove exactly this callback from exactly this path's watcher set.
    ///
    /// Calling twice is a no-op and never affects other subscribers.
    pub fn unsubscribe(&self) {
        if !self.active.replace(false) {
            return;
        }
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.borrow_mut();
            if let Some(entries) = inner.watchers.get_mut(&self.key) {
                entries.retain(|entry| entry.id != self.id);
                if entries.is_empty() {
                    inner.watchers.remove(&self.key);
                }
            }
        }
    }

    /// Whether the subscription is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

// ---------------------------------------------------------------------------
// Document navigation
// ---------------------------------------------------------------------------

fn step<'a>(value: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match (value, segment) {
        (Value::Object(map), Segment::Key(key)) => map.get(key),
        (Value::Object(map), Segment::Index(index)) => map.get(&index.to_string()),
        (Value::Array(items), Segment::Index(index)) => items.get(*index),
        (Value::Array(items), Segment::Key(key)) => items.get(key.parse::<usize>().ok()?),
        _ => None,
    }
}

fn step_mut<'a>(value: &'a mut Value, segment: &Segment) -> Option<&'a mut Value> {
    match (value, segment) {
        (Value::Object(map), Segment::Key(key)) => map.get_mut(key),
        (Value::Object(map), Segment::Index(index)) => map.get_mut(&index.to_string()),
        (Value::Array(items), Segment::Index(index)) => items.get_mut(*index),
        (Value::Array(items), Segment::Key(key)) => items.get_mut(key.parse::<usize>().ok()?),
        _ => None,
    }
}

fn resolve<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        current = step(current, segment)?;
    }
    Some(current)
}

fn resolve_mut<'a>(root: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in path.segments() {
        current = step_mut(current, segment)?;
    }
    Some(current)
}

/// Assign `value` at `path`, creating missing intermediate maps.
///
/// Returns whether the document changed. Unreachable targets (out-of-range
/// index, scalar intermediate) leave the document untouched.
fn write(root: &mut Value, path: &Path, value: Value) -> bool {
    debug_assert!(!path.is_root());
    let (last, intermediate) = path.segments().split_last().expect("non-root path");
    let mut current = root;
    for segment in intermediate {
        // Missing map keys grow an empty map so deep assignment just works.
        if let (Value::Object(map), Segment::Key(key)) = (&mut *current, segment) {
            map.entry(key.clone())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
        }
        current = match step_mut(current, segment) {
            Some(next) => next,
            None => return false,
        };
    }
    match (current, last) {
        (Value::Object(map), segment) => {
            let key = segment.to_string();
            if map.get(&key) == Some(&value) {
                return false;
            }
            map.insert(key, value);
            true
        }
        (Value::Array(items), segment) => {
            let index = match segment {
                Segment::Index(index) => *index,
                Segment::Key(key) => match key.parse::<usize>() {
                    Ok(index) => index,
                    Err(_) => return false,
                },
            };
            match index.cmp(&items.len()) {
                std::cmp::Ordering::Less => {
                    if items[index] == value {
                        return false;
                    }
                    items[index] = value;
                    true
                }
                std::cmp::Ordering::Equal => {
                    items.push(value);
                    true
                }
                std::cmp::Ordering::Greater => false,
            }
        }
        _ => false,
    }
}

/// Remove the value at `path`, returning it if it existed.
fn remove(root: &mut Value, path: &Path) -> Option<Value> {
    let (last, _) = path.segments().split_last()?;
    let parent = path.parent()?;
    let container = resolve_mut(root, &parent)?;
    match (container, last) {
        (Value::Object(map), segment) => map.remove(&segment.to_string()),
        (Value::Array(items), Segment::Index(index)) => {
            if *index < items.len() {
                Some(items.remove(*index))
            } else {
                None
            }
        }
        (Value::Array(items), Segment::Key(key)) => {
            let index = key.parse::<usize>().ok()?;
            if index < items.len() {
                Some(items.remove(index))
            } else {
                None
            }
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

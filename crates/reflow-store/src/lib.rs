#![forbid(unsafe_code)]

//! Path-observable document store for Reflow.
//!
//! This crate provides change-tracking primitives for reactive UI state:
//!
//! - [`Store`]: a JSON document behind a single mutation gateway, with
//!   change notifications delivered to path-scoped subscribers as a
//!   cascade (exact path, then each ancestor, then root).
//! - [`Subscription`]: guard that unsubscribes explicitly or on drop.
//! - [`Computed`]: a lazily-evaluated, memoized value derived from one or
//!   more store paths.
//!
//! `Store` uses `Rc<RefCell<..>>` for single-threaded shared ownership,
//! matching the event-driven UI setting it serves. It never spawns, blocks,
//! or errors: malformed paths read as `None` and writes are permissive.

pub mod computed;
pub mod path;
pub mod store;

pub use computed::Computed;
pub use path::{Path, Segment};
pub use store::{Store, Subscription, WatchFn};

#![forbid(unsafe_code)]

//! Drag-reorder controller for Reflow.
//!
//! Translates drops over a list, grouped table, or tree into a validated,
//! densely renumbered arrangement, persists it through a
//! [`SyncClient`](reflow_sync::SyncClient), and rolls the optimistic UI
//! state back when persistence fails:
//!
//! - [`Layout`]: the sibling-container model mirroring what is on screen.
//! - [`Controller`]: the drop lifecycle — validate (depth limits before any
//!   network), renumber from final display position, commit with causally
//!   ordered membership/order calls, revert on failure.
//! - [`ContainerConfig`]: wiring parsed from the markup's data attributes;
//!   malformed containers are skipped, not errored.
//! - [`UiDelegate`]: the seam to the rendering layer.

pub mod config;
pub mod controller;
pub mod layout;
pub mod ui;

pub use config::{ContainerConfig, Mode};
pub use controller::{Controller, DragPhase, Outcome, Rejection};
pub use layout::{ContainerKey, DropEvent, Layout, RecordId, RevertPlan};
pub use ui::{Notice, NullUi, RecordingUi, UiDelegate, UiEvent};

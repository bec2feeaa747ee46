#![forbid(unsafe_code)]

//! Drag-reorder controller: optimistic commit with rollback.
//!
//! One controller per reorderable container. The external drag library owns
//! the gesture and the live DOM shuffling; the controller owns everything
//! after the drop: validation, renumbering, persistence, and putting things
//! back when persistence fails.
//!
//! # Lifecycle
//!
//! ```text
//!  ┌──────┐ drag-start ┌──────────┐   drop   ┌────────────┐
//!  │ Idle ├───────────▶│ Dragging ├─────────▶│ Validating │
//!  └──▲───┘            └──────────┘          └─────┬──────┘
//!     │                                  reject    │    ok
//!     │◀───────────────┌──────────┐◀───────────────┤
//!     │                │ Rejected │          ┌─────▼──────┐
//!     │◀───────────────└──────────┘◀─────────┤ Committing │
//!     │                         sync failure └─────┬──────┘
//!     └────────────────────────────────────────────┘ success
//! ```
//!
//! # Invariants
//!
//! 1. Depth validation happens before any remote call; a rejected move
//!    never reaches the network.
//! 2. Ranks are recomputed from final display position at commit time,
//!    never incremented relative to prior values, so interleaved edits
//!    cannot drift them.
//! 3. A cross-container move persists membership before order, destination
//!    before source, and skips the source order call when the source is
//!    empty.
//! 4. Any sync failure restores the layout and instructs the UI to restore
//!    the node; the session stays interactive.
//!
//! # Concurrency
//!
//! Commits suspend only at the network boundary. The exclusive borrow
//! serializes drops on one controller; drops on different containers run
//! their commits independently and resolve last-response-wins, as the
//! low-contention admin-UI setting assumes. A per-container commit lock
//! that queues or rejects drops while one is in flight would harden this;
//! it is deliberately not imposed here.

use ahash::AHashSet;

use reflow_store::{Path, Store};
use reflow_sync::{Ack, MembershipPayload, OrderPayload, SyncClient, SyncError, TreePayload, Update};

use crate::config::{ContainerConfig, Mode};
use crate::layout::{ContainerKey, DropEvent, Layout, RecordId, RevertPlan};
use crate::ui::{Notice, UiDelegate};

/// Phase of the drag lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    /// Listening for a drag to start.
    #[default]
    Idle,
    /// A gesture is in progress; the drag library owns the visuals.
    Dragging,
    /// A drop arrived and is being checked client-side.
    Validating,
    /// The move passed validation and is being persisted.
    Committing,
    /// The last drop was rejected or rolled back.
    Rejected,
}

/// A client-side refusal, detected before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The move would nest deeper than the configured limit.
    DepthExceeded { depth: usize, limit: usize },
    /// The dropped record is not in this container's layout.
    UnknownRecord(RecordId),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DepthExceeded { depth, limit } => {
                write!(f, "move would nest {depth} levels deep (limit {limit})")
            }
            Self::UnknownRecord(id) => write!(f, "record {id} is not part of this container"),
        }
    }
}

/// How a drop resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Persisted; the layout and the display agree.
    Committed,
    /// Refused client-side; nothing was sent.
    Rejected(Rejection),
    /// The backend refused; layout and display were restored.
    RolledBack(SyncError),
}

struct Mirror {
    store: Store,
    path: Path,
}

/// Translates drops over one container into validated, renumbered,
/// persisted state.
pub struct Controller<C, U> {
    config: ContainerConfig,
    layout: Layout,
    sync: C,
    ui: U,
    phase: DragPhase,
    collapsed: AHashSet<RecordId>,
    mirror: Option<Mirror>,
}

impl<C: SyncClient, U: UiDelegate> Controller<C, U> {
    /// Wire a controller over a container's initial arrangement.
    pub fn new(config: ContainerConfig, layout: Layout, sync: C, ui: U) -> Self {
        Self {
            config,
            layout,
            sync,
            ui,
            phase: DragPhase::Idle,
            collapsed: AHashSet::new(),
            mirror: None,
        }
    }

    /// Mirror the arrangement into a reactive store document at `path`.
    ///
    /// The snapshot is written through the store's mutation gateway after
    /// construction and after every resolved drop, so watchers see layout
    /// changes like any other document change.
    #[must_use]
    pub fn with_state_mirror(mut self, store: Store, path: impl Into<Path>) -> Self {
        let mirror = Mirror {
            store,
            path: path.into(),
        };
        mirror.store.set(mirror.path.clone(), self.layout.to_value());
        self.mirror = Some(mirror);
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Current phase of the drag lifecycle.
    #[must_use]
    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    /// The controller's arrangement mirror.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The container configuration.
    #[must_use]
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// The sync client.
    #[must_use]
    pub fn sync(&self) -> &C {
        &self.sync
    }

    /// The UI delegate.
    #[must_use]
    pub fn ui(&self) -> &U {
        &self.ui
    }

    // -----------------------------------------------------------------------
    // Expand/collapse bookkeeping
    // -----------------------------------------------------------------------

    /// Record that a subtree is visually collapsed.
    ///
    /// Pure display state: a collapsed subtree still counts for depth
    /// checks and renumbering.
    pub fn collapse(&mut self, id: impl Into<RecordId>) {
        self.collapsed.insert(id.into());
    }

    /// Record that a subtree is visually expanded.
    pub fn expand(&mut self, id: impl Into<RecordId>) {
        self.collapsed.remove(&id.into());
    }

    /// Whether a subtree is visually collapsed.
    #[must_use]
    pub fn is_collapsed(&self, id: &RecordId) -> bool {
        self.collapsed.contains(id)
    }

    // -----------------------------------------------------------------------
    // Drag lifecycle
    // -----------------------------------------------------------------------

    /// A drag gesture started.
    pub fn dragging(&mut self) {
        self.transition(DragPhase::Dragging);
    }

    /// A drop arrived: validate, renumber, persist, and reconcile.
    pub async fn handle_drop(&mut self, event: DropEvent) -> Outcome {
        self.transition(DragPhase::Validating);

        let Some((origin, origin_index)) = self.layout.locate(&event.id) else {
            // Nothing to instruct the UI with: the record was never ours.
            return self.reject(Rejection::UnknownRecord(event.id), None);
        };
        let crossed = origin != event.to;

        if crossed {
            if let Mode::Tree { max_depth, .. } = self.config.mode {
                let depth =
                    self.layout.subtree_depth(&event.id) + self.layout.container_depth(&event.to);
                if depth > max_depth {
                    let plan =
                        RevertPlan::new(event.id.clone(), origin, origin_index, event.to.clone());
                    return self.reject(
                        Rejection::DepthExceeded {
                            depth,
                            limit: max_depth,
                        },
                        Some(plan),
                    );
                }
            }
        }

        // The display already shows the move; adopt it, keeping the undo.
        let plan = match self.layout.apply_move(&event.id, event.to, event.to_index) {
            Some(plan) => plan,
            None => return self.reject(Rejection::UnknownRecord(event.id), None),
        };

        self.transition(DragPhase::Committing);
        match self.commit(&plan).await {
            Ok(ack) => {
                if plan.crossed_containers() {
                    self.update_affordances(&plan);
                }
                self.ui.notify(&Notice::Success(ack.message));
                self.transition(DragPhase::Idle);
                self.write_mirror();
                Outcome::Committed
            }
            Err(error) => {
                tracing::warn!(container = %plan.destination, %error, "drop rolled back");
                self.layout.revert(&plan);
                self.ui.revert(&plan);
                self.ui.notify(&Notice::Failure(failure_text(&error)));
                self.transition(DragPhase::Rejected);
                self.transition(DragPhase::Idle);
                self.write_mirror();
                Outcome::RolledBack(error)
            }
        }
    }

    /// Persist the move: membership first for cross-container moves, then
    /// the destination's order, then the source's if it still has members.
    async fn commit(&self, plan: &RevertPlan) -> Result<Ack, SyncError> {
        if plan.crossed_containers() {
            if let Some(membership) = self.membership_payload(plan) {
                self.sync.submit(&Update::Membership(membership)).await?;
            }
            let ack = self
                .sync
                .submit(&Update::Order(self.order_payload(&plan.destination)))
                .await?;
            let source_occupied = self
                .layout
                .container(&plan.origin)
                .is_some_and(|ids| !ids.is_empty());
            if source_occupied {
                self.sync
                    .submit(&Update::Order(self.order_payload(&plan.origin)))
                    .await?;
            }
            Ok(ack)
        } else {
            self.sync
                .submit(&Update::Order(self.order_payload(&plan.destination)))
                .await
        }
    }

    /// The container-defining column assignment for a cross-container move,
    /// when the mode has one.
    fn membership_payload(&self, plan: &RevertPlan) -> Option<MembershipPayload> {
        match &self.config.mode {
            Mode::Flat => None,
            Mode::Grouped { group_column } => Some(MembershipPayload {
                id: plan.id.as_str().to_string(),
                column: group_column.clone(),
                value: match &plan.destination {
                    ContainerKey::Group(group) => Some(group.clone()),
                    _ => None,
                },
            }),
            Mode::Tree { parent_column, .. } => Some(MembershipPayload {
                id: plan.id.as_str().to_string(),
                column: parent_column.clone(),
                value: match &plan.destination {
                    ContainerKey::Child(parent) => Some(parent.as_str().to_string()),
                    _ => None,
                },
            }),
        }
    }

    /// The full-order payload for one container, ranks derived from the
    /// current arrangement.
    #[must_use]
    pub fn order_payload(&self, key: &ContainerKey) -> OrderPayload {
        let ranks = self
            .layout
            .ranks(key)
            .into_iter()
            .map(|(id, rank)| (id.as_str().to_string(), rank));
        let payload = OrderPayload::new(self.config.order_column.clone(), ranks);
        match &self.config.mode {
            Mode::Flat => payload,
            Mode::Grouped { group_column } => match key {
                ContainerKey::Group(group) => payload.in_group(group_column.clone(), group.clone()),
                _ => payload,
            },
            Mode::Tree { parent_column, .. } => payload.under_parent(
                parent_column.clone(),
                match key {
                    ContainerKey::Child(parent) => Some(parent.as_str().to_string()),
                    _ => None,
                },
            ),
        }
    }

    /// The whole arrangement as a nested tree payload. Tree mode only.
    #[must_use]
    pub fn tree_payload(&self) -> Option<TreePayload> {
        match &self.config.mode {
            Mode::Tree { parent_column, .. } => Some(TreePayload {
                tree: self.layout.to_tree(),
                order_column: self.config.order_column.clone(),
                parent_column: parent_column.clone(),
            }),
            _ => None,
        }
    }

    fn update_affordances(&mut self, plan: &RevertPlan) {
        let origin_empty = self
            .layout
            .container(&plan.origin)
            .is_none_or(|ids| ids.is_empty());
        if origin_empty {
            self.ui.container_emptied(&plan.origin);
        }
        let destination_len = self
            .layout
            .container(&plan.destination)
            .map_or(0, <[RecordId]>::len);
        if destination_len == 1 {
            self.ui.container_populated(&plan.destination);
        }
    }

    fn reject(&mut self, rejection: Rejection, plan: Option<RevertPlan>) -> Outcome {
        tracing::debug!(%rejection, "drop rejected client-side");
        if let Some(plan) = plan {
            self.ui.revert(&plan);
        }
        self.transition(DragPhase::Rejected);
        self.transition(DragPhase::Idle);
        Outcome::Rejected(rejection)
    }

    fn transition(&mut self, next: DragPhase) {
        if self.phase != next {
            tracing::trace!(from = ?self.phase, to = ?next, "phase transition");
            self.phase = next;
        }
    }

    fn write_mirror(&self) {
        if let Some(mirror) = &self.mirror {
            mirror.store.set(mirror.path.clone(), self.layout.to_value());
        }
    }
}

/// Short, user-facing text for a sync failure. The backend's own message is
/// already human-readable; anything else gets a generic line.
fn failure_text(error: &SyncError) -> String {
    match error {
        SyncError::Rejected { message: Some(message) } => message.clone(),
        _ => "The new order could not be saved.".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

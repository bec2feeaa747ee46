#![forbid(unsafe_code)]

//! The seam to the rendering layer.
//!
//! The drag library moves nodes visually before the controller hears about
//! it, so the controller's instructions to the UI are corrective: put a
//! node back, update a container's affordances after its membership
//! changed, show a short human-readable notice. Implementations translate
//! these into whatever the rendering layer does; [`NullUi`] ignores them
//! all.

use crate::layout::{ContainerKey, RevertPlan};

/// A short, human-readable notice for the user. Never a raw error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The drop was persisted; the backend may have sent a message.
    Success(Option<String>),
    /// The drop was undone; the text says why in user terms.
    Failure(String),
}

/// Instructions from the controller to the rendering layer.
///
/// All methods default to no-ops so implementations opt into what they
/// render.
pub trait UiDelegate {
    /// Re-insert the dragged node at its original index in its original
    /// container.
    fn revert(&mut self, _plan: &RevertPlan) {}

    /// A container lost its last record: keep it visible as an explicit
    /// drop target and hide its expand/collapse controls.
    fn container_emptied(&mut self, _key: &ContainerKey) {}

    /// A previously-empty container gained its first record: restore its
    /// expand/collapse controls.
    fn container_populated(&mut self, _key: &ContainerKey) {}

    /// Show a toast-equivalent notice.
    fn notify(&mut self, _notice: &Notice) {}
}

/// Ignores every instruction.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullUi;

impl UiDelegate for NullUi {}

/// Records every instruction, in order. Test support.
#[derive(Debug, Clone, Default)]
pub struct RecordingUi {
    pub events: Vec<UiEvent>,
}

/// One recorded [`UiDelegate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Reverted(RevertPlan),
    Emptied(ContainerKey),
    Populated(ContainerKey),
    Notified(Notice),
}

impl RecordingUi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded reverts.
    #[must_use]
    pub fn reverts(&self) -> Vec<&RevertPlan> {
        self.events
            .iter()
            .filter_map(|event| match event {
                UiEvent::Reverted(plan) => Some(plan),
                _ => None,
            })
            .collect()
    }

    /// The recorded notices.
    #[must_use]
    pub fn notices(&self) -> Vec<&Notice> {
        self.events
            .iter()
            .filter_map(|event| match event {
                UiEvent::Notified(notice) => Some(notice),
                _ => None,
            })
            .collect()
    }
}

impl UiDelegate for RecordingUi {
    fn revert(&mut self, plan: &RevertPlan) {
        self.events.push(UiEvent::Reverted(plan.clone()));
    }

    fn container_emptied(&mut self, key: &ContainerKey) {
        self.events.push(UiEvent::Emptied(key.clone()));
    }

    fn container_populated(&mut self, key: &ContainerKey) {
        self.events.push(UiEvent::Populated(key.clone()));
    }

    fn notify(&mut self, notice: &Notice) {
        self.events.push(UiEvent::Notified(notice.clone()));
    }
}

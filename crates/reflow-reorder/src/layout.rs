#![forbid(unsafe_code)]

//! Sibling-container model of a reorderable arrangement.
//!
//! [`Layout`] mirrors what the drag library shows on screen: an ordered map
//! from sibling container to the records it holds, in display order. It is
//! the controller's ground truth at commit time — order values are never
//! stored, they are derived from position whenever a payload is built, so
//! ranks cannot drift from what the user sees.
//!
//! A *sibling container* is the unit of contiguous renumbering: the whole
//! table (flat mode), one group (grouped mode), or one record's children
//! (tree mode). Reordering within a container changes ranks only; moving
//! between containers changes the container-defining key and renumbers both
//! sides.
//!
//! # Invariants
//!
//! 1. A record appears in at most one container.
//! 2. Ranks are always a dense 1-based sequence over a container's current
//!    order.
//! 3. Applying a move and reverting it restores the layout exactly.
//! 4. Depth computation walks the underlying arrangement; visual
//!    collapse state plays no part in it.
//! 5. No I/O — this is a pure data/logic layer.

use std::fmt;

use indexmap::IndexMap;
use reflow_sync::TreeNode;
use serde_json::Value;

/// Stable identifier of a draggable record. Survives reordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The container-defining key of a sibling set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContainerKey {
    /// The whole table (flat mode), or the top level of a tree.
    Root,
    /// One group of a grouped table.
    Group(String),
    /// The children of a record in tree mode.
    Child(RecordId),
}

impl ContainerKey {
    #[must_use]
    pub fn group(name: impl Into<String>) -> Self {
        Self::Group(name.into())
    }

    #[must_use]
    pub fn child(id: impl Into<RecordId>) -> Self {
        Self::Child(id.into())
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::Group(name) => write!(f, "group:{name}"),
            Self::Child(id) => write!(f, "child:{id}"),
        }
    }
}

/// A drop reported by the drag library, after it moved the node visually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropEvent {
    /// The dragged record.
    pub id: RecordId,
    /// Container the node landed in.
    pub to: ContainerKey,
    /// Display index it landed at.
    pub to_index: usize,
}

/// Everything needed to put a dragged record back where it came from.
///
/// Produced when a move is applied; consumed by layout rollback and handed
/// to the UI delegate so the rendering layer can re-insert the node at its
/// original index in its original container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertPlan {
    pub id: RecordId,
    pub origin: ContainerKey,
    pub origin_index: usize,
    pub destination: ContainerKey,
    /// Whether applying the move created the destination container.
    created_destination: bool,
}

impl RevertPlan {
    /// A plan for a move that was never applied to the layout (pure UI
    /// revert, e.g. after a validation rejection).
    #[must_use]
    pub fn new(
        id: RecordId,
        origin: ContainerKey,
        origin_index: usize,
        destination: ContainerKey,
    ) -> Self {
        Self {
            id,
            origin,
            origin_index,
            destination,
            created_destination: false,
        }
    }

    /// Whether the move crossed sibling containers.
    #[must_use]
    pub fn crossed_containers(&self) -> bool {
        self.origin != self.destination
    }
}

/// Ordered sibling containers, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    containers: IndexMap<ContainerKey, Vec<RecordId>>,
}

impl Layout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a container with its records in display order.
    #[must_use]
    pub fn with_container(
        mut self,
        key: ContainerKey,
        ids: impl IntoIterator<Item = impl Into<RecordId>>,
    ) -> Self {
        self.set_container(key, ids);
        self
    }

    /// Replace a container's membership wholesale.
    pub fn set_container(
        &mut self,
        key: ContainerKey,
        ids: impl IntoIterator<Item = impl Into<RecordId>>,
    ) {
        self.containers
            .insert(key, ids.into_iter().map(Into::into).collect());
    }

    /// The records of a container, in display order.
    #[must_use]
    pub fn container(&self, key: &ContainerKey) -> Option<&[RecordId]> {
        self.containers.get(key).map(Vec::as_slice)
    }

    /// All container keys, in display order.
    pub fn keys(&self) -> impl Iterator<Item = &ContainerKey> {
        self.containers.keys()
    }

    /// Find the container and display index currently holding a record.
    #[must_use]
    pub fn locate(&self, id: &RecordId) -> Option<(ContainerKey, usize)> {
        self.containers.iter().find_map(|(key, ids)| {
            ids.iter()
                .position(|candidate| candidate == id)
                .map(|index| (key.clone(), index))
        })
    }

    /// Dense 1-based ranks for a container, ties broken by display order.
    #[must_use]
    pub fn ranks(&self, key: &ContainerKey) -> Vec<(RecordId, u32)> {
        self.container(key)
            .map(|ids| {
                ids.iter()
                    .enumerate()
                    .map(|(index, id)| (id.clone(), index as u32 + 1))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Move a record to `to` at `to_index`, returning the plan that undoes
    /// it. `None` if the record is not in the layout.
    ///
    /// The target index is clamped to the destination's length; a drop into
    /// a container the layout has not seen yet creates it.
    pub fn apply_move(
        &mut self,
        id: &RecordId,
        to: ContainerKey,
        to_index: usize,
    ) -> Option<RevertPlan> {
        let (origin, origin_index) = self.locate(id)?;
        let origin_ids = self.containers.get_mut(&origin)?;
        let record = origin_ids.remove(origin_index);

        let created_destination = !self.containers.contains_key(&to);
        let destination_ids = self.containers.entry(to.clone()).or_default();
        let index = to_index.min(destination_ids.len());
        destination_ids.insert(index, record);

        Some(RevertPlan {
            id: id.clone(),
            origin,
            origin_index,
            destination: to,
            created_destination,
        })
    }

    /// Undo an applied move exactly.
    pub fn revert(&mut self, plan: &RevertPlan) {
        if let Some(destination_ids) = self.containers.get_mut(&plan.destination) {
            destination_ids.retain(|id| id != &plan.id);
            if plan.created_destination && destination_ids.is_empty() {
                self.containers.shift_remove(&plan.destination);
            }
        }
        let origin_ids = self.containers.entry(plan.origin.clone()).or_default();
        let index = plan.origin_index.min(origin_ids.len());
        origin_ids.insert(index, plan.id.clone());
    }

    // -----------------------------------------------------------------------
    // Tree walks
    // -----------------------------------------------------------------------

    /// Depth of a record's subtree: 1 for a leaf, 1 + the deepest child
    /// chain otherwise.
    ///
    /// Walks the arrangement itself, so collapsed visual state cannot hide
    /// levels from the computation. Cycles (a malformed arrangement) are
    /// cut rather than recursed into.
    #[must_use]
    pub fn subtree_depth(&self, id: &RecordId) -> usize {
        let mut visited = Vec::new();
        self.subtree_depth_inner(id, &mut visited)
    }

    fn subtree_depth_inner<'a>(&'a self, id: &'a RecordId, visited: &mut Vec<&'a RecordId>) -> usize {
        if visited.contains(&id) {
            return 0;
        }
        visited.push(id);
        let children_key = ContainerKey::Child(id.clone());
        let deepest = self
            .container(&children_key)
            .into_iter()
            .flatten()
            .map(|child| self.subtree_depth_inner(child, visited))
            .max()
            .unwrap_or(0);
        visited.pop();
        1 + deepest
    }

    /// Nesting depth of a container: 0 for the root (and for groups, which
    /// do not nest), parents' level + 1 for a child container.
    #[must_use]
    pub fn container_depth(&self, key: &ContainerKey) -> usize {
        // A well-formed arrangement has at most one level per container;
        // the bound cuts ancestor cycles in malformed ones.
        let bound = self.containers.len() + 1;
        let mut depth = 0;
        let mut current = key.clone();
        while let ContainerKey::Child(parent) = current {
            depth += 1;
            if depth >= bound {
                break;
            }
            match self.locate(&parent) {
                Some((container, _)) => current = container,
                None => break,
            }
        }
        depth
    }

    /// The arrangement as a nested tree, rooted at [`ContainerKey::Root`].
    #[must_use]
    pub fn to_tree(&self) -> Vec<TreeNode> {
        let mut visited = Vec::new();
        self.container(&ContainerKey::Root)
            .into_iter()
            .flatten()
            .map(|id| self.tree_node(id, &mut visited))
            .collect()
    }

    fn tree_node<'a>(&'a self, id: &'a RecordId, visited: &mut Vec<&'a RecordId>) -> TreeNode {
        if visited.contains(&id) {
            return TreeNode::leaf(id.as_str());
        }
        visited.push(id);
        let children = self
            .container(&ContainerKey::Child(id.clone()))
            .into_iter()
            .flatten()
            .map(|child| self.tree_node(child, visited))
            .collect();
        visited.pop();
        TreeNode {
            id: id.as_str().to_string(),
            children,
        }
    }

    /// The arrangement as a JSON value: container key → ordered id array.
    ///
    /// Used to mirror the layout into a reactive store document.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (key, ids) in &self.containers {
            map.insert(
                key.to_string(),
                Value::Array(ids.iter().map(|id| Value::String(id.as_str().to_string())).collect()),
            );
        }
        Value::Object(map)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(ids: &[&str]) -> Layout {
        Layout::new().with_container(ContainerKey::Root, ids.iter().copied())
    }

    #[test]
    fn ranks_are_dense_and_one_based() {
        let layout = flat(&["a", "b", "c"]);
        let ranks = layout.ranks(&ContainerKey::Root);
        assert_eq!(
            ranks,
            vec![
                (RecordId::from("a"), 1),
                (RecordId::from("b"), 2),
                (RecordId::from("c"), 3),
            ]
        );
    }

    #[test]
    fn ranks_follow_display_order_not_history() {
        let mut layout = flat(&["a", "b", "c"]);
        layout.apply_move(&"c".into(), ContainerKey::Root, 0).unwrap();
        let ranks = layout.ranks(&ContainerKey::Root);
        assert_eq!(
            ranks,
            vec![
                (RecordId::from("c"), 1),
                (RecordId::from("a"), 2),
                (RecordId::from("b"), 3),
            ]
        );
    }

    #[test]
    fn apply_then_revert_is_identity() {
        let original = Layout::new()
            .with_container(ContainerKey::group("todo"), ["1", "2", "3"])
            .with_container(ContainerKey::group("done"), ["4"]);
        let mut layout = original.clone();

        let plan = layout
            .apply_move(&"2".into(), ContainerKey::group("done"), 0)
            .unwrap();
        assert!(plan.crossed_containers());
        assert_ne!(layout, original);

        layout.revert(&plan);
        assert_eq!(layout, original);
    }

    #[test]
    fn revert_removes_created_container() {
        let original = Layout::new().with_container(ContainerKey::Root, ["1", "2"]);
        let mut layout = original.clone();

        let plan = layout
            .apply_move(&"2".into(), ContainerKey::child("1"), 0)
            .unwrap();
        assert_eq!(
            layout.container(&ContainerKey::child("1")),
            Some(&[RecordId::from("2")][..])
        );

        layout.revert(&plan);
        assert_eq!(layout, original);
    }

    #[test]
    fn target_index_is_clamped() {
        let mut layout = flat(&["a", "b"]);
        layout.apply_move(&"a".into(), ContainerKey::Root, 99).unwrap();
        let ranks = layout.ranks(&ContainerKey::Root);
        assert_eq!(ranks[0].0, RecordId::from("b"));
        assert_eq!(ranks[1].0, RecordId::from("a"));
    }

    #[test]
    fn locate_scans_all_containers() {
        let layout = Layout::new()
            .with_container(ContainerKey::Root, ["1"])
            .with_container(ContainerKey::child("1"), ["2", "3"]);
        assert_eq!(
            layout.locate(&"3".into()),
            Some((ContainerKey::child("1"), 1))
        );
        assert_eq!(layout.locate(&"9".into()), None);
    }

    #[test]
    fn subtree_depth_counts_levels() {
        // 1 > 2 > 3, and 4 alone.
        let layout = Layout::new()
            .with_container(ContainerKey::Root, ["1", "4"])
            .with_container(ContainerKey::child("1"), ["2"])
            .with_container(ContainerKey::child("2"), ["3"]);
        assert_eq!(layout.subtree_depth(&"4".into()), 1);
        assert_eq!(layout.subtree_depth(&"2".into()), 2);
        assert_eq!(layout.subtree_depth(&"1".into()), 3);
    }

    #[test]
    fn empty_child_container_is_still_leaf_depth() {
        let layout = Layout::new()
            .with_container(ContainerKey::Root, ["1"])
            .with_container(ContainerKey::child("1"), Vec::<String>::new());
        assert_eq!(layout.subtree_depth(&"1".into()), 1);
    }

    #[test]
    fn container_depth_counts_ancestors() {
        let layout = Layout::new()
            .with_container(ContainerKey::Root, ["1"])
            .with_container(ContainerKey::child("1"), ["2"])
            .with_container(ContainerKey::child("2"), ["3"]);
        assert_eq!(layout.container_depth(&ContainerKey::Root), 0);
        assert_eq!(layout.container_depth(&ContainerKey::group("g")), 0);
        assert_eq!(layout.container_depth(&ContainerKey::child("1")), 1);
        assert_eq!(layout.container_depth(&ContainerKey::child("2")), 2);
    }

    #[test]
    fn to_tree_nests_children() {
        let layout = Layout::new()
            .with_container(ContainerKey::Root, ["1", "3"])
            .with_container(ContainerKey::child("1"), ["2"]);
        let tree = layout.to_tree();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id, "1");
        assert_eq!(tree[0].children, vec![TreeNode::leaf("2")]);
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn cyclic_arrangement_does_not_hang() {
        // Malformed: 1 and 2 claim each other as children.
        let layout = Layout::new()
            .with_container(ContainerKey::child("1"), ["2"])
            .with_container(ContainerKey::child("2"), ["1"]);
        assert_eq!(layout.subtree_depth(&"1".into()), 2);
        let _ = layout.container_depth(&ContainerKey::child("1"));
    }

    #[test]
    fn to_value_preserves_display_order() {
        let layout = Layout::new()
            .with_container(ContainerKey::group("todo"), ["2", "1"])
            .with_container(ContainerKey::group("done"), Vec::<String>::new());
        let value = layout.to_value();
        assert_eq!(value["group:todo"], serde_json::json!(["2", "1"]));
        assert_eq!(value["group:done"], serde_json::json!([]));
    }
}

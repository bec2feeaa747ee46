#![forbid(unsafe_code)]

//! Wire payloads for order/tree persistence.
//!
//! The backend accepts a JSON body carrying either an `order` mapping
//! (stable id → integer rank), a `tree` (nested array of `{id, children}`),
//! or a single column assignment, plus the context fields the server needs
//! to validate the write (`order_column`, `group_column`, `parent_column`).
//! Ranks are dense and 1-based; the map form keeps the base explicit for
//! the backend either way.

use std::collections::BTreeMap;

use serde::Serialize;

/// Persist the full ordering of one sibling container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderPayload {
    /// Stable id → dense 1-based rank, covering the container's full
    /// membership.
    pub order: BTreeMap<String, u32>,
    /// Column the backend stores ranks in.
    pub order_column: String,
    /// Grouping column, when the container is a group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_column: Option<String>,
    /// Group the ordered records belong to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Parent column, when the container is a tree level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_column: Option<String>,
    /// Parent record the ordered records hang under; absent at the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl OrderPayload {
    /// Build a flat order payload from `(id, rank)` pairs.
    pub fn new(
        order_column: impl Into<String>,
        ranks: impl IntoIterator<Item = (String, u32)>,
    ) -> Self {
        Self {
            order: ranks.into_iter().collect(),
            order_column: order_column.into(),
            group_column: None,
            group: None,
            parent_column: None,
            parent: None,
        }
    }

    /// Attach grouped-mode context.
    #[must_use]
    pub fn in_group(mut self, group_column: impl Into<String>, group: impl Into<String>) -> Self {
        self.group_column = Some(group_column.into());
        self.group = Some(group.into());
        self
    }

    /// Attach tree-mode context. `parent` is absent for the root level.
    #[must_use]
    pub fn under_parent(
        mut self,
        parent_column: impl Into<String>,
        parent: Option<String>,
    ) -> Self {
        self.parent_column = Some(parent_column.into());
        self.parent = parent;
        self
    }
}

/// Reassign one record's grouping or parent column.
///
/// `value: None` detaches the record to the root level and serializes as an
/// explicit `null` so the backend clears the column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipPayload {
    /// The moved record.
    pub id: String,
    /// The container-defining column (`group_column` or `parent_column`).
    pub column: String,
    /// New column value; `null` clears it.
    pub value: Option<String>,
}

/// One node of a nested tree payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// A leaf node.
    #[must_use]
    pub fn leaf(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            children: Vec::new(),
        }
    }
}

/// Persist a whole tree arrangement in one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreePayload {
    pub tree: Vec<TreeNode>,
    pub order_column: String,
    pub parent_column: String,
}

/// One persistence request, as handed to a [`SyncClient`](crate::SyncClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Update {
    Order(OrderPayload),
    Membership(MembershipPayload),
    Tree(TreePayload),
}

impl Update {
    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Order(_) => "order",
            Self::Membership(_) => "membership",
            Self::Tree(_) => "tree",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

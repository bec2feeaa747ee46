#![forbid(unsafe_code)]

//! Container wiring from the markup contract.
//!
//! Draggable containers describe themselves through data attributes: the
//! persistence endpoint, the rank column, and — depending on mode — a group
//! column or a parent column with a depth limit. The core reads these as
//! configuration at initialization and otherwise knows nothing about
//! markup.
//!
//! A container with missing or unparsable required attributes is simply
//! skipped (no reordering wired up for it). That is a configuration-time
//! mistake by the page author, not a runtime condition, so it is
//! debug-logged and never surfaced to the user.

/// Attribute carrying the persistence endpoint.
pub const ATTR_ENDPOINT: &str = "data-reorder-url";
/// Row-level attribute carrying the stable record identifier. Read by the
/// drag adapter when it builds [`DropEvent`](crate::DropEvent)s.
pub const ATTR_ITEM_ID: &str = "data-id";
/// Attribute carrying the rank column name.
pub const ATTR_ORDER_COLUMN: &str = "data-order-column";
/// Attribute carrying the group column name (grouped mode).
pub const ATTR_GROUP_COLUMN: &str = "data-group-column";
/// Attribute carrying the parent column name (tree mode).
pub const ATTR_PARENT_COLUMN: &str = "data-parent-column";
/// Attribute carrying the tree depth limit.
pub const ATTR_MAX_DEPTH: &str = "data-max-depth";

/// Depth limit applied when tree markup does not set one.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Which kind of sibling containers a table reorders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// One container: the whole table.
    Flat,
    /// One container per group value.
    Grouped { group_column: String },
    /// Nested containers with a depth limit.
    Tree {
        parent_column: String,
        max_depth: usize,
    },
}

/// Configuration of one reorderable container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Where order/membership updates are POSTed.
    pub endpoint: String,
    /// Column the backend stores ranks in.
    pub order_column: String,
    pub mode: Mode,
}

impl ContainerConfig {
    /// A flat sortable table.
    #[must_use]
    pub fn flat(endpoint: impl Into<String>, order_column: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            order_column: order_column.into(),
            mode: Mode::Flat,
        }
    }

    /// A grouped sortable table.
    #[must_use]
    pub fn grouped(
        endpoint: impl Into<String>,
        order_column: impl Into<String>,
        group_column: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            order_column: order_column.into(),
            mode: Mode::Grouped {
                group_column: group_column.into(),
            },
        }
    }

    /// A tree view with a nesting limit.
    #[must_use]
    pub fn tree(
        endpoint: impl Into<String>,
        order_column: impl Into<String>,
        parent_column: impl Into<String>,
        max_depth: usize,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            order_column: order_column.into(),
            mode: Mode::Tree {
                parent_column: parent_column.into(),
                max_depth,
            },
        }
    }

    /// Parse a container's data attributes.
    ///
    /// Returns `None` — and logs why at debug level — when the attribute
    /// set does not describe a wireable container: endpoint or order column
    /// missing, both group and parent columns present, or an unparsable
    /// depth limit.
    pub fn from_attrs<'a>(
        attrs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Option<Self> {
        let mut endpoint = None;
        let mut order_column = None;
        let mut group_column = None;
        let mut parent_column = None;
        let mut max_depth_raw = None;
        for (name, value) in attrs {
            match name {
                ATTR_ENDPOINT => endpoint = Some(value),
                ATTR_ORDER_COLUMN => order_column = Some(value),
                ATTR_GROUP_COLUMN => group_column = Some(value),
                ATTR_PARENT_COLUMN => parent_column = Some(value),
                ATTR_MAX_DEPTH => max_depth_raw = Some(value),
                _ => {}
            }
        }

        let Some(endpoint) = endpoint.filter(|value| !value.is_empty()) else {
            tracing::debug!("container skipped: no endpoint");
            return None;
        };
        let Some(order_column) = order_column.filter(|value| !value.is_empty()) else {
            tracing::debug!(endpoint, "container skipped: no order column");
            return None;
        };

        let mode = match (group_column, parent_column) {
            (Some(_), Some(_)) => {
                tracing::debug!(endpoint, "container skipped: both group and parent columns");
                return None;
            }
            (Some(group_column), None) => Mode::Grouped {
                group_column: group_column.to_string(),
            },
            (None, Some(parent_column)) => {
                let max_depth = match max_depth_raw {
                    Some(raw) => match raw.parse::<usize>() {
                        Ok(depth) if depth > 0 => depth,
                        _ => {
                            tracing::debug!(endpoint, raw, "container skipped: bad depth limit");
                            return None;
                        }
                    },
                    None => DEFAULT_MAX_DEPTH,
                };
                Mode::Tree {
                    parent_column: parent_column.to_string(),
                    max_depth,
                }
            }
            (None, None) => Mode::Flat,
        };

        Some(Self {
            endpoint: endpoint.to_string(),
            order_column: order_column.to_string(),
            mode,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_from_minimal_attrs() {
        let config = ContainerConfig::from_attrs([
            (ATTR_ENDPOINT, "/admin/sort"),
            (ATTR_ORDER_COLUMN, "position"),
        ])
        .unwrap();
        assert_eq!(config, ContainerConfig::flat("/admin/sort", "position"));
    }

    #[test]
    fn grouped_from_attrs() {
        let config = ContainerConfig::from_attrs([
            (ATTR_ENDPOINT, "/admin/sort"),
            (ATTR_ORDER_COLUMN, "position"),
            (ATTR_GROUP_COLUMN, "status"),
        ])
        .unwrap();
        assert_eq!(
            config.mode,
            Mode::Grouped {
                group_column: "status".into()
            }
        );
    }

    #[test]
    fn tree_reads_depth_limit_with_default() {
        let config = ContainerConfig::from_attrs([
            (ATTR_ENDPOINT, "/admin/tree"),
            (ATTR_ORDER_COLUMN, "position"),
            (ATTR_PARENT_COLUMN, "parent_id"),
            (ATTR_MAX_DEPTH, "3"),
        ])
        .unwrap();
        assert_eq!(
            config.mode,
            Mode::Tree {
                parent_column: "parent_id".into(),
                max_depth: 3
            }
        );

        let defaulted = ContainerConfig::from_attrs([
            (ATTR_ENDPOINT, "/admin/tree"),
            (ATTR_ORDER_COLUMN, "position"),
            (ATTR_PARENT_COLUMN, "parent_id"),
        ])
        .unwrap();
        assert_eq!(
            defaulted.mode,
            Mode::Tree {
                parent_column: "parent_id".into(),
                max_depth: DEFAULT_MAX_DEPTH
            }
        );
    }

    #[test]
    fn malformed_attrs_are_skipped() {
        // No endpoint.
        assert!(ContainerConfig::from_attrs([(ATTR_ORDER_COLUMN, "position")]).is_none());
        // Empty endpoint.
        assert!(
            ContainerConfig::from_attrs([
                (ATTR_ENDPOINT, ""),
                (ATTR_ORDER_COLUMN, "position"),
            ])
            .is_none()
        );
        // No order column.
        assert!(ContainerConfig::from_attrs([(ATTR_ENDPOINT, "/sort")]).is_none());
        // Ambiguous mode.
        assert!(
            ContainerConfig::from_attrs([
                (ATTR_ENDPOINT, "/sort"),
                (ATTR_ORDER_COLUMN, "position"),
                (ATTR_GROUP_COLUMN, "status"),
                (ATTR_PARENT_COLUMN, "parent_id"),
            ])
            .is_none()
        );
        // Unparsable depth.
        assert!(
            ContainerConfig::from_attrs([
                (ATTR_ENDPOINT, "/sort"),
                (ATTR_ORDER_COLUMN, "position"),
                (ATTR_PARENT_COLUMN, "parent_id"),
                (ATTR_MAX_DEPTH, "lots"),
            ])
            .is_none()
        );
    }

    #[test]
    fn unknown_attrs_are_ignored() {
        let config = ContainerConfig::from_attrs([
            (ATTR_ENDPOINT, "/sort"),
            (ATTR_ORDER_COLUMN, "position"),
            ("data-theme", "dark"),
        ]);
        assert!(config.is_some());
    }
}

//! Write access to the host page
//!
//! The page context only ever touches three things on the host DOM: a cursor
//! element's `display`, its `filter`, and the identifier attribute it assigns.

use super::mutation::NodeHandle;
use crate::model::CursorId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    Display,
    Filter,
}

pub trait HostDom {
    /// Record `id` on the node's identifier data attribute
    fn assign_id(&mut self, node: NodeHandle, id: CursorId);

    /// Set an inline style property
    fn set_style(&mut self, node: NodeHandle, property: StyleProperty, value: &str);
}

/// Host that keeps the written values in memory
///
/// Used for headless runs and tests.
#[derive(Debug, Default)]
pub struct MemoryHost {
    ids: HashMap<NodeHandle, CursorId>,
    styles: HashMap<(NodeHandle, StyleProperty), String>,
    writes: usize,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_of(&self, node: NodeHandle) -> Option<CursorId> {
        self.ids.get(&node).copied()
    }

    pub fn style(&self, node: NodeHandle, property: StyleProperty) -> Option<&str> {
        self.styles.get(&(node, property)).map(String::as_str)
    }

    /// Total number of writes performed against this host
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl HostDom for MemoryHost {
    fn assign_id(&mut self, node: NodeHandle, id: CursorId) {
        self.ids.insert(node, id);
        self.writes += 1;
    }

    fn set_style(&mut self, node: NodeHandle, property: StyleProperty, value: &str) {
        self.styles.insert((node, property), value.to_string());
        self.writes += 1;
    }
}

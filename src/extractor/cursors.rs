//! Incremental derivation of the cursor list from mutation batches

use super::host::{HostDom, StyleProperty};
use super::mutation::{MutationEvent, NodeHandle, NodeKind, NodeSnapshot};
use super::style::{display_value, is_displayed, opacity_filter, parse_opacity_filter};
use crate::model::{rgb_to_hex, CursorId, CursorRecord, GlobalDefaults};
use std::collections::HashMap;

/// Derived cursor state for one page context
///
/// Identity is an arena: each cursor node is mapped to the id minted for it
/// the first time it was seen, and records are looked up by that id.
pub struct CursorExtractor {
    defaults: GlobalDefaults,
    cursors: Vec<CursorRecord>,
    nodes: HashMap<NodeHandle, CursorId>,
}

impl CursorExtractor {
    pub fn new(defaults: GlobalDefaults) -> Self {
        Self {
            defaults,
            cursors: Vec::new(),
            nodes: HashMap::new(),
        }
    }

    pub fn defaults(&self) -> &GlobalDefaults {
        &self.defaults
    }

    /// Defaults applied to cursors that appear from now on
    pub fn set_defaults(&mut self, defaults: GlobalDefaults) {
        self.defaults = defaults;
    }

    /// Current list, in discovery order
    pub fn cursors(&self) -> &[CursorRecord] {
        &self.cursors
    }

    pub fn node_of(&self, id: CursorId) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .find_map(|(node, known)| (*known == id).then_some(*node))
    }

    /// Apply one batch in delivery order
    ///
    /// Returns the new list when the batch carried at least one recognized
    /// signal, `None` when it was a no-op. The list is replaced as a whole
    /// at the end of the batch.
    pub fn apply_batch(
        &mut self,
        batch: &[MutationEvent],
        host: &mut dyn HostDom,
    ) -> Option<Vec<CursorRecord>> {
        let mut cursors = self.cursors.clone();
        let mut signal = false;

        for event in batch {
            let applied = match event {
                MutationEvent::ChildAdded { target, child } => match target.kind {
                    NodeKind::Container => self.cursor_added(child, &mut cursors, host),
                    NodeKind::Cursor => self.cursor_child_added(target, child, &mut cursors, host),
                    _ => false,
                },
                MutationEvent::ChildRemoved { target, child }
                    if target.kind == NodeKind::Container =>
                {
                    self.cursor_removed(child, &mut cursors)
                }
                MutationEvent::ChildRemoved { .. } => false,
                MutationEvent::AttributeChanged { target } => match target.kind {
                    NodeKind::Cursor => {
                        Self::cursor_style_changed(&self.nodes, target, &mut cursors)
                    }
                    NodeKind::NameLabel => {
                        Self::label_style_changed(&self.nodes, target, &mut cursors)
                    }
                    _ => false,
                },
            };
            if !applied {
                tracing::debug!("Dropped mutation {:?}", event);
            }
            signal |= applied;
        }

        if !signal {
            return None;
        }
        self.cursors = cursors;
        Some(self.cursors.clone())
    }

    /// Show or hide a cursor element directly. Returns false for unknown ids.
    pub fn set_cursor_visible(&self, id: CursorId, visible: bool, host: &mut dyn HostDom) -> bool {
        match self.node_of(id) {
            Some(node) => {
                host.set_style(node, StyleProperty::Display, display_value(visible));
                true
            }
            None => false,
        }
    }

    fn cursor_added(
        &mut self,
        node: &NodeSnapshot,
        cursors: &mut Vec<CursorRecord>,
        host: &mut dyn HostDom,
    ) -> bool {
        if node.kind != NodeKind::Cursor {
            return false;
        }
        // Redelivered notification for a cursor we already track
        if self.nodes.contains_key(&node.handle) {
            return false;
        }

        let id = CursorId::new();
        host.assign_id(node.handle, id);
        let display = display_value(self.defaults.all_enabled);
        host.set_style(node.handle, StyleProperty::Display, display);
        let filter = opacity_filter(self.defaults.all_opacity);
        host.set_style(node.handle, StyleProperty::Filter, &filter);

        self.nodes.insert(node.handle, id);
        cursors.push(CursorRecord::from_defaults(id, &self.defaults));

        tracing::debug!("Cursor {} appeared on node {:?}", id, node.handle);
        true
    }

    fn cursor_removed(&mut self, node: &NodeSnapshot, cursors: &mut Vec<CursorRecord>) -> bool {
        let Some(id) = self.nodes.remove(&node.handle) else {
            return false;
        };
        let before = cursors.len();
        cursors.retain(|cursor| cursor.id != id);

        tracing::debug!("Cursor {} removed", id);
        cursors.len() != before
    }

    fn cursor_child_added(
        &self,
        cursor: &NodeSnapshot,
        child: &NodeSnapshot,
        cursors: &mut [CursorRecord],
        host: &mut dyn HostDom,
    ) -> bool {
        let Some(record) = Self::record_for(&self.nodes, cursor.handle, cursors) else {
            return false;
        };

        match child.kind {
            NodeKind::NameLabel => {
                let show = self.defaults.all_show_names;
                host.set_style(child.handle, StyleProperty::Display, display_value(show));
                record.show_name = show;
                if let Some(text) = &child.text {
                    record.name = text.trim().to_string();
                }
                true
            }
            NodeKind::Marker => {
                let Some(color) = child.style.border_color.as_deref().and_then(rgb_to_hex) else {
                    return false;
                };
                record.color = Some(color);
                true
            }
            _ => false,
        }
    }

    fn cursor_style_changed(
        nodes: &HashMap<NodeHandle, CursorId>,
        cursor: &NodeSnapshot,
        cursors: &mut [CursorRecord],
    ) -> bool {
        // Not yet assigned an id, or already gone
        let Some(record) = Self::record_for(nodes, cursor.handle, cursors) else {
            return false;
        };

        record.enabled = is_displayed(cursor.style.display.as_deref());
        if let Some(opacity) = cursor.style.filter.as_deref().and_then(parse_opacity_filter) {
            record.opacity = opacity;
        }
        true
    }

    fn label_style_changed(
        nodes: &HashMap<NodeHandle, CursorId>,
        label: &NodeSnapshot,
        cursors: &mut [CursorRecord],
    ) -> bool {
        let Some(parent) = label.parent else {
            return false;
        };
        let Some(record) = Self::record_for(nodes, parent, cursors) else {
            return false;
        };

        record.show_name = is_displayed(label.style.display.as_deref());
        true
    }

    fn record_for<'a>(
        nodes: &HashMap<NodeHandle, CursorId>,
        node: NodeHandle,
        cursors: &'a mut [CursorRecord],
    ) -> Option<&'a mut CursorRecord> {
        let id = nodes.get(&node)?;
        cursors.iter_mut().find(|cursor| cursor.id == *id)
    }
}

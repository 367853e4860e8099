//! Typed change events delivered by the host page observer
//!
//! The observer adapter classifies each node it reports and snapshots the
//! style properties this crate reads. Nodes are referred to by opaque handles
//! owned by the adapter.

/// Opaque reference to a host DOM node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub u64);

/// What a node is within the cursor container subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The element holding every cursor
    Container,
    /// One participant's cursor element
    Cursor,
    /// Name label child of a cursor
    NameLabel,
    /// Arrow child of a cursor carrying its color
    Marker,
    /// Anything else; ignored
    Other,
}

/// Inline style values as seen when the mutation was recorded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeStyle {
    pub display: Option<String>,
    pub filter: Option<String>,
    pub border_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub handle: NodeHandle,
    pub kind: NodeKind,
    pub parent: Option<NodeHandle>,
    pub style: NodeStyle,
    pub text: Option<String>,
}

impl NodeSnapshot {
    pub fn new(handle: u64, kind: NodeKind) -> Self {
        Self {
            handle: NodeHandle(handle),
            kind,
            parent: None,
            style: NodeStyle::default(),
            text: None,
        }
    }

    pub fn with_parent(mut self, parent: u64) -> Self {
        self.parent = Some(NodeHandle(parent));
        self
    }

    pub fn with_display(mut self, display: &str) -> Self {
        self.style.display = Some(display.to_string());
        self
    }

    pub fn with_filter(mut self, filter: &str) -> Self {
        self.style.filter = Some(filter.to_string());
        self
    }

    pub fn with_border_color(mut self, color: &str) -> Self {
        self.style.border_color = Some(color.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationEvent {
    ChildAdded {
        target: NodeSnapshot,
        child: NodeSnapshot,
    },
    ChildRemoved {
        target: NodeSnapshot,
        child: NodeSnapshot,
    },
    /// The `style` attribute of `target` changed
    AttributeChanged { target: NodeSnapshot },
}

/// Events delivered together, in delivery order
pub type MutationBatch = Vec<MutationEvent>;

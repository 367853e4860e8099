//! Page-side cursor extraction
//!
//! Watches the host page's cursor container through typed mutation batches,
//! keeps the derived cursor list and writes it to the board store. New cursors
//! get the board defaults applied to their inline style as they appear.

pub mod cursors;
pub mod host;
pub mod mutation;
pub mod runtime;
pub mod style;

pub use cursors::CursorExtractor;
pub use host::{HostDom, MemoryHost, StyleProperty};
pub use mutation::{MutationBatch, MutationEvent, NodeHandle, NodeKind, NodeSnapshot, NodeStyle};
pub use runtime::{PageInputs, PageRuntime};

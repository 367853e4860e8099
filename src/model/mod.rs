//! Cursor state shared by both contexts
//!
//! Everything here is plain serializable data. The page context derives it,
//! the store persists it and the panel renders it.

pub mod color;
pub mod cursor;

pub use color::{rgb_to_hex, HexColor};
pub use cursor::{CursorId, CursorRecord, GlobalDefaults, Opacity};

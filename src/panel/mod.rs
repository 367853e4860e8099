//! Extension panel context
//!
//! The panel is only alive while it is open. On open it checks that the
//! active page is a board, connects to the page context, renders one control
//! group per stored cursor and then keeps its groups in step with the store
//! while forwarding the user's changes to the page.

pub mod activation;
pub mod diff;
pub mod synchronizer;
pub mod view;

pub use activation::board_for_page;
pub use diff::{diff_ids, IdDiff};
pub use synchronizer::{Activation, PanelAction, PanelSynchronizer};
pub use view::{ControlGroup, PanelView};

//! Liveness-checked link between the panel and the page context
//!
//! The panel opens a named link when it becomes visible. The page side
//! attaches a [`PanelConnection`] to it which pings the panel on a fixed
//! interval and releases the link once two pings in a row go unanswered.

pub mod connection;
pub mod frame;
pub mod liveness;
pub mod port;

pub use connection::{ConnectionEvent, Liveness, PanelConnection};
pub use frame::{DisplayChange, Frame, Message, OpacityChange};
pub use liveness::{Heartbeat, HeartbeatAction, MAX_OUTSTANDING_PINGS};
pub use port::{port_listener, Port, PortConnector, PortListener};

//! Board Cursors - control the other participants' cursors on a shared board.
//!
//! Two cooperating contexts share one board-scoped store:
//!
//! - the page context ([`extractor`]) derives the cursor list from the host
//!   page, writes it to the store and applies display commands to the page;
//! - the panel context ([`panel`]) renders per-cursor controls from the store
//!   and sends the user's changes to the page over a liveness-checked
//!   [`channel`].

pub mod channel;
pub mod config;
pub mod error;
pub mod extractor;
pub mod model;
pub mod panel;
pub mod store;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Calling this twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "board_cursors=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    tracing::info!("Starting Board Cursors v{}", env!("CARGO_PKG_VERSION"));
}

//! region-snip: draw a rectangle over a page, capture exactly that region.
//!
//! This crate wires together:
//! - Message protocol shared by every context (protocol.rs)
//! - Capture → crop → downscale pipeline (capture/)
//! - Page-side overlay agent and escape relay (overlay/)
//! - Privileged orchestrator and its browser seam (orchestrator/)
//! - Session preview store (store.rs) and panel clients (panel.rs)
//! - In-process bus connecting them (bus.rs)

pub mod bus;
pub mod capture;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod overlay;
pub mod panel;
pub mod protocol;
pub mod safety;
pub mod store;

pub use config::SnipConfig;
pub use error::SnipError;
pub use orchestrator::{BrowserHost, Orchestrator};
pub use protocol::{CommandResult, Envelope, Message, Origin, SelectionRect};

/// Initialise `env_logger` once. Later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

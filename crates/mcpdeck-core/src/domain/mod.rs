//! Pure domain types shared across the workspace.
//!
//! These types carry no infrastructure dependencies; adapters and the
//! runtime exchange them through the ports defined in [`crate::ports`].

mod server;
mod snapshot;

pub use server::{
    PLUGIN_ID_PREFIX, ServerConfig, ServerRecord, ServerScope, ServerStatus, plugin_full_name,
    short_name,
};
pub use snapshot::Snapshot;

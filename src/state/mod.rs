//! Per-server routing state.
//!
//! Each virtual server gets one [`ServerContext`] owning its session and
//! topology stores. Contexts are created on first use and dropped when the
//! server starts or stops, which is what clears sessions and forces the
//! channel hierarchy to be rebuilt.

pub mod sessions;
pub mod topology;

pub use sessions::{Session, SessionStore};
pub use topology::{LocationKey, Removal, TopologyStore};

/// Everything the router keeps about one virtual server.
#[derive(Debug, Default)]
pub struct ServerContext {
    pub sessions: SessionStore,
    pub topology: TopologyStore,
}

impl ServerContext {
    pub fn new() -> Self {
        Self::default()
    }
}

//! Unified error handling for proxvoice.
//!
//! Payload validation failures are not errors here: they are recovered
//! inside the router and only logged. What remains are faults that abort
//! the handling of one event.

use crate::host::ChannelId;
use proxvoice_proto::DecodeError;
use thiserror::Error;

// ============================================================================
// Host Errors (voice server API calls)
// ============================================================================

/// Failure reported by the voice server API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("no such channel: {0}")]
    NoSuchChannel(ChannelId),

    #[error("no such user session: {0}")]
    NoSuchUser(u32),

    #[error("voice server unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// Topology Errors (channel hierarchy invariants)
// ============================================================================

/// The channel hierarchy is not in the state routing expects.
///
/// These indicate an initialization bug or an out-of-band change, never bad
/// user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("channel topology not initialized")]
    NotInitialized,

    #[error("waiting room channel missing from topology")]
    MissingWaitingRoom,

    #[error("group channel root missing from topology")]
    MissingGroupRoot,
}

// ============================================================================
// Router Errors (one event)
// ============================================================================

/// Errors that abort handling of a single host event.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error("host call failed: {0}")]
    Host(#[from] HostError),
}

impl RouterError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Topology(TopologyError::NotInitialized) => "topology_not_initialized",
            Self::Topology(TopologyError::MissingWaitingRoom) => "missing_waiting_room",
            Self::Topology(TopologyError::MissingGroupRoot) => "missing_group_root",
            Self::Host(_) => "host",
        }
    }

    /// Whether the fault points at a bug rather than a transient condition.
    ///
    /// Decode and topology faults are logged at error level; host failures
    /// are expected to clear up on a later update.
    pub fn is_fault(&self) -> bool {
        !matches!(self, Self::Host(_))
    }
}

/// Result type for router callbacks.
pub type RouterResult<T = ()> = Result<T, RouterError>;

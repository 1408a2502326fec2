//! proxvoice - proximity voice routing for game-linked voice servers.
//!
//! Users whose voice client reports game context through the positional
//! audio plugin are moved into channels by the map they are on, or into a
//! shared channel with their party while in the waiting room.
//!
//! The [`router::Router`] implements the host callback set
//! ([`host::ServerCallbacks`]); [`dispatch::Dispatcher`] feeds it host events.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod http;
pub mod metrics;
pub mod replay;
pub mod router;
pub mod state;
pub mod telemetry;

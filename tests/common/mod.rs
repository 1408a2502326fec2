//! Integration test common infrastructure.
//!
//! Provides a router wired to an in-memory voice server, and a builder for
//! the user states a game-linked voice client would report.

pub mod harness;
pub mod player;

#[allow(unused_imports)]
pub use harness::TestRouter;
#[allow(unused_imports)]
pub use player::Player;

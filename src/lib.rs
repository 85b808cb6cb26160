#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod ai;
pub mod config;
pub mod domain;
pub mod errors;
pub mod health;
pub mod registry;
pub mod room;
pub mod telemetry;
pub mod ws;


// Re-exports for public API
pub use ai::{AiBrain, AiContext, AiDifficulty};
pub use domain::snapshot::RoomSnapshot;
pub use domain::state::GameState;
pub use domain::{ConnId, PlayerId};
pub use errors::{GameError, RejectKind};
pub use registry::RoomRegistry;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::init();
}

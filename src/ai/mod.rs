//! Bot opponents: per-bot decision heuristics and the controller that
//! drives them through the same engine operations humans use.

pub mod brain;
pub mod controller;
pub mod names;

pub use brain::{AiBrain, AiDifficulty};
pub use controller::{AiContext, BotAction, PowerAction};

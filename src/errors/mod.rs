pub mod domain;

pub use domain::{GameError, RejectKind};

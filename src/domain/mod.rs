//! Game engine: rules, decks, roles, powers, and the room state machine.

pub mod policies;
pub mod powers;
pub mod roles;
pub mod snapshot;
pub mod state;

/// Stable identity of a seated player, unchanged across reconnects.
pub type PlayerId = uuid::Uuid;

/// Volatile identity of one transport connection.
pub type ConnId = uuid::Uuid;

#[cfg(test)]
mod tests_powers;
#[cfg(test)]
mod tests_state;

//! WebSocket transport: per-connection session actors and the wire
//! protocol they speak.

pub mod protocol;
pub mod session;

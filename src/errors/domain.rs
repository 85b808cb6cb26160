//! Domain errors for game rule violations.
//!
//! Every rejected player action maps to a `GameError` with a closed
//! machine-readable `RejectKind` plus a human-readable detail string.
//! Clients branch on the kind; the detail is for display and logs only.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of rejection reasons surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectKind {
    RoomNotFound,
    PlayerNotFound,
    RoomFull,
    GameAlreadyStarted,
    GameNotStarted,
    DuplicateName,
    InvalidName,
    NotHost,
    WrongPhase,
    NotPresident,
    NotCabinetChief,
    DeadPlayer,
    TermLimited,
    SelfTarget,
    AlreadyInvestigated,
    VetoLocked,
    NoVetoPending,
    CardIndexOutOfRange,
    PlayerCountOutOfRange,
    VotesPending,
    GameOver,
    BadRequest,
}

/// A rule violation detected while applying a player action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {detail}")]
pub struct GameError {
    pub kind: RejectKind,
    pub detail: String,
}

impl GameError {
    pub fn new(kind: RejectKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn wrong_phase(expected: &str, actual: impl std::fmt::Debug) -> Self {
        Self::new(
            RejectKind::WrongPhase,
            format!("expected phase {expected}, currently {actual:?}"),
        )
    }

    pub fn player_not_found(detail: impl Into<String>) -> Self {
        Self::new(RejectKind::PlayerNotFound, detail)
    }

    pub fn not_president(detail: impl Into<String>) -> Self {
        Self::new(RejectKind::NotPresident, detail)
    }

    pub fn dead_player(detail: impl Into<String>) -> Self {
        Self::new(RejectKind::DeadPlayer, detail)
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(RejectKind::BadRequest, detail)
    }

    pub fn kind(&self) -> RejectKind {
        self.kind
    }
}

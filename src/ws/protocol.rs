//! Wire messages exchanged with clients.
//!
//! Events are tagged with a kebab-case `type` field; payload keys are
//! camelCase. Every success broadcast carries the recipient's redacted
//! room snapshot so clients never have to patch state incrementally.

use serde::{Deserialize, Serialize};

use crate::ai::AiDifficulty;
use crate::domain::policies::{PolicyCard, WinReason};
use crate::domain::powers::Power;
use crate::domain::roles::{Role, Team};
use crate::domain::snapshot::RoomSnapshot;
use crate::domain::PlayerId;
use crate::errors::domain::RejectKind;

/// Client-to-server requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMsg {
    CreateRoom {
        room_name: String,
        player_name: String,
    },
    JoinRoom {
        room_id: String,
        player_name: String,
    },
    RejoinRoom {
        room_id: String,
        player_id: PlayerId,
    },
    GetRooms,
    StartGame,
    AddAi {
        #[serde(default)]
        difficulty: Option<AiDifficulty>,
    },
    RemoveAi {
        ai_player_id: PlayerId,
    },
    NominateCabinetChief {
        cabinet_chief_id: PlayerId,
    },
    CastVote {
        vote: bool,
    },
    PresidentDiscard {
        card_index: usize,
    },
    CabinetChiefEnact {
        card_index: usize,
    },
    RequestVeto,
    RespondVeto {
        accepts: bool,
    },
    ExecutePeek,
    ExecuteInvestigate {
        target_player_id: PlayerId,
    },
    ExecuteSpecialElection {
        target_player_id: PlayerId,
    },
    ExecuteExecution {
        target_player_id: PlayerId,
    },
    SendMessage {
        message: String,
    },
}

/// One row of the lobby's room browser.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyRoom {
    pub room_id: String,
    pub room_name: String,
    pub player_count: usize,
    pub max_players: usize,
}

/// A player whose role the recipient legitimately knows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownPlayer {
    pub player_id: PlayerId,
    pub name: String,
    pub role: Role,
}

/// Server-to-client events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMsg {
    RoomCreated {
        room_id: String,
        player_id: PlayerId,
        game_state: RoomSnapshot,
    },
    RoomJoined {
        room_id: String,
        player_id: PlayerId,
        game_state: RoomSnapshot,
    },
    RoomRejoined {
        room_id: String,
        player_id: PlayerId,
        game_state: RoomSnapshot,
        #[serde(skip_serializing_if = "Option::is_none")]
        role: Option<Role>,
        known_players: Vec<KnownPlayer>,
    },
    PlayerJoined {
        player_id: PlayerId,
        player_name: String,
        game_state: RoomSnapshot,
    },
    PlayerLeft {
        player_id: PlayerId,
        #[serde(skip_serializing_if = "Option::is_none")]
        new_host: Option<PlayerId>,
        game_state: RoomSnapshot,
    },
    RoomsList {
        rooms: Vec<LobbyRoom>,
    },
    GameStarted {
        game_state: RoomSnapshot,
    },
    /// Private: the recipient's own role and starting knowledge.
    RoleAssigned {
        role: Role,
        known_players: Vec<KnownPlayer>,
    },
    GameUpdate {
        game_state: RoomSnapshot,
    },
    CabinetChiefNominated {
        cabinet_chief_id: PlayerId,
        game_state: RoomSnapshot,
    },
    VoteCast {
        player_id: PlayerId,
        votes_cast: usize,
        game_state: RoomSnapshot,
    },
    VoteResult {
        ja: usize,
        nein: usize,
        approved: bool,
        game_state: RoomSnapshot,
    },
    ChaosTriggered {
        enacted: PolicyCard,
        game_state: RoomSnapshot,
    },
    /// Private: legislative cards for the president or cabinet chief.
    ReceivePolicies {
        cards: Vec<PolicyCard>,
    },
    PresidentDiscarded {
        game_state: RoomSnapshot,
    },
    PolicyEnacted {
        card: PolicyCard,
        game_state: RoomSnapshot,
    },
    ExecutivePowerAvailable {
        power: Power,
        game_state: RoomSnapshot,
    },
    VetoRequested {
        game_state: RoomSnapshot,
    },
    VetoResult {
        accepted: bool,
        game_state: RoomSnapshot,
    },
    PowerExecuted {
        power: Power,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_id: Option<PlayerId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_name: Option<String>,
        game_state: RoomSnapshot,
    },
    /// Private: peek result for the president.
    PeekResult {
        cards: Vec<PolicyCard>,
    },
    /// Private: investigation result for the president.
    InvestigationResult {
        target_id: PlayerId,
        target_name: String,
        team: Team,
    },
    ChatMessage {
        player_id: PlayerId,
        player_name: String,
        message: String,
        timestamp: i64,
    },
    GameOver {
        winner: Team,
        win_reason: WinReason,
        game_state: RoomSnapshot,
    },
    Rejected {
        kind: RejectKind,
        message: String,
    },
}

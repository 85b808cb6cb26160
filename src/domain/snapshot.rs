//! Serialized room views sent over the wire.
//!
//! Snapshots are built per recipient. A viewer sees their own role, the
//! roles dealt to them as starting knowledge, and team loyalty for anyone
//! they investigated. Everything is revealed once the game ends.

use serde::Serialize;

use crate::domain::policies::WinReason;
use crate::domain::powers::Power;
use crate::domain::roles::{Role, Team};
use crate::domain::state::{GameState, Phase, Player};
use crate::domain::PlayerId;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub is_dead: bool,
    pub is_ai: bool,
    pub is_connected: bool,
    pub was_investigated: bool,
    /// Full role, present only when the viewer legitimately knows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Team loyalty alone, when known through investigation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: String,
    pub room_name: String,
    pub host_id: Option<PlayerId>,
    pub phase: Phase,
    pub players: Vec<PlayerView>,
    pub president_id: Option<PlayerId>,
    pub cabinet_chief_id: Option<PlayerId>,
    pub nominated_cabinet_chief_id: Option<PlayerId>,
    /// Who has voted so far; ballot contents stay secret until the tally.
    pub voters: Vec<PlayerId>,
    pub reform_policies: u8,
    pub syndicate_policies: u8,
    pub failed_governments: u8,
    pub deck_size: usize,
    pub discard_size: usize,
    pub veto_unlocked: bool,
    pub current_power: Option<Power>,
    pub started: bool,
    pub game_over: bool,
    pub winner: Option<Team>,
    pub win_reason: Option<WinReason>,
}

impl RoomSnapshot {
    /// Builds the room view for one recipient. `viewer = None` yields the
    /// fully redacted spectator view.
    pub fn for_viewer(state: &GameState, viewer: Option<PlayerId>) -> Self {
        let viewer_player = viewer.and_then(|id| state.player(id));
        let players = state
            .players()
            .iter()
            .map(|p| player_view(state, viewer_player, p))
            .collect();

        let mut voters: Vec<PlayerId> = state.votes().keys().copied().collect();
        voters.sort();

        Self {
            room_id: state.room_id().to_string(),
            room_name: state.room_name().to_string(),
            host_id: state.host_id(),
            phase: state.phase(),
            players,
            president_id: state.current_president().map(|p| p.id),
            cabinet_chief_id: state.cabinet_chief(),
            nominated_cabinet_chief_id: state.nominated_cabinet_chief(),
            voters,
            reform_policies: state.reform_policies(),
            syndicate_policies: state.syndicate_policies(),
            failed_governments: state.failed_governments(),
            deck_size: state.deck_size(),
            discard_size: state.discard_size(),
            veto_unlocked: state.veto_unlocked(),
            current_power: state.current_power(),
            started: state.started(),
            game_over: state.game_over(),
            winner: state.winner(),
            win_reason: state.win_reason(),
        }
    }
}

fn player_view(state: &GameState, viewer: Option<&Player>, subject: &Player) -> PlayerView {
    let (role, team) = visible_knowledge(state, viewer, subject);
    PlayerView {
        id: subject.id,
        name: subject.name.clone(),
        is_dead: subject.is_dead,
        is_ai: subject.is_ai,
        is_connected: subject.is_ai || subject.conn_id.is_some(),
        was_investigated: subject.was_investigated,
        role,
        team,
    }
}

fn visible_knowledge(
    state: &GameState,
    viewer: Option<&Player>,
    subject: &Player,
) -> (Option<Role>, Option<Team>) {
    if state.game_over() {
        return (subject.role, None);
    }
    let Some(viewer) = viewer else {
        return (None, None);
    };
    if viewer.id == subject.id || viewer.known_roles.contains(&subject.id) {
        return (subject.role, None);
    }
    if viewer.known_teams.contains(&subject.id) {
        return (None, subject.team());
    }
    (None, None)
}

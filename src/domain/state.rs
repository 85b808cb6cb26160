//! Per-room game state machine.
//!
//! A `GameState` owns everything mutable about one room. All writes go
//! through the operations here; callers outside the domain layer read
//! state through accessors or a serialized snapshot. Every operation
//! validates fully before mutating, so a rejected call leaves the room
//! untouched.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::policies::{self, PolicyCard, PolicyKind, WinReason};
use crate::domain::powers::{self, Power};
use crate::domain::roles::{self, Role, Team, MAX_PLAYERS, MIN_PLAYERS};
use crate::domain::{ConnId, PlayerId};
use crate::errors::domain::{GameError, RejectKind};

/// Consecutive rejected elections before the country descends into chaos.
pub const CHAOS_THRESHOLD: u8 = 3;

/// Syndicate enactments at which the Kingpin winning the cabinet seat
/// ends the game outright.
pub const KINGPIN_ELECTION_THRESHOLD: u8 = 3;

/// Syndicate enactments at which the veto becomes available.
pub const VETO_UNLOCK_THRESHOLD: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Players joining; host may add or remove bots.
    Lobby,
    /// Roles dealt and privately revealed; next stop is nomination.
    RoleReveal,
    /// Sitting president picks a cabinet chief candidate.
    Nomination,
    /// Everyone alive votes on the proposed government.
    Election,
    /// President holds three cards and must discard one.
    LegislativePresident,
    /// Cabinet chief holds two cards and must enact one (or ask to veto).
    LegislativeCabinet,
    /// President must use the power unlocked by the last enactment.
    ExecutivePower,
    /// Cabinet chief asked to veto; president decides.
    VetoDecision,
    /// Terminal.
    GameOver,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub conn_id: Option<ConnId>,
    pub name: String,
    pub role: Option<Role>,
    pub is_dead: bool,
    pub is_ai: bool,
    pub was_investigated: bool,
    /// Players whose full role this player learned at the deal.
    pub known_roles: Vec<PlayerId>,
    /// Players whose team this player learned through investigation.
    pub known_teams: Vec<PlayerId>,
}

impl Player {
    pub fn team(&self) -> Option<Team> {
        self.role.map(|r| r.team)
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }
}

/// What happens to a player record when their connection drops.
#[derive(Debug, Clone)]
pub enum DisconnectOutcome {
    /// Pre-start: the player entry is deleted. Carries the removed player
    /// and the new host if hosting migrated.
    Removed {
        player: Player,
        new_host: Option<PlayerId>,
    },
    /// Post-start: only the connection binding is cleared.
    Unbound { player_id: PlayerId },
    /// The connection was not bound to any player in this room.
    Unknown,
}

#[derive(Debug, Clone)]
pub enum ElectionOutcome {
    Approved {
        ja: usize,
        nein: usize,
        cabinet_chief: PlayerId,
        /// Kingpin seated as cabinet chief late in the game.
        instant_win: bool,
    },
    Rejected {
        ja: usize,
        nein: usize,
        failed_governments: u8,
    },
    Chaos {
        ja: usize,
        nein: usize,
        chaos: ChaosOutcome,
    },
}

#[derive(Debug, Clone)]
pub struct ChaosOutcome {
    pub enacted: PolicyCard,
    pub game_over: bool,
}

#[derive(Debug, Clone)]
pub struct EnactOutcome {
    pub enacted: PolicyCard,
    pub game_over: bool,
    /// Power unlocked by this enactment, if any. When set, the room sits
    /// in `ExecutivePower` until the president resolves it.
    pub power: Option<Power>,
}

#[derive(Debug, Clone)]
pub enum VetoOutcome {
    /// President refused; the cabinet chief keeps the two cards.
    Refused,
    /// Both cards discarded, government counts as failed.
    Accepted {
        failed_governments: u8,
        chaos: Option<ChaosOutcome>,
    },
}

#[derive(Debug, Clone)]
pub struct PeekOutcome {
    pub cards: Vec<PolicyCard>,
}

#[derive(Debug, Clone)]
pub struct InvestigateOutcome {
    pub target: PlayerId,
    pub target_name: String,
    pub team: Team,
}

#[derive(Debug, Clone)]
pub struct SpecialElectionOutcome {
    pub next_president: PlayerId,
}

#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub executed: PlayerId,
    pub executed_name: String,
    pub was_kingpin: bool,
    pub game_over: bool,
}

pub struct GameState {
    room_id: String,
    room_name: String,
    host_id: Option<PlayerId>,
    phase: Phase,
    players: Vec<Player>,
    president_index: Option<usize>,
    cabinet_chief: Option<PlayerId>,
    previous_president: Option<PlayerId>,
    previous_cabinet_chief: Option<PlayerId>,
    nominated_cabinet_chief: Option<PlayerId>,
    votes: HashMap<PlayerId, bool>,
    deck: Vec<PolicyCard>,
    discard: Vec<PolicyCard>,
    /// Cards currently held by the legislative session (3, then 2).
    hand: Vec<PolicyCard>,
    reform_policies: u8,
    syndicate_policies: u8,
    current_power: Option<Power>,
    failed_governments: u8,
    veto_unlocked: bool,
    veto_requested: bool,
    /// Set when the president declines a veto: no second ask this round.
    veto_refused: bool,
    /// One-shot presidency override installed by a special election.
    special_election_override: Option<usize>,
    started: bool,
    game_over: bool,
    winner: Option<Team>,
    win_reason: Option<WinReason>,
    rng: StdRng,
}

impl GameState {
    pub fn new(room_id: String, room_name: String) -> Self {
        Self::with_rng(room_id, room_name, StdRng::from_os_rng())
    }

    /// Deterministic variant for tests and reproducible games.
    pub fn with_seed(room_id: String, room_name: String, seed: u64) -> Self {
        Self::with_rng(room_id, room_name, StdRng::seed_from_u64(seed))
    }

    fn with_rng(room_id: String, room_name: String, rng: StdRng) -> Self {
        Self {
            room_id,
            room_name,
            host_id: None,
            phase: Phase::Lobby,
            players: Vec::new(),
            president_index: None,
            cabinet_chief: None,
            previous_president: None,
            previous_cabinet_chief: None,
            nominated_cabinet_chief: None,
            votes: HashMap::new(),
            deck: Vec::new(),
            discard: Vec::new(),
            hand: Vec::new(),
            reform_policies: 0,
            syndicate_policies: 0,
            current_power: None,
            failed_governments: 0,
            veto_unlocked: false,
            veto_requested: false,
            veto_refused: false,
            special_election_override: None,
            started: false,
            game_over: false,
            winner: None,
            win_reason: None,
            rng,
        }
    }

    // ---- accessors ----

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    pub fn host_id(&self) -> Option<PlayerId> {
        self.host_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn game_over(&self) -> bool {
        self.game_over
    }

    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    pub fn win_reason(&self) -> Option<WinReason> {
        self.win_reason
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_by_conn(&self, conn_id: ConnId) -> Option<&Player> {
        self.players.iter().find(|p| p.conn_id == Some(conn_id))
    }

    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_alive()).count()
    }

    pub fn current_president(&self) -> Option<&Player> {
        self.president_index.map(|i| &self.players[i])
    }

    pub fn cabinet_chief(&self) -> Option<PlayerId> {
        self.cabinet_chief
    }

    pub fn nominated_cabinet_chief(&self) -> Option<PlayerId> {
        self.nominated_cabinet_chief
    }

    pub fn previous_president(&self) -> Option<PlayerId> {
        self.previous_president
    }

    pub fn previous_cabinet_chief(&self) -> Option<PlayerId> {
        self.previous_cabinet_chief
    }

    pub fn votes(&self) -> &HashMap<PlayerId, bool> {
        &self.votes
    }

    pub fn hand(&self) -> &[PolicyCard] {
        &self.hand
    }

    pub fn deck_size(&self) -> usize {
        self.deck.len()
    }

    pub fn discard_size(&self) -> usize {
        self.discard.len()
    }

    pub fn reform_policies(&self) -> u8 {
        self.reform_policies
    }

    pub fn syndicate_policies(&self) -> u8 {
        self.syndicate_policies
    }

    pub fn failed_governments(&self) -> u8 {
        self.failed_governments
    }

    pub fn veto_unlocked(&self) -> bool {
        self.veto_unlocked
    }

    pub fn veto_requested(&self) -> bool {
        self.veto_requested
    }

    pub fn veto_refused(&self) -> bool {
        self.veto_refused
    }

    pub fn current_power(&self) -> Option<Power> {
        self.current_power
    }

    pub fn has_connected_humans(&self) -> bool {
        self.players
            .iter()
            .any(|p| !p.is_ai && p.conn_id.is_some())
    }

    pub fn all_votes_in(&self) -> bool {
        self.phase == Phase::Election && self.votes.len() >= self.alive_count()
    }

    // ---- lobby operations ----

    pub fn add_player(
        &mut self,
        name: &str,
        conn_id: Option<ConnId>,
        is_ai: bool,
    ) -> Result<PlayerId, GameError> {
        if self.started {
            return Err(GameError::new(
                RejectKind::GameAlreadyStarted,
                "the game has already started",
            ));
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::new(RejectKind::RoomFull, "the room is full"));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::new(
                RejectKind::InvalidName,
                "player name cannot be empty",
            ));
        }
        if self.players.iter().any(|p| p.name == name) {
            return Err(GameError::new(
                RejectKind::DuplicateName,
                format!("the name {name} is already taken"),
            ));
        }

        let id = Uuid::new_v4();
        self.players.push(Player {
            id,
            conn_id,
            name: name.to_string(),
            role: None,
            is_dead: false,
            is_ai,
            was_investigated: false,
            known_roles: Vec::new(),
            known_teams: Vec::new(),
        });
        if self.host_id.is_none() && !is_ai {
            self.host_id = Some(id);
        }
        Ok(id)
    }

    /// Removes a player before the game starts, migrating hosting to the
    /// first remaining human if needed. Returns the removed player and the
    /// new host id when hosting moved.
    pub fn remove_player(
        &mut self,
        player_id: PlayerId,
    ) -> Result<(Player, Option<PlayerId>), GameError> {
        if self.started {
            return Err(GameError::new(
                RejectKind::GameAlreadyStarted,
                "players cannot be removed once the game has started",
            ));
        }
        let idx = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| GameError::player_not_found("player is not in this room"))?;
        let removed = self.players.remove(idx);

        let mut new_host = None;
        if self.host_id == Some(player_id) {
            self.host_id = self.players.iter().find(|p| !p.is_ai).map(|p| p.id);
            new_host = self.host_id;
        }
        Ok((removed, new_host))
    }

    pub fn handle_disconnect(&mut self, conn_id: ConnId) -> DisconnectOutcome {
        let Some(player_id) = self
            .players
            .iter()
            .find(|p| p.conn_id == Some(conn_id))
            .map(|p| p.id)
        else {
            return DisconnectOutcome::Unknown;
        };

        if !self.started {
            match self.remove_player(player_id) {
                Ok((player, new_host)) => DisconnectOutcome::Removed { player, new_host },
                Err(_) => DisconnectOutcome::Unknown,
            }
        } else {
            if let Some(p) = self.players.iter_mut().find(|p| p.id == player_id) {
                p.conn_id = None;
            }
            DisconnectOutcome::Unbound { player_id }
        }
    }

    /// Rebinds a (re)connecting transport to an existing player.
    pub fn bind_connection(
        &mut self,
        player_id: PlayerId,
        conn_id: ConnId,
    ) -> Result<(), GameError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or_else(|| GameError::player_not_found("no such player in this room"))?;
        if player.is_ai {
            return Err(GameError::bad_request("cannot bind a connection to a bot"));
        }
        player.conn_id = Some(conn_id);
        Ok(())
    }

    pub fn start_game(&mut self, caller: PlayerId) -> Result<(), GameError> {
        if self.started {
            return Err(GameError::new(
                RejectKind::GameAlreadyStarted,
                "the game has already started",
            ));
        }
        if self.host_id != Some(caller) {
            return Err(GameError::new(
                RejectKind::NotHost,
                "only the host may start the game",
            ));
        }
        let count = self.players.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return Err(GameError::new(
                RejectKind::PlayerCountOutOfRange,
                format!("need between {MIN_PLAYERS} and {MAX_PLAYERS} players, have {count}"),
            ));
        }

        let role_pool = roles::generate_roles(count, &mut self.rng)?;
        for (player, role) in self.players.iter_mut().zip(role_pool) {
            player.role = Some(role);
        }

        let seats: Vec<(PlayerId, Role)> = self
            .players
            .iter()
            .filter_map(|p| p.role.map(|r| (p.id, r)))
            .collect();
        let knowledge = roles::initial_knowledge(&seats);
        for player in &mut self.players {
            if let Some(known) = knowledge.get(&player.id) {
                player.known_roles = known.clone();
            }
        }

        self.deck = policies::create_deck(&mut self.rng);
        self.president_index = Some(self.rng.random_range(0..count));
        self.started = true;
        self.phase = Phase::RoleReveal;
        Ok(())
    }

    /// Leaves role reveal for the first nomination.
    pub fn begin_nomination(&mut self) -> Result<(), GameError> {
        if self.phase != Phase::RoleReveal {
            return Err(GameError::wrong_phase("role_reveal", self.phase));
        }
        self.enter_nomination();
        Ok(())
    }

    // ---- election round ----

    pub fn nominate_cabinet_chief(
        &mut self,
        president: PlayerId,
        nominee: PlayerId,
    ) -> Result<(), GameError> {
        self.require_live_game()?;
        if self.phase != Phase::Nomination {
            return Err(GameError::wrong_phase("nomination", self.phase));
        }
        self.require_president(president)?;
        let target = self
            .player(nominee)
            .ok_or_else(|| GameError::player_not_found("nominee is not in this room"))?;
        if target.is_dead {
            return Err(GameError::dead_player("cannot nominate a dead player"));
        }
        if self.alive_count() > 5 && self.previous_cabinet_chief == Some(nominee) {
            return Err(GameError::new(
                RejectKind::TermLimited,
                format!("{} was cabinet chief last round", target.name),
            ));
        }

        self.nominated_cabinet_chief = Some(nominee);
        self.votes.clear();
        self.phase = Phase::Election;
        Ok(())
    }

    pub fn cast_vote(&mut self, voter: PlayerId, vote: bool) -> Result<(), GameError> {
        self.require_live_game()?;
        if self.phase != Phase::Election {
            return Err(GameError::wrong_phase("election", self.phase));
        }
        let player = self
            .player(voter)
            .ok_or_else(|| GameError::player_not_found("voter is not in this room"))?;
        if player.is_dead {
            return Err(GameError::dead_player("dead players cannot vote"));
        }
        // Revoting before the tally simply overwrites.
        self.votes.insert(voter, vote);
        Ok(())
    }

    pub fn count_votes(&mut self) -> Result<ElectionOutcome, GameError> {
        self.require_live_game()?;
        if self.phase != Phase::Election {
            return Err(GameError::wrong_phase("election", self.phase));
        }
        if !self.all_votes_in() {
            return Err(GameError::new(
                RejectKind::VotesPending,
                "not everyone has voted yet",
            ));
        }

        let alive = self.alive_count();
        let ja = self
            .votes
            .iter()
            .filter(|(id, v)| **v && self.player(**id).is_some_and(Player::is_alive))
            .count();
        let nein = alive - ja;
        let approved = ja >= alive.div_ceil(2);

        if approved {
            let chief_id = self.nominated_cabinet_chief.ok_or_else(|| {
                GameError::bad_request("election closed without a nominated cabinet chief")
            })?;
            self.cabinet_chief = Some(chief_id);
            self.failed_governments = 0;

            let chief_is_kingpin = self
                .player(chief_id)
                .and_then(|p| p.role)
                .is_some_and(|r| r.is_kingpin());
            if chief_is_kingpin && self.syndicate_policies >= KINGPIN_ELECTION_THRESHOLD {
                self.finish_game(Team::Syndicate, WinReason::KingpinElected);
                return Ok(ElectionOutcome::Approved {
                    ja,
                    nein,
                    cabinet_chief: chief_id,
                    instant_win: true,
                });
            }

            self.phase = Phase::LegislativePresident;
            Ok(ElectionOutcome::Approved {
                ja,
                nein,
                cabinet_chief: chief_id,
                instant_win: false,
            })
        } else {
            self.failed_governments += 1;
            self.nominated_cabinet_chief = None;
            self.votes.clear();

            if self.failed_governments >= CHAOS_THRESHOLD {
                let chaos = self.trigger_chaos();
                Ok(ElectionOutcome::Chaos { ja, nein, chaos })
            } else {
                self.advance_president();
                self.phase = Phase::Nomination;
                Ok(ElectionOutcome::Rejected {
                    ja,
                    nein,
                    failed_governments: self.failed_governments,
                })
            }
        }
    }

    // ---- legislative session ----

    pub fn president_draw_cards(&mut self, president: PlayerId) -> Result<Vec<PolicyCard>, GameError> {
        self.require_live_game()?;
        if self.phase != Phase::LegislativePresident {
            return Err(GameError::wrong_phase("legislative_president", self.phase));
        }
        self.require_president(president)?;
        if !self.hand.is_empty() {
            return Err(GameError::bad_request("cards have already been drawn"));
        }

        self.hand = policies::draw(&mut self.deck, &mut self.discard, 3, &mut self.rng);
        Ok(self.hand.clone())
    }

    pub fn president_discard_card(
        &mut self,
        president: PlayerId,
        index: usize,
    ) -> Result<(), GameError> {
        self.require_live_game()?;
        if self.phase != Phase::LegislativePresident {
            return Err(GameError::wrong_phase("legislative_president", self.phase));
        }
        self.require_president(president)?;
        if index >= self.hand.len() {
            return Err(GameError::new(
                RejectKind::CardIndexOutOfRange,
                format!("card index {index} out of range for hand of {}", self.hand.len()),
            ));
        }

        let card = self.hand.remove(index);
        self.discard.push(card);
        if self.syndicate_policies >= VETO_UNLOCK_THRESHOLD {
            self.veto_unlocked = true;
        }
        self.phase = Phase::LegislativeCabinet;
        Ok(())
    }

    pub fn cabinet_chief_enact_policy(
        &mut self,
        chief: PlayerId,
        index: usize,
    ) -> Result<EnactOutcome, GameError> {
        self.require_live_game()?;
        if self.phase != Phase::LegislativeCabinet && self.phase != Phase::VetoDecision {
            return Err(GameError::wrong_phase("legislative_cabinet", self.phase));
        }
        self.require_cabinet_chief(chief)?;
        if index >= self.hand.len() {
            return Err(GameError::new(
                RejectKind::CardIndexOutOfRange,
                format!("card index {index} out of range for hand of {}", self.hand.len()),
            ));
        }

        // The chosen index is the card that becomes law; the rest go to
        // the discard pile.
        let enacted = self.hand.remove(index);
        self.discard.append(&mut self.hand);
        self.veto_requested = false;

        let kind = enacted.kind;
        match kind {
            PolicyKind::Reform => self.reform_policies += 1,
            PolicyKind::Syndicate => self.syndicate_policies += 1,
        }

        if let Some((winner, reason)) =
            policies::check_track_victory(self.reform_policies, self.syndicate_policies)
        {
            self.finish_game(winner, reason);
            return Ok(EnactOutcome {
                enacted,
                game_over: true,
                power: None,
            });
        }

        let power = if kind == PolicyKind::Syndicate {
            powers::power_for_track(self.syndicate_policies, self.players.len())
        } else {
            None
        };

        if let Some(power) = power {
            self.current_power = Some(power);
            self.phase = Phase::ExecutivePower;
        } else {
            self.complete_round();
        }

        Ok(EnactOutcome {
            enacted,
            game_over: false,
            power,
        })
    }

    pub fn request_veto(&mut self, chief: PlayerId) -> Result<(), GameError> {
        self.require_live_game()?;
        if self.phase != Phase::LegislativeCabinet {
            return Err(GameError::wrong_phase("legislative_cabinet", self.phase));
        }
        self.require_cabinet_chief(chief)?;
        if !self.veto_unlocked {
            return Err(GameError::new(
                RejectKind::VetoLocked,
                "the veto has not been unlocked yet",
            ));
        }
        if self.veto_refused {
            return Err(GameError::new(
                RejectKind::VetoLocked,
                "the president already refused a veto this round",
            ));
        }

        self.veto_requested = true;
        self.phase = Phase::VetoDecision;
        Ok(())
    }

    pub fn respond_to_veto(
        &mut self,
        president: PlayerId,
        accepts: bool,
    ) -> Result<VetoOutcome, GameError> {
        self.require_live_game()?;
        if self.phase != Phase::VetoDecision || !self.veto_requested {
            return Err(GameError::new(
                RejectKind::NoVetoPending,
                "no veto is awaiting a decision",
            ));
        }
        self.require_president(president)?;

        self.veto_requested = false;
        if !accepts {
            self.veto_refused = true;
            self.phase = Phase::LegislativeCabinet;
            return Ok(VetoOutcome::Refused);
        }

        self.discard.append(&mut self.hand);
        self.failed_governments += 1;
        if self.failed_governments >= CHAOS_THRESHOLD {
            let chaos = self.trigger_chaos();
            Ok(VetoOutcome::Accepted {
                failed_governments: CHAOS_THRESHOLD,
                chaos: Some(chaos),
            })
        } else {
            let failed = self.failed_governments;
            self.complete_round();
            Ok(VetoOutcome::Accepted {
                failed_governments: failed,
                chaos: None,
            })
        }
    }

    // ---- presidential powers ----

    pub fn execute_peek(&mut self, president: PlayerId) -> Result<PeekOutcome, GameError> {
        self.require_power(president, Power::Peek)?;

        if self.deck.len() < 3 {
            policies::reshuffle_discard(&mut self.deck, &mut self.discard, &mut self.rng);
        }
        let cards = self.deck.iter().take(3).cloned().collect();
        self.complete_round();
        Ok(PeekOutcome { cards })
    }

    pub fn execute_investigate(
        &mut self,
        president: PlayerId,
        target: PlayerId,
    ) -> Result<InvestigateOutcome, GameError> {
        self.require_power(president, Power::Investigate)?;
        let target_player = self
            .player(target)
            .ok_or_else(|| GameError::player_not_found("target is not in this room"))?;
        powers::validate_investigate(target_player)?;
        let team = target_player
            .team()
            .ok_or_else(|| GameError::bad_request("target has no role yet"))?;
        let target_name = target_player.name.clone();

        if let Some(p) = self.players.iter_mut().find(|p| p.id == target) {
            p.was_investigated = true;
        }
        if let Some(p) = self.players.iter_mut().find(|p| p.id == president) {
            p.known_teams.push(target);
        }
        self.complete_round();
        Ok(InvestigateOutcome {
            target,
            target_name,
            team,
        })
    }

    pub fn execute_special_election(
        &mut self,
        president: PlayerId,
        target: PlayerId,
    ) -> Result<SpecialElectionOutcome, GameError> {
        self.require_power(president, Power::SpecialElection)?;
        let target_player = self
            .player(target)
            .ok_or_else(|| GameError::player_not_found("target is not in this room"))?;
        powers::validate_special_election(target_player, president)?;

        let index = self
            .players
            .iter()
            .position(|p| p.id == target)
            .ok_or_else(|| GameError::player_not_found("target is not seated"))?;
        self.special_election_override = Some(index);
        self.complete_round();
        Ok(SpecialElectionOutcome {
            next_president: target,
        })
    }

    pub fn execute_execution(
        &mut self,
        president: PlayerId,
        target: PlayerId,
    ) -> Result<ExecutionOutcome, GameError> {
        self.require_power(president, Power::Execution)?;
        let target_player = self
            .player(target)
            .ok_or_else(|| GameError::player_not_found("target is not in this room"))?;
        powers::validate_execution(target_player)?;
        let was_kingpin = target_player.role.is_some_and(|r| r.is_kingpin());
        let executed_name = target_player.name.clone();

        if let Some(p) = self.players.iter_mut().find(|p| p.id == target) {
            p.is_dead = true;
        }

        if was_kingpin {
            self.finish_game(Team::Reformers, WinReason::KingpinExecuted);
            return Ok(ExecutionOutcome {
                executed: target,
                executed_name,
                was_kingpin: true,
                game_over: true,
            });
        }

        self.complete_round();
        Ok(ExecutionOutcome {
            executed: target,
            executed_name,
            was_kingpin: false,
            game_over: false,
        })
    }

    // ---- internals ----

    fn require_live_game(&self) -> Result<(), GameError> {
        if !self.started {
            return Err(GameError::new(
                RejectKind::GameNotStarted,
                "the game has not started",
            ));
        }
        if self.game_over {
            return Err(GameError::new(RejectKind::GameOver, "the game is over"));
        }
        Ok(())
    }

    fn require_president(&self, caller: PlayerId) -> Result<(), GameError> {
        if self.current_president().map(|p| p.id) != Some(caller) {
            return Err(GameError::not_president(
                "only the sitting president may do that",
            ));
        }
        Ok(())
    }

    fn require_cabinet_chief(&self, caller: PlayerId) -> Result<(), GameError> {
        if self.cabinet_chief != Some(caller) {
            return Err(GameError::new(
                RejectKind::NotCabinetChief,
                "only the cabinet chief may do that",
            ));
        }
        Ok(())
    }

    fn require_power(&self, president: PlayerId, power: Power) -> Result<(), GameError> {
        self.require_live_game()?;
        if self.phase != Phase::ExecutivePower {
            return Err(GameError::wrong_phase("executive_power", self.phase));
        }
        self.require_president(president)?;
        if self.current_power != Some(power) {
            return Err(GameError::bad_request(format!(
                "the unlocked power is {:?}, not {power:?}",
                self.current_power
            )));
        }
        Ok(())
    }

    fn enter_nomination(&mut self) {
        self.nominated_cabinet_chief = None;
        self.votes.clear();
        self.current_power = None;
        self.veto_requested = false;
        self.veto_refused = false;
        self.phase = Phase::Nomination;
    }

    /// Closes out a government: remembers the term-limit pair, rotates the
    /// presidency (honoring a one-shot special-election override), returns
    /// to nomination.
    fn complete_round(&mut self) {
        self.previous_president = self.current_president().map(|p| p.id);
        self.previous_cabinet_chief = self.cabinet_chief;
        self.cabinet_chief = None;

        if let Some(index) = self.special_election_override.take() {
            if self.players[index].is_alive() {
                self.president_index = Some(index);
            } else {
                self.advance_president();
            }
        } else {
            self.advance_president();
        }
        self.enter_nomination();
    }

    /// Moves the presidency pointer to the next living player, wrapping.
    fn advance_president(&mut self) {
        debug_assert!(self.alive_count() > 0);
        let len = self.players.len();
        let mut idx = self.president_index.unwrap_or(len - 1);
        loop {
            idx = (idx + 1) % len;
            if self.players[idx].is_alive() {
                break;
            }
        }
        self.president_index = Some(idx);
    }

    /// Three failed governments: the top deck card becomes law with no
    /// government attached, so no power fires. The last elected government
    /// stays on the books for term limits.
    fn trigger_chaos(&mut self) -> ChaosOutcome {
        self.failed_governments = 0;
        let mut drawn = policies::draw(&mut self.deck, &mut self.discard, 1, &mut self.rng);
        // The deck plus discard always holds at least one card mid-game.
        let enacted = drawn.remove(0);
        match enacted.kind {
            PolicyKind::Reform => self.reform_policies += 1,
            PolicyKind::Syndicate => self.syndicate_policies += 1,
        }

        self.cabinet_chief = None;

        if let Some((winner, reason)) =
            policies::check_track_victory(self.reform_policies, self.syndicate_policies)
        {
            self.finish_game(winner, reason);
            return ChaosOutcome {
                enacted,
                game_over: true,
            };
        }

        self.advance_president();
        self.enter_nomination();
        ChaosOutcome {
            enacted,
            game_over: false,
        }
    }

    fn finish_game(&mut self, winner: Team, reason: WinReason) {
        self.game_over = true;
        self.winner = Some(winner);
        self.win_reason = Some(reason);
        self.phase = Phase::GameOver;
    }

    /// Total cards across every pile; constant for the whole game.
    pub fn total_cards(&self) -> usize {
        self.deck.len()
            + self.discard.len()
            + self.hand.len()
            + self.reform_policies as usize
            + self.syndicate_policies as usize
    }
}

#[cfg(test)]
impl GameState {
    pub(crate) fn test_set_hand(&mut self, cards: Vec<PolicyCard>) {
        self.hand = cards;
    }

    pub(crate) fn test_set_policies(&mut self, reform: u8, syndicate: u8) {
        self.reform_policies = reform;
        self.syndicate_policies = syndicate;
    }

    pub(crate) fn test_set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn test_set_power(&mut self, power: Option<Power>) {
        self.current_power = power;
    }

    pub(crate) fn test_set_cabinet_chief(&mut self, chief: Option<PlayerId>) {
        self.cabinet_chief = chief;
    }

    pub(crate) fn test_set_president_index(&mut self, index: usize) {
        self.president_index = Some(index);
    }

    pub(crate) fn test_set_failed_governments(&mut self, n: u8) {
        self.failed_governments = n;
    }

    pub(crate) fn test_set_veto_unlocked(&mut self, unlocked: bool) {
        self.veto_unlocked = unlocked;
    }

    pub(crate) fn test_kill_player(&mut self, id: PlayerId) {
        if let Some(p) = self.players.iter_mut().find(|p| p.id == id) {
            p.is_dead = true;
        }
    }

    pub(crate) fn test_deck(&self) -> &[PolicyCard] {
        &self.deck
    }

    pub(crate) fn test_discard(&self) -> &[PolicyCard] {
        &self.discard
    }
}

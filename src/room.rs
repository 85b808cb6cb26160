//! One actor per room.
//!
//! The actor owns the room's `GameState` and `AiContext`, so every
//! mutation happens on this actor's mailbox in arrival order and nothing
//! outside can touch the state. Bot turns are `run_later` callbacks
//! against the same actor; each re-validates the room state before
//! acting, which is all the staleness protection a moved-on room needs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actix::{Actor, ActorContext, Addr, AsyncContext, Context, Handler, Message};
use rand::Rng;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::ai::brain::TalkContext;
use crate::ai::controller::{self, BotAction, PowerAction};
use crate::ai::{names, AiContext, AiDifficulty};
use crate::domain::powers::Power;
use crate::domain::snapshot::RoomSnapshot;
use crate::domain::state::{DisconnectOutcome, ElectionOutcome, GameState, VetoOutcome};
use crate::domain::{ConnId, PlayerId};
use crate::errors::domain::{GameError, RejectKind};
use crate::registry::RoomRegistry;
use crate::ws::protocol::{ClientMsg, KnownPlayer, ServerMsg};
use crate::ws::session::{Bound, Outbound, WsSession};

/// Bot thinking time, uniform within this window.
const AI_DELAY_MIN_MS: u64 = 2_000;
const AI_DELAY_MAX_MS: u64 = 4_000;
/// Extra spacing between successive bot ballots in one election.
const AI_VOTE_STAGGER_MS: u64 = 1_000;
/// Pause between the last ballot landing and the tally broadcast.
const TALLY_DELAY_MS: u64 = 800;

#[derive(Message)]
#[rtype(result = "()")]
pub struct Join {
    pub conn_id: ConnId,
    pub player_name: String,
    pub session: Addr<WsSession>,
    /// True when this join is the room-creating request.
    pub created: bool,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Rejoin {
    pub conn_id: ConnId,
    pub player_id: PlayerId,
    pub session: Addr<WsSession>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub conn_id: ConnId,
}

/// Any in-room request from a connected player.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Command {
    pub conn_id: ConnId,
    pub msg: ClientMsg,
}

pub struct RoomActor {
    state: GameState,
    ai: AiContext,
    registry: Arc<RoomRegistry>,
    conns: HashMap<ConnId, (PlayerId, Addr<WsSession>)>,
    /// Guards against double-processing one election's tally.
    tally_in_flight: bool,
}

impl RoomActor {
    pub fn new(room_id: String, room_name: String, registry: Arc<RoomRegistry>) -> Self {
        Self {
            state: GameState::new(room_id, room_name),
            ai: AiContext::new(),
            registry,
            conns: HashMap::new(),
            tally_in_flight: false,
        }
    }

    fn snapshot_for(&self, viewer: Option<PlayerId>) -> RoomSnapshot {
        RoomSnapshot::for_viewer(&self.state, viewer)
    }

    fn send_to_player(&self, player_id: PlayerId, msg: ServerMsg) {
        for (pid, session) in self.conns.values() {
            if *pid == player_id {
                session.do_send(Outbound(msg));
                return;
            }
        }
    }

    /// Sends one event to every connection, each with its own redacted
    /// snapshot.
    fn broadcast(&self, build: impl Fn(RoomSnapshot) -> ServerMsg) {
        for (pid, session) in self.conns.values() {
            let snapshot = self.snapshot_for(Some(*pid));
            session.do_send(Outbound(build(snapshot)));
        }
    }

    /// Sends an identical event to every connection (no snapshot inside).
    fn broadcast_plain(&self, msg: &ServerMsg) {
        for (_, session) in self.conns.values() {
            session.do_send(Outbound(msg.clone()));
        }
    }

    fn broadcast_update(&self) {
        self.broadcast(|game_state| ServerMsg::GameUpdate { game_state });
    }

    fn sync_listing(&self) {
        self.registry.update_listing(
            self.state.room_id(),
            self.state.players().len(),
            self.state.started(),
        );
    }

    fn reject(&self, conn_id: ConnId, err: GameError) {
        if let Some((_, session)) = self.conns.get(&conn_id) {
            session.do_send(Outbound(ServerMsg::Rejected {
                kind: err.kind,
                message: err.detail,
            }));
        }
    }

    fn known_players_for(&self, player_id: PlayerId) -> Vec<KnownPlayer> {
        let Some(player) = self.state.player(player_id) else {
            return Vec::new();
        };
        player
            .known_roles
            .iter()
            .filter_map(|id| self.state.player(*id))
            .filter_map(|p| {
                p.role.map(|role| KnownPlayer {
                    player_id: p.id,
                    name: p.name.clone(),
                    role,
                })
            })
            .collect()
    }

    /// Tears the room down once no human is connected.
    fn maybe_teardown(&mut self, ctx: &mut Context<Self>) {
        if self.conns.is_empty() && !self.state.has_connected_humans() {
            info!(room_id = %self.state.room_id(), "room empty, shutting down");
            self.registry.remove(self.state.room_id());
            ctx.stop();
        }
    }

    // ---- bot scheduling ----

    fn drive_bots(&mut self, ctx: &mut Context<Self>) {
        if self.state.game_over() {
            return;
        }
        let actions = controller::decide(&self.state, &mut self.ai);
        let mut rng = rand::rng();
        for (i, action) in actions.into_iter().enumerate() {
            let delay = rng.random_range(AI_DELAY_MIN_MS..AI_DELAY_MAX_MS)
                + i as u64 * AI_VOTE_STAGGER_MS;
            ctx.run_later(Duration::from_millis(delay), move |act, ctx| {
                if !controller::action_matches_state(&act.state, &action) {
                    return;
                }
                act.apply_bot_action(action, ctx);
            });
        }
    }

    fn apply_bot_action(&mut self, action: BotAction, ctx: &mut Context<Self>) {
        let result = match action {
            BotAction::Nominate {
                president,
                nominee,
            } => self.op_nominate(president, nominee, ctx),
            BotAction::Vote { voter, vote } => self.op_cast_vote(voter, vote, ctx),
            BotAction::DiscardCard { president, index } => {
                self.op_discard(president, index, ctx)
            }
            BotAction::RequestVeto { chief } => self.op_request_veto(chief, ctx),
            BotAction::EnactPolicy { chief, index } => self.op_enact(chief, index, ctx),
            BotAction::RespondVeto { president, accepts } => {
                self.op_respond_veto(president, accepts, ctx)
            }
            BotAction::UsePower { president, action } => self.op_power(president, action, ctx),
        };
        // A failed bot action must never take the room down; the staleness
        // guard makes this rare, so just record it.
        if let Err(err) = result {
            warn!(
                room_id = %self.state.room_id(),
                actor = %action.actor(),
                %err,
                "bot action rejected"
            );
        }
    }

    fn bots_chatter(&mut self, context: TalkContext) {
        let bots: Vec<(PlayerId, String)> = self
            .state
            .players()
            .iter()
            .filter(|p| p.is_ai && p.is_alive())
            .map(|p| (p.id, p.name.clone()))
            .collect();
        for (id, name) in bots {
            let Some(brain) = self.ai.brain_mut(id) else {
                continue;
            };
            if let Some(line) = brain.table_talk(context) {
                self.broadcast_plain(&ServerMsg::ChatMessage {
                    player_id: id,
                    player_name: name,
                    message: line.to_string(),
                    timestamp: now_millis(),
                });
            }
        }
    }

    // ---- game operations (shared by humans and bots) ----

    fn op_start_game(&mut self, caller: PlayerId, ctx: &mut Context<Self>) -> Result<(), GameError> {
        self.state.start_game(caller)?;
        self.sync_listing();
        self.broadcast(|game_state| ServerMsg::GameStarted { game_state });

        let humans: Vec<PlayerId> = self
            .state
            .players()
            .iter()
            .filter(|p| !p.is_ai)
            .map(|p| p.id)
            .collect();
        for id in humans {
            if let Some(role) = self.state.player(id).and_then(|p| p.role) {
                let known_players = self.known_players_for(id);
                self.send_to_player(
                    id,
                    ServerMsg::RoleAssigned {
                        role,
                        known_players,
                    },
                );
            }
        }

        self.state.begin_nomination()?;
        self.broadcast_update();
        self.drive_bots(ctx);
        Ok(())
    }

    fn op_add_ai(
        &mut self,
        caller: PlayerId,
        difficulty: AiDifficulty,
    ) -> Result<(), GameError> {
        if self.state.host_id() != Some(caller) {
            return Err(GameError::new(
                RejectKind::NotHost,
                "only the host may add bots",
            ));
        }
        let name = names::next_free(|n| self.state.players().iter().any(|p| p.name == n));
        let id = self.state.add_player(&name, None, true)?;
        self.ai.register(id, difficulty);
        self.sync_listing();
        self.broadcast(move |game_state| ServerMsg::PlayerJoined {
            player_id: id,
            player_name: name.clone(),
            game_state,
        });
        Ok(())
    }

    fn op_remove_ai(&mut self, caller: PlayerId, target: PlayerId) -> Result<(), GameError> {
        if self.state.host_id() != Some(caller) {
            return Err(GameError::new(
                RejectKind::NotHost,
                "only the host may remove bots",
            ));
        }
        if !self.state.player(target).is_some_and(|p| p.is_ai) {
            return Err(GameError::bad_request("target is not a bot"));
        }
        let (removed, new_host) = self.state.remove_player(target)?;
        self.ai.remove(removed.id);
        self.sync_listing();
        self.broadcast(move |game_state| ServerMsg::PlayerLeft {
            player_id: removed.id,
            new_host,
            game_state,
        });
        Ok(())
    }

    fn op_nominate(
        &mut self,
        president: PlayerId,
        nominee: PlayerId,
        ctx: &mut Context<Self>,
    ) -> Result<(), GameError> {
        self.state.nominate_cabinet_chief(president, nominee)?;
        self.broadcast(move |game_state| ServerMsg::CabinetChiefNominated {
            cabinet_chief_id: nominee,
            game_state,
        });
        self.drive_bots(ctx);
        Ok(())
    }

    fn op_cast_vote(
        &mut self,
        voter: PlayerId,
        vote: bool,
        ctx: &mut Context<Self>,
    ) -> Result<(), GameError> {
        self.state.cast_vote(voter, vote)?;
        let votes_cast = self.state.votes().len();
        self.broadcast(move |game_state| ServerMsg::VoteCast {
            player_id: voter,
            votes_cast,
            game_state,
        });

        if self.state.all_votes_in() && !self.tally_in_flight {
            self.tally_in_flight = true;
            ctx.run_later(Duration::from_millis(TALLY_DELAY_MS), |act, ctx| {
                act.tally_in_flight = false;
                act.process_votes(ctx);
            });
        }
        Ok(())
    }

    fn process_votes(&mut self, ctx: &mut Context<Self>) {
        if !self.state.all_votes_in() {
            return;
        }
        let outcome = match self.state.count_votes() {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(room_id = %self.state.room_id(), %err, "tally failed");
                return;
            }
        };

        match outcome {
            ElectionOutcome::Approved {
                ja,
                nein,
                instant_win,
                ..
            } => {
                self.broadcast(move |game_state| ServerMsg::VoteResult {
                    ja,
                    nein,
                    approved: true,
                    game_state,
                });
                if instant_win {
                    self.finish_broadcast();
                    return;
                }
                // The server deals for the president right away.
                if let Some(president) = self.state.current_president().map(|p| p.id) {
                    match self.state.president_draw_cards(president) {
                        Ok(cards) => {
                            self.send_to_player(
                                president,
                                ServerMsg::ReceivePolicies { cards },
                            );
                            self.broadcast_update();
                        }
                        Err(err) => {
                            warn!(room_id = %self.state.room_id(), %err, "deal failed")
                        }
                    }
                }
            }
            ElectionOutcome::Rejected { ja, nein, .. } => {
                self.broadcast(move |game_state| ServerMsg::VoteResult {
                    ja,
                    nein,
                    approved: false,
                    game_state,
                });
            }
            ElectionOutcome::Chaos { ja, nein, chaos } => {
                self.broadcast(move |game_state| ServerMsg::VoteResult {
                    ja,
                    nein,
                    approved: false,
                    game_state,
                });
                let enacted = chaos.enacted.clone();
                self.broadcast(move |game_state| ServerMsg::ChaosTriggered {
                    enacted: enacted.clone(),
                    game_state,
                });
                if chaos.game_over {
                    self.finish_broadcast();
                    return;
                }
            }
        }
        self.bots_chatter(TalkContext::AfterVote);
        self.drive_bots(ctx);
    }

    fn op_discard(
        &mut self,
        president: PlayerId,
        index: usize,
        ctx: &mut Context<Self>,
    ) -> Result<(), GameError> {
        self.state.president_discard_card(president, index)?;
        self.broadcast(|game_state| ServerMsg::PresidentDiscarded { game_state });
        if let Some(chief) = self.state.cabinet_chief() {
            self.send_to_player(
                chief,
                ServerMsg::ReceivePolicies {
                    cards: self.state.hand().to_vec(),
                },
            );
        }
        self.drive_bots(ctx);
        Ok(())
    }

    fn op_enact(
        &mut self,
        chief: PlayerId,
        index: usize,
        ctx: &mut Context<Self>,
    ) -> Result<(), GameError> {
        let president = self
            .state
            .current_president()
            .map(|p| p.id)
            .ok_or_else(|| GameError::bad_request("no sitting president"))?;
        let outcome = self.state.cabinet_chief_enact_policy(chief, index)?;
        self.ai
            .observe_enactment(president, chief, outcome.enacted.kind);

        let card = outcome.enacted.clone();
        self.broadcast(move |game_state| ServerMsg::PolicyEnacted {
            card: card.clone(),
            game_state,
        });

        if outcome.game_over {
            self.finish_broadcast();
            return Ok(());
        }
        if let Some(power) = outcome.power {
            self.broadcast(move |game_state| ServerMsg::ExecutivePowerAvailable {
                power,
                game_state,
            });
        }
        self.bots_chatter(TalkContext::AfterEnactment);
        self.drive_bots(ctx);
        Ok(())
    }

    fn op_request_veto(
        &mut self,
        chief: PlayerId,
        ctx: &mut Context<Self>,
    ) -> Result<(), GameError> {
        self.state.request_veto(chief)?;
        self.broadcast(|game_state| ServerMsg::VetoRequested { game_state });
        self.drive_bots(ctx);
        Ok(())
    }

    fn op_respond_veto(
        &mut self,
        president: PlayerId,
        accepts: bool,
        ctx: &mut Context<Self>,
    ) -> Result<(), GameError> {
        let outcome = self.state.respond_to_veto(president, accepts)?;
        match outcome {
            VetoOutcome::Refused => {
                self.broadcast(|game_state| ServerMsg::VetoResult {
                    accepted: false,
                    game_state,
                });
            }
            VetoOutcome::Accepted { chaos, .. } => {
                self.broadcast(|game_state| ServerMsg::VetoResult {
                    accepted: true,
                    game_state,
                });
                if let Some(chaos) = chaos {
                    let enacted = chaos.enacted.clone();
                    self.broadcast(move |game_state| ServerMsg::ChaosTriggered {
                        enacted: enacted.clone(),
                        game_state,
                    });
                    if chaos.game_over {
                        self.finish_broadcast();
                        return Ok(());
                    }
                }
            }
        }
        self.drive_bots(ctx);
        Ok(())
    }

    fn op_power(
        &mut self,
        president: PlayerId,
        action: PowerAction,
        ctx: &mut Context<Self>,
    ) -> Result<(), GameError> {
        match action {
            PowerAction::Peek => {
                let outcome = self.state.execute_peek(president)?;
                self.send_to_player(
                    president,
                    ServerMsg::PeekResult {
                        cards: outcome.cards,
                    },
                );
                self.broadcast(|game_state| ServerMsg::PowerExecuted {
                    power: Power::Peek,
                    target_id: None,
                    target_name: None,
                    game_state,
                });
            }
            PowerAction::Investigate(target) => {
                let outcome = self.state.execute_investigate(president, target)?;
                self.ai
                    .observe_investigation(president, target, outcome.team);
                self.send_to_player(
                    president,
                    ServerMsg::InvestigationResult {
                        target_id: outcome.target,
                        target_name: outcome.target_name.clone(),
                        team: outcome.team,
                    },
                );
                let target_name = outcome.target_name;
                self.broadcast(move |game_state| ServerMsg::PowerExecuted {
                    power: Power::Investigate,
                    target_id: Some(target),
                    target_name: Some(target_name.clone()),
                    game_state,
                });
            }
            PowerAction::SpecialElection(target) => {
                let outcome = self.state.execute_special_election(president, target)?;
                let target_name = self
                    .state
                    .player(outcome.next_president)
                    .map(|p| p.name.clone());
                self.broadcast(move |game_state| ServerMsg::PowerExecuted {
                    power: Power::SpecialElection,
                    target_id: Some(target),
                    target_name: target_name.clone(),
                    game_state,
                });
            }
            PowerAction::Execution(target) => {
                let outcome = self.state.execute_execution(president, target)?;
                let target_name = outcome.executed_name.clone();
                self.broadcast(move |game_state| ServerMsg::PowerExecuted {
                    power: Power::Execution,
                    target_id: Some(target),
                    target_name: Some(target_name.clone()),
                    game_state,
                });
                if outcome.game_over {
                    self.finish_broadcast();
                    return Ok(());
                }
            }
        }
        self.drive_bots(ctx);
        Ok(())
    }

    fn op_chat(&mut self, player_id: PlayerId, message: String) -> Result<(), GameError> {
        let player_name = self
            .state
            .player(player_id)
            .map(|p| p.name.clone())
            .ok_or_else(|| GameError::player_not_found("sender is not in this room"))?;
        self.broadcast_plain(&ServerMsg::ChatMessage {
            player_id,
            player_name,
            message,
            timestamp: now_millis(),
        });
        Ok(())
    }

    fn finish_broadcast(&self) {
        let (Some(winner), Some(win_reason)) = (self.state.winner(), self.state.win_reason())
        else {
            return;
        };
        info!(
            room_id = %self.state.room_id(),
            ?winner,
            ?win_reason,
            "game over"
        );
        self.broadcast(move |game_state| ServerMsg::GameOver {
            winner,
            win_reason,
            game_state,
        });
    }
}

impl Actor for RoomActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!(room_id = %self.state.room_id(), room_name = %self.state.room_name(), "room created");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!(room_id = %self.state.room_id(), "room stopped");
    }
}

impl Handler<Join> for RoomActor {
    type Result = ();

    fn handle(&mut self, msg: Join, ctx: &mut Self::Context) {
        match self.state.add_player(&msg.player_name, Some(msg.conn_id), false) {
            Ok(player_id) => {
                self.conns.insert(msg.conn_id, (player_id, msg.session.clone()));
                msg.session.do_send(Bound {
                    room: ctx.address(),
                    player_id,
                });

                let room_id = self.state.room_id().to_string();
                let game_state = self.snapshot_for(Some(player_id));
                let reply = if msg.created {
                    ServerMsg::RoomCreated {
                        room_id,
                        player_id,
                        game_state,
                    }
                } else {
                    ServerMsg::RoomJoined {
                        room_id,
                        player_id,
                        game_state,
                    }
                };
                msg.session.do_send(Outbound(reply));

                let player_name = msg.player_name.trim().to_string();
                self.broadcast(move |game_state| ServerMsg::PlayerJoined {
                    player_id,
                    player_name: player_name.clone(),
                    game_state,
                });
                self.sync_listing();
            }
            Err(err) => {
                msg.session.do_send(Outbound(ServerMsg::Rejected {
                    kind: err.kind,
                    message: err.detail,
                }));
                self.maybe_teardown(ctx);
            }
        }
    }
}

impl Handler<Rejoin> for RoomActor {
    type Result = ();

    fn handle(&mut self, msg: Rejoin, ctx: &mut Self::Context) {
        match self.state.bind_connection(msg.player_id, msg.conn_id) {
            Ok(()) => {
                // Drop any stale binding left from the old connection.
                self.conns.retain(|_, (pid, _)| *pid != msg.player_id);
                self.conns
                    .insert(msg.conn_id, (msg.player_id, msg.session.clone()));
                msg.session.do_send(Bound {
                    room: ctx.address(),
                    player_id: msg.player_id,
                });

                let role = self.state.player(msg.player_id).and_then(|p| p.role);
                let known_players = self.known_players_for(msg.player_id);
                msg.session.do_send(Outbound(ServerMsg::RoomRejoined {
                    room_id: self.state.room_id().to_string(),
                    player_id: msg.player_id,
                    game_state: self.snapshot_for(Some(msg.player_id)),
                    role,
                    known_players,
                }));
                self.broadcast_update();
            }
            Err(err) => {
                msg.session.do_send(Outbound(ServerMsg::Rejected {
                    kind: err.kind,
                    message: err.detail,
                }));
            }
        }
    }
}

impl Handler<Disconnect> for RoomActor {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, ctx: &mut Self::Context) {
        self.conns.remove(&msg.conn_id);
        match self.state.handle_disconnect(msg.conn_id) {
            DisconnectOutcome::Removed { player, new_host } => {
                self.broadcast(move |game_state| ServerMsg::PlayerLeft {
                    player_id: player.id,
                    new_host,
                    game_state,
                });
                self.sync_listing();
            }
            DisconnectOutcome::Unbound { .. } => {
                self.broadcast_update();
            }
            DisconnectOutcome::Unknown => {}
        }
        self.maybe_teardown(ctx);
    }
}

impl Handler<Command> for RoomActor {
    type Result = ();

    fn handle(&mut self, msg: Command, ctx: &mut Self::Context) {
        let Some((player_id, _)) = self.conns.get(&msg.conn_id).cloned() else {
            return;
        };

        let result = match msg.msg {
            ClientMsg::StartGame => self.op_start_game(player_id, ctx),
            ClientMsg::AddAi { difficulty } => {
                self.op_add_ai(player_id, difficulty.unwrap_or_default())
            }
            ClientMsg::RemoveAi { ai_player_id } => self.op_remove_ai(player_id, ai_player_id),
            ClientMsg::NominateCabinetChief { cabinet_chief_id } => {
                self.op_nominate(player_id, cabinet_chief_id, ctx)
            }
            ClientMsg::CastVote { vote } => self.op_cast_vote(player_id, vote, ctx),
            ClientMsg::PresidentDiscard { card_index } => {
                self.op_discard(player_id, card_index, ctx)
            }
            ClientMsg::CabinetChiefEnact { card_index } => {
                self.op_enact(player_id, card_index, ctx)
            }
            ClientMsg::RequestVeto => self.op_request_veto(player_id, ctx),
            ClientMsg::RespondVeto { accepts } => {
                self.op_respond_veto(player_id, accepts, ctx)
            }
            ClientMsg::ExecutePeek => self.op_power(player_id, PowerAction::Peek, ctx),
            ClientMsg::ExecuteInvestigate { target_player_id } => {
                self.op_power(player_id, PowerAction::Investigate(target_player_id), ctx)
            }
            ClientMsg::ExecuteSpecialElection { target_player_id } => self.op_power(
                player_id,
                PowerAction::SpecialElection(target_player_id),
                ctx,
            ),
            ClientMsg::ExecuteExecution { target_player_id } => {
                self.op_power(player_id, PowerAction::Execution(target_player_id), ctx)
            }
            ClientMsg::SendMessage { message } => self.op_chat(player_id, message),
            // Connection-scoped requests are resolved by the session.
            ClientMsg::CreateRoom { .. }
            | ClientMsg::JoinRoom { .. }
            | ClientMsg::RejoinRoom { .. }
            | ClientMsg::GetRooms => Err(GameError::bad_request("already bound to a room")),
        };

        if let Err(err) = result {
            self.reject(msg.conn_id, err);
        }
    }
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

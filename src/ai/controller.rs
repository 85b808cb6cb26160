//! Turn coordination for bot players.
//!
//! `AiContext` is owned by one room and dies with it, so bot learning
//! never leaks across rooms. `decide` inspects the current phase and
//! returns the actions the room's bots want to take; the caller applies
//! them through the regular engine operations, scheduling each with a
//! delay. Because that delay means the room can move on before an action
//! lands, `action_matches_state` must be re-checked right before applying
//! a scheduled action.

use std::collections::HashMap;

use tracing::warn;

use crate::ai::brain::{AiBrain, AiDifficulty};
use crate::domain::policies::PolicyKind;
use crate::domain::powers::Power;
use crate::domain::roles::Team;
use crate::domain::state::{GameState, Phase, Player};
use crate::domain::PlayerId;

pub struct AiContext {
    brains: HashMap<PlayerId, AiBrain>,
}

impl AiContext {
    pub fn new() -> Self {
        Self {
            brains: HashMap::new(),
        }
    }

    pub fn register(&mut self, id: PlayerId, difficulty: AiDifficulty) {
        self.brains.insert(id, AiBrain::new(difficulty));
    }

    pub fn register_seeded(&mut self, id: PlayerId, difficulty: AiDifficulty, seed: u64) {
        self.brains.insert(id, AiBrain::with_seed(difficulty, seed));
    }

    pub fn remove(&mut self, id: PlayerId) {
        self.brains.remove(&id);
    }

    pub fn brain_mut(&mut self, id: PlayerId) -> Option<&mut AiBrain> {
        self.brains.get_mut(&id)
    }

    pub fn is_bot(&self, id: PlayerId) -> bool {
        self.brains.contains_key(&id)
    }

    /// Feeds a governed enactment into every bot's trust model.
    pub fn observe_enactment(
        &mut self,
        president: PlayerId,
        chief: PlayerId,
        enacted: PolicyKind,
    ) {
        for brain in self.brains.values_mut() {
            brain.update_trust(president, chief, enacted);
        }
    }

    /// A bot president who investigated someone remembers the answer.
    pub fn observe_investigation(
        &mut self,
        investigator: PlayerId,
        target: PlayerId,
        team: Team,
    ) {
        if let Some(brain) = self.brains.get_mut(&investigator) {
            brain.note_investigation(target, team);
        }
    }
}

impl Default for AiContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Peek,
    Investigate(PlayerId),
    SpecialElection(PlayerId),
    Execution(PlayerId),
}

/// One engine call a bot intends to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    Nominate {
        president: PlayerId,
        nominee: PlayerId,
    },
    Vote {
        voter: PlayerId,
        vote: bool,
    },
    DiscardCard {
        president: PlayerId,
        index: usize,
    },
    RequestVeto {
        chief: PlayerId,
    },
    EnactPolicy {
        chief: PlayerId,
        index: usize,
    },
    RespondVeto {
        president: PlayerId,
        accepts: bool,
    },
    UsePower {
        president: PlayerId,
        action: PowerAction,
    },
}

impl BotAction {
    pub fn actor(&self) -> PlayerId {
        match *self {
            BotAction::Nominate { president, .. } => president,
            BotAction::Vote { voter, .. } => voter,
            BotAction::DiscardCard { president, .. } => president,
            BotAction::RequestVeto { chief } => chief,
            BotAction::EnactPolicy { chief, .. } => chief,
            BotAction::RespondVeto { president, .. } => president,
            BotAction::UsePower { president, .. } => president,
        }
    }
}

/// Collects what every relevant bot wants to do in the current phase.
/// Order matters for elections: votes are returned in seat order so the
/// caller can stagger their delays deterministically.
pub fn decide(state: &GameState, ctx: &mut AiContext) -> Vec<BotAction> {
    if state.game_over() {
        return Vec::new();
    }
    match state.phase() {
        Phase::Nomination => decide_nomination(state, ctx),
        Phase::Election => decide_votes(state, ctx),
        Phase::LegislativePresident => decide_discard(state, ctx),
        Phase::LegislativeCabinet => decide_enactment(state, ctx),
        Phase::VetoDecision => decide_veto_response(state, ctx),
        Phase::ExecutivePower => decide_power(state, ctx),
        Phase::Lobby | Phase::RoleReveal | Phase::GameOver => Vec::new(),
    }
}

fn bot_player<'a>(state: &'a GameState, ctx: &AiContext, id: PlayerId) -> Option<&'a Player> {
    state.player(id).filter(|p| p.is_ai && ctx.is_bot(p.id))
}

fn decide_nomination(state: &GameState, ctx: &mut AiContext) -> Vec<BotAction> {
    let Some(president) = state.current_president().map(|p| p.id) else {
        return Vec::new();
    };
    let Some(me) = bot_player(state, ctx, president) else {
        return Vec::new();
    };
    let me = me.clone();
    let Some(brain) = ctx.brain_mut(president) else {
        return Vec::new();
    };
    match brain.choose_nominee(state, &me) {
        Some(nominee) => vec![BotAction::Nominate {
            president,
            nominee,
        }],
        None => {
            warn!(president = %president, "bot president found no eligible nominee");
            Vec::new()
        }
    }
}

fn decide_votes(state: &GameState, ctx: &mut AiContext) -> Vec<BotAction> {
    let pending: Vec<Player> = state
        .players()
        .iter()
        .filter(|p| p.is_alive() && p.is_ai && !state.votes().contains_key(&p.id))
        .cloned()
        .collect();

    pending
        .into_iter()
        .filter_map(|p| {
            let brain = ctx.brain_mut(p.id)?;
            let vote = brain.vote_on_government(state, &p);
            Some(BotAction::Vote { voter: p.id, vote })
        })
        .collect()
}

fn decide_discard(state: &GameState, ctx: &mut AiContext) -> Vec<BotAction> {
    if state.hand().len() != 3 {
        return Vec::new();
    }
    let Some(president) = state.current_president().map(|p| p.id) else {
        return Vec::new();
    };
    let Some(me) = bot_player(state, ctx, president) else {
        return Vec::new();
    };
    let me = me.clone();
    let Some(brain) = ctx.brain_mut(president) else {
        return Vec::new();
    };
    let index = brain.choose_discard(state.hand(), &me);
    vec![BotAction::DiscardCard { president, index }]
}

fn decide_enactment(state: &GameState, ctx: &mut AiContext) -> Vec<BotAction> {
    if state.hand().len() != 2 {
        return Vec::new();
    }
    let Some(chief) = state.cabinet_chief() else {
        return Vec::new();
    };
    let Some(me) = bot_player(state, ctx, chief) else {
        return Vec::new();
    };
    let me = me.clone();
    let Some(brain) = ctx.brain_mut(chief) else {
        return Vec::new();
    };
    if !state.veto_refused() && brain.should_request_veto(state, &me) {
        return vec![BotAction::RequestVeto { chief }];
    }
    let index = brain.choose_enactment(state.hand(), &me);
    vec![BotAction::EnactPolicy { chief, index }]
}

fn decide_veto_response(state: &GameState, ctx: &mut AiContext) -> Vec<BotAction> {
    let Some(president) = state.current_president().map(|p| p.id) else {
        return Vec::new();
    };
    if bot_player(state, ctx, president).is_none() {
        return Vec::new();
    }
    let Some(brain) = ctx.brain_mut(president) else {
        return Vec::new();
    };
    let accepts = brain.respond_to_veto(state);
    vec![BotAction::RespondVeto { president, accepts }]
}

fn decide_power(state: &GameState, ctx: &mut AiContext) -> Vec<BotAction> {
    let Some(power) = state.current_power() else {
        return Vec::new();
    };
    let Some(president) = state.current_president().map(|p| p.id) else {
        return Vec::new();
    };
    let Some(me) = bot_player(state, ctx, president) else {
        return Vec::new();
    };
    let me = me.clone();
    let Some(brain) = ctx.brain_mut(president) else {
        return Vec::new();
    };

    let action = match power {
        Power::Peek => Some(PowerAction::Peek),
        Power::Investigate => brain
            .choose_investigation_target(state, &me)
            .map(PowerAction::Investigate),
        Power::SpecialElection => brain
            .choose_special_election_target(state, &me)
            .map(PowerAction::SpecialElection),
        Power::Execution => brain
            .choose_execution_target(state, &me)
            .map(PowerAction::Execution),
    };
    match action {
        Some(action) => vec![BotAction::UsePower { president, action }],
        None => {
            warn!(president = %president, ?power, "bot president found no power target");
            Vec::new()
        }
    }
}

/// Staleness guard for delayed actions: true only if the room is still in
/// a state where this exact action makes sense.
pub fn action_matches_state(state: &GameState, action: &BotAction) -> bool {
    if state.game_over() {
        return false;
    }
    let president = state.current_president().map(|p| p.id);
    match *action {
        BotAction::Nominate { president: p, .. } => {
            state.phase() == Phase::Nomination && president == Some(p)
        }
        BotAction::Vote { voter, .. } => {
            state.phase() == Phase::Election
                && state.player(voter).is_some_and(Player::is_alive)
                && !state.votes().contains_key(&voter)
        }
        BotAction::DiscardCard { president: p, .. } => {
            state.phase() == Phase::LegislativePresident
                && president == Some(p)
                && state.hand().len() == 3
        }
        BotAction::RequestVeto { chief } => {
            state.phase() == Phase::LegislativeCabinet
                && state.cabinet_chief() == Some(chief)
                && state.veto_unlocked()
                && !state.veto_refused()
        }
        BotAction::EnactPolicy { chief, .. } => {
            state.phase() == Phase::LegislativeCabinet
                && state.cabinet_chief() == Some(chief)
                && state.hand().len() == 2
        }
        BotAction::RespondVeto { president: p, .. } => {
            state.phase() == Phase::VetoDecision && president == Some(p)
        }
        BotAction::UsePower { president: p, .. } => {
            state.phase() == Phase::ExecutivePower && president == Some(p)
        }
    }
}

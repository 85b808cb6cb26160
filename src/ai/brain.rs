//! Per-bot decision heuristics.
//!
//! Every choice funnels through `lean`, which plays the strategically
//! preferred option with a given probability. Difficulty reshapes that
//! probability: easy bots are coin flips, medium bots average the
//! strategy weight with 0.5, hard bots use it as-is and additionally
//! consult their running trust and suspicion scores.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::policies::{PolicyCard, PolicyKind};
use crate::domain::roles::Team;
use crate::domain::state::{GameState, Player};
use crate::domain::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Suspicion score at which an investigation pins a confirmed Syndicate
/// member (and its negation, a confirmed Reformer).
const PINNED: i32 = 5;

pub struct AiBrain {
    difficulty: AiDifficulty,
    suspicion: HashMap<PlayerId, i32>,
    trust: HashMap<PlayerId, i32>,
    rng: StdRng,
}

impl AiBrain {
    pub fn new(difficulty: AiDifficulty) -> Self {
        Self::with_rng(difficulty, StdRng::from_os_rng())
    }

    pub fn with_seed(difficulty: AiDifficulty, seed: u64) -> Self {
        Self::with_rng(difficulty, StdRng::seed_from_u64(seed))
    }

    fn with_rng(difficulty: AiDifficulty, rng: StdRng) -> Self {
        Self {
            difficulty,
            suspicion: HashMap::new(),
            trust: HashMap::new(),
            rng,
        }
    }

    pub fn difficulty(&self) -> AiDifficulty {
        self.difficulty
    }

    fn suspicion_of(&self, id: PlayerId) -> i32 {
        self.suspicion.get(&id).copied().unwrap_or(0)
    }

    fn trust_in(&self, id: PlayerId) -> i32 {
        self.trust.get(&id).copied().unwrap_or(0)
    }

    /// Plays `preferred` with probability `weight`, bent by difficulty.
    fn lean(&mut self, preferred: bool, weight: f64) -> bool {
        let p = match self.difficulty {
            AiDifficulty::Easy => 0.5,
            AiDifficulty::Medium => (weight + 0.5) / 2.0,
            AiDifficulty::Hard => weight,
        };
        if self.rng.random_bool(p) {
            preferred
        } else {
            !preferred
        }
    }

    fn pick(&mut self, pool: &[PlayerId]) -> Option<PlayerId> {
        pool.choose(&mut self.rng).copied()
    }

    fn my_team(me: &Player) -> Team {
        me.team().unwrap_or(Team::Reformers)
    }

    fn nomination_pool(state: &GameState, me: &Player) -> Vec<PlayerId> {
        state
            .players()
            .iter()
            .filter(|p| p.is_alive() && p.id != me.id)
            .filter(|p| {
                !(state.alive_count() > 5 && state.previous_cabinet_chief() == Some(p.id))
            })
            .map(|p| p.id)
            .collect()
    }

    fn living_others(state: &GameState, me: &Player) -> Vec<PlayerId> {
        state
            .players()
            .iter()
            .filter(|p| p.is_alive() && p.id != me.id)
            .map(|p| p.id)
            .collect()
    }

    pub fn choose_nominee(&mut self, state: &GameState, me: &Player) -> Option<PlayerId> {
        let pool = Self::nomination_pool(state, me);
        if pool.is_empty() {
            return None;
        }

        if self.difficulty == AiDifficulty::Hard {
            let preferred: Vec<PlayerId> = match Self::my_team(me) {
                Team::Syndicate => pool
                    .iter()
                    .copied()
                    .filter(|id| self.trust_in(*id) > 0)
                    .collect(),
                Team::Reformers => pool
                    .iter()
                    .copied()
                    .filter(|id| self.suspicion_of(*id) < 3)
                    .collect(),
            };
            if !preferred.is_empty() {
                return self.pick(&preferred);
            }
        }
        self.pick(&pool)
    }

    pub fn vote_on_government(&mut self, state: &GameState, me: &Player) -> bool {
        let president = state.current_president();
        let chief = state
            .nominated_cabinet_chief()
            .and_then(|id| state.player(id));
        let (Some(president), Some(chief)) = (president, chief) else {
            return self.lean(true, 0.5);
        };

        match Self::my_team(me) {
            Team::Syndicate => {
                let government_has_teammate = president.team() == Some(Team::Syndicate)
                    || chief.team() == Some(Team::Syndicate);
                if government_has_teammate {
                    self.lean(true, 0.9)
                } else if state.failed_governments() >= 2 {
                    self.lean(true, 0.7)
                } else if state.reform_policies() >= 3 {
                    self.lean(true, 0.6)
                } else {
                    self.lean(true, 0.4)
                }
            }
            Team::Reformers => {
                if state.syndicate_policies() >= 3 && self.suspicion_of(chief.id) >= 2 {
                    self.lean(false, 0.9)
                } else if self.trust_in(president.id) > 0 || self.trust_in(chief.id) > 0 {
                    self.lean(true, 0.7)
                } else if state.failed_governments() >= 2 {
                    self.lean(true, 0.8)
                } else {
                    self.lean(true, 0.55)
                }
            }
        }
    }

    /// Index of the card the president should bury.
    pub fn choose_discard(&mut self, hand: &[PolicyCard], me: &Player) -> usize {
        let adverse = match Self::my_team(me) {
            Team::Syndicate => PolicyKind::Reform,
            Team::Reformers => PolicyKind::Syndicate,
        };
        hand.iter().position(|c| c.kind == adverse).unwrap_or(0)
    }

    /// Index of the card the cabinet chief should enact.
    pub fn choose_enactment(&mut self, hand: &[PolicyCard], me: &Player) -> usize {
        let favored = match Self::my_team(me) {
            Team::Syndicate => PolicyKind::Syndicate,
            Team::Reformers => PolicyKind::Reform,
        };
        hand.iter().position(|c| c.kind == favored).unwrap_or(0)
    }

    pub fn should_request_veto(&mut self, state: &GameState, me: &Player) -> bool {
        if !state.veto_unlocked() {
            return false;
        }
        let hand = state.hand();
        match Self::my_team(me) {
            Team::Syndicate => {
                if hand.iter().all(|c| c.kind == PolicyKind::Reform) {
                    self.lean(true, 0.7)
                } else {
                    false
                }
            }
            Team::Reformers => {
                if hand.iter().all(|c| c.kind == PolicyKind::Syndicate)
                    && state.syndicate_policies() >= 4
                {
                    self.lean(true, 0.8)
                } else {
                    false
                }
            }
        }
    }

    pub fn respond_to_veto(&mut self, state: &GameState) -> bool {
        if state.failed_governments() >= 1 {
            // Accepting would edge the room toward chaos.
            self.lean(false, 0.7)
        } else {
            self.lean(true, 0.6)
        }
    }

    pub fn choose_investigation_target(
        &mut self,
        state: &GameState,
        me: &Player,
    ) -> Option<PlayerId> {
        let pool: Vec<PlayerId> = state
            .players()
            .iter()
            .filter(|p| p.is_alive() && p.id != me.id && !p.was_investigated)
            .map(|p| p.id)
            .collect();
        if pool.is_empty() {
            return None;
        }

        if self.difficulty == AiDifficulty::Hard {
            let suspicious: Vec<PlayerId> = pool
                .iter()
                .copied()
                .filter(|id| self.suspicion_of(*id) > 0)
                .collect();
            if !suspicious.is_empty() {
                return self.pick(&suspicious);
            }
        }
        self.pick(&pool)
    }

    pub fn choose_special_election_target(
        &mut self,
        state: &GameState,
        me: &Player,
    ) -> Option<PlayerId> {
        let pool = Self::living_others(state, me);
        if pool.is_empty() {
            return None;
        }

        if self.difficulty == AiDifficulty::Hard {
            let preferred: Vec<PlayerId> = match Self::my_team(me) {
                Team::Syndicate => pool
                    .iter()
                    .copied()
                    .filter(|id| self.trust_in(*id) > 0)
                    .collect(),
                Team::Reformers => pool
                    .iter()
                    .copied()
                    .filter(|id| self.trust_in(*id) > 0 && self.suspicion_of(*id) == 0)
                    .collect(),
            };
            if !preferred.is_empty() {
                return self.pick(&preferred);
            }
        }
        self.pick(&pool)
    }

    pub fn choose_execution_target(&mut self, state: &GameState, me: &Player) -> Option<PlayerId> {
        let pool = Self::living_others(state, me);
        if pool.is_empty() {
            return None;
        }

        if self.difficulty == AiDifficulty::Hard {
            match Self::my_team(me) {
                Team::Syndicate => {
                    // Negative suspicion marks probable Reformers.
                    let threats: Vec<PlayerId> = pool
                        .iter()
                        .copied()
                        .filter(|id| self.suspicion_of(*id) < 0)
                        .collect();
                    if !threats.is_empty() {
                        return self.pick(&threats);
                    }
                }
                Team::Reformers => {
                    let most_suspect = pool
                        .iter()
                        .copied()
                        .max_by_key(|id| self.suspicion_of(*id));
                    if let Some(id) = most_suspect {
                        if self.suspicion_of(id) > 0 {
                            return Some(id);
                        }
                    }
                }
            }
        }
        self.pick(&pool)
    }

    /// The one persistent learning signal: every governed enactment shifts
    /// this bot's opinion of the president and the cabinet chief.
    pub fn update_trust(
        &mut self,
        president: PlayerId,
        chief: PlayerId,
        enacted: PolicyKind,
    ) {
        let delta = match enacted {
            PolicyKind::Syndicate => 1,
            PolicyKind::Reform => -1,
        };
        for id in [president, chief] {
            *self.suspicion.entry(id).or_default() += delta;
            *self.trust.entry(id).or_default() -= delta;
        }
    }

    /// An investigation result is definitive, so it pins the scores.
    pub fn note_investigation(&mut self, target: PlayerId, team: Team) {
        match team {
            Team::Syndicate => {
                self.suspicion.insert(target, PINNED);
                self.trust.insert(target, -PINNED);
            }
            Team::Reformers => {
                self.suspicion.insert(target, -PINNED);
                self.trust.insert(target, PINNED);
            }
        }
    }

    /// Occasional table talk; `None` most of the time.
    pub fn table_talk(&mut self, context: TalkContext) -> Option<&'static str> {
        if !self.rng.random_bool(0.3) {
            return None;
        }
        let lines: &[&'static str] = match context {
            TalkContext::AfterVote => &[
                "I hope we made the right call there...",
                "Let's see how this plays out.",
                "I don't trust this government one bit.",
                "We need to play this smart.",
            ],
            TalkContext::AfterEnactment => &[
                "Interesting choice of policy...",
                "Things are getting tense.",
                "Anyone else find that suspicious?",
                "Stay sharp, everyone.",
            ],
        };
        lines.choose(&mut self.rng).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TalkContext {
    AfterVote,
    AfterEnactment,
}

#[cfg(test)]
impl AiBrain {
    pub(crate) fn test_suspicion(&self, id: PlayerId) -> i32 {
        self.suspicion_of(id)
    }

    pub(crate) fn test_trust(&self, id: PlayerId) -> i32 {
        self.trust_in(id)
    }
}

//! Policy deck construction, drawing, and track victory checks.
//!
//! The deck holds seventeen cards: eleven Syndicate and six Reform. Cards
//! leave the deck into the in-play hand, then into either the discard pile
//! or an enacted track slot. When a draw would underflow, the discard pile
//! is shuffled and appended under the remaining deck so card identity is
//! conserved across the whole game.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::roles::Team;

pub const SYNDICATE_CARDS: usize = 11;
pub const REFORM_CARDS: usize = 6;
pub const DECK_SIZE: usize = SYNDICATE_CARDS + REFORM_CARDS;

/// Enacted-track lengths that end the game.
pub const REFORM_TRACK_WIN: u8 = 5;
pub const SYNDICATE_TRACK_WIN: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Reform,
    Syndicate,
}

impl PolicyKind {
    pub fn team(self) -> Team {
        match self {
            PolicyKind::Reform => Team::Reformers,
            PolicyKind::Syndicate => Team::Syndicate,
        }
    }
}

/// A single policy card. The id is unique within a room's deck and stable
/// for the lifetime of the game, which is what makes conservation checkable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCard {
    pub id: String,
    pub kind: PolicyKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    ReformTrack,
    SyndicateTrack,
    KingpinExecuted,
    KingpinElected,
}

/// Builds the full 17-card deck, shuffled. Index 0 is the top of the deck.
pub fn create_deck(rng: &mut impl Rng) -> Vec<PolicyCard> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for i in 1..=SYNDICATE_CARDS {
        deck.push(PolicyCard {
            id: format!("S{i}"),
            kind: PolicyKind::Syndicate,
        });
    }
    for i in 1..=REFORM_CARDS {
        deck.push(PolicyCard {
            id: format!("R{i}"),
            kind: PolicyKind::Reform,
        });
    }
    deck.shuffle(rng);
    deck
}

/// Moves the shuffled discard pile under the remaining deck.
pub fn reshuffle_discard(
    deck: &mut Vec<PolicyCard>,
    discard: &mut Vec<PolicyCard>,
    rng: &mut impl Rng,
) {
    discard.shuffle(rng);
    deck.append(discard);
}

/// Draws `n` cards from the top, reshuffling the discard pile under the
/// deck first if the deck is short.
pub fn draw(
    deck: &mut Vec<PolicyCard>,
    discard: &mut Vec<PolicyCard>,
    n: usize,
    rng: &mut impl Rng,
) -> Vec<PolicyCard> {
    if deck.len() < n {
        reshuffle_discard(deck, discard, rng);
    }
    let take = n.min(deck.len());
    deck.drain(..take).collect()
}

/// Checks the enacted tracks for a completed win.
pub fn check_track_victory(reform: u8, syndicate: u8) -> Option<(Team, WinReason)> {
    if reform >= REFORM_TRACK_WIN {
        Some((Team::Reformers, WinReason::ReformTrack))
    } else if syndicate >= SYNDICATE_TRACK_WIN {
        Some((Team::Syndicate, WinReason::SyndicateTrack))
    } else {
        None
    }
}

//! Secret role assignment and initial mutual knowledge.
//!
//! Role counts scale with the table size. The Syndicate always includes
//! exactly one Kingpin on top of its regular members; at seven players or
//! more the Kingpin also learns who the regular Syndicate members are,
//! while at six or fewer the Kingpin is kept blind as a balance rule and
//! only the regular members know each other (and the Kingpin's identity).

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::PlayerId;
use crate::errors::domain::{GameError, RejectKind};

pub const MIN_PLAYERS: usize = 5;
pub const MAX_PLAYERS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Reformers,
    Syndicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Reformer,
    Syndicalist,
    Kingpin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub kind: RoleKind,
    pub team: Team,
}

impl Role {
    pub fn reformer() -> Self {
        Self {
            kind: RoleKind::Reformer,
            team: Team::Reformers,
        }
    }

    pub fn syndicalist() -> Self {
        Self {
            kind: RoleKind::Syndicalist,
            team: Team::Syndicate,
        }
    }

    pub fn kingpin() -> Self {
        Self {
            kind: RoleKind::Kingpin,
            team: Team::Syndicate,
        }
    }

    pub fn is_kingpin(&self) -> bool {
        self.kind == RoleKind::Kingpin
    }
}

/// (reformer count, regular syndicalist count) for a table size.
/// The Kingpin is added on top of the syndicalist count.
fn distribution(player_count: usize) -> Option<(usize, usize)> {
    match player_count {
        5 => Some((3, 1)),
        6 => Some((4, 1)),
        7 => Some((4, 2)),
        8 => Some((5, 2)),
        9 => Some((5, 3)),
        10 => Some((6, 3)),
        _ => None,
    }
}

/// Builds and shuffles the role pool for `player_count` seats.
pub fn generate_roles(player_count: usize, rng: &mut impl Rng) -> Result<Vec<Role>, GameError> {
    let (reformers, syndicalists) = distribution(player_count).ok_or_else(|| {
        GameError::new(
            RejectKind::PlayerCountOutOfRange,
            format!("cannot deal roles for {player_count} players"),
        )
    })?;

    let mut roles = Vec::with_capacity(player_count);
    roles.extend(std::iter::repeat(Role::reformer()).take(reformers));
    roles.extend(std::iter::repeat(Role::syndicalist()).take(syndicalists));
    roles.push(Role::kingpin());
    roles.shuffle(rng);
    Ok(roles)
}

/// Computes which other players each seated player immediately knows by role.
///
/// Regular syndicalists always know every other Syndicate member, Kingpin
/// included. The Kingpin reciprocally knows the regulars only at tables of
/// seven or more; at six or fewer the Kingpin stays blind (balance rule).
pub fn initial_knowledge(seats: &[(PlayerId, Role)]) -> HashMap<PlayerId, Vec<PlayerId>> {
    let small_table = seats.len() <= 6;
    let mut knowledge: HashMap<PlayerId, Vec<PlayerId>> = HashMap::new();

    for (id, role) in seats {
        if role.team != Team::Syndicate {
            continue;
        }
        if role.is_kingpin() && small_table {
            knowledge.insert(*id, Vec::new());
            continue;
        }
        let known = seats
            .iter()
            .filter(|(other, other_role)| other != id && other_role.team == Team::Syndicate)
            .map(|(other, _)| *other)
            .collect();
        knowledge.insert(*id, known);
    }

    knowledge
}

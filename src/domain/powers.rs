//! Presidential powers and their unlock schedule.
//!
//! A power unlocks only when a Syndicate policy is enacted through a
//! government, never through an electoral-chaos auto-enactment. Which power
//! fires depends on the table size and on how many Syndicate policies are
//! enacted so far.

use serde::{Deserialize, Serialize};

use crate::domain::state::Player;
use crate::domain::PlayerId;
use crate::errors::domain::{GameError, RejectKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Power {
    /// President privately inspects the top three deck cards.
    Peek,
    /// President learns a living player's team loyalty.
    Investigate,
    /// President hand-picks the next presidential candidate.
    SpecialElection,
    /// President kills a living player.
    Execution,
}

/// Power schedule by Syndicate-track position, one slot per enactment.
/// Tables of 7-8 players use the middle track; 9-10 the last.
const TRACK_5_6: [Option<Power>; 5] = [
    None,
    None,
    Some(Power::Peek),
    Some(Power::Execution),
    Some(Power::Execution),
];
const TRACK_7_8: [Option<Power>; 5] = [
    None,
    Some(Power::Investigate),
    Some(Power::SpecialElection),
    Some(Power::Execution),
    Some(Power::Execution),
];
const TRACK_9_10: [Option<Power>; 5] = [
    Some(Power::Investigate),
    Some(Power::Investigate),
    Some(Power::SpecialElection),
    Some(Power::Execution),
    Some(Power::Execution),
];

/// Looks up the power unlocked by the `syndicate_count`-th Syndicate
/// enactment at a table of `player_count` seats.
pub fn power_for_track(syndicate_count: u8, player_count: usize) -> Option<Power> {
    let track = match player_count {
        5 | 6 => &TRACK_5_6,
        7 | 8 => &TRACK_7_8,
        _ => &TRACK_9_10,
    };
    if syndicate_count == 0 || syndicate_count as usize > track.len() {
        return None;
    }
    track[syndicate_count as usize - 1]
}

pub fn validate_investigate(target: &Player) -> Result<(), GameError> {
    if target.is_dead {
        return Err(GameError::dead_player("cannot investigate a dead player"));
    }
    if target.was_investigated {
        return Err(GameError::new(
            RejectKind::AlreadyInvestigated,
            format!("{} has already been investigated", target.name),
        ));
    }
    Ok(())
}

pub fn validate_special_election(target: &Player, president: PlayerId) -> Result<(), GameError> {
    if target.is_dead {
        return Err(GameError::dead_player(
            "cannot appoint a dead player as president",
        ));
    }
    if target.id == president {
        return Err(GameError::new(
            RejectKind::SelfTarget,
            "president cannot appoint themselves",
        ));
    }
    Ok(())
}

pub fn validate_execution(target: &Player) -> Result<(), GameError> {
    if target.is_dead {
        return Err(GameError::dead_player("target is already dead"));
    }
    Ok(())
}

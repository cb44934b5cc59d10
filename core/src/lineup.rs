//! Squad organizer. Picks one gameweek's starting 11 and bench.
//!
//! FIXED SEQUENCE (no backtracking):
//!   1. Initial starting 11 by predicted points, formation minimums first
//!   2. Captain / vice-captain, one doubling
//!   3. At most one automatic substitution of an unplayed starter
//!   4. Squad-size validation
//!
//! Ties are broken by player name so identical inputs always produce the
//! same lineup regardless of squad order.

use crate::{
    config::SquadRules,
    error::{SimError, SimResult},
    player::{PlayerRecord, Position, Squad},
    types::{PlayerName, Points},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    pub off:          PlayerName,
    pub on:           PlayerName,
    pub off_position: Position,
    pub on_position:  Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Captaincy {
    pub captain:      PlayerName,
    pub vice_captain: PlayerName,
    /// Whichever of the two had their points multiplied.
    pub doubled:      PlayerName,
    /// Points of the doubled player before the multiplier.
    pub raw_points:   Points,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineup {
    pub starters:     Vec<PlayerRecord>,
    pub bench:        Vec<PlayerRecord>,
    pub captaincy:    Captaincy,
    pub substitution: Option<Substitution>,
}

impl Lineup {
    /// Points scored this gameweek. Bench points never count.
    pub fn starter_points(&self) -> Points {
        self.starters.iter().map(|p| p.total_points).sum()
    }

    /// "DEF-MID-FWD" counts of the starting 11, e.g. "4-4-2".
    pub fn formation(&self) -> String {
        formation_of(&self.starters)
    }

    pub fn is_starting(&self, name: &str) -> bool {
        self.starters.iter().any(|p| p.name == name)
    }
}

/// Run the full organizer sequence over a squad.
pub fn organise_team(squad: &Squad, rules: &SquadRules) -> SimResult<Lineup> {
    let (mut starters, mut bench) = select_starting_eleven(squad, rules);
    let captaincy = select_captaincy(&mut starters, rules);
    let substitution = substitute_unplayed(&mut starters, &mut bench, rules);
    validate_lineup(&starters, &bench, rules)?;

    let Some(captaincy) = captaincy else {
        return Err(lineup_size_error(&starters, &bench, rules));
    };

    log::debug!(
        "lineup {} captain={} vice={} doubled={}",
        formation_of(&starters),
        captaincy.captain,
        captaincy.vice_captain,
        captaincy.doubled
    );

    Ok(Lineup { starters, bench, captaincy, substitution })
}

// ── 1. Initial starting 11 ───────────────────────────────────────────────────

/// Highest predicted points first; name breaks ties.
fn by_prediction(a: &PlayerRecord, b: &PlayerRecord) -> Ordering {
    b.predicted_points
        .partial_cmp(&a.predicted_points)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.name.cmp(&b.name))
}

/// Move the first `n` players matching `wanted` from `pool` to `into`,
/// preserving ranking order.
fn take_best(
    pool:   &mut Vec<PlayerRecord>,
    into:   &mut Vec<PlayerRecord>,
    n:      usize,
    wanted: impl Fn(&PlayerRecord) -> bool,
) {
    let mut taken = 0;
    let mut i = 0;
    while taken < n && i < pool.len() {
        if wanted(&pool[i]) {
            into.push(pool.remove(i));
            taken += 1;
        } else {
            i += 1;
        }
    }
}

/// Greedy pick: best GK, best minimum DEF/MID/FWD, then the best remaining
/// outfield players for the flexible slots. Everyone else is on the bench.
pub fn select_starting_eleven(
    squad: &Squad,
    rules: &SquadRules,
) -> (Vec<PlayerRecord>, Vec<PlayerRecord>) {
    let mut ranked: Vec<PlayerRecord> = squad.players().to_vec();
    ranked.sort_by(by_prediction);

    let mut starters = Vec::with_capacity(rules.starters);
    for position in Position::ALL {
        take_best(&mut ranked, &mut starters, rules.minimum(position), |p| p.position == position);
    }
    take_best(&mut ranked, &mut starters, rules.flexible_slots(), |p| p.position.is_outfield());

    (starters, ranked)
}

// ── 2. Captain / vice-captain ────────────────────────────────────────────────

/// Double the captain's points, or the vice-captain's when the captain did
/// not play. `None` with fewer than two starters.
pub fn select_captaincy(starters: &mut [PlayerRecord], rules: &SquadRules) -> Option<Captaincy> {
    let mut order: Vec<usize> = (0..starters.len()).collect();
    order.sort_by(|&a, &b| by_prediction(&starters[a], &starters[b]));

    let (&captain_idx, &vice_idx) = (order.first()?, order.get(1)?);
    let doubled_idx = if starters[captain_idx].has_played() { captain_idx } else { vice_idx };

    let raw_points = starters[doubled_idx].total_points;
    starters[doubled_idx].total_points = raw_points * rules.captain_multiplier;

    Some(Captaincy {
        captain:      starters[captain_idx].name.clone(),
        vice_captain: starters[vice_idx].name.clone(),
        doubled:      starters[doubled_idx].name.clone(),
        raw_points,
    })
}

// ── 3. Automatic substitution ────────────────────────────────────────────────

/// Bench positions that may replace `off` without breaking the formation.
pub fn eligible_positions(off: &PlayerRecord, starters: &[PlayerRecord], rules: &SquadRules) -> Vec<Position> {
    if off.position == Position::Goalkeeper {
        return vec![Position::Goalkeeper];
    }
    let current = starters.iter().filter(|p| p.position == off.position).count();
    if current <= rules.minimum(off.position) {
        return vec![off.position];
    }
    Position::OUTFIELD.to_vec()
}

/// Swap the earliest-kickoff unplayed starter for the best eligible bench
/// player. Only one substitution per gameweek.
pub fn substitute_unplayed(
    starters: &mut Vec<PlayerRecord>,
    bench:    &mut Vec<PlayerRecord>,
    rules:    &SquadRules,
) -> Option<Substitution> {
    let off_idx = starters
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.has_played())
        .min_by(|(_, a), (_, b)| {
            a.kickoff_time
                .cmp(&b.kickoff_time)
                .then_with(|| a.name.cmp(&b.name))
        })
        .map(|(i, _)| i)?;

    let eligible = eligible_positions(&starters[off_idx], starters, rules);
    let Some(on_idx) = bench
        .iter()
        .enumerate()
        .filter(|(_, p)| eligible.contains(&p.position))
        .min_by(|(_, a), (_, b)| by_prediction(a, b))
        .map(|(i, _)| i)
    else {
        log::debug!("no eligible bench player for {}", starters[off_idx].name);
        return None;
    };

    let off = starters.remove(off_idx);
    let on = bench.remove(on_idx);
    let substitution = Substitution {
        off:          off.name.clone(),
        on:           on.name.clone(),
        off_position: off.position,
        on_position:  on.position,
    };
    bench.push(off);
    starters.push(on);

    Some(substitution)
}

// ── 4. Validation ────────────────────────────────────────────────────────────

pub fn validate_lineup(starters: &[PlayerRecord], bench: &[PlayerRecord], rules: &SquadRules) -> SimResult<()> {
    if starters.len() != rules.starters || bench.len() != rules.bench {
        return Err(lineup_size_error(starters, bench, rules));
    }
    Ok(())
}

fn lineup_size_error(starters: &[PlayerRecord], bench: &[PlayerRecord], rules: &SquadRules) -> SimError {
    SimError::LineupSize {
        starters:          starters.len(),
        bench:             bench.len(),
        expected_starters: rules.starters,
        expected_bench:    rules.bench,
    }
}

fn formation_of(starters: &[PlayerRecord]) -> String {
    let count = |pos: Position| starters.iter().filter(|p| p.position == pos).count();
    format!(
        "{}-{}-{}",
        count(Position::Defender),
        count(Position::Midfielder),
        count(Position::Forward)
    )
}

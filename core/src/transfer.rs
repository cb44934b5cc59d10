//! Transfer policies.
//!
//! RULE: A policy only proposes. The simulator applies the proposal with
//! `execute_transfer`, so a policy never mutates the squad or budget.
//!
//! Policies:
//!   - `NoTransfers`              baseline, never proposes
//!   - `ConditionalRandomPolicy`  random swap driven by a typed predicate
//!   - `BudgetOptimalPolicy`      best predicted-points gain under budget

use crate::{
    config::{SquadRules, TransferConfig},
    error::{SimError, SimResult},
    player::{PlayerRecord, Squad},
    predicate::TransferPredicate,
    rng::SimRng,
    stats::latest_rows,
    types::{Gameweek, Points},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A completed (or proposed) one-for-one swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub gameweek:        Gameweek,
    pub outgoing:        PlayerRecord,
    pub incoming:        PlayerRecord,
    /// Predicted-points gain that justified the swap.
    pub predicted_delta: f64,
    /// `incoming.total_points - outgoing.total_points`. Reporting only.
    pub realized_delta:  Points,
    pub budget_before:   f64,
    pub budget_after:    f64,
}

/// The contract every transfer policy fulfils.
pub trait TransferPolicy: Send {
    /// Stable name used in event logs and batch result keys.
    fn name(&self) -> String;

    /// Decide whether to swap one squad member for a market player.
    ///
    /// - `market`: every player row for `gameweek` (may contain duplicates)
    /// - `budget`: current leftover budget
    fn propose(
        &mut self,
        gameweek: Gameweek,
        squad:    &Squad,
        market:   &[PlayerRecord],
        budget:   f64,
        rng:      &mut SimRng,
    ) -> SimResult<Option<Transfer>>;
}

/// Apply a proposal to the squad and budget.
pub fn execute_transfer(squad: &mut Squad, budget: &mut f64, transfer: &Transfer) -> SimResult<()> {
    squad
        .swap(&transfer.outgoing.name, transfer.incoming.clone())
        .ok_or_else(|| SimError::UnknownPlayer {
            name:     transfer.outgoing.name.clone(),
            gameweek: transfer.gameweek,
        })?;
    *budget = transfer.budget_after;
    Ok(())
}

/// One row per market player (last occurrence wins), ordered by name.
fn market_players(market: &[PlayerRecord]) -> Vec<&PlayerRecord> {
    let mut players: Vec<&PlayerRecord> = latest_rows(market).into_values().collect();
    players.sort_by(|a, b| a.name.cmp(&b.name));
    players
}

// ── No transfers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct NoTransfers;

impl TransferPolicy for NoTransfers {
    fn name(&self) -> String {
        "no_transfers".into()
    }

    fn propose(
        &mut self,
        _gameweek: Gameweek,
        _squad:    &Squad,
        _market:   &[PlayerRecord],
        _budget:   f64,
        _rng:      &mut SimRng,
    ) -> SimResult<Option<Transfer>> {
        Ok(None)
    }
}

// ── Conditional random ───────────────────────────────────────────────────────

/// Swaps a random member failing the predicate for a random same-position
/// market player satisfying it. Ignores the budget entirely.
#[derive(Debug, Clone)]
pub struct ConditionalRandomPolicy {
    predicate: TransferPredicate,
}

impl ConditionalRandomPolicy {
    pub fn new(predicate: TransferPredicate) -> Self {
        Self { predicate }
    }
}

impl TransferPolicy for ConditionalRandomPolicy {
    fn name(&self) -> String {
        format!("random[{}]", self.predicate)
    }

    fn propose(
        &mut self,
        gameweek: Gameweek,
        squad:    &Squad,
        market:   &[PlayerRecord],
        budget:   f64,
        rng:      &mut SimRng,
    ) -> SimResult<Option<Transfer>> {
        let condition = self.predicate.resolve(squad)?;

        let failing: Vec<&PlayerRecord> = squad.iter().filter(|p| !condition.matches(p)).collect();
        let Some(outgoing) = rng.choose(&failing).copied() else {
            log::debug!("gw={gameweek} random transfer: every member satisfies {}", self.predicate);
            return Ok(None);
        };

        let pool: Vec<&PlayerRecord> = market_players(market)
            .into_iter()
            .filter(|p| p.position == outgoing.position)
            .filter(|p| !squad.contains(&p.name))
            .filter(|p| condition.matches(p))
            .collect();
        let Some(incoming) = rng.choose(&pool).copied() else {
            log::debug!(
                "gw={gameweek} random transfer: no {} on the market satisfies {}",
                outgoing.position, self.predicate
            );
            return Ok(None);
        };

        Ok(Some(Transfer {
            gameweek,
            outgoing:        outgoing.clone(),
            incoming:        incoming.signed(),
            predicted_delta: incoming.predicted_points - outgoing.predicted_points,
            realized_delta:  incoming.total_points - outgoing.total_points,
            budget_before:   budget,
            budget_after:    budget,
        }))
    }
}

// ── Budget optimal ───────────────────────────────────────────────────────────

/// Makes the single swap with the largest predicted-points gain that is
/// affordable and respects the per-club cap, if the gain clears the
/// improvement threshold.
///
/// Ties on gain go to the alphabetically first outgoing player; ties on a
/// replacement's predicted points go to the alphabetically first candidate.
#[derive(Debug, Clone)]
pub struct BudgetOptimalPolicy {
    threshold: f64,
    club_cap:  usize,
}

impl BudgetOptimalPolicy {
    pub fn new(transfers: &TransferConfig, rules: &SquadRules) -> Self {
        Self {
            threshold: transfers.improvement_threshold,
            club_cap:  rules.club_cap,
        }
    }

    /// Best affordable replacement for one member, if any.
    fn best_replacement<'m>(
        &self,
        gameweek: Gameweek,
        member:   &PlayerRecord,
        squad:    &Squad,
        market:   &[&'m PlayerRecord],
        budget:   f64,
    ) -> Option<&'m PlayerRecord> {
        let value_cap = member.value + budget;
        let club_counts = squad.club_counts();

        market
            .iter()
            .copied()
            .filter(|p| p.gameweek == gameweek)
            .filter(|p| p.position == member.position)
            .filter(|p| !squad.contains(&p.name))
            .filter(|p| p.value <= value_cap)
            .filter(|p| club_counts.get(p.team.as_str()).copied().unwrap_or(0) < self.club_cap)
            .max_by(|a, b| {
                a.predicted_points
                    .partial_cmp(&b.predicted_points)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| b.name.cmp(&a.name))
            })
    }
}

impl TransferPolicy for BudgetOptimalPolicy {
    fn name(&self) -> String {
        "budget_optimal".into()
    }

    fn propose(
        &mut self,
        gameweek: Gameweek,
        squad:    &Squad,
        market:   &[PlayerRecord],
        budget:   f64,
        _rng:     &mut SimRng,
    ) -> SimResult<Option<Transfer>> {
        let market = market_players(market);

        let mut members: Vec<&PlayerRecord> = squad.iter().collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));

        let mut best: Option<(f64, &PlayerRecord, &PlayerRecord)> = None;
        for member in members {
            let Some(candidate) = self.best_replacement(gameweek, member, squad, &market, budget) else {
                continue;
            };
            let delta = candidate.predicted_points - member.predicted_points;
            if delta <= self.threshold {
                continue;
            }
            if best.as_ref().map_or(true, |(best_delta, _, _)| delta > *best_delta) {
                best = Some((delta, member, candidate));
            }
        }

        let Some((delta, outgoing, incoming)) = best else {
            log::debug!("gw={gameweek} no transfer clears the {:.1} point threshold", self.threshold);
            return Ok(None);
        };

        Ok(Some(Transfer {
            gameweek,
            outgoing:        outgoing.clone(),
            incoming:        incoming.signed(),
            predicted_delta: delta,
            realized_delta:  incoming.total_points - outgoing.total_points,
            budget_before:   budget,
            budget_after:    budget + outgoing.value - incoming.value,
        }))
    }
}

//! The season simulator: replays a season one gameweek at a time.
//!
//! EXECUTION ORDER per gameweek (fixed, never reordered):
//!   1. Stats refresh        (stats.rs)
//!   2. Transfer proposal    (transfer.rs, via the injected policy)
//!   3. Team organisation    (lineup.rs)
//!   4. Scoring              starting 11 only
//!   5. Squad-size check     fatal on mismatch
//!
//! RULES:
//!   - Each gameweek reads only the squad state left by the previous one.
//!   - All randomness flows through the simulator's SimRng.
//!   - Every decision is recorded as a SimEvent (and persisted when a
//!     store is attached).

use crate::{
    config::SimConfig,
    data::SeasonData,
    error::{SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    lineup::{organise_team, Lineup},
    player::{PlayerRecord, Position, Squad},
    rng::SimRng,
    stats::{latest_rows, refresh_squad_stats},
    store::SimStore,
    transfer::{execute_transfer, TransferPolicy},
    types::{Gameweek, Points, RunId},
};
use std::sync::Arc;

/// Everything a finished season produces.
#[derive(Debug, Clone)]
pub struct SeasonOutcome {
    pub run_id:          RunId,
    pub gameweeks:       Vec<Gameweek>,
    /// Season-to-date points at each gameweek.
    pub points_track:    Vec<Points>,
    /// One lineup per gameweek. Empty for position-group runs.
    pub lineups:         Vec<Lineup>,
    pub final_squad:     Squad,
    pub leftover_budget: f64,
    pub events:          Vec<SimEvent>,
}

impl SeasonOutcome {
    pub fn total_points(&self) -> Points {
        self.points_track.last().copied().unwrap_or(0)
    }

    pub fn transfers_made(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SimEvent::TransferMade { .. }))
            .count()
    }
}

pub struct SeasonSimulator {
    pub run_id: RunId,
    seed:       u64,
    config:     SimConfig,
    data:       Arc<dyn SeasonData>,
    policy:     Box<dyn TransferPolicy>,
    rng:        SimRng,
    store:      Option<SimStore>,
    events:     Vec<SimEvent>,
}

impl SeasonSimulator {
    pub fn new(
        run_id: RunId,
        seed:   u64,
        config: SimConfig,
        data:   Arc<dyn SeasonData>,
        policy: Box<dyn TransferPolicy>,
    ) -> Self {
        Self {
            run_id,
            seed,
            config,
            data,
            policy,
            rng: SimRng::new(seed, 0),
            store: None,
            events: Vec::new(),
        }
    }

    /// Draw randomness from an explicit task stream (batch workers).
    pub fn with_rng(mut self, rng: SimRng) -> Self {
        self.rng = rng;
        self
    }

    /// Persist the run, its decisions and its points track.
    pub fn with_store(mut self, store: SimStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn store(&self) -> Option<&SimStore> {
        self.store.as_ref()
    }

    /// Simulate a full 15-player squad season.
    pub fn run_season(&mut self, initial: Squad, leftover_budget: f64) -> SimResult<SeasonOutcome> {
        let gameweeks = self.data.gameweeks();
        if gameweeks.is_empty() {
            return Err(SimError::EmptySeason);
        }
        let desired = self.config.rules.squad_size;
        self.begin(&initial, leftover_budget, Some(desired))?;

        let expected_size = initial.len();
        let mut squad = initial;
        let mut budget = leftover_budget;
        let mut per_gameweek = Vec::with_capacity(gameweeks.len());
        let mut lineups = Vec::with_capacity(gameweeks.len());

        for &gameweek in &gameweeks {
            let lineup = self.play_gameweek(gameweek, &mut squad, &mut budget)?;
            let points = lineup.starter_points();
            per_gameweek.push(points);
            lineups.push(lineup);

            check_squad_size(gameweek, expected_size, &squad)?;
            let cumulative = per_gameweek.iter().sum();
            self.emit(SimEvent::GameweekScored { gameweek, points, cumulative })?;
        }

        self.finish(gameweeks, per_gameweek, lineups, squad, budget)
    }

    /// Simulate a single-position group with no lineup selection: every
    /// member scores. The first gameweek's points seed the track and
    /// transfers start from the second gameweek.
    pub fn run_position_group(&mut self, initial: Squad, position: Position) -> SimResult<SeasonOutcome> {
        let gameweeks = self.data.gameweeks();
        let Some((&first, rest)) = gameweeks.split_first() else {
            return Err(SimError::EmptySeason);
        };
        self.begin(&initial, 0.0, None)?;

        let expected_size = initial.len();
        let mut squad = initial;
        let mut budget = 0.0;
        let mut per_gameweek = vec![squad.total_points()];
        self.emit(SimEvent::GameweekScored {
            gameweek:   first,
            points:     per_gameweek[0],
            cumulative: per_gameweek[0],
        })?;

        for &gameweek in rest {
            let market = self.data.position_rows(gameweek, position);
            squad = self.refresh(gameweek, &squad, &market)?;
            self.transfer_step(gameweek, &mut squad, &market, &mut budget)?;

            let points = squad.total_points();
            per_gameweek.push(points);
            check_squad_size(gameweek, expected_size, &squad)?;
            let cumulative = per_gameweek.iter().sum();
            self.emit(SimEvent::GameweekScored { gameweek, points, cumulative })?;
        }

        self.finish(gameweeks, per_gameweek, Vec::new(), squad, budget)
    }

    /// Record the run. `desired_size` is the full-squad size to warn
    /// against; position groups have none.
    fn begin(
        &mut self,
        initial:         &Squad,
        leftover_budget: f64,
        desired_size:    Option<usize>,
    ) -> SimResult<()> {
        if let Some(store) = &self.store {
            if !store.run_exists(&self.run_id)? {
                store.insert_run(&self.run_id, self.seed, &self.policy.name(), env!("CARGO_PKG_VERSION"))?;
            }
        }

        self.emit(SimEvent::SeasonStarted {
            run_id:     self.run_id.clone(),
            seed:       self.seed,
            policy:     self.policy.name(),
            squad_size: initial.len(),
            leftover_budget,
        })?;

        let Some(expected) = desired_size else {
            return Ok(());
        };
        if initial.len() != expected {
            log::warn!(
                "squad has {} players, but the desired number of players is {expected}",
                initial.len()
            );
            self.emit(SimEvent::SquadSizeWarning { expected, actual: initial.len() })?;
        }
        Ok(())
    }

    fn play_gameweek(
        &mut self,
        gameweek: Gameweek,
        squad:    &mut Squad,
        budget:   &mut f64,
    ) -> SimResult<Lineup> {
        let data = Arc::clone(&self.data);
        let rows = data.gameweek_rows(gameweek);

        *squad = self.refresh(gameweek, squad, rows)?;
        self.transfer_step(gameweek, squad, rows, budget)?;

        let lineup = organise_team(squad, &self.config.rules)?;
        self.emit(SimEvent::LineupSelected {
            gameweek,
            formation:    lineup.formation(),
            captaincy:    lineup.captaincy.clone(),
            substitution: lineup.substitution.clone(),
        })?;
        Ok(lineup)
    }

    fn refresh(
        &mut self,
        gameweek: Gameweek,
        squad:    &Squad,
        rows:     &[PlayerRecord],
    ) -> SimResult<Squad> {
        let refreshed = refresh_squad_stats(squad, rows);
        check_squad_size(gameweek, squad.len(), &refreshed)?;

        let present = latest_rows(rows);
        let absent: Vec<_> = squad
            .iter()
            .filter(|p| !present.contains_key(p.name.as_str()))
            .map(|p| p.name.clone())
            .collect();
        if !absent.is_empty() {
            log::debug!("gw={gameweek} did not play: {}", absent.join(", "));
        }
        self.emit(SimEvent::StatsRefreshed { gameweek, absent })?;
        Ok(refreshed)
    }

    fn transfer_step(
        &mut self,
        gameweek: Gameweek,
        squad:    &mut Squad,
        market:   &[PlayerRecord],
        budget:   &mut f64,
    ) -> SimResult<()> {
        match self.policy.propose(gameweek, squad, market, *budget, &mut self.rng)? {
            Some(transfer) => {
                execute_transfer(squad, budget, &transfer)?;
                log::debug!(
                    "gw={gameweek} transfer {} -> {} (predicted {:+.2}, actual {:+}, budget {:.1})",
                    transfer.outgoing.name,
                    transfer.incoming.name,
                    transfer.predicted_delta,
                    transfer.realized_delta,
                    transfer.budget_after
                );
                self.emit(SimEvent::TransferMade {
                    gameweek,
                    outgoing:        transfer.outgoing.name,
                    incoming:        transfer.incoming.name,
                    position:        transfer.incoming.position,
                    predicted_delta: transfer.predicted_delta,
                    realized_delta:  transfer.realized_delta,
                    budget_before:   transfer.budget_before,
                    budget_after:    transfer.budget_after,
                })
            }
            None => self.emit(SimEvent::TransferSkipped { gameweek }),
        }
    }

    fn finish(
        &mut self,
        gameweeks:    Vec<Gameweek>,
        per_gameweek: Vec<Points>,
        lineups:      Vec<Lineup>,
        final_squad:  Squad,
        budget:       f64,
    ) -> SimResult<SeasonOutcome> {
        let points_track = accumulate_points(&per_gameweek);
        let total_points = points_track.last().copied().unwrap_or(0);

        self.emit(SimEvent::SeasonCompleted {
            gameweeks: gameweeks.len(),
            total_points,
            leftover_budget: budget,
        })?;
        if let Some(store) = &self.store {
            store.save_points_track(&self.run_id, &gameweeks, &points_track)?;
        }

        log::info!(
            "run={} policy={} finished: {} gameweeks, {total_points} points, budget {budget:.1}",
            self.run_id,
            self.policy.name(),
            gameweeks.len()
        );

        Ok(SeasonOutcome {
            run_id: self.run_id.clone(),
            gameweeks,
            points_track,
            lineups,
            final_squad,
            leftover_budget: budget,
            events: std::mem::take(&mut self.events),
        })
    }

    fn emit(&mut self, event: SimEvent) -> SimResult<()> {
        if let Some(store) = &self.store {
            let entry = EventLogEntry {
                id:         None,
                run_id:     self.run_id.clone(),
                gameweek:   event.gameweek(),
                event_type: event.type_name().to_string(),
                payload:    serde_json::to_string(&event)?,
            };
            store.append_event(&entry)?;
        }
        self.events.push(event);
        Ok(())
    }
}

/// Running sum: `track[i] = track[i - 1] + points[i]`.
pub fn accumulate_points(points: &[Points]) -> Vec<Points> {
    points
        .iter()
        .scan(0, |total, &p| {
            *total += p;
            Some(*total)
        })
        .collect()
}

fn check_squad_size(gameweek: Gameweek, expected: usize, squad: &Squad) -> SimResult<()> {
    if squad.len() != expected {
        return Err(SimError::SquadSizeChanged { gameweek, expected, actual: squad.len() });
    }
    Ok(())
}

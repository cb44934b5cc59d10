//! Batch evaluation of transfer predicates across seasons and positions.
//!
//! Each (season, position) task is independent: it owns its squad state
//! and its own RNG stream drawn from the RngBank by task index, and reads
//! only shared immutable season data. Tasks run in parallel on the rayon
//! pool. A failing task reports its error in its own result slot and
//! never affects the others.

use crate::{
    config::SimConfig,
    data::{select_random_group, SeasonData},
    engine::SeasonSimulator,
    error::{SimError, SimResult},
    player::Position,
    predicate::{CmpOp, Threshold, TransferPredicate},
    rng::{RngBank, SimRng},
    transfer::{ConditionalRandomPolicy, NoTransfers, TransferPolicy},
};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Key of the no-transfer baseline in every result map.
pub const BASELINE: &str = "no_transfers";

/// Average cumulative points track per named strategy.
pub type StrategyTracks = BTreeMap<String, Vec<f64>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationTask {
    pub season:   String,
    pub position: Position,
}

impl EvaluationTask {
    pub fn new(season: &str, position: Position) -> Self {
        Self { season: season.to_string(), position }
    }

    /// Result key, e.g. "mid_2021-22".
    pub fn key(&self) -> String {
        format!("{}_{}", self.position.code().to_ascii_lowercase(), self.season)
    }
}

#[derive(Debug)]
pub struct TaskResult {
    pub task:       EvaluationTask,
    pub task_index: u64,
    pub tracks:     SimResult<StrategyTracks>,
}

/// The sweep used for variable analysis: for each model input, "transfer
/// towards players better than the squad's worst" (or the reverse).
pub fn standard_predicates() -> Vec<(String, TransferPredicate)> {
    let higher = |field: &str| {
        (
            format!("transfers_on_higher_{field}"),
            TransferPredicate::numeric(field, CmpOp::Gt, Threshold::MinOf(field.to_string())),
        )
    };
    let lower = |field: &str| {
        (
            format!("transfers_on_lower_{field}"),
            TransferPredicate::numeric(field, CmpOp::Lt, Threshold::MaxOf(field.to_string())),
        )
    };

    vec![
        ("transfers_on_was_home".to_string(), TransferPredicate::flag("was_home", true)),
        ("transfers_on_was_away".to_string(), TransferPredicate::flag("was_home", false)),
        higher("recent_total_points"),
        higher("recent_goals_scored"),
        higher("recent_yellow_cards"),
        lower("recent_yellow_cards"),
        higher("recent_red_cards"),
        lower("recent_red_cards"),
        higher("recent_assists"),
        higher("recent_clean_sheets"),
        higher("recent_saves"),
        higher("recent_minutes"),
        higher("recent_bps"),
        higher("recent_goals_conceded"),
        lower("recent_goals_conceded"),
        higher("recent_creativity"),
        (
            "transfers_on_higher_recent_won_games".to_string(),
            TransferPredicate::numeric(
                "recent_won_game",
                CmpOp::Gt,
                Threshold::MinOf("recent_won_game".to_string()),
            ),
        ),
    ]
}

/// Run every task in parallel.
pub fn evaluate_predicates(
    seasons:     &BTreeMap<String, Arc<dyn SeasonData>>,
    tasks:       &[EvaluationTask],
    predicates:  &[(String, TransferPredicate)],
    config:      &SimConfig,
    master_seed: u64,
) -> Vec<TaskResult> {
    let bank = RngBank::new(master_seed);

    tasks
        .par_iter()
        .enumerate()
        .map(|(i, task)| {
            let task_index = i as u64;
            let mut rng = bank.for_task(task_index);
            let tracks = match seasons.get(&task.season) {
                Some(data) => evaluate_position(data, task, predicates, config, &mut rng),
                None => Err(SimError::Other(anyhow::anyhow!("unknown season '{}'", task.season))),
            };
            match &tracks {
                Ok(_)  => log::info!("completed all iterations for {}", task.key()),
                Err(e) => log::warn!("task {} failed: {e}", task.key()),
            }
            TaskResult { task: task.clone(), task_index, tracks }
        })
        .collect()
}

/// Average points track per strategy for one (season, position) task.
///
/// Every iteration samples a fresh random group and runs the baseline and
/// each predicate against that same starting group.
pub fn evaluate_position(
    data:       &Arc<dyn SeasonData>,
    task:       &EvaluationTask,
    predicates: &[(String, TransferPredicate)],
    config:     &SimConfig,
    rng:        &mut SimRng,
) -> SimResult<StrategyTracks> {
    let iterations = config.batch.iterations.max(1);
    let mut sums: StrategyTracks = BTreeMap::new();

    for iteration in 0..iterations {
        let group = select_random_group(data.as_ref(), task.position, config.batch.group_size, rng)?;

        let strategies = std::iter::once((BASELINE.to_string(), None))
            .chain(predicates.iter().map(|(name, p)| (name.clone(), Some(p.clone()))));

        for (name, predicate) in strategies {
            let policy: Box<dyn TransferPolicy> = match predicate {
                Some(p) => Box::new(ConditionalRandomPolicy::new(p)),
                None    => Box::new(NoTransfers),
            };
            let run_id = format!("{}-{iteration}-{name}", task.key());
            let child = SimRng::new(rng.next_u64(), rng.task_index);

            let outcome = SeasonSimulator::new(run_id, rng.task_index, config.clone(), Arc::clone(data), policy)
                .with_rng(child)
                .run_position_group(group.clone(), task.position)?;

            add_track(&mut sums, &name, &outcome.points_track);
        }
        log::debug!("iteration {} complete for {}", iteration + 1, task.key());
    }

    for track in sums.values_mut() {
        for v in track.iter_mut() {
            *v /= iterations as f64;
        }
    }
    Ok(sums)
}

fn add_track(sums: &mut StrategyTracks, name: &str, track: &[i64]) {
    let entry = sums.entry(name.to_string()).or_insert_with(|| vec![0.0; track.len()]);
    if entry.len() < track.len() {
        entry.resize(track.len(), 0.0);
    }
    for (acc, points) in entry.iter_mut().zip(track) {
        *acc += *points as f64;
    }
}

/// Order strategies by final cumulative points, best first, as
/// `(rank, name, final_points)` with ranks starting at 1.
pub fn rank_by_final_points(tracks: &StrategyTracks) -> Vec<(usize, String, f64)> {
    let mut finals: Vec<(String, f64)> = tracks
        .iter()
        .map(|(name, track)| (name.clone(), track.last().copied().unwrap_or(0.0)))
        .collect();
    finals.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    finals
        .into_iter()
        .enumerate()
        .map(|(i, (name, points))| (i + 1, name, points))
        .collect()
}

/// Element-wise mean of each strategy's track over several seasons.
/// Strategies missing from a season count as zero for that season.
pub fn average_across_seasons(per_season: &[&StrategyTracks]) -> StrategyTracks {
    let mut sums: StrategyTracks = BTreeMap::new();
    for tracks in per_season {
        for (name, track) in tracks.iter() {
            let entry = sums.entry(name.clone()).or_insert_with(|| vec![0.0; track.len()]);
            if entry.len() < track.len() {
                entry.resize(track.len(), 0.0);
            }
            for (acc, v) in entry.iter_mut().zip(track) {
                *acc += v;
            }
        }
    }
    let seasons = per_season.len().max(1) as f64;
    for track in sums.values_mut() {
        for v in track.iter_mut() {
            *v /= seasons;
        }
    }
    sums
}

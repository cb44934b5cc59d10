//! season-runner: headless season simulator for FPL squads.
//!
//! Usage:
//!   season-runner --data gw_rows.json --squad squad.json --policy optimal
//!   season-runner --data gw_rows.json --squad squad.json --policy "recent_bps > lowest" --db run.db
//!   season-runner --data gw_rows.json --batch --season 2021-22 --iterations 20 --json

use anyhow::{Context, Result};
use fpl_sim_core::{
    batch::{evaluate_predicates, rank_by_final_points, standard_predicates, EvaluationTask},
    config::SimConfig,
    data::{InitialSquad, InMemorySeason, SeasonData},
    engine::{SeasonOutcome, SeasonSimulator},
    event::SimEvent,
    player::Position,
    types::{Gameweek, Points},
    predicate::TransferPredicate,
    store::SimStore,
    transfer::{BudgetOptimalPolicy, ConditionalRandomPolicy, NoTransfers, TransferPolicy},
};
use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;

#[derive(serde::Serialize)]
struct RunReport<'a> {
    run_id:          &'a str,
    policy:          &'a str,
    gameweeks:       &'a [Gameweek],
    points_track:    &'a [Points],
    transfers:       usize,
    leftover_budget: f64,
}

#[derive(serde::Serialize)]
struct RankedStrategy {
    rank:         usize,
    strategy:     String,
    final_points: f64,
}

#[derive(serde::Serialize)]
struct TaskReport {
    task:    String,
    ranking: Vec<RankedStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error:   Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let batch_mode = args.iter().any(|a| a == "--batch");
    let json = args.iter().any(|a| a == "--json");
    let data_path = string_arg(&args, "--data").context("--data <rows.json> is required")?;
    let db = string_arg(&args, "--db").unwrap_or(":memory:");

    let mut config = match string_arg(&args, "--config") {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    config.batch.iterations = parse_arg(&args, "--iterations", config.batch.iterations);

    let season = InMemorySeason::load_json(data_path)?;
    log::info!(
        "seed={seed} data={data_path} rows={} gameweeks={}",
        season.row_count(),
        season.gameweeks().len()
    );
    if !json {
        println!("FPL season-runner");
        println!("  seed:      {seed}");
        println!("  data:      {data_path} ({} rows, {} gameweeks)", season.row_count(), season.gameweeks().len());
        println!();
    }

    if batch_mode {
        let label = string_arg(&args, "--season").unwrap_or("season");
        run_batch(Arc::new(season), label, &config, seed, json)
    } else {
        let squad_path = string_arg(&args, "--squad").context("--squad <squad.json> is required")?;
        let policy_arg = string_arg(&args, "--policy").unwrap_or("optimal");
        run_single(Arc::new(season), squad_path, policy_arg, db, config, seed, json)
    }
}

fn run_single(
    data:       Arc<dyn SeasonData>,
    squad_path: &str,
    policy_arg: &str,
    db:         &str,
    config:     SimConfig,
    seed:       u64,
    json:       bool,
) -> Result<()> {
    let initial = InitialSquad::load_json(squad_path)?;
    let squad = initial.hydrate(data.as_ref())?;
    let policy = build_policy(policy_arg, &config)?;

    let store = if db == ":memory:" { SimStore::in_memory()? } else { SimStore::open(db)? };
    store.migrate()?;

    let run_id = format!("run-{seed}-{}", chrono::Utc::now().timestamp());
    let mut simulator = SeasonSimulator::new(run_id, seed, config, data, policy).with_store(store);
    let outcome = simulator.run_season(squad, initial.leftover_budget)?;

    if json {
        let report = RunReport {
            run_id:          &outcome.run_id,
            policy:          policy_arg,
            gameweeks:       &outcome.gameweeks,
            points_track:    &outcome.points_track,
            transfers:       outcome.transfers_made(),
            leftover_budget: outcome.leftover_budget,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&outcome);
    }
    Ok(())
}

fn run_batch(
    data:   Arc<dyn SeasonData>,
    label:  &str,
    config: &SimConfig,
    seed:   u64,
    json:   bool,
) -> Result<()> {
    let seasons: BTreeMap<String, Arc<dyn SeasonData>> = [(label.to_string(), data)].into();
    let tasks: Vec<EvaluationTask> = Position::ALL
        .iter()
        .map(|p| EvaluationTask::new(label, *p))
        .collect();

    let results = evaluate_predicates(&seasons, &tasks, &standard_predicates(), config, seed);

    let reports: Vec<TaskReport> = results
        .into_iter()
        .map(|result| {
            let task = result.task.key();
            match result.tracks {
                Ok(tracks) => TaskReport {
                    task,
                    ranking: rank_by_final_points(&tracks)
                        .into_iter()
                        .map(|(rank, strategy, final_points)| RankedStrategy { rank, strategy, final_points })
                        .collect(),
                    error: None,
                },
                Err(e) => TaskReport { task, ranking: Vec::new(), error: Some(e.to_string()) },
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!("=== {} ===", report.task);
        if let Some(e) = &report.error {
            println!("  failed: {e}");
        }
        for r in &report.ranking {
            println!("  {:>2}. {:<45} {:>8.1}", r.rank, r.strategy, r.final_points);
        }
        println!();
    }
    Ok(())
}

fn build_policy(arg: &str, config: &SimConfig) -> Result<Box<dyn TransferPolicy>> {
    Ok(match arg {
        "optimal" => Box::new(BudgetOptimalPolicy::new(&config.transfers, &config.rules)),
        "none"    => Box::new(NoTransfers),
        predicate => {
            let predicate: TransferPredicate = predicate.parse()?;
            Box::new(ConditionalRandomPolicy::new(predicate))
        }
    })
}

fn print_summary(outcome: &SeasonOutcome) {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {}", outcome.run_id);
    println!("  gameweeks:      {}", outcome.gameweeks.len());
    println!("  total points:   {}", outcome.total_points());
    println!("  transfers:      {}", outcome.transfers_made());
    println!("  budget left:    {:.1}", outcome.leftover_budget);

    println!();
    println!("=== GAMEWEEKS ===");
    for event in &outcome.events {
        match event {
            SimEvent::TransferMade { gameweek, outgoing, incoming, predicted_delta, realized_delta, budget_after, .. } => {
                println!(
                    "  GW{gameweek:<3} transfer  {outgoing} -> {incoming} \
                     (predicted {predicted_delta:+.1}, actual {realized_delta:+}, budget {budget_after:.1})"
                );
            }
            SimEvent::LineupSelected { gameweek, formation, captaincy, substitution } => {
                let sub = substitution
                    .as_ref()
                    .map(|s| format!(", sub {} -> {}", s.off, s.on))
                    .unwrap_or_default();
                println!(
                    "  GW{gameweek:<3} lineup    {formation} C={} VC={}{sub}",
                    captaincy.captain, captaincy.vice_captain
                );
            }
            SimEvent::GameweekScored { gameweek, points, cumulative } => {
                println!("  GW{gameweek:<3} scored    {points:>4}  (season {cumulative})");
            }
            _ => {}
        }
    }
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

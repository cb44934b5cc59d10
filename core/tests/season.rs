//! Full-season simulation through the engine.

mod common;

use common::{config, init_logging, player, season_from, standard_players, standard_squad};
use fpl_sim_core::{
    config::SimConfig,
    data::{select_random_group, InMemorySeason, InitialSquad, SeasonData},
    engine::{accumulate_points, SeasonSimulator},
    error::SimError,
    event::SimEvent,
    player::{Position, Squad},
    rng::SimRng,
    store::SimStore,
    transfer::{BudgetOptimalPolicy, NoTransfers, TransferPolicy},
};
use std::sync::Arc;

fn simulator(data: InMemorySeason, policy: Box<dyn TransferPolicy>) -> SeasonSimulator {
    init_logging();
    SeasonSimulator::new("season-test".into(), 1, config(), Arc::new(data), policy)
}

fn optimal(cfg: &SimConfig) -> Box<dyn TransferPolicy> {
    Box::new(BudgetOptimalPolicy::new(&cfg.transfers, &cfg.rules))
}

fn migrated_store() -> SimStore {
    let store = SimStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
}

/// Gameweeks are processed in ascending order even with gaps.
#[test]
fn non_contiguous_gameweeks_are_all_played() {
    let data = season_from(&[7, 1, 4, 2], &standard_players(), |_, _| {});
    let outcome = simulator(data, Box::new(NoTransfers))
        .run_season(standard_squad(), 0.0)
        .unwrap();

    assert_eq!(outcome.gameweeks, vec![1, 2, 4, 7]);
    assert_eq!(outcome.lineups.len(), 4);
    // 11 starters on 2 points each, plus the captain's extra 2.
    assert_eq!(outcome.points_track, vec![24, 48, 72, 96]);
    assert_eq!(outcome.total_points(), 96);
}

/// The track is a running sum of starter points.
#[test]
fn points_track_accumulates_starter_points() {
    let data = season_from(&[1, 2, 3], &standard_players(), |gw, p| {
        p.total_points = gw as i64;
    });
    let outcome = simulator(data, Box::new(NoTransfers))
        .run_season(standard_squad(), 0.0)
        .unwrap();

    let per_gameweek: Vec<i64> = outcome.lineups.iter().map(|l| l.starter_points()).collect();
    assert_eq!(per_gameweek, vec![12, 24, 36]);
    assert_eq!(outcome.points_track, accumulate_points(&per_gameweek));
    assert!(outcome.points_track.windows(2).all(|w| w[1] >= w[0]));
}

/// Bench players never contribute, however much they score.
#[test]
fn bench_points_do_not_count() {
    let data = season_from(&[1, 2], &standard_players(), |_, p| {
        if matches!(p.name.as_str(), "Ramsdale" | "Toney" | "Dunk" | "Coady") {
            p.total_points = 10;
        }
    });
    let outcome = simulator(data, Box::new(NoTransfers))
        .run_season(standard_squad(), 0.0)
        .unwrap();

    assert_eq!(outcome.points_track, vec![24, 48]);
}

/// A player with no row scores nothing and loses their prediction.
#[test]
fn absent_player_drops_out_of_the_lineup() {
    let data = season_from(&[1, 2], &standard_players(), |_, _| {});
    let rows: Vec<_> = [1, 2]
        .iter()
        .flat_map(|&gw| data.gameweek_rows(gw).to_vec())
        .filter(|p| !(p.gameweek == 2 && p.name == "Salah"))
        .collect();
    let data = InMemorySeason::from_rows(rows);

    let outcome = simulator(data, Box::new(NoTransfers))
        .run_season(standard_squad(), 0.0)
        .unwrap();

    let gw2 = &outcome.lineups[1];
    assert!(!gw2.is_starting("Salah"));
    assert_eq!(gw2.formation(), "3-4-3");
    assert_eq!(gw2.captaincy.captain, "Kane");
    assert_eq!(gw2.starter_points(), 24);

    let absent = outcome.events.iter().find_map(|e| match e {
        SimEvent::StatsRefreshed { gameweek: 2, absent } => Some(absent.clone()),
        _ => None,
    });
    assert_eq!(absent, Some(vec!["Salah".to_string()]));
}

/// The optimal policy buys a clear upgrade and the decision is persisted.
#[test]
fn optimal_transfer_is_made_and_logged() {
    let mut players = standard_players();
    players.push(player("White", Position::Defender, 7.0));
    let data = season_from(&[1, 2], &players, |gw, p| {
        if gw == 1 && p.name == "White" {
            p.predicted_points = 1.0;
        }
    });
    let cfg = config();

    let mut sim = simulator(data, optimal(&cfg)).with_store(migrated_store());
    let outcome = sim.run_season(standard_squad(), 0.0).unwrap();

    assert_eq!(outcome.transfers_made(), 1);
    assert!(outcome.final_squad.contains("White"));
    assert!(!outcome.final_squad.contains("Coady"));
    assert_eq!(outcome.final_squad.len(), 15);
    assert!(outcome.leftover_budget.abs() < 1e-9, "like-for-like price swap");
    assert!(outcome.lineups[1].is_starting("White"));

    let store = sim.store().unwrap();
    assert_eq!(store.event_count("season-test", "transfer_made").unwrap(), 1);
    assert_eq!(store.event_count("season-test", "transfer_skipped").unwrap(), 1);
    assert_eq!(store.event_count("season-test", "lineup_selected").unwrap(), 2);
    assert_eq!(
        store.points_track("season-test").unwrap(),
        vec![(1, outcome.points_track[0]), (2, outcome.points_track[1])]
    );
}

/// Every lineup in a season holds 11 starters, 4 bench and one keeper.
#[test]
fn lineup_invariants_hold_every_gameweek() {
    let mut players = standard_players();
    players.push(player("White", Position::Defender, 9.0));
    players.push(player("Haaland", Position::Forward, 12.0));
    let data = season_from(&[1, 2, 3, 4], &players, |gw, p| {
        if gw % 2 == 0 && p.name == "Son" {
            p.minutes = 0;
            p.total_points = 0;
        }
    });
    let cfg = config();

    let outcome = simulator(data, optimal(&cfg))
        .run_season(standard_squad(), 2.0)
        .unwrap();

    for lineup in &outcome.lineups {
        assert_eq!(lineup.starters.len(), 11);
        assert_eq!(lineup.bench.len(), 4);
        let keepers = lineup
            .starters
            .iter()
            .filter(|p| p.position == Position::Goalkeeper)
            .count();
        assert_eq!(keepers, 1);
    }
    assert_eq!(outcome.final_squad.len(), 15);
    assert!((outcome.leftover_budget - 2.0).abs() < 1e-9, "equal prices leave the budget alone");
}

/// A negative leftover budget is carried through the season untouched.
#[test]
fn negative_budget_is_carried_through() {
    let data = season_from(&[1, 2], &standard_players(), |_, _| {});
    let cfg = config();

    let outcome = simulator(data, optimal(&cfg))
        .run_season(standard_squad(), -0.5)
        .unwrap();

    assert_eq!(outcome.transfers_made(), 0);
    assert_eq!(outcome.leftover_budget, -0.5);
    assert_eq!(outcome.points_track, vec![24, 48]);
}

/// A short squad is warned about up front and then rejected by the organizer.
#[test]
fn short_squad_warns_then_fails() {
    let data = season_from(&[1], &standard_players(), |_, _| {});
    let squad: Squad = standard_squad()
        .into_players()
        .into_iter()
        .filter(|p| p.name != "Coady")
        .collect();

    let mut sim = simulator(data, Box::new(NoTransfers)).with_store(migrated_store());
    let err = sim.run_season(squad, 0.0).unwrap_err();

    assert!(matches!(err, SimError::LineupSize { .. }), "unexpected error: {err}");
    let store = sim.store().unwrap();
    assert_eq!(store.event_count("season-test", "squad_size_warning").unwrap(), 1);
}

#[test]
fn empty_season_is_rejected() {
    let err = simulator(InMemorySeason::default(), Box::new(NoTransfers))
        .run_season(standard_squad(), 0.0)
        .unwrap_err();
    assert!(matches!(err, SimError::EmptySeason));
}

// ── Position groups ──────────────────────────────────────────────────────────

/// Every group member scores; the first gameweek seeds the track. A group
/// is never measured against the full squad size.
#[test]
fn position_group_scores_every_member() {
    let data = season_from(&[1, 2, 3], &standard_players(), |_, _| {});
    let group = select_random_group(&data, Position::Defender, 5, &mut SimRng::new(3, 0)).unwrap();

    let outcome = simulator(data, Box::new(NoTransfers))
        .run_position_group(group, Position::Defender)
        .unwrap();

    assert_eq!(outcome.points_track, vec![10, 20, 30]);
    assert!(outcome.lineups.is_empty());
    let warnings = outcome
        .events
        .iter()
        .filter(|e| matches!(e, SimEvent::SquadSizeWarning { .. }))
        .count();
    assert_eq!(warnings, 0);
}

#[test]
fn random_group_is_distinct_and_single_position() {
    let data = season_from(&[1], &standard_players(), |_, _| {});
    let group = select_random_group(&data, Position::Midfielder, 4, &mut SimRng::new(11, 2)).unwrap();

    assert_eq!(group.len(), 4);
    assert_eq!(group.names().len(), 4);
    assert!(group.iter().all(|p| p.position == Position::Midfielder));
    assert!(group.iter().all(|p| p.bought_for == Some(p.value)));

    let err = select_random_group(&data, Position::Forward, 4, &mut SimRng::new(11, 2));
    assert!(err.is_err(), "only three forwards exist");
}

// ── Initial squad ────────────────────────────────────────────────────────────

#[test]
fn initial_squad_hydrates_from_first_gameweek() {
    let data = season_from(&[3, 5], &standard_players(), |gw, p| {
        p.value = gw as f64;
    });
    let initial = InitialSquad {
        names:           vec!["Salah".into(), "Kane".into()],
        leftover_budget: 1.5,
    };

    let squad = initial.hydrate(&data).unwrap();
    assert_eq!(squad.len(), 2);
    assert!(squad.iter().all(|p| p.gameweek == 3 && p.bought_for == Some(3.0)));

    let unknown = InitialSquad { names: vec!["Nobody".into()], leftover_budget: 0.0 };
    let err = unknown.hydrate(&data).unwrap_err();
    assert!(matches!(err, SimError::UnknownPlayer { gameweek: 3, .. }));
}

//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use fpl_sim_core::{
    config::SimConfig,
    data::InMemorySeason,
    player::{PlayerRecord, Position, Squad},
    types::Gameweek,
};
use std::collections::BTreeMap;

/// Route engine logs through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn kickoff(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 8, 14, hour, 0, 0).unwrap()
}

/// A player who played 90 minutes for their own one-man club.
pub fn player(name: &str, position: Position, predicted: f64) -> PlayerRecord {
    PlayerRecord {
        name:             name.to_string(),
        position,
        gameweek:         1,
        minutes:          90,
        kickoff_time:     kickoff(15),
        total_points:     2,
        value:            5.0,
        bought_for:       None,
        team:             format!("{name} FC"),
        predicted_points: predicted,
        was_home:         true,
        features:         BTreeMap::new(),
    }
}

/// 2 GK, 5 DEF, 5 MID, 3 FWD with distinct predicted points.
///
/// Expected lineup: Alisson; Dias, Cancelo, James; Salah, Son, Fernandes;
/// Kane; flexible slots Vardy, Bowen, Gallagher (3-5-2).
/// Bench: Ramsdale, Toney, Dunk, Coady. Captain Salah, vice Kane.
pub fn standard_players() -> Vec<PlayerRecord> {
    use Position::*;
    vec![
        player("Alisson", Goalkeeper, 6.0),
        player("Ramsdale", Goalkeeper, 4.0),
        player("Dias", Defender, 5.5),
        player("Cancelo", Defender, 5.0),
        player("James", Defender, 4.5),
        player("Dunk", Defender, 3.0),
        player("Coady", Defender, 2.5),
        player("Salah", Midfielder, 9.0),
        player("Son", Midfielder, 7.0),
        player("Fernandes", Midfielder, 6.5),
        player("Bowen", Midfielder, 4.0),
        player("Gallagher", Midfielder, 3.5),
        player("Kane", Forward, 8.0),
        player("Vardy", Forward, 5.2),
        player("Toney", Forward, 3.2),
    ]
}

/// The standard players, signed at their current value.
pub fn standard_squad() -> Squad {
    standard_players().iter().map(|p| p.signed()).collect()
}

/// Copy `players` into every listed gameweek, letting `tweak` adjust each
/// row before it is stored.
pub fn season_from(
    gameweeks: &[Gameweek],
    players:   &[PlayerRecord],
    tweak:     impl Fn(Gameweek, &mut PlayerRecord),
) -> InMemorySeason {
    let mut rows = Vec::new();
    for &gw in gameweeks {
        for p in players {
            let mut row = p.clone();
            row.gameweek = gw;
            row.bought_for = None;
            tweak(gw, &mut row);
            rows.push(row);
        }
    }
    InMemorySeason::from_rows(rows)
}

pub fn config() -> SimConfig {
    SimConfig::default()
}

pub fn names(players: &[PlayerRecord]) -> Vec<String> {
    let mut names: Vec<String> = players.iter().map(|p| p.name.clone()).collect();
    names.sort();
    names
}

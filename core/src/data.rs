//! Season data providers.
//!
//! RULE: The simulator never loads data itself. Every gameweek's rows come
//! from an injected `SeasonData` implementation, so tests, the CLI and the
//! batch evaluator can each supply their own source.

use crate::{
    error::{SimError, SimResult},
    player::{PlayerRecord, Position, Squad},
    rng::SimRng,
    stats::latest_rows,
    types::{Gameweek, PlayerName},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only access to one season's per-gameweek player statistics.
pub trait SeasonData: Send + Sync {
    /// Distinct gameweeks present in the data, ascending.
    fn gameweeks(&self) -> Vec<Gameweek>;

    /// Every row for one gameweek. Players with two fixtures appear twice.
    fn gameweek_rows(&self, gameweek: Gameweek) -> &[PlayerRecord];

    /// Rows for one gameweek restricted to a position.
    fn position_rows(&self, gameweek: Gameweek, position: Position) -> Vec<PlayerRecord> {
        self.gameweek_rows(gameweek)
            .iter()
            .filter(|p| p.position == position)
            .cloned()
            .collect()
    }

    fn first_gameweek(&self) -> SimResult<Gameweek> {
        self.gameweeks().first().copied().ok_or(SimError::EmptySeason)
    }
}

/// A season held entirely in memory, indexed by gameweek.
#[derive(Debug, Clone, Default)]
pub struct InMemorySeason {
    by_gameweek: BTreeMap<Gameweek, Vec<PlayerRecord>>,
}

impl InMemorySeason {
    pub fn from_rows(rows: Vec<PlayerRecord>) -> Self {
        let mut by_gameweek: BTreeMap<Gameweek, Vec<PlayerRecord>> = BTreeMap::new();
        for row in rows {
            by_gameweek.entry(row.gameweek).or_default().push(row);
        }
        Self { by_gameweek }
    }

    /// Load a JSON array of player rows.
    pub fn load_json(path: &str) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let rows: Vec<PlayerRecord> = serde_json::from_str(&content)?;
        log::info!("loaded {} player rows from {path}", rows.len());
        Ok(Self::from_rows(rows))
    }

    pub fn row_count(&self) -> usize {
        self.by_gameweek.values().map(Vec::len).sum()
    }
}

impl SeasonData for InMemorySeason {
    fn gameweeks(&self) -> Vec<Gameweek> {
        self.by_gameweek.keys().copied().collect()
    }

    fn gameweek_rows(&self, gameweek: Gameweek) -> &[PlayerRecord] {
        self.by_gameweek.get(&gameweek).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ── Initial squad ────────────────────────────────────────────────────────────

/// Output of the external initial-selection step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialSquad {
    pub names:           Vec<PlayerName>,
    pub leftover_budget: f64,
}

impl InitialSquad {
    pub fn load_json(path: &str) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Look the named players up in the first gameweek and sign them at
    /// their current value.
    pub fn hydrate(&self, data: &dyn SeasonData) -> SimResult<Squad> {
        let gameweek = data.first_gameweek()?;
        let latest = latest_rows(data.gameweek_rows(gameweek));

        self.names
            .iter()
            .map(|name| {
                latest
                    .get(name.as_str())
                    .map(|row| row.signed())
                    .ok_or_else(|| SimError::UnknownPlayer { name: name.clone(), gameweek })
            })
            .collect::<SimResult<Vec<_>>>()
            .map(Squad::new)
    }
}

/// Sample `size` distinct players of one position from the first gameweek.
pub fn select_random_group(
    data:     &dyn SeasonData,
    position: Position,
    size:     usize,
    rng:      &mut SimRng,
) -> SimResult<Squad> {
    let gameweek = data.first_gameweek()?;
    let mut pool: Vec<&PlayerRecord> = latest_rows(data.gameweek_rows(gameweek))
        .into_values()
        .filter(|p| p.position == position)
        .collect();
    pool.sort_by(|a, b| a.name.cmp(&b.name));

    if pool.len() < size {
        return Err(SimError::Other(anyhow::anyhow!(
            "gameweek {gameweek} has {} {position} players, need {size}",
            pool.len()
        )));
    }

    Ok(rng.sample(&pool, size).into_iter().map(|p| p.signed()).collect())
}

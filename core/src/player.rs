//! Player records and the 15-player squad that owns them.
//!
//! A `PlayerRecord` is one row of gameweek statistics. The same struct is
//! used for market rows (read-only, supplied by `SeasonData`) and for squad
//! members (mutated gameweek-by-gameweek by the simulator).

use crate::types::{Gameweek, PlayerName, Points};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

// ── Position ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "GK", alias = "GKP")]
    Goalkeeper,
    #[serde(rename = "DEF")]
    Defender,
    #[serde(rename = "MID")]
    Midfielder,
    #[serde(rename = "FWD")]
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    pub const OUTFIELD: [Position; 3] = [
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Goalkeeper => "GK",
            Self::Defender   => "DEF",
            Self::Midfielder => "MID",
            Self::Forward    => "FWD",
        }
    }

    pub fn is_outfield(&self) -> bool {
        !matches!(self, Self::Goalkeeper)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GK" | "GKP" => Ok(Self::Goalkeeper),
            "DEF"        => Ok(Self::Defender),
            "MID"        => Ok(Self::Midfielder),
            "FWD"        => Ok(Self::Forward),
            other        => Err(format!("unknown position '{other}'")),
        }
    }
}

// ── PlayerRecord ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name:             PlayerName,
    pub position:         Position,
    #[serde(alias = "GW")]
    pub gameweek:         Gameweek,
    pub minutes:          u32,
    pub kickoff_time:     DateTime<Utc>,
    pub total_points:     Points,
    pub value:            f64,
    /// Price paid when the player entered the squad. Never refreshed.
    #[serde(default)]
    pub bought_for:       Option<f64>,
    /// Club identifier.
    pub team:             String,
    #[serde(default)]
    pub predicted_points: f64,
    #[serde(default)]
    pub was_home:         bool,
    /// Named model inputs such as `recent_total_points`.
    #[serde(default)]
    pub features:         BTreeMap<String, f64>,
}

impl PlayerRecord {
    pub fn has_played(&self) -> bool {
        self.minutes > 0
    }

    /// Look up a numeric field by its source column name.
    pub fn numeric(&self, field: &str) -> Option<f64> {
        match field {
            "total_points"     => Some(self.total_points as f64),
            "predicted_points" => Some(self.predicted_points),
            "minutes"          => Some(self.minutes as f64),
            "value"            => Some(self.value),
            "bought_for"       => self.bought_for,
            _                  => self.features.get(field).copied(),
        }
    }

    /// Look up a boolean field. Numeric features read as `value != 0`.
    pub fn flag(&self, field: &str) -> Option<bool> {
        match field {
            "was_home" => Some(self.was_home),
            _          => self.features.get(field).map(|v| *v != 0.0),
        }
    }

    /// Overwrite this gameweek's statistics from a fresh source row.
    /// `bought_for` and `position` survive untouched.
    pub fn refresh_from(&mut self, row: &PlayerRecord) {
        self.gameweek         = row.gameweek;
        self.minutes          = row.minutes;
        self.kickoff_time     = row.kickoff_time;
        self.total_points     = row.total_points;
        self.value            = row.value;
        self.team             = row.team.clone();
        self.predicted_points = row.predicted_points;
        self.was_home         = row.was_home;
        self.features         = row.features.clone();
    }

    /// Mark the player as absent from a gameweek's fixtures. Every other
    /// field keeps its prior-gameweek value.
    pub fn mark_absent(&mut self) {
        self.total_points     = 0;
        self.predicted_points = 0.0;
    }

    /// Copy of a market row ready to join a squad.
    pub fn signed(&self) -> PlayerRecord {
        let mut player = self.clone();
        player.bought_for = Some(self.value);
        player
    }
}

// ── Squad ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Squad {
    players: Vec<PlayerRecord>,
}

impl Squad {
    pub fn new(players: Vec<PlayerRecord>) -> Self {
        Self { players }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[PlayerRecord] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [PlayerRecord] {
        &mut self.players
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.iter()
    }

    pub fn into_players(self) -> Vec<PlayerRecord> {
        self.players
    }

    pub fn contains(&self, name: &str) -> bool {
        self.players.iter().any(|p| p.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> BTreeSet<PlayerName> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }

    /// Number of squad members per club.
    pub fn club_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for p in &self.players {
            *counts.entry(p.team.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Sum of actual points over every member.
    pub fn total_points(&self) -> Points {
        self.players.iter().map(|p| p.total_points).sum()
    }

    /// Replace `outgoing` with `incoming`. Returns the removed player, or
    /// `None` (leaving the squad untouched) when `outgoing` is not a member.
    pub fn swap(&mut self, outgoing: &str, incoming: PlayerRecord) -> Option<PlayerRecord> {
        let idx = self.players.iter().position(|p| p.name == outgoing)?;
        let removed = self.players.remove(idx);
        self.players.push(incoming);
        Some(removed)
    }
}

impl FromIterator<PlayerRecord> for Squad {
    fn from_iter<I: IntoIterator<Item = PlayerRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = r#"{
        "name": "Mohamed Salah",
        "position": "MID",
        "GW": 3,
        "minutes": 90,
        "kickoff_time": "2021-08-28T16:30:00Z",
        "total_points": 12,
        "value": 12.5,
        "team": "Liverpool",
        "predicted_points": 7.4,
        "features": { "recent_bps": 31.0, "recent_won_game": 1.0 }
    }"#;

    #[test]
    fn parses_a_source_row() {
        let row: PlayerRecord = serde_json::from_str(ROW).unwrap();

        assert_eq!(row.position, Position::Midfielder);
        assert_eq!(row.gameweek, 3);
        assert_eq!(row.bought_for, None);
        assert!(!row.was_home);
        assert_eq!(row.numeric("recent_bps"), Some(31.0));
        assert_eq!(row.numeric("total_points"), Some(12.0));
        assert_eq!(row.flag("recent_won_game"), Some(true));
        assert_eq!(row.numeric("recent_saves"), None);
    }

    #[test]
    fn position_codes() {
        assert_eq!("gkp".parse::<Position>().unwrap(), Position::Goalkeeper);
        assert_eq!(" FWD ".parse::<Position>().unwrap(), Position::Forward);
        assert!("ST".parse::<Position>().is_err());

        let gk: Position = serde_json::from_str("\"GKP\"").unwrap();
        assert_eq!(gk, Position::Goalkeeper);
        assert_eq!(serde_json::to_string(&gk).unwrap(), "\"GK\"");
    }

    #[test]
    fn refresh_keeps_purchase_price() {
        let mut member: PlayerRecord = serde_json::from_str(ROW).unwrap();
        member = member.signed();

        let mut next = member.clone();
        next.gameweek = 4;
        next.value = 13.0;
        next.bought_for = None;
        member.refresh_from(&next);

        assert_eq!(member.gameweek, 4);
        assert_eq!(member.value, 13.0);
        assert_eq!(member.bought_for, Some(12.5));
    }

    #[test]
    fn swap_rejects_non_members() {
        let row: PlayerRecord = serde_json::from_str(ROW).unwrap();
        let mut squad: Squad = std::iter::once(row.clone()).collect();

        assert!(squad.swap("Nobody", row.clone()).is_none());
        assert_eq!(squad.len(), 1);

        let mut incoming = row;
        incoming.name = "Luis Diaz".into();
        let removed = squad.swap("Mohamed Salah", incoming).unwrap();
        assert_eq!(removed.name, "Mohamed Salah");
        assert!(squad.contains("Luis Diaz"));
    }
}

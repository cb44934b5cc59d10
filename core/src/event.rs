//! Decision log: every transfer, substitution and captaincy choice.
//!
//! RULE: Events are reporting output only. Nothing in the simulation reads
//! them back to make a decision.

use crate::{
    lineup::{Captaincy, Substitution},
    player::Position,
    types::{Gameweek, PlayerName, Points, RunId},
};
use serde::{Deserialize, Serialize};

/// Every event emitted during a season simulation.
/// Variants may be added, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Season lifecycle ───────────────────────────
    SeasonStarted {
        run_id:          RunId,
        seed:            u64,
        policy:          String,
        squad_size:      usize,
        leftover_budget: f64,
    },
    SquadSizeWarning {
        expected: usize,
        actual:   usize,
    },
    SeasonCompleted {
        gameweeks:       usize,
        total_points:    Points,
        leftover_budget: f64,
    },

    // ── Per-gameweek decisions ─────────────────────
    StatsRefreshed {
        gameweek: Gameweek,
        absent:   Vec<PlayerName>,
    },
    TransferMade {
        gameweek:        Gameweek,
        outgoing:        PlayerName,
        incoming:        PlayerName,
        position:        Position,
        predicted_delta: f64,
        realized_delta:  Points,
        budget_before:   f64,
        budget_after:    f64,
    },
    TransferSkipped {
        gameweek: Gameweek,
    },
    LineupSelected {
        gameweek:     Gameweek,
        formation:    String,
        captaincy:    Captaincy,
        substitution: Option<Substitution>,
    },
    GameweekScored {
        gameweek:   Gameweek,
        points:     Points,
        cumulative: Points,
    },
}

impl SimEvent {
    /// Stable string name, used for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SeasonStarted { .. }    => "season_started",
            Self::SquadSizeWarning { .. } => "squad_size_warning",
            Self::SeasonCompleted { .. }  => "season_completed",
            Self::StatsRefreshed { .. }   => "stats_refreshed",
            Self::TransferMade { .. }     => "transfer_made",
            Self::TransferSkipped { .. }  => "transfer_skipped",
            Self::LineupSelected { .. }   => "lineup_selected",
            Self::GameweekScored { .. }   => "gameweek_scored",
        }
    }

    /// Gameweek the event belongs to; season-level events report 0.
    pub fn gameweek(&self) -> Gameweek {
        match self {
            Self::StatsRefreshed { gameweek, .. }
            | Self::TransferMade { gameweek, .. }
            | Self::TransferSkipped { gameweek }
            | Self::LineupSelected { gameweek, .. }
            | Self::GameweekScored { gameweek, .. } => *gameweek,
            _ => 0,
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub gameweek:   Gameweek,
    pub event_type: String,
    pub payload:    String, // JSON-serialized SimEvent
}

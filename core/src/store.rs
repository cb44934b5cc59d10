//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The simulator calls store methods and never executes SQL directly.

use crate::{
    error::SimResult,
    event::EventLogEntry,
    types::{Gameweek, Points},
};
use rusqlite::{params, Connection};

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the decision database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; in-memory ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests and batch workers).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, policy: &str, version: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, policy, version) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, seed as i64, policy, version],
        )?;
        Ok(())
    }

    pub fn run_exists(&self, run_id: &str) -> SimResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM run WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, gameweek, event_type, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.run_id, entry.gameweek as i64, entry.event_type, entry.payload],
        )?;
        Ok(())
    }

    pub fn events_for_run(&self, run_id: &str) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, gameweek, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    run_id:     row.get(1)?,
                    gameweek:   row.get::<_, i64>(2)? as Gameweek,
                    event_type: row.get(3)?,
                    payload:    row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, run_id: &str, event_type: &str) -> SimResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Points track ───────────────────────────────────────────

    pub fn save_points_track(
        &self,
        run_id:    &str,
        gameweeks: &[Gameweek],
        track:     &[Points],
    ) -> SimResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (gw, points) in gameweeks.iter().zip(track) {
            tx.execute(
                "INSERT OR REPLACE INTO points_track (run_id, gameweek, cumulative_points)
                 VALUES (?1, ?2, ?3)",
                params![run_id, *gw as i64, points],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn points_track(&self, run_id: &str) -> SimResult<Vec<(Gameweek, Points)>> {
        let mut stmt = self.conn.prepare(
            "SELECT gameweek, cumulative_points FROM points_track
             WHERE run_id = ?1 ORDER BY gameweek ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get::<_, i64>(0)? as Gameweek, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

//! SQLite schema definitions for the ingested dataset
//!
//! Tables:
//! - fight_outcomes: One row per bout on a completed card (the event collection)
//! - fights: Bout metadata
//! - fight_corners: Per-corner counting stats, two rows per fight
//! - fighters: Fighter profiles
//! - upcoming_events / upcoming_fights: Announced cards
//! - fighter_metrics: Aggregated career metrics snapshot

use rusqlite::{Connection, Result};

/// Create all tables in the database
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS fight_outcomes (
            fight_id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL,
            event_name TEXT,
            event_date TEXT,
            location TEXT,
            winner_id TEXT,
            winner_name TEXT
        );

        CREATE TABLE IF NOT EXISTS fights (
            fight_id TEXT PRIMARY KEY,
            event_id TEXT,
            event_name TEXT,
            division TEXT,
            title_fight INTEGER,
            method TEXT,
            method_detail TEXT,
            finish_round INTEGER,
            total_rounds INTEGER,
            match_time_sec INTEGER,
            referee TEXT
        );

        CREATE TABLE IF NOT EXISTS fight_corners (
            fight_id TEXT NOT NULL REFERENCES fights(fight_id) ON DELETE CASCADE,
            corner TEXT NOT NULL,
            fighter_id TEXT NOT NULL,
            fighter_name TEXT,
            kd INTEGER,
            sig_str_landed INTEGER,
            sig_str_attempted INTEGER,
            total_str_landed INTEGER,
            total_str_attempted INTEGER,
            td_landed INTEGER,
            td_attempted INTEGER,
            sub_att INTEGER,
            rev INTEGER,
            ctrl_sec INTEGER,
            head_landed INTEGER,
            head_attempted INTEGER,
            body_landed INTEGER,
            body_attempted INTEGER,
            leg_landed INTEGER,
            leg_attempted INTEGER,
            distance_landed INTEGER,
            distance_attempted INTEGER,
            clinch_landed INTEGER,
            clinch_attempted INTEGER,
            ground_landed INTEGER,
            ground_attempted INTEGER,
            PRIMARY KEY (fight_id, corner)
        );

        CREATE TABLE IF NOT EXISTS fighters (
            fighter_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            nickname TEXT,
            wins INTEGER,
            losses INTEGER,
            draws INTEGER,
            height_cm REAL,
            weight_kg REAL,
            reach_cm REAL,
            stance TEXT,
            dob TEXT,
            splm REAL,
            str_acc REAL,
            sapm REAL,
            str_def REAL,
            td_avg REAL,
            td_acc REAL,
            td_def REAL,
            sub_avg REAL
        );

        CREATE TABLE IF NOT EXISTS upcoming_events (
            event_id TEXT PRIMARY KEY,
            name TEXT,
            event_date TEXT,
            location TEXT
        );

        CREATE TABLE IF NOT EXISTS upcoming_fights (
            fight_id TEXT PRIMARY KEY,
            event_id TEXT,
            event_name TEXT,
            red_id TEXT,
            red_name TEXT,
            blue_id TEXT,
            blue_name TEXT,
            division TEXT,
            title_fight INTEGER
        );

        CREATE TABLE IF NOT EXISTS fighter_metrics (
            fighter_id TEXT PRIMARY KEY,
            name TEXT,
            total_fights INTEGER NOT NULL,
            metrics_json TEXT NOT NULL,
            computed_at TEXT DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_outcomes_event ON fight_outcomes(event_id);
        CREATE INDEX IF NOT EXISTS idx_outcomes_date ON fight_outcomes(event_date);
        CREATE INDEX IF NOT EXISTS idx_corners_fighter ON fight_corners(fighter_id);
        "#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_create_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        // Verify tables exist
        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN
                 ('fight_outcomes', 'fights', 'fight_corners', 'fighters',
                  'upcoming_events', 'upcoming_fights', 'fighter_metrics')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 7);
    }

    #[test]
    fn test_create_tables_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        // Should not fail on second call
        create_tables(&conn).unwrap();
    }
}

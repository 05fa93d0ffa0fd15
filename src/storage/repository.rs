//! SQLite repository for the ingested dataset and metrics snapshot

use anyhow::Context;
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row, Transaction};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use super::schema::create_tables;
use crate::error::PipelineError;
use crate::stats::FighterMetrics;
use crate::types::{
    floor_date, Attempts, Corner, CornerStats, EntityKind, FightOutcome, FightRecord,
    FighterProfile, FinishMethod, UpcomingEvent, UpcomingFight,
};

type StoreResult<T> = std::result::Result<T, PipelineError>;

/// How a save treats rows already on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// The given rows become the whole collection
    Replace,
    /// The given rows are inserted or overwrite by key; other rows stay
    Upsert,
}

/// Repository over every persisted collection
pub struct DatasetStore {
    conn: Connection,
}

impl DatasetStore {
    /// Create a new store, initializing the database if needed
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let conn = Connection::open(db_path).context("Failed to open database")?;

        // Enable foreign keys
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        create_tables(&conn)?;

        Ok(Self { conn })
    }

    /// Open a store that must already exist
    pub fn open_existing(db_path: &Path) -> StoreResult<Self> {
        if !db_path.exists() {
            return Err(PipelineError::NotFound {
                collection: format!("dataset {}", db_path.display()),
            });
        }

        let conn = Connection::open(db_path)?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Create an in-memory store (for testing)
    #[cfg(test)]
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Raw connection, for tests that plant rows the loaders reject
    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ==================== Delta Queries ====================

    /// Identifiers already stored for `kind`
    pub fn known_ids(&self, kind: EntityKind) -> StoreResult<HashSet<String>> {
        let sql = match kind {
            EntityKind::Event => "SELECT DISTINCT event_id FROM fight_outcomes",
            EntityKind::Fight => "SELECT fight_id FROM fights",
            EntityKind::Fighter => "SELECT fighter_id FROM fighters",
            EntityKind::UpcomingEvent => "SELECT event_id FROM upcoming_events",
            EntityKind::UpcomingFight => "SELECT fight_id FROM upcoming_fights",
        };

        let mut stmt = self.conn.prepare(sql)?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    /// Latest stored date for a date-gated kind, or the floor date when the
    /// collection is empty or the kind carries no date
    pub fn watermark(&self, kind: EntityKind) -> StoreResult<NaiveDate> {
        let sql = match kind {
            EntityKind::Event => "SELECT MAX(event_date) FROM fight_outcomes",
            EntityKind::UpcomingEvent => "SELECT MAX(event_date) FROM upcoming_events",
            _ => return Ok(floor_date()),
        };

        let result: Option<String> = self.conn.query_row(sql, [], |row| row.get(0))?;

        Ok(result
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
            .unwrap_or_else(floor_date))
    }

    /// Number of stored entities of `kind`
    pub fn count(&self, kind: EntityKind) -> StoreResult<usize> {
        Ok(self.known_ids(kind)?.len())
    }

    /// Number of fighters with a metrics snapshot
    pub fn metrics_count(&self) -> StoreResult<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM fighter_metrics", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ==================== Load Operations ====================

    pub fn load_outcomes(&self) -> StoreResult<Vec<FightOutcome>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT fight_id, event_id, event_name, event_date, location,
                   winner_id, winner_name
            FROM fight_outcomes
            ORDER BY rowid
            "#,
        )?;

        let outcomes = stmt
            .query_map([], |row| {
                Ok(FightOutcome {
                    fight_id: row.get(0)?,
                    event_id: row.get(1)?,
                    event_name: text(row, 2)?,
                    date: date(row, 3)?,
                    location: text(row, 4)?,
                    winner_id: row.get(5)?,
                    winner_name: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(outcomes)
    }

    pub fn load_fights(&self) -> StoreResult<Vec<FightRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT fight_id, event_id, event_name, division, title_fight, method,
                   method_detail, finish_round, total_rounds, match_time_sec, referee
            FROM fights
            ORDER BY rowid
            "#,
        )?;

        let mut fights = stmt
            .query_map([], |row| {
                let method: Option<String> = row.get(5)?;
                Ok(FightRecord {
                    fight_id: row.get(0)?,
                    event_id: text(row, 1)?,
                    event_name: text(row, 2)?,
                    division: text(row, 3)?,
                    title_fight: row.get::<_, Option<bool>>(4)?.unwrap_or(false),
                    method: method
                        .and_then(|m| m.parse().ok())
                        .unwrap_or(FinishMethod::Other),
                    method_detail: text(row, 6)?,
                    finish_round: count(row, 7)?,
                    total_rounds: row.get(8)?,
                    match_time_sec: row.get::<_, Option<i64>>(9)?.unwrap_or(0),
                    referee: row.get(10)?,
                    red: CornerStats::default(),
                    blue: CornerStats::default(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut corners = self.load_corners()?;
        for fight in &mut fights {
            if let Some(red) = corners.remove(&(fight.fight_id.clone(), Corner::Red)) {
                fight.red = red;
            }
            if let Some(blue) = corners.remove(&(fight.fight_id.clone(), Corner::Blue)) {
                fight.blue = blue;
            }
        }

        Ok(fights)
    }

    fn load_corners(&self) -> StoreResult<HashMap<(String, Corner), CornerStats>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT fight_id, corner, fighter_id, fighter_name, kd,
                   sig_str_landed, sig_str_attempted, total_str_landed, total_str_attempted,
                   td_landed, td_attempted, sub_att, rev, ctrl_sec,
                   head_landed, head_attempted, body_landed, body_attempted,
                   leg_landed, leg_attempted, distance_landed, distance_attempted,
                   clinch_landed, clinch_attempted, ground_landed, ground_attempted
            FROM fight_corners
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                let fight_id: String = row.get(0)?;
                let corner = match row.get::<_, String>(1)?.as_str() {
                    "blue" => Corner::Blue,
                    _ => Corner::Red,
                };
                let stats = CornerStats {
                    fighter_id: row.get(2)?,
                    fighter_name: text(row, 3)?,
                    kd: count(row, 4)?,
                    sig_str: attempts(row, 5)?,
                    total_str: attempts(row, 7)?,
                    td: attempts(row, 9)?,
                    sub_att: count(row, 11)?,
                    rev: count(row, 12)?,
                    ctrl_sec: count(row, 13)?,
                    head: attempts(row, 14)?,
                    body: attempts(row, 16)?,
                    leg: attempts(row, 18)?,
                    distance: attempts(row, 20)?,
                    clinch: attempts(row, 22)?,
                    ground: attempts(row, 24)?,
                };
                Ok(((fight_id, corner), stats))
            })?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;

        Ok(rows)
    }

    pub fn load_fighters(&self) -> StoreResult<Vec<FighterProfile>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT fighter_id, name, nickname, wins, losses, draws, height_cm,
                   weight_kg, reach_cm, stance, dob, splm, str_acc, sapm, str_def,
                   td_avg, td_acc, td_def, sub_avg
            FROM fighters
            ORDER BY rowid
            "#,
        )?;

        let fighters = stmt
            .query_map([], |row| {
                Ok(FighterProfile {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    nickname: row.get(2)?,
                    wins: count(row, 3)?,
                    losses: count(row, 4)?,
                    draws: count(row, 5)?,
                    height_cm: row.get(6)?,
                    weight_kg: row.get(7)?,
                    reach_cm: row.get(8)?,
                    stance: row.get(9)?,
                    dob: row.get(10)?,
                    splm: rate(row, 11)?,
                    str_acc: rate(row, 12)?,
                    sapm: rate(row, 13)?,
                    str_def: rate(row, 14)?,
                    td_avg: rate(row, 15)?,
                    td_acc: rate(row, 16)?,
                    td_def: rate(row, 17)?,
                    sub_avg: rate(row, 18)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(fighters)
    }

    pub fn load_upcoming_events(&self) -> StoreResult<Vec<UpcomingEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, name, event_date, location FROM upcoming_events ORDER BY rowid",
        )?;

        let events = stmt
            .query_map([], |row| {
                Ok(UpcomingEvent {
                    event_id: row.get(0)?,
                    name: text(row, 1)?,
                    date: date(row, 2)?,
                    location: text(row, 3)?,
                    fight_refs: Vec::new(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(events)
    }

    pub fn load_upcoming_fights(&self) -> StoreResult<Vec<UpcomingFight>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT fight_id, event_id, event_name, red_id, red_name, blue_id,
                   blue_name, division, title_fight
            FROM upcoming_fights
            ORDER BY rowid
            "#,
        )?;

        let fights = stmt
            .query_map([], |row| {
                Ok(UpcomingFight {
                    fight_id: row.get(0)?,
                    event_id: text(row, 1)?,
                    event_name: text(row, 2)?,
                    red_id: text(row, 3)?,
                    red_name: text(row, 4)?,
                    blue_id: text(row, 5)?,
                    blue_name: text(row, 6)?,
                    division: text(row, 7)?,
                    title_fight: row.get::<_, Option<bool>>(8)?.unwrap_or(false),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(fights)
    }

    /// Metrics snapshot for one fighter
    pub fn load_fighter_metrics(&self, fighter_id: &str) -> StoreResult<FighterMetrics> {
        let mut stmt = self
            .conn
            .prepare("SELECT metrics_json FROM fighter_metrics WHERE fighter_id = ?1")?;
        let mut rows = stmt.query_map([fighter_id], |row| metrics_json(row, 0))?;

        match rows.next() {
            Some(metrics) => Ok(metrics?),
            None => Err(PipelineError::NotFound {
                collection: format!("metrics for fighter {}", fighter_id),
            }),
        }
    }

    // ==================== Save Operations ====================

    /// Write the completed-data collections in one transaction
    pub fn save_completed(
        &mut self,
        outcomes: &[FightOutcome],
        fights: &[FightRecord],
        fighters: &[FighterProfile],
        mode: SaveMode,
    ) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        write_outcomes(&tx, outcomes, mode)?;
        write_fights(&tx, fights, mode)?;
        write_fighters(&tx, fighters, mode)?;
        tx.commit()?;
        Ok(())
    }

    /// Write the upcoming collections in one transaction
    pub fn save_upcoming(
        &mut self,
        events: &[UpcomingEvent],
        fights: &[UpcomingFight],
        mode: SaveMode,
    ) -> StoreResult<()> {
        let tx = self.conn.transaction()?;

        if mode == SaveMode::Replace {
            tx.execute("DELETE FROM upcoming_events", [])?;
        }
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO upcoming_events (event_id, name, event_date, location)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for event in events {
                stmt.execute(params![
                    event.event_id,
                    event.name,
                    event.date.map(|d| d.to_string()),
                    event.location,
                ])?;
            }
        }

        if mode == SaveMode::Replace {
            tx.execute("DELETE FROM upcoming_fights", [])?;
        }
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO upcoming_fights
                (fight_id, event_id, event_name, red_id, red_name, blue_id, blue_name,
                 division, title_fight)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )?;
            for fight in fights {
                stmt.execute(params![
                    fight.fight_id,
                    fight.event_id,
                    fight.event_name,
                    fight.red_id,
                    fight.red_name,
                    fight.blue_id,
                    fight.blue_name,
                    fight.division,
                    fight.title_fight,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Replace the metrics snapshot
    pub fn save_metrics(&mut self, metrics: &BTreeMap<String, FighterMetrics>) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM fighter_metrics", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO fighter_metrics (fighter_id, name, total_fights, metrics_json)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for (fighter_id, m) in metrics {
                let json = serde_json::to_string(m)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                stmt.execute(params![fighter_id, m.name, m.total_fights, json])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn write_outcomes(
    tx: &Transaction<'_>,
    outcomes: &[FightOutcome],
    mode: SaveMode,
) -> rusqlite::Result<()> {
    if mode == SaveMode::Replace {
        tx.execute("DELETE FROM fight_outcomes", [])?;
    }
    let mut stmt = tx.prepare(
        r#"
        INSERT OR REPLACE INTO fight_outcomes
        (fight_id, event_id, event_name, event_date, location, winner_id, winner_name)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )?;
    for o in outcomes {
        stmt.execute(params![
            o.fight_id,
            o.event_id,
            o.event_name,
            o.date.map(|d| d.to_string()),
            o.location,
            o.winner_id,
            o.winner_name,
        ])?;
    }
    Ok(())
}

fn write_fights(
    tx: &Transaction<'_>,
    fights: &[FightRecord],
    mode: SaveMode,
) -> rusqlite::Result<()> {
    if mode == SaveMode::Replace {
        tx.execute("DELETE FROM fight_corners", [])?;
        tx.execute("DELETE FROM fights", [])?;
    }

    let mut fight_stmt = tx.prepare(
        r#"
        INSERT OR REPLACE INTO fights
        (fight_id, event_id, event_name, division, title_fight, method, method_detail,
         finish_round, total_rounds, match_time_sec, referee)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )?;
    let mut corner_stmt = tx.prepare(
        r#"
        INSERT OR REPLACE INTO fight_corners
        (fight_id, corner, fighter_id, fighter_name, kd,
         sig_str_landed, sig_str_attempted, total_str_landed, total_str_attempted,
         td_landed, td_attempted, sub_att, rev, ctrl_sec,
         head_landed, head_attempted, body_landed, body_attempted,
         leg_landed, leg_attempted, distance_landed, distance_attempted,
         clinch_landed, clinch_attempted, ground_landed, ground_attempted)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)
        "#,
    )?;

    for fight in fights {
        fight_stmt.execute(params![
            fight.fight_id,
            fight.event_id,
            fight.event_name,
            fight.division,
            fight.title_fight,
            fight.method.as_str(),
            fight.method_detail,
            fight.finish_round,
            fight.total_rounds,
            fight.match_time_sec,
            fight.referee,
        ])?;

        for corner in Corner::BOTH {
            let c = fight.corner(corner);
            corner_stmt.execute(params![
                fight.fight_id,
                corner.as_str(),
                c.fighter_id,
                c.fighter_name,
                c.kd,
                c.sig_str.landed,
                c.sig_str.attempted,
                c.total_str.landed,
                c.total_str.attempted,
                c.td.landed,
                c.td.attempted,
                c.sub_att,
                c.rev,
                c.ctrl_sec,
                c.head.landed,
                c.head.attempted,
                c.body.landed,
                c.body.attempted,
                c.leg.landed,
                c.leg.attempted,
                c.distance.landed,
                c.distance.attempted,
                c.clinch.landed,
                c.clinch.attempted,
                c.ground.landed,
                c.ground.attempted,
            ])?;
        }
    }
    Ok(())
}

fn write_fighters(
    tx: &Transaction<'_>,
    fighters: &[FighterProfile],
    mode: SaveMode,
) -> rusqlite::Result<()> {
    if mode == SaveMode::Replace {
        tx.execute("DELETE FROM fighters", [])?;
    }
    let mut stmt = tx.prepare(
        r#"
        INSERT OR REPLACE INTO fighters
        (fighter_id, name, nickname, wins, losses, draws, height_cm, weight_kg,
         reach_cm, stance, dob, splm, str_acc, sapm, str_def, td_avg, td_acc,
         td_def, sub_avg)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                ?16, ?17, ?18, ?19)
        "#,
    )?;
    for f in fighters {
        stmt.execute(params![
            f.id,
            f.name,
            f.nickname,
            f.wins,
            f.losses,
            f.draws,
            f.height_cm,
            f.weight_kg,
            f.reach_cm,
            f.stance,
            f.dob,
            f.splm,
            f.str_acc,
            f.sapm,
            f.str_def,
            f.td_avg,
            f.td_acc,
            f.td_def,
            f.sub_avg,
        ])?;
    }
    Ok(())
}

// Null columns load as zero / empty so records leave the store fully materialized

fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

fn count(row: &Row<'_>, idx: usize) -> rusqlite::Result<u32> {
    Ok(row.get::<_, Option<u32>>(idx)?.unwrap_or(0))
}

fn rate(row: &Row<'_>, idx: usize) -> rusqlite::Result<f64> {
    Ok(row.get::<_, Option<f64>>(idx)?.unwrap_or(0.0))
}

fn attempts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Attempts> {
    Ok(Attempts::new(count(row, idx)?, count(row, idx + 1)?))
}

fn date(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let value: Option<String> = row.get(idx)?;
    Ok(value.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()))
}

fn metrics_json(row: &Row<'_>, idx: usize) -> rusqlite::Result<FighterMetrics> {
    let json: String = row.get(idx)?;
    serde_json::from_str(&json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

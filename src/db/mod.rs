//! Database module - SQLite storage for plans, performances, profiles and chats
//!
//! Each store keeps one JSON document per row, keyed by record id, with the
//! columns needed for lookups pulled out alongside it.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::coach::Conversation;
use crate::equipment::EquipmentProfile;
use crate::plan::WorkoutPlan;
use crate::tracker::WorkoutPerformance;

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// In-memory database for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS plans (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                data TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS performances (
                id TEXT PRIMARY KEY,
                workout_day_id TEXT NOT NULL,
                date TEXT NOT NULL,
                data TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_performances_day ON performances (workout_day_id);
            CREATE INDEX IF NOT EXISTS idx_performances_date ON performances (date);
            CREATE TABLE IF NOT EXISTS equipment_profiles (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                is_default INTEGER NOT NULL,
                data TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                updated_at INTEGER NOT NULL,
                data TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    // --- plans ---

    pub fn put_plan(&self, plan: &WorkoutPlan) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO plans (id, name, data) VALUES (?1, ?2, ?3)",
            params![plan.id, plan.name, serde_json::to_string(plan)?],
        )?;
        Ok(())
    }

    pub fn plans(&self) -> Result<Vec<WorkoutPlan>> {
        let mut stmt = self.conn.prepare("SELECT data FROM plans ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.map(decode_row).collect()
    }

    pub fn plan(&self, id: &str) -> Result<Option<WorkoutPlan>> {
        self.conn
            .query_row("SELECT data FROM plans WHERE id = ?1", params![id], |row| {
                row.get::<_, String>(0)
            })
            .optional()?
            .map(|data| decode(&data))
            .transpose()
    }

    // --- performances ---

    pub fn put_performance(&self, performance: &WorkoutPerformance) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO performances (id, workout_day_id, date, data)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                performance.id,
                performance.workout_day_id,
                performance.date,
                serde_json::to_string(performance)?,
            ],
        )?;
        Ok(())
    }

    pub fn performances(&self) -> Result<Vec<WorkoutPerformance>> {
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM performances ORDER BY date DESC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.map(decode_row).collect()
    }

    pub fn performances_for_day(&self, workout_day_id: &str) -> Result<Vec<WorkoutPerformance>> {
        let mut stmt = self.conn.prepare(
            "SELECT data FROM performances WHERE workout_day_id = ?1 ORDER BY date DESC",
        )?;
        let rows = stmt.query_map(params![workout_day_id], |row| row.get::<_, String>(0))?;
        rows.map(decode_row).collect()
    }

    /// Performances with a date in the inclusive [start, end] range (YYYY-MM-DD)
    pub fn performances_in_range(&self, start: &str, end: &str) -> Result<Vec<WorkoutPerformance>> {
        let mut stmt = self.conn.prepare(
            "SELECT data FROM performances WHERE date >= ?1 AND date <= ?2 ORDER BY date",
        )?;
        let rows = stmt.query_map(params![start, end], |row| row.get::<_, String>(0))?;
        rows.map(decode_row).collect()
    }

    pub fn latest_performance_for_day(
        &self,
        workout_day_id: &str,
    ) -> Result<Option<WorkoutPerformance>> {
        self.conn
            .query_row(
                "SELECT data FROM performances WHERE workout_day_id = ?1
                 ORDER BY date DESC LIMIT 1",
                params![workout_day_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(|data| decode(&data))
            .transpose()
    }

    // --- equipment profiles ---

    pub fn put_profile(&self, profile: &EquipmentProfile) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO equipment_profiles (id, name, is_default, data)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                profile.id,
                profile.name,
                profile.is_default as i64,
                serde_json::to_string(profile)?,
            ],
        )?;
        Ok(())
    }

    pub fn profiles(&self) -> Result<Vec<EquipmentProfile>> {
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM equipment_profiles ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.map(decode_row).collect()
    }

    pub fn default_profile(&self) -> Result<Option<EquipmentProfile>> {
        self.conn
            .query_row(
                "SELECT data FROM equipment_profiles WHERE is_default = 1 LIMIT 1",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(|data| decode(&data))
            .transpose()
    }

    // --- conversations ---

    pub fn put_conversation(&self, conversation: &Conversation) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO conversations (id, updated_at, data) VALUES (?1, ?2, ?3)",
            params![
                conversation.id,
                conversation.updated_at,
                serde_json::to_string(conversation)?,
            ],
        )?;
        Ok(())
    }

    pub fn conversation(&self, id: &str) -> Result<Option<Conversation>> {
        self.conn
            .query_row(
                "SELECT data FROM conversations WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(|data| decode(&data))
            .transpose()
    }

    /// All conversations, most recently updated first
    pub fn conversations(&self) -> Result<Vec<Conversation>> {
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM conversations ORDER BY updated_at DESC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.map(decode_row).collect()
    }

    pub fn delete_conversation(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM conversations WHERE id = ?1", params![id])?;
        Ok(())
    }
}

fn decode<T: serde::de::DeserializeOwned>(data: &str) -> Result<T> {
    serde_json::from_str(data).context("corrupt record in database")
}

fn decode_row<T: serde::de::DeserializeOwned>(
    row: std::result::Result<String, rusqlite::Error>,
) -> Result<T> {
    decode(&row?)
}

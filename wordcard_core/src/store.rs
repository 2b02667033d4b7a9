//! Persistence for the word list and the test result history

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use tracing::debug;

use crate::error::Result;
use crate::session::ResultRecord;
use crate::words::WordEntry;

/// Where the word list lives between runs.
pub trait WordStore {
    fn load(&self) -> Result<Vec<WordEntry>>;
    fn save(&mut self, entries: &[WordEntry]) -> Result<()>;
}

/// Append-only log of finished test sessions.
pub trait ResultStore {
    fn append(&mut self, record: &ResultRecord) -> Result<()>;
    fn load_all(&self) -> Result<Vec<ResultRecord>>;
    fn clear(&mut self) -> Result<()>;
}

/// SQLite-backed store for both words and results.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file and make sure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS words (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                position INTEGER NOT NULL,
                term TEXT NOT NULL,
                definition TEXT NOT NULL,
                tag TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                taken_at TEXT NOT NULL,
                correct INTEGER NOT NULL,
                wrong INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                total INTEGER NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }

    /// Delete every word and the whole result history.
    pub fn wipe_all(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM words", [])?;
        tx.execute("DELETE FROM results", [])?;
        tx.commit()?;
        Ok(())
    }

    pub fn word_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM words", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl WordStore for SqliteStore {
    fn load(&self) -> Result<Vec<WordEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT term, definition, tag FROM words ORDER BY position ASC, id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(WordEntry {
                term: row.get(0)?,
                definition: row.get(1)?,
                tag: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            })
        })?;

        let mut words = Vec::new();
        for row in rows {
            words.push(row?);
        }
        Ok(words)
    }

    fn save(&mut self, entries: &[WordEntry]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM words", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO words (position, term, definition, tag) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, entry) in entries.iter().enumerate() {
                insert.execute(params![
                    position as i64,
                    entry.term,
                    entry.definition,
                    entry.tag
                ])?;
            }
        }
        tx.commit()?;
        debug!(count = entries.len(), "saved word list");
        Ok(())
    }
}

impl ResultStore for SqliteStore {
    fn append(&mut self, record: &ResultRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO results (taken_at, correct, wrong, accuracy, total)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.timestamp.to_rfc3339(),
                record.correct_count as i64,
                record.wrong_count as i64,
                record.accuracy_percent as i64,
                record.total_questions as i64
            ],
        )?;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ResultRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT taken_at, correct, wrong, accuracy, total FROM results ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let taken_at: String = row.get(0)?;
            let timestamp = DateTime::parse_from_rfc3339(&taken_at)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?
                .with_timezone(&Utc);
            Ok(ResultRecord {
                timestamp,
                correct_count: row.get::<_, i64>(1)? as usize,
                wrong_count: row.get::<_, i64>(2)? as usize,
                accuracy_percent: row.get::<_, i64>(3)? as u32,
                total_questions: row.get::<_, i64>(4)? as usize,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn clear(&mut self) -> Result<()> {
        self.conn.execute("DELETE FROM results", [])?;
        Ok(())
    }
}

/// In-process store, for tests and for hosts that persist on their own.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pub words: Vec<WordEntry>,
    pub results: Vec<ResultRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WordStore for MemoryStore {
    fn load(&self) -> Result<Vec<WordEntry>> {
        Ok(self.words.clone())
    }

    fn save(&mut self, entries: &[WordEntry]) -> Result<()> {
        self.words = entries.to_vec();
        Ok(())
    }
}

impl ResultStore for MemoryStore {
    fn append(&mut self, record: &ResultRecord) -> Result<()> {
        self.results.push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ResultRecord>> {
        Ok(self.results.clone())
    }

    fn clear(&mut self) -> Result<()> {
        self.results.clear();
        Ok(())
    }
}

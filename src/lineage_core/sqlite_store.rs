//! SQLite-backed transaction store
//!
//! Read-only view over the tables populated by the league sync process.
//! Opens the database in WAL + query_only mode so report builds never take
//! write locks. Missing player/team/franchise joins degrade to "Unknown"
//! projections with a warning instead of failing the read.

use super::model::{FranchiseInfo, PlayerInfo, Transaction, TransactionGroup, TransactionKind};
use super::store::{StoreError, TransactionStore};
use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Idempotent schema for the archive tables.
///
/// The sync process owns these tables in production; this is used by tests
/// and by standalone tooling that needs to seed a fresh database.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS franchises (
            id          INTEGER PRIMARY KEY,
            main_name   TEXT NOT NULL,
            color       TEXT NOT NULL DEFAULT '#888888'
        );

        CREATE TABLE IF NOT EXISTS players (
            id          INTEGER PRIMARY KEY,
            name        TEXT NOT NULL,
            position    TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS teams (
            id           INTEGER PRIMARY KEY,
            franchise_id INTEGER NOT NULL REFERENCES franchises(id),
            year         INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS transaction_groups (
            id          INTEGER PRIMARY KEY,
            date        INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS transactions (
            id                       INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id                INTEGER NOT NULL,
            team_id                  INTEGER NOT NULL,
            kind                     TEXT NOT NULL,
            timestamp                INTEGER NOT NULL,
            description              TEXT,
            group_id                 INTEGER REFERENCES transaction_groups(id),
            player_transaction_index INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_transactions_player_time
            ON transactions(player_id, timestamp, id);
        CREATE INDEX IF NOT EXISTS idx_transactions_group
            ON transactions(group_id);
        "#,
    )
}

const TRANSACTION_COLUMNS: &str = "t.id, t.player_id, p.name, p.position, \
     tm.franchise_id, f.main_name, f.color, tm.year, \
     t.kind, t.timestamp, t.description, t.group_id, t.player_transaction_index";

/// SQLite implementation of [`TransactionStore`].
pub struct SqliteTransactionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTransactionStore {
    /// Open the archive database read-only.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        // Must come after the PRAGMAs above
        conn.execute("PRAGMA query_only = ON", [])?;

        log::info!("📥 Transaction store opened (read-only, WAL)");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn load_group(conn: &Connection, group_id: i64) -> Result<Option<TransactionGroup>, StoreError> {
        let date: Option<i64> = conn
            .query_row(
                "SELECT date FROM transaction_groups WHERE id = ?1",
                [group_id],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        let Some(date) = date else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS}
             FROM transactions t
             LEFT JOIN players p ON p.id = t.player_id
             LEFT JOIN teams tm ON tm.id = t.team_id
             LEFT JOIN franchises f ON f.id = tm.franchise_id
             WHERE t.group_id = ?1
             ORDER BY t.timestamp ASC, t.id ASC"
        ))?;

        let transactions = stmt
            .query_map([group_id], row_to_transaction)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(TransactionGroup {
            id: group_id,
            date,
            transactions,
        }))
    }
}

/// Map a joined row to a display-safe [`Transaction`].
///
/// NULLs from the LEFT JOINs mean the sync process referenced a missing
/// player/team/franchise; substitute "Unknown" labels and keep going.
fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    let id: i64 = row.get(0)?;
    let player_id: i64 = row.get(1)?;

    let player_name: Option<String> = row.get(2)?;
    let player_name = player_name.unwrap_or_else(|| {
        log::warn!("Transaction {} references missing player {}", id, player_id);
        "Unknown Player".to_string()
    });
    let position: Option<String> = row.get(3)?;

    let franchise_id: Option<i64> = row.get(4)?;
    let franchise_id = franchise_id.unwrap_or_else(|| {
        log::warn!("Transaction {} references missing team/franchise", id);
        0
    });
    let franchise_name: Option<String> = row.get(5)?;
    let franchise_color: Option<String> = row.get(6)?;
    let year: Option<i32> = row.get(7)?;

    let kind_str: String = row.get(8)?;
    let kind = match TransactionKind::from_str(&kind_str) {
        Some(kind) => kind,
        None => return Err(rusqlite::Error::InvalidQuery),
    };

    Ok(Transaction {
        id,
        player: PlayerInfo {
            id: player_id,
            name: player_name,
            position: position.unwrap_or_default(),
        },
        franchise: FranchiseInfo {
            id: franchise_id,
            name: franchise_name.unwrap_or_else(|| "Unknown Franchise".to_string()),
            color: franchise_color.unwrap_or_else(|| "#888888".to_string()),
        },
        year: year.unwrap_or(0),
        kind,
        timestamp: row.get(9)?,
        description: row.get(10)?,
        group_id: row.get(11)?,
        player_transaction_index: row.get(12)?,
    })
}

#[async_trait]
impl TransactionStore for SqliteTransactionStore {
    async fn get_transaction_group(
        &self,
        group_id: i64,
    ) -> Result<Option<TransactionGroup>, StoreError> {
        let conn = self.conn.lock().unwrap();
        Self::load_group(&conn, group_id)
    }

    async fn next_transaction_for_player(
        &self,
        player_id: i64,
        from_timestamp: i64,
        exclude_transaction_id: i64,
    ) -> Result<Option<Transaction>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS}
             FROM transactions t
             LEFT JOIN players p ON p.id = t.player_id
             LEFT JOIN teams tm ON tm.id = t.team_id
             LEFT JOIN franchises f ON f.id = tm.franchise_id
             WHERE t.player_id = ?1
               AND t.timestamp >= ?2
               AND t.id != ?3
               AND t.kind != 'VETOED_TRADE'
             ORDER BY t.timestamp ASC, t.id ASC
             LIMIT 1"
        ))?;

        let mut rows = stmt.query_map(
            rusqlite::params![player_id, from_timestamp, exclude_transaction_id],
            row_to_transaction,
        )?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    async fn list_trade_groups(&self) -> Result<Vec<TransactionGroup>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT g.id FROM transaction_groups g
             WHERE EXISTS (
                 SELECT 1 FROM transactions t
                 WHERE t.group_id = g.id AND t.kind = 'TRADED'
             )
             ORDER BY g.date ASC, g.id ASC",
        )?;
        let group_ids: Vec<i64> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);

        let mut groups = Vec::with_capacity(group_ids.len());
        for group_id in group_ids {
            if let Some(group) = Self::load_group(&conn, group_id)? {
                groups.push(group);
            }
        }

        Ok(groups)
    }
}

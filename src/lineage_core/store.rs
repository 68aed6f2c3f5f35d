//! Read interface over the archived transaction history
//!
//! The lineage builder and summarizer only ever read; ingestion and schema
//! management belong to the sync process. Implementations must resolve
//! player/team/franchise joins to display-safe projections and must exclude
//! vetoed trades from forward-scan candidates entirely.

use super::model::{Transaction, TransactionGroup};
use async_trait::async_trait;

#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Read-only access to transaction history.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Fetch a transaction group with all member transactions, ordered by
    /// (timestamp, id). Returns `None` if the group does not exist.
    async fn get_transaction_group(
        &self,
        group_id: i64,
    ) -> Result<Option<TransactionGroup>, StoreError>;

    /// Earliest transaction for `player_id` at or after `from_timestamp`,
    /// excluding `exclude_transaction_id`, ordered by (timestamp, id).
    ///
    /// Vetoed trades never qualify as candidates.
    async fn next_transaction_for_player(
        &self,
        player_id: i64,
        from_timestamp: i64,
        exclude_transaction_id: i64,
    ) -> Result<Option<Transaction>, StoreError>;

    /// All groups containing at least one Traded leg, ordered by (date, id),
    /// each with member transactions loaded.
    async fn list_trade_groups(&self) -> Result<Vec<TransactionGroup>, StoreError>;
}

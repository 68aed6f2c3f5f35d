//! Lineage Core - Trade History Reconstruction Engine
//!
//! This module reconstructs what became of every player moved in a trade:
//! for each traded player it walks the forward transaction history across
//! team boundaries until the branch terminates (drop, draft, add, or still
//! rostered) and folds in downstream trades that re-involve the players.
//!
//! # Architecture
//!
//! ```text
//! SQLite Database → TransactionStore (get group / next tx per player)
//!     ↓
//! TradeGroupSummarizer (by-year trade list, descriptions, sides)
//!     ↓ selected trade group
//! TradeLineageBuilder (forward walk, cycle guard, trade expansion)
//!     ↓
//! LineageForest → JSON boundary (trade_report binary)
//! ```

pub mod builder;
pub mod memory_store;
pub mod model;
pub mod sqlite_store;
pub mod store;
pub mod summary;

pub use builder::{LineageError, LineageForest, LineageNode, TradeLineageBuilder};
pub use memory_store::MemoryTransactionStore;
pub use model::{FranchiseInfo, PlayerInfo, Transaction, TransactionGroup, TransactionKind};
pub use sqlite_store::SqliteTransactionStore;
pub use store::{StoreError, TransactionStore};
pub use summary::{TradeGroupSummarizer, TradeSide, TradeSummary};

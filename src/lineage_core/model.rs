//! Core records for the league transaction archive
//!
//! Everything here is a read-only projection of already-ingested rows. The
//! store resolves missing player/team/franchise joins to display-safe
//! "Unknown" values, so the lineage logic never has to null-check navigation
//! chains.

use serde::{Deserialize, Serialize};

/// Transaction kind as recorded by the league sync process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "TRADED")]
    Traded,
    #[serde(rename = "DRAFT_PICKED")]
    DraftPicked,
    #[serde(rename = "DROPPED")]
    Dropped,
    #[serde(rename = "ADDED")]
    Added,
    #[serde(rename = "KEPT")]
    Kept,
    #[serde(rename = "VETOED_TRADE")]
    VetoedTrade,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Traded => "TRADED",
            TransactionKind::DraftPicked => "DRAFT_PICKED",
            TransactionKind::Dropped => "DROPPED",
            TransactionKind::Added => "ADDED",
            TransactionKind::Kept => "KEPT",
            TransactionKind::VetoedTrade => "VETOED_TRADE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TRADED" => Some(TransactionKind::Traded),
            "DRAFT_PICKED" => Some(TransactionKind::DraftPicked),
            "DROPPED" => Some(TransactionKind::Dropped),
            "ADDED" => Some(TransactionKind::Added),
            "KEPT" => Some(TransactionKind::Kept),
            "VETOED_TRADE" => Some(TransactionKind::VetoedTrade),
            _ => None,
        }
    }

    /// Kinds that close a lineage branch: the player's prior ownership
    /// context ends here (drafted fresh, or dropped/added outside trade
    /// context).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionKind::DraftPicked | TransactionKind::Dropped | TransactionKind::Added
        )
    }

    /// Kinds that continue a lineage chain.
    pub fn continues_lineage(&self) -> bool {
        matches!(self, TransactionKind::Traded | TransactionKind::Kept)
    }
}

/// Display-safe player projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: i64,
    pub name: String,
    pub position: String,
}

/// Display-safe franchise projection (resolved through the team the
/// transaction belongs to).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FranchiseInfo {
    pub id: i64,
    pub name: String,
    pub color: String,
}

/// One atomic roster event: a player moving onto or off of one team at one
/// point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub player: PlayerInfo,
    pub franchise: FranchiseInfo,
    /// Season year of the team the transaction belongs to.
    pub year: i32,
    pub kind: TransactionKind,
    /// Unix timestamp. Ties between same-timestamp events are broken by id.
    pub timestamp: i64,
    pub description: Option<String>,
    /// Set for every Traded transaction; links all legs of a multi-team
    /// trade together.
    pub group_id: Option<i64>,
    /// Stable per-player ordering among same-timestamp events, as recorded
    /// by the sync process.
    pub player_transaction_index: i32,
}

/// A set of transactions that occurred as one logical event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionGroup {
    pub id: i64,
    /// Unix date of the event.
    pub date: i64,
    /// Member transactions, ordered by (timestamp, id).
    pub transactions: Vec<Transaction>,
}

impl TransactionGroup {
    /// The Traded legs of this group.
    pub fn traded_legs(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Traded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            TransactionKind::Traded,
            TransactionKind::DraftPicked,
            TransactionKind::Dropped,
            TransactionKind::Added,
            TransactionKind::Kept,
            TransactionKind::VetoedTrade,
        ] {
            assert_eq!(TransactionKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(TransactionKind::from_str("WAIVED"), None);
    }

    #[test]
    fn test_terminal_classification() {
        assert!(TransactionKind::DraftPicked.is_terminal());
        assert!(TransactionKind::Dropped.is_terminal());
        assert!(TransactionKind::Added.is_terminal());
        assert!(!TransactionKind::Traded.is_terminal());
        assert!(!TransactionKind::Kept.is_terminal());
        // Vetoed trades are inert: neither terminal nor continuing
        assert!(!TransactionKind::VetoedTrade.is_terminal());
        assert!(!TransactionKind::VetoedTrade.continues_lineage());
    }

    #[test]
    fn test_continues_lineage() {
        assert!(TransactionKind::Traded.continues_lineage());
        assert!(TransactionKind::Kept.continues_lineage());
        assert!(!TransactionKind::Dropped.continues_lineage());
    }
}

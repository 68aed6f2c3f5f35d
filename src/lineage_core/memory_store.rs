//! In-memory transaction store
//!
//! Backs builder and summarizer tests, and small fixture datasets, with the
//! same query semantics as the SQLite store (ordering, veto filtering,
//! trade-group discovery).

use super::model::{Transaction, TransactionGroup, TransactionKind};
use super::store::{StoreError, TransactionStore};
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryTransactionStore {
    group_dates: HashMap<i64, i64>,
    transactions: Vec<Transaction>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&mut self, group_id: i64, date: i64) {
        self.group_dates.insert(group_id, date);
    }

    pub fn add_transaction(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    fn members_of(&self, group_id: i64) -> Vec<Transaction> {
        let mut members: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.group_id == Some(group_id))
            .cloned()
            .collect();
        members.sort_by_key(|t| (t.timestamp, t.id));
        members
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn get_transaction_group(
        &self,
        group_id: i64,
    ) -> Result<Option<TransactionGroup>, StoreError> {
        let Some(&date) = self.group_dates.get(&group_id) else {
            return Ok(None);
        };

        Ok(Some(TransactionGroup {
            id: group_id,
            date,
            transactions: self.members_of(group_id),
        }))
    }

    async fn next_transaction_for_player(
        &self,
        player_id: i64,
        from_timestamp: i64,
        exclude_transaction_id: i64,
    ) -> Result<Option<Transaction>, StoreError> {
        let next = self
            .transactions
            .iter()
            .filter(|t| {
                t.player.id == player_id
                    && t.timestamp >= from_timestamp
                    && t.id != exclude_transaction_id
                    && t.kind != TransactionKind::VetoedTrade
            })
            .min_by_key(|t| (t.timestamp, t.id))
            .cloned();

        Ok(next)
    }

    async fn list_trade_groups(&self) -> Result<Vec<TransactionGroup>, StoreError> {
        let mut groups: Vec<TransactionGroup> = Vec::new();

        for (&group_id, &date) in &self.group_dates {
            let members = self.members_of(group_id);
            if members.iter().any(|t| t.kind == TransactionKind::Traded) {
                groups.push(TransactionGroup {
                    id: group_id,
                    date,
                    transactions: members,
                });
            }
        }

        groups.sort_by_key(|g| (g.date, g.id));
        Ok(groups)
    }
}

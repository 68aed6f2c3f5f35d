//! Trade lineage builder
//!
//! Reconstructs the forward chain of transactions for every player moved in
//! one trade event. Each traded player becomes a root; the walk follows the
//! player's history in (timestamp, id) order until a terminal event (drop,
//! draft, add), the end of history, or a would-be cycle. A downstream trade
//! expands into the full sibling group so the players coming back the other
//! way are tracked too, as long as they land with a franchise that was party
//! to the original trade.

use super::model::{Transaction, TransactionKind};
use super::store::{StoreError, TransactionStore};
use super::summary::describe_trade;
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

#[derive(Debug)]
pub enum LineageError {
    /// The requested group does not exist or contains no Traded leg.
    NotFound(i64),
    Store(StoreError),
}

impl From<StoreError> for LineageError {
    fn from(err: StoreError) -> Self {
        LineageError::Store(err)
    }
}

impl std::fmt::Display for LineageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineageError::NotFound(id) => write!(f, "No trade found for transaction group {}", id),
            LineageError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for LineageError {}

/// One node in a reconstructed lineage tree.
#[derive(Debug, Clone, Serialize)]
pub struct LineageNode {
    pub transaction: Transaction,
    pub children: Vec<LineageNode>,
    /// True iff no further transaction continues this player's chain.
    pub is_end_node: bool,
}

impl LineageNode {
    fn new(transaction: Transaction) -> Self {
        Self {
            transaction,
            children: Vec::new(),
            is_end_node: false,
        }
    }
}

/// The lineage output for one trade event: one root per traded player.
#[derive(Debug, Clone, Serialize)]
pub struct LineageForest {
    pub group_id: i64,
    pub date: i64,
    pub description: String,
    pub roots: Vec<LineageNode>,
}

/// Cycle-guard key: a transaction already incorporated for a given player.
type VisitedKey = (i64, i64);

type ExtendFuture<'a> = Pin<Box<dyn Future<Output = Result<(), LineageError>> + Send + 'a>>;

pub struct TradeLineageBuilder<S> {
    store: Arc<S>,
}

impl<S: TransactionStore> TradeLineageBuilder<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Build the lineage forest for one trade event.
    ///
    /// Fails with [`LineageError::NotFound`] if the group does not exist or
    /// has no Traded leg. Everything else degrades to a smaller tree rather
    /// than aborting: the lineage is a best-effort historical reconstruction.
    pub async fn build_lineage(&self, group_id: i64) -> Result<LineageForest, LineageError> {
        let group = self
            .store
            .get_transaction_group(group_id)
            .await?
            .ok_or(LineageError::NotFound(group_id))?;

        let root_transactions: Vec<Transaction> = group.traded_legs().cloned().collect();
        if root_transactions.is_empty() {
            return Err(LineageError::NotFound(group_id));
        }

        // Franchises that received a player in this event. Once a player
        // later leaves this set, their branch stops being tracked.
        let origin_franchises: HashSet<i64> =
            root_transactions.iter().map(|t| t.franchise.id).collect();

        // Shared across the whole forest build
        let mut visited: HashSet<VisitedKey> = HashSet::new();

        let mut roots = Vec::with_capacity(root_transactions.len());
        for transaction in root_transactions {
            let mut root = LineageNode::new(transaction.clone());
            self.extend_forward(
                &mut root,
                transaction.player.id,
                transaction.timestamp,
                transaction.id,
                &mut visited,
                &origin_franchises,
            )
            .await?;
            roots.push(root);
        }

        log::debug!(
            "Built lineage forest for group {}: {} roots, {} transactions visited",
            group_id,
            roots.len(),
            visited.len()
        );

        Ok(LineageForest {
            group_id: group.id,
            date: group.date,
            description: describe_trade(&group),
            roots,
        })
    }

    /// Extend `current` with the player's next transaction at or after
    /// `from_timestamp`, excluding `exclude_id`.
    ///
    /// Recursive over async store reads, so the future is boxed.
    fn extend_forward<'a>(
        &'a self,
        current: &'a mut LineageNode,
        player_id: i64,
        from_timestamp: i64,
        exclude_id: i64,
        visited: &'a mut HashSet<VisitedKey>,
        origins: &'a HashSet<i64>,
    ) -> ExtendFuture<'a> {
        Box::pin(async move {
            let next = self
                .store
                .next_transaction_for_player(player_id, from_timestamp, exclude_id)
                .await?;

            let Some(next) = next else {
                // Player is still rostered as far as the archive knows
                current.is_end_node = true;
                return Ok(());
            };

            if !visited.insert((next.id, player_id)) {
                // Contradictory or duplicate timestamps in the source data
                // would loop here; close the branch instead
                current.is_end_node = true;
                return Ok(());
            }

            if next.kind.is_terminal() {
                // Ownership context ends; the terminal event itself is not
                // a child, the end flag carries it
                current.is_end_node = true;
            } else if !next.kind.continues_lineage() {
                // A vetoed trade never took effect. The store contract
                // filters these out of candidates; if one leaks through,
                // look straight past it
                self.extend_forward(
                    current,
                    player_id,
                    next.timestamp,
                    next.id,
                    visited,
                    origins,
                )
                .await?;
            } else if next.kind == TransactionKind::Traded {
                self.expand_trade(current, next, visited, origins).await?;
            } else {
                // Kept: linear continuation with the same lineage
                let mut child = LineageNode::new(next.clone());
                self.extend_forward(
                    &mut child,
                    player_id,
                    next.timestamp,
                    next.id,
                    visited,
                    origins,
                )
                .await?;
                current.children.push(child);
            }

            Ok(())
        })
    }

    /// Fan out a downstream trade: attach the triggering leg under `current`
    /// and a sibling node for every other player moved in the same group.
    ///
    /// A leg whose destination franchise was party to the original trade
    /// keeps being traced; everyone else ends there.
    async fn expand_trade(
        &self,
        current: &mut LineageNode,
        trigger: Transaction,
        visited: &mut HashSet<VisitedKey>,
        origins: &HashSet<i64>,
    ) -> Result<(), LineageError> {
        let sibling_group = match trigger.group_id {
            Some(group_id) => self.store.get_transaction_group(group_id).await?,
            None => {
                log::warn!(
                    "Traded transaction {} has no group id; expanding without siblings",
                    trigger.id
                );
                None
            }
        };

        let mut child = LineageNode::new(trigger.clone());
        if origins.contains(&trigger.franchise.id) {
            self.extend_forward(
                &mut child,
                trigger.player.id,
                trigger.timestamp,
                trigger.id,
                visited,
                origins,
            )
            .await?;
        } else {
            // Player left the scope of the original trade
            child.is_end_node = true;
        }
        current.children.push(child);

        let Some(group) = sibling_group else {
            return Ok(());
        };

        for leg in group
            .traded_legs()
            .filter(|t| t.id != trigger.id && t.player.id != trigger.player.id)
        {
            if !visited.insert((leg.id, leg.player.id)) {
                // Already tracked under another branch of this forest
                continue;
            }

            let mut sibling = LineageNode::new(leg.clone());
            if origins.contains(&leg.franchise.id) {
                self.extend_forward(
                    &mut sibling,
                    leg.player.id,
                    leg.timestamp,
                    leg.id,
                    visited,
                    origins,
                )
                .await?;
            } else {
                sibling.is_end_node = true;
            }
            current.children.push(sibling);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage_core::memory_store::MemoryTransactionStore;
    use crate::lineage_core::model::{FranchiseInfo, PlayerInfo};

    const MALLARDS: i64 = 1;
    const IRONSIDES: i64 = 2;
    const HOLLOWMEN: i64 = 3;

    fn franchise(id: i64) -> FranchiseInfo {
        let name = match id {
            MALLARDS => "Mallards",
            IRONSIDES => "Ironsides",
            HOLLOWMEN => "Hollowmen",
            _ => "Unknown Franchise",
        };
        FranchiseInfo {
            id,
            name: name.to_string(),
            color: "#aa3311".to_string(),
        }
    }

    fn tx(
        id: i64,
        player_id: i64,
        kind: TransactionKind,
        timestamp: i64,
        franchise_id: i64,
        group_id: Option<i64>,
    ) -> Transaction {
        Transaction {
            id,
            player: PlayerInfo {
                id: player_id,
                name: format!("Player {}", player_id),
                position: "RB".to_string(),
            },
            franchise: franchise(franchise_id),
            year: 2021,
            kind,
            timestamp,
            description: None,
            group_id,
            player_transaction_index: 0,
        }
    }

    /// Two-team, two-player trade: Mallards send Player 1 to Ironsides and
    /// receive Player 2.
    fn base_trade(store: &mut MemoryTransactionStore) {
        store.add_group(500, 1000);
        store.add_transaction(tx(1, 1, TransactionKind::Traded, 1000, IRONSIDES, Some(500)));
        store.add_transaction(tx(2, 2, TransactionKind::Traded, 1000, MALLARDS, Some(500)));
    }

    async fn build(store: MemoryTransactionStore, group_id: i64) -> LineageForest {
        TradeLineageBuilder::new(Arc::new(store))
            .build_lineage(group_id)
            .await
            .unwrap()
    }

    fn assert_end_iff_leaf(node: &LineageNode) {
        assert_eq!(
            node.is_end_node,
            node.children.is_empty(),
            "node for transaction {} violates end-iff-leaf",
            node.transaction.id
        );
        for child in &node.children {
            assert_end_iff_leaf(child);
        }
    }

    #[tokio::test]
    async fn test_simple_trade_no_followup() {
        let mut store = MemoryTransactionStore::new();
        base_trade(&mut store);

        let forest = build(store, 500).await;

        assert_eq!(forest.roots.len(), 2);
        for root in &forest.roots {
            assert!(root.is_end_node);
            assert!(root.children.is_empty());
        }
        assert_eq!(
            forest.description,
            "Mallards trades Player 1 to Ironsides for Player 2"
        );
    }

    #[tokio::test]
    async fn test_drop_terminates_without_child() {
        let mut store = MemoryTransactionStore::new();
        base_trade(&mut store);
        store.add_transaction(tx(3, 1, TransactionKind::Dropped, 2000, IRONSIDES, None));

        let forest = build(store, 500).await;

        let root = &forest.roots[0];
        assert_eq!(root.transaction.player.id, 1);
        // The drop closes the branch but is not a visible child
        assert!(root.is_end_node);
        assert!(root.children.is_empty());
    }

    #[tokio::test]
    async fn test_retrade_out_of_scope_ends_child() {
        let mut store = MemoryTransactionStore::new();
        base_trade(&mut store);
        // Player 1 later traded from Ironsides to Hollowmen, who were not
        // part of the original trade
        store.add_group(600, 2000);
        store.add_transaction(tx(3, 1, TransactionKind::Traded, 2000, HOLLOWMEN, Some(600)));

        let forest = build(store, 500).await;

        let root = &forest.roots[0];
        assert!(!root.is_end_node);
        assert_eq!(root.children.len(), 1);
        let child = &root.children[0];
        assert_eq!(child.transaction.id, 3);
        assert!(child.is_end_node);
        assert!(child.children.is_empty());
    }

    #[tokio::test]
    async fn test_retrade_back_in_scope_fans_out() {
        let mut store = MemoryTransactionStore::new();
        base_trade(&mut store);
        // Player 1 traded back from Ironsides to Mallards, while Player 3
        // goes from Mallards to Ironsides in the same event
        store.add_group(600, 2000);
        store.add_transaction(tx(3, 1, TransactionKind::Traded, 2000, MALLARDS, Some(600)));
        store.add_transaction(tx(4, 3, TransactionKind::Traded, 2000, IRONSIDES, Some(600)));

        let forest = build(store, 500).await;

        let root = &forest.roots[0];
        assert_eq!(root.transaction.player.id, 1);
        assert!(!root.is_end_node);
        // Triggering leg plus the sibling player fan out under the same node
        assert_eq!(root.children.len(), 2);

        let trigger = &root.children[0];
        assert_eq!(trigger.transaction.id, 3);
        assert_eq!(trigger.transaction.player.id, 1);
        // Back with an origin franchise, traced further: no more history
        assert!(trigger.is_end_node);

        let sibling = &root.children[1];
        assert_eq!(sibling.transaction.id, 4);
        assert_eq!(sibling.transaction.player.id, 3);
        assert!(sibling.is_end_node);

        // Player 2's root is unaffected
        assert!(forest.roots[1].is_end_node);
        assert!(forest.roots[1].children.is_empty());
    }

    #[tokio::test]
    async fn test_kept_is_linear_continuation() {
        let mut store = MemoryTransactionStore::new();
        base_trade(&mut store);
        store.add_transaction(tx(3, 1, TransactionKind::Kept, 2000, IRONSIDES, None));
        store.add_transaction(tx(4, 1, TransactionKind::Kept, 3000, IRONSIDES, None));
        store.add_transaction(tx(5, 1, TransactionKind::Dropped, 4000, IRONSIDES, None));

        let forest = build(store, 500).await;

        // Root -> kept -> kept, then the drop closes the chain invisibly
        let root = &forest.roots[0];
        assert_eq!(root.children.len(), 1);
        let first = &root.children[0];
        assert_eq!(first.transaction.id, 3);
        assert_eq!(first.children.len(), 1);
        let second = &first.children[0];
        assert_eq!(second.transaction.id, 4);
        assert!(second.is_end_node);
    }

    #[tokio::test]
    async fn test_vetoed_trade_is_invisible() {
        let mut store = MemoryTransactionStore::new();
        base_trade(&mut store);
        store.add_group(600, 1500);
        store.add_transaction(tx(
            3,
            1,
            TransactionKind::VetoedTrade,
            1500,
            HOLLOWMEN,
            Some(600),
        ));
        store.add_transaction(tx(4, 1, TransactionKind::Kept, 2000, IRONSIDES, None));

        let forest = build(store, 500).await;

        let root = &forest.roots[0];
        assert_eq!(root.children.len(), 1);
        // The vetoed trade never appears; the keep is the next real event
        assert_eq!(root.children[0].transaction.id, 4);
        assert_eq!(root.children[0].transaction.kind, TransactionKind::Kept);
    }

    #[tokio::test]
    async fn test_vetoed_trade_then_nothing() {
        let mut store = MemoryTransactionStore::new();
        base_trade(&mut store);
        store.add_group(600, 1500);
        store.add_transaction(tx(
            3,
            1,
            TransactionKind::VetoedTrade,
            1500,
            HOLLOWMEN,
            Some(600),
        ));

        let forest = build(store, 500).await;

        assert!(forest.roots[0].is_end_node);
        assert!(forest.roots[0].children.is_empty());
    }

    #[tokio::test]
    async fn test_colliding_timestamps_terminate() {
        let mut store = MemoryTransactionStore::new();
        // Single-leg trade at t=1000, with two keeps at the very same
        // timestamp: without the visited set the walk would bounce between
        // them and the root forever
        store.add_group(500, 1000);
        store.add_transaction(tx(1, 1, TransactionKind::Traded, 1000, IRONSIDES, Some(500)));
        store.add_transaction(tx(2, 1, TransactionKind::Kept, 1000, IRONSIDES, None));
        store.add_transaction(tx(3, 1, TransactionKind::Kept, 1000, IRONSIDES, None));

        let forest = build(store, 500).await;

        // Finite and well-formed is the whole point here
        assert_eq!(forest.roots.len(), 1);
        assert_end_iff_leaf(&forest.roots[0]);
    }

    #[tokio::test]
    async fn test_end_node_iff_leaf_across_complex_history() {
        let mut store = MemoryTransactionStore::new();
        base_trade(&mut store);
        store.add_transaction(tx(3, 1, TransactionKind::Kept, 2000, IRONSIDES, None));
        store.add_group(600, 3000);
        store.add_transaction(tx(4, 1, TransactionKind::Traded, 3000, MALLARDS, Some(600)));
        store.add_transaction(tx(5, 4, TransactionKind::Traded, 3000, IRONSIDES, Some(600)));
        store.add_transaction(tx(6, 4, TransactionKind::Dropped, 4000, IRONSIDES, None));

        let forest = build(store, 500).await;

        assert_eq!(forest.roots.len(), 2);
        for root in &forest.roots {
            assert_end_iff_leaf(root);
        }
    }

    #[tokio::test]
    async fn test_deterministic_rebuild() {
        let mut store = MemoryTransactionStore::new();
        base_trade(&mut store);
        store.add_transaction(tx(3, 1, TransactionKind::Kept, 2000, IRONSIDES, None));
        store.add_group(600, 3000);
        store.add_transaction(tx(4, 1, TransactionKind::Traded, 3000, MALLARDS, Some(600)));
        store.add_transaction(tx(5, 4, TransactionKind::Traded, 3000, IRONSIDES, Some(600)));

        let builder = TradeLineageBuilder::new(Arc::new(store));
        let first = builder.build_lineage(500).await.unwrap();
        let second = builder.build_lineage(500).await.unwrap();

        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_root_count_matches_traded_legs() {
        let mut store = MemoryTransactionStore::new();
        store.add_group(500, 1000);
        store.add_transaction(tx(1, 1, TransactionKind::Traded, 1000, IRONSIDES, Some(500)));
        store.add_transaction(tx(2, 2, TransactionKind::Traded, 1000, MALLARDS, Some(500)));
        store.add_transaction(tx(3, 3, TransactionKind::Traded, 1000, HOLLOWMEN, Some(500)));

        let forest = build(store, 500).await;
        assert_eq!(forest.roots.len(), 3);
    }

    #[tokio::test]
    async fn test_self_trade_single_root() {
        let mut store = MemoryTransactionStore::new();
        store.add_group(500, 1000);
        store.add_transaction(tx(1, 1, TransactionKind::Traded, 1000, MALLARDS, Some(500)));

        let forest = build(store, 500).await;
        assert_eq!(forest.roots.len(), 1);
        assert!(forest.roots[0].is_end_node);
    }

    #[tokio::test]
    async fn test_missing_group_is_not_found() {
        let store = MemoryTransactionStore::new();
        let builder = TradeLineageBuilder::new(Arc::new(store));

        let result = builder.build_lineage(999).await;
        assert!(matches!(result, Err(LineageError::NotFound(999))));
    }

    #[tokio::test]
    async fn test_group_without_traded_leg_is_not_found() {
        let mut store = MemoryTransactionStore::new();
        store.add_group(500, 1000);
        store.add_transaction(tx(1, 1, TransactionKind::DraftPicked, 1000, MALLARDS, Some(500)));

        let builder = TradeLineageBuilder::new(Arc::new(store));
        let result = builder.build_lineage(500).await;
        assert!(matches!(result, Err(LineageError::NotFound(500))));
    }
}

//! Trade group summaries and by-year listing
//!
//! Groups raw transaction groups into a year-keyed trade list with
//! human-readable descriptions and per-franchise sides. Also the input
//! discovery step for the lineage builder: a summary's group id is what gets
//! fed to `build_lineage`.

use super::model::{FranchiseInfo, PlayerInfo, TransactionGroup};
use super::store::{StoreError, TransactionStore};
use chrono::{Datelike, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Players one franchise received in a trade.
#[derive(Debug, Clone, Serialize)]
pub struct TradeSide {
    pub franchise: FranchiseInfo,
    pub players: Vec<PlayerInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeSummary {
    pub group_id: i64,
    pub date: i64,
    pub description: String,
    /// One side per distinct receiving franchise, ordered by franchise id.
    pub sides: Vec<TradeSide>,
    /// Flat list of every player name involved, for quick filtering.
    pub player_names: Vec<String>,
}

pub struct TradeGroupSummarizer<S> {
    store: Arc<S>,
}

impl<S: TransactionStore> TradeGroupSummarizer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Every trade event, bucketed by calendar year.
    ///
    /// Within each year, summaries are in ascending (date, group id) order.
    pub async fn list_trades_by_year(
        &self,
    ) -> Result<BTreeMap<i32, Vec<TradeSummary>>, StoreError> {
        let groups = self.store.list_trade_groups().await?;

        let mut by_year: BTreeMap<i32, Vec<TradeSummary>> = BTreeMap::new();
        for group in &groups {
            // Store returns groups ordered by (date, id); buckets inherit it
            by_year
                .entry(year_of(group.date))
                .or_default()
                .push(summarize_group(group));
        }

        log::debug!(
            "Summarized {} trade groups across {} seasons",
            groups.len(),
            by_year.len()
        );

        Ok(by_year)
    }
}

fn year_of(timestamp: i64) -> i32 {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|d| d.year())
        .unwrap_or(1970)
}

/// Build the summary for one trade group.
pub fn summarize_group(group: &TransactionGroup) -> TradeSummary {
    let sides = trade_sides(group);
    let player_names = group
        .traded_legs()
        .map(|t| t.player.name.clone())
        .collect();

    TradeSummary {
        group_id: group.id,
        date: group.date,
        description: describe_trade(group),
        sides,
        player_names,
    }
}

/// Group the Traded legs by receiving franchise, ordered by franchise id.
pub fn trade_sides(group: &TransactionGroup) -> Vec<TradeSide> {
    let mut sides: BTreeMap<i64, TradeSide> = BTreeMap::new();

    for leg in group.traded_legs() {
        sides
            .entry(leg.franchise.id)
            .or_insert_with(|| TradeSide {
                franchise: leg.franchise.clone(),
                players: Vec::new(),
            })
            .players
            .push(leg.player.clone());
    }

    sides.into_values().collect()
}

/// Human-readable one-line description of a trade group.
///
/// Two franchises: "{A} trades {players A sent} to {B} for {players A got}".
/// More than two: a multi-team summary. A single receiving franchise is a
/// source-data anomaly but still gets a degenerate description.
pub fn describe_trade(group: &TransactionGroup) -> String {
    let sides = trade_sides(group);

    match sides.as_slice() {
        [] => format!("Trade group {} with no traded players", group.id),
        [side] => format!(
            "{} internal trade ({} players)",
            side.franchise.name,
            side.players.len()
        ),
        [a, b] => format!(
            "{} trades {} to {} for {}",
            a.franchise.name,
            player_list(&b.players),
            b.franchise.name,
            player_list(&a.players)
        ),
        many => {
            let franchises: Vec<&str> =
                many.iter().map(|s| s.franchise.name.as_str()).collect();
            let player_count: usize = many.iter().map(|s| s.players.len()).sum();
            format!(
                "Multi-team trade involving {} ({} players)",
                franchises.join(", "),
                player_count
            )
        }
    }
}

fn player_list(players: &[PlayerInfo]) -> String {
    players
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

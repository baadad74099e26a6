//! C4: unified reader fanning out across the hot and cold tiers (§4.4).
//!
//! The hot tier covers roughly the last 10-20 minutes of ledger close; the
//! cold tier is the durable columnar lake. A caller rarely wants to know
//! which tier actually answered a query, so [`TieredStore`] merges both
//! into one sorted, deduplicated page. [`TierMode`] exists for operational
//! control (diagnosing a tier, or running a shadow comparison) rather than
//! as something collaborators pass routinely.

mod merge;

use std::cmp::Ordering;

use rust_decimal::Decimal;
use tracing::warn;

use crate::cold::ColdStore;
use crate::cursor::{AccountListCursor, OperationCursor, TokenHolderCursor};
use crate::domain::{AccountState, EnrichedOp, Holder, SortOrder};
use crate::error::QueryError;
use crate::hot::{HotStore, OperationFilters};

pub use merge::{merge_keep_hot, sort_and_page};

/// How a [`TieredStore`] operation should consult its two backing tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierMode {
    /// Only the hot tier is consulted. Used to isolate hot-tier behavior
    /// during an incident, or when the cold lake is known to be down.
    HotOnly,
    /// Only the cold tier is consulted, e.g. for a query entirely outside
    /// the hot retention window.
    ColdOnly,
    /// Both tiers are queried concurrently and merged (§4.4). A failure in
    /// either tier degrades to a partial result if the other tier
    /// succeeded, and to [`QueryError::TierUnavailable`] if both failed.
    Unified,
    /// Both tiers are queried, but only the hot tier's result is returned;
    /// the cold tier's result is compared and any divergence logged. Used
    /// to validate the cold lake's ingestion against the hot tier without
    /// risking a regression in what callers receive.
    HybridShadow,
}

#[derive(Clone)]
pub struct TieredStore {
    hot: HotStore,
    cold: ColdStore,
    mode: TierMode,
}

impl TieredStore {
    pub fn new(hot: HotStore, cold: ColdStore, mode: TierMode) -> Self {
        Self { hot, cold, mode }
    }

    pub fn mode(&self) -> TierMode {
        self.mode
    }

    pub fn hot(&self) -> &HotStore {
        &self.hot
    }

    pub fn cold(&self) -> &ColdStore {
        &self.cold
    }

    /// `account_current(account_id)`: hot lookup, cold fallback (§4.4 — the
    /// common case where the row exists in exactly one tier, so there is
    /// nothing to merge).
    pub async fn account_current(&self, account_id: &str) -> Result<Option<AccountState>, QueryError> {
        match self.mode {
            TierMode::HotOnly => self.hot.account_current(account_id).await,
            TierMode::ColdOnly => self.cold.account_current(account_id).await,
            TierMode::Unified => match self.hot.account_current(account_id).await? {
                Some(row) => Ok(Some(row)),
                None => self.cold.account_current(account_id).await,
            },
            TierMode::HybridShadow => {
                let hot = self.hot.account_current(account_id).await?;
                if hot.is_none() {
                    if let Ok(Some(cold_row)) = self.cold.account_current(account_id).await {
                        warn!(account_id, ledger = cold_row.last_modified_ledger, "hybrid shadow: hot tier missing account present in cold tier");
                    }
                }
                Ok(hot)
            }
        }
    }

    /// `accounts_list(filters)`: both tiers queried and deduplicated on
    /// `account_id`, hot winning any overlap, re-sorted on the requested
    /// axis and re-paginated (§4.2, §4.4).
    pub async fn accounts_list(
        &self,
        sort_by: &str,
        sort_order: SortOrder,
        min_balance: Option<Decimal>,
        limit: i64,
        cursor: Option<&AccountListCursor>,
    ) -> Result<(Vec<AccountState>, bool), QueryError> {
        // Overfetch so that after merge+resort there are still `limit`
        // rows left even if every hot row displaced a cold one.
        let fetch_limit = limit.saturating_mul(2).max(limit);

        let (hot, cold) = self.fetch_both(
            self.hot.accounts_list(sort_by, sort_order, min_balance, fetch_limit, cursor),
            self.cold.accounts_current_latest(fetch_limit, cursor.map(|c| c.account_id.clone())),
        )
        .await?;

        let merged = merge_keep_hot(hot, cold, |r: &AccountState| r.account_id.clone(), |r| r.last_modified_ledger);

        let cmp: Box<dyn FnMut(&AccountState, &AccountState) -> Ordering> = match (sort_by, sort_order) {
            ("last_modified_ledger", SortOrder::Asc) => Box::new(|a, b| {
                a.last_modified_ledger
                    .cmp(&b.last_modified_ledger)
                    .then_with(|| a.account_id.cmp(&b.account_id))
            }),
            ("last_modified_ledger", SortOrder::Desc) => Box::new(|a, b| {
                b.last_modified_ledger
                    .cmp(&a.last_modified_ledger)
                    .then_with(|| a.account_id.cmp(&b.account_id))
            }),
            (_, SortOrder::Asc) => Box::new(|a, b| a.balance.cmp(&b.balance).then_with(|| a.account_id.cmp(&b.account_id))),
            (_, SortOrder::Desc) => Box::new(|a, b| b.balance.cmp(&a.balance).then_with(|| a.account_id.cmp(&b.account_id))),
        };

        Ok(sort_and_page(merged, cmp, limit as usize))
    }

    /// `token_holders(asset, filters)`: same merge contract as
    /// `accounts_list`, ordered `(balance desc, account_id asc)`.
    pub async fn token_holders(
        &self,
        code: &str,
        issuer: &str,
        min_balance: Option<Decimal>,
        limit: i64,
        cursor: Option<&TokenHolderCursor>,
    ) -> Result<(Vec<Holder>, bool), QueryError> {
        let fetch_limit = limit.saturating_mul(2).max(limit);
        let asset = crate::asset::Asset::Credit {
            code: code.to_string(),
            issuer: issuer.to_string(),
        };

        let (hot, cold) = self.fetch_both(
            self.hot.token_holders(&asset, min_balance, fetch_limit, cursor),
            self.cold.token_holders(
                code,
                issuer,
                min_balance.map(|d| d.to_string()),
                fetch_limit,
                cursor.map(|c| (c.balance.clone(), c.account_id.clone())),
            ),
        )
        .await?;

        let merged = merge_keep_hot(hot, cold, |r: &Holder| r.account_id.clone(), |_| 0i64);

        let cmp = |a: &Holder, b: &Holder| {
            let ba: Decimal = a.balance.parse().unwrap_or(Decimal::ZERO);
            let bb: Decimal = b.balance.parse().unwrap_or(Decimal::ZERO);
            bb.cmp(&ba).then_with(|| a.account_id.cmp(&b.account_id))
        };

        Ok(sort_and_page(merged, cmp, limit as usize))
    }

    /// `operations(filters)`: merged on `(transaction_hash, operation_index)`,
    /// ordered `(ledger_sequence desc, operation_index desc)`.
    pub async fn operations(
        &self,
        filters: &OperationFilters,
        limit: i64,
        cursor: Option<&OperationCursor>,
    ) -> Result<(Vec<EnrichedOp>, bool), QueryError> {
        let fetch_limit = limit.saturating_mul(2).max(limit);

        let (hot, cold) = self.fetch_both(
            self.hot.operations(filters, fetch_limit, cursor),
            self.cold.operations(
                filters.account_id.as_deref(),
                filters.start_ledger,
                filters.end_ledger,
                cursor.map(|c| c.ledger_seq),
                cursor.map(|c| c.op_index),
                fetch_limit,
            ),
        )
        .await?;

        let merged = merge_keep_hot(
            hot,
            cold,
            |r: &EnrichedOp| (r.transaction_hash.clone(), r.operation_index),
            |r| r.ledger_sequence,
        );

        let cmp = |a: &EnrichedOp, b: &EnrichedOp| {
            b.ledger_sequence
                .cmp(&a.ledger_sequence)
                .then_with(|| b.operation_index.cmp(&a.operation_index))
        };

        Ok(sort_and_page(merged, cmp, limit as usize))
    }

    /// Runs the hot and cold futures per [`TierMode`], applying the
    /// partial-tolerance contract: in [`TierMode::Unified`], one tier
    /// failing degrades to the other tier's rows alone; both failing is
    /// [`QueryError::TierUnavailable`] (§4.4).
    async fn fetch_both<T: Default>(
        &self,
        hot_fut: impl std::future::Future<Output = Result<T, QueryError>>,
        cold_fut: impl std::future::Future<Output = Result<T, QueryError>>,
    ) -> Result<(T, T), QueryError> {
        fan_out(self.mode, hot_fut, cold_fut).await
    }
}

/// Runs a hot/cold future pair per [`TierMode`] with the same
/// partial-tolerance contract as [`TieredStore::fetch_both`]. Exposed so
/// [`crate::facade`] can apply the tier-merge contract to operations
/// `TieredStore` itself doesn't wrap (offers, pools, claimable balances,
/// contract data) without duplicating the fallback logic.
pub async fn fan_out<T: Default>(
    mode: TierMode,
    hot_fut: impl std::future::Future<Output = Result<T, QueryError>>,
    cold_fut: impl std::future::Future<Output = Result<T, QueryError>>,
) -> Result<(T, T), QueryError> {
    match mode {
        TierMode::HotOnly => Ok((hot_fut.await?, T::default())),
        TierMode::ColdOnly => Ok((T::default(), cold_fut.await?)),
        TierMode::Unified => {
            let (hot_res, cold_res) = tokio::join!(hot_fut, cold_fut);
            match (hot_res, cold_res) {
                (Ok(hot), Ok(cold)) => Ok((hot, cold)),
                (Ok(hot), Err(e)) => {
                    warn!(error = %e, "cold tier unavailable, serving hot-only results");
                    Ok((hot, T::default()))
                }
                (Err(e), Ok(cold)) => {
                    warn!(error = %e, "hot tier unavailable, serving cold-only results");
                    Ok((T::default(), cold))
                }
                (Err(hot_err), Err(cold_err)) => Err(QueryError::TierUnavailable {
                    hot: hot_err.to_string(),
                    cold: cold_err.to_string(),
                }),
            }
        }
        TierMode::HybridShadow => {
            let (hot_res, cold_res) = tokio::join!(hot_fut, cold_fut);
            let hot = hot_res?;
            if let Err(e) = cold_res {
                warn!(error = %e, "hybrid shadow: cold tier query failed, ignored");
            }
            Ok((hot, T::default()))
        }
    }
}

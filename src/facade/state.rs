//! State-table operations (§6.1 "State tables"): offers, liquidity pools
//! and claimable balances. All three are hot-only — current-state DEX and
//! claim tables with no SCD2/cold counterpart in this tree, the same
//! reasoning as `account_signers`/`account_balances` (§4.4 "very large
//! scans" is the cold tier's reason to exist; these tables are small
//! enough that the hot tier's own retention already covers them).

use tokio_util::sync::CancellationToken;

use crate::cursor::IdCursor;
use crate::domain::{ClaimableBalance, LiquidityPool, Offer};
use crate::error::QueryError;

use super::{normalize_limit, with_cancel, ListResponse, QueryFacade};

impl QueryFacade {
    /// `offers(limit, cursor?)` (§6.1): `id asc`.
    pub async fn offers(&self, cancel: CancellationToken, limit: Option<i64>, cursor: Option<&str>) -> Result<ListResponse<Offer>, QueryError> {
        let limit = normalize_limit(limit)?;
        let cursor = cursor.map(IdCursor::decode).transpose()?;
        let rows = with_cancel(&cancel, self.tiered().hot().offers(limit.saturating_add(1), cursor.as_ref())).await?;
        Ok(page_by_id(rows, limit, |o| o.offer_id.to_string()))
    }

    /// `offer_by_id(offer_id)` (§6.1).
    pub async fn offer_by_id(&self, cancel: CancellationToken, offer_id: i64) -> Result<Option<Offer>, QueryError> {
        with_cancel(&cancel, self.tiered().hot().offer_by_id(offer_id)).await
    }

    /// `offers_by_pair(selling_asset, buying_asset, limit, cursor?)` (§6.1).
    pub async fn offers_by_pair(
        &self,
        cancel: CancellationToken,
        selling_asset: &str,
        buying_asset: &str,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<ListResponse<Offer>, QueryError> {
        let limit = normalize_limit(limit)?;
        let cursor = cursor.map(IdCursor::decode).transpose()?;
        let rows = with_cancel(
            &cancel,
            self.tiered()
                .hot()
                .offers_by_pair(selling_asset, buying_asset, limit.saturating_add(1), cursor.as_ref()),
        )
        .await?;
        Ok(page_by_id(rows, limit, |o| o.offer_id.to_string()))
    }

    /// `liquidity_pools(limit, cursor?)` (§6.1): `id asc`.
    pub async fn liquidity_pools(
        &self,
        cancel: CancellationToken,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<ListResponse<LiquidityPool>, QueryError> {
        let limit = normalize_limit(limit)?;
        let cursor = cursor.map(IdCursor::decode).transpose()?;
        let rows = with_cancel(&cancel, self.tiered().hot().liquidity_pools(limit.saturating_add(1), cursor.as_ref())).await?;
        Ok(page_by_id(rows, limit, |p| p.pool_id.clone()))
    }

    /// `liquidity_pool_by_id(pool_id)` (§6.1).
    pub async fn liquidity_pool_by_id(&self, cancel: CancellationToken, pool_id: &str) -> Result<Option<LiquidityPool>, QueryError> {
        with_cancel(&cancel, self.tiered().hot().liquidity_pool_by_id(pool_id)).await
    }

    /// `liquidity_pools_by_asset(asset, limit, cursor?)` (§6.1).
    pub async fn liquidity_pools_by_asset(
        &self,
        cancel: CancellationToken,
        asset: &str,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<ListResponse<LiquidityPool>, QueryError> {
        let limit = normalize_limit(limit)?;
        let cursor = cursor.map(IdCursor::decode).transpose()?;
        let rows = with_cancel(
            &cancel,
            self.tiered().hot().liquidity_pools_by_asset(asset, limit.saturating_add(1), cursor.as_ref()),
        )
        .await?;
        Ok(page_by_id(rows, limit, |p| p.pool_id.clone()))
    }

    /// `claimable_balances(limit, cursor?)` (§6.1): `id asc`.
    pub async fn claimable_balances(
        &self,
        cancel: CancellationToken,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<ListResponse<ClaimableBalance>, QueryError> {
        let limit = normalize_limit(limit)?;
        let cursor = cursor.map(IdCursor::decode).transpose()?;
        let rows = with_cancel(&cancel, self.tiered().hot().claimable_balances(limit.saturating_add(1), cursor.as_ref())).await?;
        Ok(page_by_id(rows, limit, |b| b.balance_id.clone()))
    }

    /// `claimable_balance_by_id(balance_id)` (§6.1).
    pub async fn claimable_balance_by_id(&self, cancel: CancellationToken, balance_id: &str) -> Result<Option<ClaimableBalance>, QueryError> {
        with_cancel(&cancel, self.tiered().hot().claimable_balance_by_id(balance_id)).await
    }

    /// `claimable_balances_by_asset(asset, limit, cursor?)` (§6.1).
    pub async fn claimable_balances_by_asset(
        &self,
        cancel: CancellationToken,
        asset: &str,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<ListResponse<ClaimableBalance>, QueryError> {
        let limit = normalize_limit(limit)?;
        let cursor = cursor.map(IdCursor::decode).transpose()?;
        let rows = with_cancel(
            &cancel,
            self.tiered().hot().claimable_balances_by_asset(asset, limit.saturating_add(1), cursor.as_ref()),
        )
        .await?;
        Ok(page_by_id(rows, limit, |b| b.balance_id.clone()))
    }
}

/// Shared `id asc` cursor pagination for the overfetch-by-one rows every
/// state-table listing above produces.
fn page_by_id<T>(mut rows: Vec<T>, limit: i64, id_of: impl Fn(&T) -> String) -> ListResponse<T> {
    let has_more = rows.len() as i64 > limit;
    rows.truncate(limit as usize);
    let next_cursor = if has_more {
        rows.last().map(|r| IdCursor { id: id_of(r) }.encode())
    } else {
        None
    };
    ListResponse::new(rows, next_cursor, has_more)
}

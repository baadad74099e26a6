use tokio_util::sync::CancellationToken;

use crate::asset::Asset;
use crate::cursor::{AccountHistoryCursor, AccountListCursor, AssetListCursor, TokenHolderCursor};
use crate::domain::{AccountSnapshot, AccountState, AssetListResp, Balances, Holder, Signers, TokenStats};
use crate::error::QueryError;
use crate::tiered::{fan_out, merge_keep_hot, sort_and_page};

use super::{normalize_limit, with_cancel, AccountsListFilters, AssetListFilters, ListResponse, QueryFacade, TokenHoldersFilters};

impl QueryFacade {
    /// `account_current(account_id)` (§6.1).
    pub async fn account_current(&self, cancel: CancellationToken, account_id: &str) -> Result<Option<AccountState>, QueryError> {
        if account_id.is_empty() {
            return Err(QueryError::MissingArgument("account_id"));
        }
        with_cancel(&cancel, self.tiered().account_current(account_id)).await
    }

    /// `account_history(account_id, limit, cursor?)`, merged across tiers
    /// on `ledger_sequence` the way [`crate::tiered::TieredStore`]'s own
    /// listing operations are (§4.4) — `TieredStore` itself has no method
    /// for this one since its rows carry no stable natural key beyond the
    /// ledger sequence itself.
    pub async fn account_history(
        &self,
        cancel: CancellationToken,
        account_id: &str,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<ListResponse<AccountSnapshot>, QueryError> {
        if account_id.is_empty() {
            return Err(QueryError::MissingArgument("account_id"));
        }
        let limit = normalize_limit(limit)?;
        let cursor = cursor.map(AccountHistoryCursor::decode).transpose()?;
        let fetch_limit = limit.saturating_add(1);

        let (hot, cold) = with_cancel(
            &cancel,
            fan_out(
                self.tiered().mode(),
                self.tiered().hot().account_history(account_id, fetch_limit, cursor.as_ref().map(|c| c.ledger_seq)),
                self.tiered()
                    .cold()
                    .account_history(account_id, fetch_limit, cursor.as_ref().map(|c| c.ledger_seq)),
            ),
        )
        .await?;

        let merged = merge_keep_hot(hot, cold, |r: &AccountSnapshot| r.ledger_sequence, |r| r.ledger_sequence);
        let (mut page, has_more) = sort_and_page(merged, |a, b| b.ledger_sequence.cmp(&a.ledger_sequence), limit as usize);
        let next_cursor = if has_more {
            page.last().map(|r| AccountHistoryCursor { ledger_seq: r.ledger_sequence }.encode())
        } else {
            None
        };
        page.truncate(limit as usize);

        Ok(ListResponse::new(page, next_cursor, has_more))
    }

    /// `accounts_list(filters)` (§6.1, §4.2). Sort/cursor mismatch is
    /// rejected before the tier is ever consulted.
    pub async fn accounts_list(
        &self,
        cancel: CancellationToken,
        filters: &AccountsListFilters,
    ) -> Result<ListResponse<AccountState>, QueryError> {
        let limit = normalize_limit(filters.limit)?;
        let cursor = filters.cursor.as_deref().map(AccountListCursor::decode).transpose()?;
        if let Some(c) = &cursor {
            c.check_sort(filters.sort_by.as_str(), filters.sort_order.as_str())?;
        }

        let (rows, has_more) = with_cancel(
            &cancel,
            self.tiered()
                .accounts_list(filters.sort_by.as_str(), filters.sort_order, filters.min_balance, limit, cursor.as_ref()),
        )
        .await?;

        let next_cursor = if has_more {
            rows.last().map(|r| {
                AccountListCursor {
                    balance: r.balance.to_string(),
                    last_modified_ledger: Some(r.last_modified_ledger),
                    sort_by: filters.sort_by.as_str().to_string(),
                    sort_order: filters.sort_order.as_str().to_string(),
                    account_id: r.account_id.clone(),
                }
                .encode()
            })
        } else {
            None
        };

        Ok(ListResponse::new(rows, next_cursor, has_more))
    }

    /// `account_signers(account_id)` (§6.1). Hot-only: signer weights are
    /// current-state data with no SCD2/cold counterpart in this tree.
    pub async fn account_signers(&self, cancel: CancellationToken, account_id: &str) -> Result<Option<Signers>, QueryError> {
        if account_id.is_empty() {
            return Err(QueryError::MissingArgument("account_id"));
        }
        with_cancel(&cancel, self.tiered().hot().account_signers(account_id)).await
    }

    /// `account_balances(account_id)` (§6.1). Hot-only, for the same
    /// reason as `account_signers`: "current balances" is exactly the
    /// hot tier's retention window by definition.
    pub async fn account_balances(&self, cancel: CancellationToken, account_id: &str) -> Result<Option<Balances>, QueryError> {
        if account_id.is_empty() {
            return Err(QueryError::MissingArgument("account_id"));
        }
        with_cancel(&cancel, self.tiered().hot().account_balances(account_id)).await
    }

    /// `asset_list(filters)` (§6.1). Hot-only: the per-asset aggregate is
    /// a live 24h rollup with no cold-tier equivalent (§9 open question).
    /// `total` counts the same filtered population as the page, ignoring
    /// pagination, via a second query sharing `asset_list`'s `WHERE` clauses.
    pub async fn asset_list(&self, cancel: CancellationToken, filters: &AssetListFilters) -> Result<AssetListResp, QueryError> {
        let limit = normalize_limit(filters.limit)?;
        let cursor = filters.cursor.as_deref().map(AssetListCursor::decode).transpose()?;
        if let Some(c) = &cursor {
            c.check_sort(filters.sort_by.as_str(), filters.sort_order.as_str())?;
        }

        let hot = self.tiered().hot();
        let rows = with_cancel(
            &cancel,
            hot.asset_list(
                filters.sort_by.as_str(),
                filters.sort_order,
                filters.min_holders,
                filters.min_volume,
                filters.asset_type.as_deref(),
                filters.search.as_deref(),
                limit.saturating_add(1),
                cursor.as_ref(),
            ),
        )
        .await?;
        let total = with_cancel(
            &cancel,
            hot.asset_list_total(filters.min_holders, filters.min_volume, filters.asset_type.as_deref(), filters.search.as_deref()),
        )
        .await?;

        let has_more = rows.len() as i64 > limit;
        let mut rows = rows;
        rows.truncate(limit as usize);

        let next_cursor = if has_more {
            rows.last().map(|r| {
                AssetListCursor {
                    holder_count: r.holder_count,
                    volume_24h: r.volume_24h.to_string(),
                    sort_by: filters.sort_by.as_str().to_string(),
                    sort_order: filters.sort_order.as_str().to_string(),
                    code: r.code.clone(),
                    issuer: r.issuer.clone(),
                }
                .encode()
            })
        } else {
            None
        };

        Ok(AssetListResp {
            count: rows.len(),
            items: rows,
            total,
            cursor: next_cursor,
            has_more,
            generated_at: chrono::Utc::now(),
        })
    }

    /// `token_stats(asset)` (§6.1): `NotFound` if the asset has no
    /// trustlines at all rather than a zeroed-out summary.
    pub async fn token_stats(&self, cancel: CancellationToken, asset: &str) -> Result<TokenStats, QueryError> {
        let asset = Asset::parse(asset)?;
        let (code, issuer) = match &asset {
            Asset::Native => return Err(QueryError::InvalidArgument("token_stats is not defined for the native asset".into())),
            Asset::Credit { code, issuer } => (code.clone(), issuer.clone()),
        };
        with_cancel(&cancel, self.tiered().hot().token_stats(&code, &issuer))
            .await?
            .ok_or_else(|| QueryError::NotFound(format!("no stats for asset {code}:{issuer}")))
    }

    /// `token_holders(asset, filters)` (§6.1, §4.4).
    pub async fn token_holders(
        &self,
        cancel: CancellationToken,
        asset: &str,
        filters: &TokenHoldersFilters,
    ) -> Result<ListResponse<Holder>, QueryError> {
        let asset = Asset::parse(asset)?;
        let (code, issuer) = match &asset {
            Asset::Native => return Err(QueryError::InvalidArgument("token_holders is not defined for the native asset".into())),
            Asset::Credit { code, issuer } => (code.clone(), issuer.clone()),
        };
        let limit = normalize_limit(filters.limit)?;
        let cursor = filters.cursor.as_deref().map(TokenHolderCursor::decode).transpose()?;

        let (rows, has_more) = with_cancel(
            &cancel,
            self.tiered().token_holders(&code, &issuer, filters.min_balance, limit, cursor.as_ref()),
        )
        .await?;

        let next_cursor = if has_more {
            rows.last().map(|r| {
                TokenHolderCursor {
                    balance: r.balance.clone(),
                    account_id: r.account_id.clone(),
                }
                .encode()
            })
        } else {
            None
        };

        Ok(ListResponse::new(rows, next_cursor, has_more))
    }
}

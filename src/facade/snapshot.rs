//! C5 operations exposed through the façade (§6.1 "Snapshot (Gold)"):
//! point-in-time reconstruction, dispatched straight to
//! [`crate::snapshot::SnapshotReader`] after argument validation. These
//! bypass [`super::with_cancel`]'s tier-level races, because the
//! multi-step operations (`portfolio_at`, `batch_accounts_at`) already
//! interleave several tier calls internally; the cancellation check is
//! applied once around the whole operation instead of around each step.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use crate::asset::Asset;
use crate::domain::{AccountSnapshotResp, BatchAccountsResp, HoldersResp, PortfolioResp};
use crate::error::QueryError;
use crate::snapshot::MAX_BATCH_ACCOUNTS;

use super::{normalize_limit, with_cancel, QueryFacade};

impl QueryFacade {
    /// `account_at(account_id, t)` (§4.5 op 1, §6.1).
    pub async fn account_at(&self, cancel: CancellationToken, account_id: &str, at: DateTime<Utc>) -> Result<AccountSnapshotResp, QueryError> {
        if account_id.is_empty() {
            return Err(QueryError::MissingArgument("account_id"));
        }
        with_cancel(&cancel, self.snapshot().account_at(account_id, at)).await
    }

    /// `portfolio_at(account_id, t)` (§4.5 op 2, §6.1).
    pub async fn portfolio_at(&self, cancel: CancellationToken, account_id: &str, at: DateTime<Utc>) -> Result<PortfolioResp, QueryError> {
        if account_id.is_empty() {
            return Err(QueryError::MissingArgument("account_id"));
        }
        with_cancel(&cancel, self.snapshot().portfolio_at(account_id, at)).await
    }

    /// `asset_holders_at(asset, t, limit, min_balance?)` (§4.5 op 3, §6.1).
    pub async fn asset_holders_at(
        &self,
        cancel: CancellationToken,
        asset: &str,
        at: DateTime<Utc>,
        limit: Option<i64>,
        min_balance: Option<Decimal>,
    ) -> Result<HoldersResp, QueryError> {
        let asset = Asset::parse(asset)?;
        let limit = normalize_limit(limit)?;
        with_cancel(&cancel, self.snapshot().asset_holders_at(&asset, at, limit, min_balance)).await
    }

    /// `batch_accounts_at(ids, t)` (§4.5 op 4, §6.1, §5): rejects more than
    /// [`MAX_BATCH_ACCOUNTS`] ids before ever touching a tier.
    pub async fn batch_accounts_at(&self, cancel: CancellationToken, account_ids: &[String], at: DateTime<Utc>) -> Result<BatchAccountsResp, QueryError> {
        if account_ids.is_empty() {
            return Err(QueryError::MissingArgument("account_ids"));
        }
        if account_ids.len() > MAX_BATCH_ACCOUNTS {
            return Err(QueryError::InvalidArgument(format!(
                "batch_accounts_at accepts at most {MAX_BATCH_ACCOUNTS} ids, got {}",
                account_ids.len()
            )));
        }
        with_cancel(&cancel, self.snapshot().batch_accounts_at(account_ids, at)).await
    }
}

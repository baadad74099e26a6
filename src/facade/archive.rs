//! Compliance archive operations (§6.1 "Compliance archive", §4.6).
//!
//! `asset_transactions`/`compliance_balances`/`supply_timeline` answer the
//! same questions an archive artifact would, served directly rather than
//! written to a checksummed file — useful for a caller that wants one
//! page of data without waiting on a background job. `start_archive`/
//! `archive_status`/`lineage` drive the actual asynchronous job.

use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::archive::producers::extract_string;
use crate::asset::Asset;
use crate::domain::{
    ArchiveRequest, ArchiveStatusResp, BalancesResp, ComplianceBalanceRow, LineageEntry, StartArchiveResp, SupplyInterval, SupplyResp,
    TransactionRecord, TransactionsResp,
};
use crate::error::QueryError;

use super::{normalize_limit, with_cancel, QueryFacade};

impl QueryFacade {
    /// `asset_transactions(asset, period, include_failed, limit)` (§6.1,
    /// §4.6): the same payment-operation feed the `transactions` archive
    /// artifact is built from, served as one page rather than a file.
    pub async fn asset_transactions(
        &self,
        cancel: CancellationToken,
        asset: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        include_failed: bool,
        limit: Option<i64>,
    ) -> Result<TransactionsResp, QueryError> {
        if end_date < start_date {
            return Err(QueryError::InvalidArgument("end_date must not precede start_date".into()));
        }
        let asset = Asset::parse(asset)?;
        let (code, issuer) = match &asset {
            Asset::Native => return Err(QueryError::InvalidArgument("asset_transactions is not defined for the native asset".into())),
            Asset::Credit { code, issuer } => (code.clone(), issuer.clone()),
        };
        let limit = normalize_limit(limit)?;

        let start = start_date.and_hms_opt(0, 0, 0).unwrap().and_utc().to_rfc3339();
        let end = end_date.and_hms_opt(0, 0, 0).unwrap().and_utc().to_rfc3339();

        let mut ops = with_cancel(
            &cancel,
            self.tiered().cold().payment_operations_in_period(&code, &issuer, &start, &end, include_failed),
        )
        .await?;

        let has_more = ops.len() as i64 > limit;
        ops.truncate(limit as usize);

        let transactions: Vec<TransactionRecord> = ops
            .into_iter()
            .map(|op| TransactionRecord {
                ledger_sequence: op.ledger_sequence,
                closed_at: op.ledger_close_time,
                transaction_hash: op.transaction_hash,
                operation_index: op.operation_index,
                operation_type: op.operation_type,
                from_account: if extract_string(&op.payload, "from").is_empty() {
                    op.source_account.clone()
                } else {
                    extract_string(&op.payload, "from")
                },
                to_account: extract_string(&op.payload, "to"),
                amount: extract_string(&op.payload, "amount"),
                successful: op.successful,
            })
            .collect();

        Ok(TransactionsResp {
            count: transactions.len(),
            transactions,
            has_more,
            generated_at: Utc::now(),
        })
    }

    /// `compliance_balances(asset, t, min_balance?, limit)` (§6.1, §4.6):
    /// the same SCD2 holder reconstruction the `balances` archive artifact
    /// uses, each row annotated with its share of total supply at `t`.
    pub async fn compliance_balances(
        &self,
        cancel: CancellationToken,
        asset: &str,
        at: DateTime<Utc>,
        min_balance: Option<Decimal>,
        limit: Option<i64>,
    ) -> Result<BalancesResp, QueryError> {
        let asset = Asset::parse(asset)?;
        let (code, issuer) = match &asset {
            Asset::Native => return Err(QueryError::InvalidArgument("compliance_balances is not defined for the native asset".into())),
            Asset::Credit { code, issuer } => (code.clone(), issuer.clone()),
        };
        let limit = normalize_limit(limit)?;

        let holders = with_cancel(&cancel, self.snapshot().asset_holders_at(&asset, at, limit, min_balance)).await?;
        let supply = with_cancel(&cancel, self.tiered().cold().holders_and_supply_at(&code, &issuer, at)).await?;

        let balances: Vec<ComplianceBalanceRow> = holders
            .holders
            .into_iter()
            .map(|h| {
                let balance = BigDecimal::from_str(&h.balance).unwrap_or_else(|_| BigDecimal::zero());
                let percent = if supply.total_supply.is_zero() {
                    BigDecimal::zero()
                } else {
                    (&balance / &supply.total_supply) * BigDecimal::from(100)
                };
                ComplianceBalanceRow {
                    account_id: h.account_id,
                    balance: h.balance,
                    percent_of_supply: format!("{:.2}", percent),
                }
            })
            .collect();

        Ok(BalancesResp {
            balances,
            snapshot_ledger: holders.snapshot_ledger,
            has_more: holders.has_more,
            generated_at: Utc::now(),
        })
    }

    /// `supply_timeline(asset, period, interval)` (§6.1, §4.6). Not
    /// defined for the native asset: the aggregate is built from
    /// `trustlines_snapshot`, which has no rows for XLM itself.
    pub async fn supply_timeline(
        &self,
        cancel: CancellationToken,
        asset: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        interval: SupplyInterval,
    ) -> Result<SupplyResp, QueryError> {
        if end_date < start_date {
            return Err(QueryError::InvalidArgument("end_date must not precede start_date".into()));
        }
        let asset = Asset::parse(asset)?;
        let (code, issuer) = match &asset {
            Asset::Native => return Err(QueryError::InvalidArgument("supply_timeline is not defined for the native asset".into())),
            Asset::Credit { code, issuer } => (code.clone(), issuer.clone()),
        };
        with_cancel(&cancel, self.snapshot().supply_timeline(&code, &issuer, start_date, end_date, interval)).await
    }

    /// `start_archive(request)` (§6.1, §4.6): registers the job and
    /// returns immediately; production happens on a detached background
    /// task not tied to `cancel` (§5 "archive jobs do not honor the HTTP
    /// request cancellation").
    pub async fn start_archive(&self, request: ArchiveRequest) -> StartArchiveResp {
        let created_at = Utc::now();
        let archive_id = self.archive().start_archive(request).await;
        StartArchiveResp {
            archive_id,
            status: "pending",
            callback_path: format!("/v1/archives/{archive_id}"),
            created_at,
        }
    }

    /// `archive_status(id)` (§6.1).
    pub async fn archive_status(&self, cancel: CancellationToken, id: Uuid) -> Result<ArchiveStatusResp, QueryError> {
        let job = with_cancel(&cancel, self.archive().status(id)).await?;
        Ok(ArchiveStatusResp {
            archive_id: job.id,
            status: job.status,
            artifacts: job.artifacts.iter().map(Into::into).collect(),
            error: job.error,
            created_at: job.created_at,
            completed_at: job.completed_at,
        })
    }

    /// `lineage(asset?, limit)` (§6.1): most-recent-first (§5). A single
    /// lock read under the job store's shared lock; not worth racing
    /// against `cancel` the way a tier round-trip is.
    pub async fn lineage(&self, asset: Option<&str>, limit: usize) -> Vec<LineageEntry> {
        self.archive().lineage(asset, limit).await
    }
}

//! C5: point-in-time (SCD2) snapshot reconstruction (§4.5).
//!
//! Every operation here answers "what was true at instant `t`", fanned out
//! across the same hot/cold tiers as [`crate::tiered::TieredStore`] (§4.4),
//! since the hot tier's snapshot tables cover its own short retention
//! window and the cold tier covers the full history. Unlike the unified
//! reader's "merge and paginate a listing" contract, a point-in-time query
//! has at most one correct answer per key (§3.2 SCD2 uniqueness): when
//! both tiers answer, the row with the later `closed_at` wins, ties
//! breaking to the hot tier exactly as in the C4 merge contract (§4.4).

use std::future::Future;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use crate::asset::Asset;
use crate::domain::{
    AccountAtState, AccountSnapshotResp, AccountSnapshotRow, BatchAccountsResp, Holder, HoldersResp, PortfolioBalance,
    PortfolioResp, SupplyInterval, SupplyResp, SupplyTimelinePoint,
};
use crate::error::QueryError;
use crate::tiered::{TierMode, TieredStore};

/// Hard cap on ids accepted by `batch_accounts_at` in a single call (§5).
pub const MAX_BATCH_ACCOUNTS: usize = 100;

#[derive(Clone)]
pub struct SnapshotReader {
    store: TieredStore,
}

impl SnapshotReader {
    pub fn new(store: TieredStore) -> Self {
        Self { store }
    }

    /// `account_at(account_id, t)` (§4.5 op 1). A missing account at `t`
    /// is a well-formed response with `state` absent, not an error (§4.5
    /// acceptance policy).
    pub async fn account_at(&self, account_id: &str, at: DateTime<Utc>) -> Result<AccountSnapshotResp, QueryError> {
        let row = pick_latest(
            self.store.mode(),
            self.store.hot().account_at(account_id, at),
            self.store.cold().account_at(account_id, at),
            |r: &AccountSnapshotRow| r.ledger_sequence,
        )
        .await?;

        Ok(match row {
            Some(r) => AccountSnapshotResp {
                account_id: account_id.to_string(),
                state: Some(AccountAtState {
                    balance: r.balance.to_string(),
                    sequence_number: r.sequence_number,
                    subentry_count: r.subentry_count,
                    flags: r.flags,
                    home_domain: r.home_domain,
                    sponsor: r.sponsor,
                }),
                snapshot_ledger: r.ledger_sequence,
            },
            None => AccountSnapshotResp {
                account_id: account_id.to_string(),
                state: None,
                snapshot_ledger: 0,
            },
        })
    }

    /// `portfolio_at(account_id, t)` (§4.5 op 2): native balance plus every
    /// positive trustline balance, `snapshot_ledger` the max observed
    /// ledger across every row consulted.
    pub async fn portfolio_at(&self, account_id: &str, at: DateTime<Utc>) -> Result<PortfolioResp, QueryError> {
        let account = self.account_at(account_id, at).await?;

        let trustlines = pick_latest_many(
            self.store.mode(),
            self.store.hot().account_trustlines_at(account_id, at),
            self.store.cold().account_trustlines_at(account_id, at),
            |r| (r.asset_code.clone(), r.asset_issuer.clone()),
            |r| r.ledger_sequence,
        )
        .await?;

        let mut balances = Vec::with_capacity(1 + trustlines.len());
        let mut snapshot_ledger = account.snapshot_ledger;

        if let Some(state) = &account.state {
            balances.push(PortfolioBalance {
                asset_type: "native".to_string(),
                asset_code: "XLM".to_string(),
                asset_issuer: None,
                balance: state.balance.clone(),
            });
        }

        for t in &trustlines {
            snapshot_ledger = snapshot_ledger.max(t.ledger_sequence);
            let asset = Asset::Credit {
                code: t.asset_code.clone(),
                issuer: t.asset_issuer.clone(),
            };
            balances.push(PortfolioBalance {
                asset_type: match asset.asset_type() {
                    crate::asset::AssetType::CreditAlphanum4 => "credit_alphanum4".to_string(),
                    crate::asset::AssetType::CreditAlphanum12 => "credit_alphanum12".to_string(),
                    _ => "credit_alphanum4".to_string(),
                },
                asset_code: t.asset_code.clone(),
                asset_issuer: Some(t.asset_issuer.clone()),
                balance: t.balance.to_string(),
            });
        }

        Ok(PortfolioResp {
            account_id: account_id.to_string(),
            total_assets: balances.len(),
            balances,
            snapshot_ledger,
        })
    }

    /// `asset_holders_at(asset, t, limit, min_balance?)` (§4.5 op 3): for a
    /// credit asset, every trustline valid at `t` with positive balance;
    /// for the native asset, every account with positive native balance
    /// (no trustline row exists for XLM itself).
    pub async fn asset_holders_at(
        &self,
        asset: &Asset,
        at: DateTime<Utc>,
        limit: i64,
        min_balance: Option<Decimal>,
    ) -> Result<HoldersResp, QueryError> {
        let fetch_limit = limit.saturating_add(1);

        let (mut holders, snapshot_ledger): (Vec<Holder>, i64) = match asset {
            Asset::Native => {
                let rows = pick_latest_many(
                    self.store.mode(),
                    self.store.hot().account_holders_at(at, min_balance, fetch_limit),
                    self.store
                        .cold()
                        .account_holders_at(at, min_balance.map(|d| d.to_string()), fetch_limit),
                    |r: &AccountSnapshotRow| r.account_id.clone(),
                    |r| r.ledger_sequence,
                )
                .await?;
                let max_ledger = rows.iter().map(|r| r.ledger_sequence).max().unwrap_or(0);
                let holders = rows
                    .into_iter()
                    .map(|r| Holder {
                        account_id: r.account_id,
                        balance: r.balance.to_string(),
                    })
                    .collect();
                (holders, max_ledger)
            }
            Asset::Credit { code, issuer } => {
                let rows = pick_latest_many(
                    self.store.mode(),
                    self.store.hot().trustline_holders_at(code, issuer, at, min_balance, fetch_limit),
                    self.store
                        .cold()
                        .trustline_holders_at(code, issuer, at, min_balance.map(|d| d.to_string()), fetch_limit),
                    |r| r.account_id.clone(),
                    |r| r.ledger_sequence,
                )
                .await?;
                let max_ledger = rows.iter().map(|r| r.ledger_sequence).max().unwrap_or(0);
                let holders = rows
                    .into_iter()
                    .map(|r| Holder {
                        account_id: r.account_id,
                        balance: r.balance.to_string(),
                    })
                    .collect();
                (holders, max_ledger)
            }
        };

        holders.sort_by(|a, b| {
            let ba: Decimal = a.balance.parse().unwrap_or(Decimal::ZERO);
            let bb: Decimal = b.balance.parse().unwrap_or(Decimal::ZERO);
            bb.cmp(&ba)
        });

        let has_more = holders.len() as i64 > limit;
        holders.truncate(limit as usize);

        Ok(HoldersResp {
            holders,
            snapshot_ledger,
            has_more,
        })
    }

    /// `batch_accounts_at(ids, t)` (§4.5 op 4). The ≤100-id cap is
    /// enforced by [`crate::facade::QueryFacade`] before this is called.
    pub async fn batch_accounts_at(&self, account_ids: &[String], at: DateTime<Utc>) -> Result<BatchAccountsResp, QueryError> {
        let mut accounts = Vec::with_capacity(account_ids.len());
        let mut found = 0usize;
        let mut snapshot_ledger = 0i64;

        for id in account_ids {
            let resp = self.account_at(id, at).await?;
            if resp.state.is_some() {
                found += 1;
            }
            snapshot_ledger = snapshot_ledger.max(resp.snapshot_ledger);
            accounts.push(resp);
        }

        Ok(BatchAccountsResp {
            accounts,
            found,
            snapshot_ledger,
        })
    }

    /// `supply_timeline(asset, period, interval)` (§4.5 op 5): one SCD2
    /// aggregate per step of `interval` across `[start, end]`, computed in
    /// arbitrary precision (§9) since network-wide supply can exceed 2^63.
    /// Only available where the cold tier's historical aggregate lives —
    /// this is a cold-only operation regardless of `TieredStore::mode()`
    /// (§4.4 "very large scans" routing).
    pub async fn supply_timeline(
        &self,
        code: &str,
        issuer: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        interval: SupplyInterval,
    ) -> Result<SupplyResp, QueryError> {
        let start = start_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| QueryError::InvalidArgument("invalid start_date".to_string()))?
            .and_utc();
        let end = end_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| QueryError::InvalidArgument("invalid end_date".to_string()))?
            .and_utc();

        let mut points = Vec::new();
        let mut previous_supply: Option<BigDecimal> = None;
        let mut at = start;
        let step = interval.duration();

        while at <= end {
            let supply = self.store.cold().holders_and_supply_at(code, issuer, at).await?;
            let issuer_balance = self.store.cold().issuer_balance_at(code, issuer, at).await?;
            let circulating = (&supply.total_supply - &issuer_balance).max(BigDecimal::zero());

            let (supply_change, supply_change_percent) = match &previous_supply {
                Some(prev) => {
                    let change = &supply.total_supply - prev;
                    let percent = if prev.is_zero() {
                        BigDecimal::zero()
                    } else {
                        (&change / prev) * BigDecimal::from(100)
                    };
                    (Some(change.round(7).to_string()), Some(percent.round(2).to_string()))
                }
                None => (None, None),
            };

            points.push(SupplyTimelinePoint {
                timestamp: at,
                ledger_sequence: supply.snapshot_ledger,
                total_supply: supply.total_supply.round(7).to_string(),
                circulating_supply: circulating.round(7).to_string(),
                issuer_balance: issuer_balance.round(7).to_string(),
                holder_count: supply.holder_count,
                supply_change,
                supply_change_percent,
            });

            previous_supply = Some(supply.total_supply);
            at += step;
        }

        Ok(SupplyResp { points })
    }
}

/// Choose between a hot-tier and cold-tier answer for the same key,
/// preferring the row with the later validity timestamp (tracked here via
/// `ledger_of`, a proxy for recency); ties favor the hot tier (§4.4).
async fn pick_latest<T>(
    mode: TierMode,
    hot_fut: impl Future<Output = Result<Option<T>, QueryError>>,
    cold_fut: impl Future<Output = Result<Option<T>, QueryError>>,
    ledger_of: impl Fn(&T) -> i64,
) -> Result<Option<T>, QueryError> {
    let (hot, cold) = fan_out(mode, hot_fut, cold_fut).await?;
    Ok(match (hot, cold) {
        (Some(h), Some(c)) => {
            if ledger_of(&c) > ledger_of(&h) {
                Some(c)
            } else {
                Some(h)
            }
        }
        (Some(h), None) => Some(h),
        (None, Some(c)) => Some(c),
        (None, None) => None,
    })
}

/// Same contract as [`pick_latest`] but for set-valued queries (every
/// trustline row, every holder row): merges on `key_of`, hot winning ties.
async fn pick_latest_many<T, K: Eq + std::hash::Hash>(
    mode: TierMode,
    hot_fut: impl Future<Output = Result<Vec<T>, QueryError>>,
    cold_fut: impl Future<Output = Result<Vec<T>, QueryError>>,
    key_of: impl Fn(&T) -> K,
    ledger_of: impl Fn(&T) -> i64,
) -> Result<Vec<T>, QueryError> {
    let (hot, cold) = fan_out(mode, hot_fut, cold_fut).await?;
    Ok(crate::tiered::merge_keep_hot(hot, cold, key_of, ledger_of))
}

async fn fan_out<T: Default>(
    mode: TierMode,
    hot_fut: impl Future<Output = Result<T, QueryError>>,
    cold_fut: impl Future<Output = Result<T, QueryError>>,
) -> Result<(T, T), QueryError> {
    match mode {
        TierMode::HotOnly => Ok((hot_fut.await?, T::default())),
        TierMode::ColdOnly => Ok((T::default(), cold_fut.await?)),
        TierMode::Unified | TierMode::HybridShadow => {
            let (hot_res, cold_res) = tokio::join!(hot_fut, cold_fut);
            match (hot_res, cold_res) {
                (Ok(hot), Ok(cold)) => Ok((hot, cold)),
                (Ok(hot), Err(e)) => {
                    warn!(error = %e, "cold tier unavailable for snapshot read, serving hot-only");
                    Ok((hot, T::default()))
                }
                (Err(e), Ok(cold)) => {
                    warn!(error = %e, "hot tier unavailable for snapshot read, serving cold-only");
                    Ok((T::default(), cold))
                }
                (Err(hot_err), Err(cold_err)) => Err(QueryError::TierUnavailable {
                    hot: hot_err.to_string(),
                    cold: cold_err.to_string(),
                }),
            }
        }
    }
}

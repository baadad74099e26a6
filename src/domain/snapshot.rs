use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Holder;

/// `account_at(account_id, t)` response (§6.1). `state` is absent — not an
/// error — when the account did not yet exist at `t` (§4.5 acceptance policy).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSnapshotResp {
    pub account_id: String,
    pub state: Option<AccountAtState>,
    pub snapshot_ledger: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountAtState {
    pub balance: String,
    pub sequence_number: i64,
    pub subentry_count: i32,
    pub flags: i32,
    pub home_domain: Option<String>,
    pub sponsor: Option<String>,
}

/// `portfolio_at(account_id, t)` response: native balance plus every
/// positive trustline balance at `t` (§4.5 op 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioResp {
    pub account_id: String,
    pub balances: Vec<PortfolioBalance>,
    pub total_assets: usize,
    pub snapshot_ledger: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioBalance {
    pub asset_type: String,
    pub asset_code: String,
    pub asset_issuer: Option<String>,
    pub balance: String,
}

/// `asset_holders_at(asset, t, limit, min_balance?)` response (§4.5 op 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldersResp {
    pub holders: Vec<Holder>,
    pub snapshot_ledger: i64,
    pub has_more: bool,
}

/// `batch_accounts_at(ids, t)` response (§4.5 op 4). `ids` is capped at
/// 100 entries by the façade before this is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAccountsResp {
    pub accounts: Vec<AccountSnapshotResp>,
    pub found: usize,
    pub snapshot_ledger: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyInterval {
    OneHour,
    OneDay,
    OneWeek,
}

impl SupplyInterval {
    pub fn duration(&self) -> chrono::Duration {
        match self {
            SupplyInterval::OneHour => chrono::Duration::hours(1),
            SupplyInterval::OneDay => chrono::Duration::days(1),
            SupplyInterval::OneWeek => chrono::Duration::weeks(1),
        }
    }
}

/// One point of `supply_timeline(asset, period, interval)` (§4.5 op 5, §6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyTimelinePoint {
    pub timestamp: DateTime<Utc>,
    pub ledger_sequence: i64,
    pub total_supply: String,
    pub circulating_supply: String,
    pub issuer_balance: String,
    pub holder_count: i64,
    pub supply_change: Option<String>,
    pub supply_change_percent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyResp {
    pub points: Vec<SupplyTimelinePoint>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of `asset_transactions(asset, period, include_failed, limit)`
/// (§4.6). Same shape as the `transactions` archive artifact's canonical
/// row, but served directly rather than written to a checksummed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub ledger_sequence: i64,
    pub closed_at: DateTime<Utc>,
    pub transaction_hash: String,
    pub operation_index: i32,
    pub operation_type: String,
    pub from_account: String,
    pub to_account: String,
    pub amount: String,
    pub successful: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsResp {
    pub transactions: Vec<TransactionRecord>,
    pub count: usize,
    pub has_more: bool,
    pub generated_at: DateTime<Utc>,
}

/// One row of `compliance_balances(asset, t, min_balance?, limit)`: a
/// holder's balance at `t` plus its share of total supply at the same
/// instant (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceBalanceRow {
    pub account_id: String,
    pub balance: String,
    pub percent_of_supply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancesResp {
    pub balances: Vec<ComplianceBalanceRow>,
    pub snapshot_ledger: i64,
    pub has_more: bool,
    pub generated_at: DateTime<Utc>,
}

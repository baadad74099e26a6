use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current or historical state of an account (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccountState {
    pub account_id: String,
    pub balance: Decimal,
    pub sequence_number: i64,
    pub subentry_count: i32,
    pub threshold_low: i16,
    pub threshold_medium: i16,
    pub threshold_high: i16,
    pub flags: i32,
    pub home_domain: Option<String>,
    pub sponsor: Option<String>,
    pub last_modified_ledger: i64,
}

/// A single SCD2 row from `accounts_snapshot`: the account's state for one
/// validity interval (§3.2).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccountSnapshotRow {
    pub account_id: String,
    pub balance: Decimal,
    pub sequence_number: i64,
    pub subentry_count: i32,
    pub flags: i32,
    pub home_domain: Option<String>,
    pub sponsor: Option<String>,
    pub ledger_sequence: i64,
    pub closed_at: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
}

/// Account history listing entry: one version of the account as of a
/// ledger, paginated by `ledger_seq desc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub balance: String,
    pub sequence_number: i64,
    pub ledger_sequence: i64,
    pub closed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountSortBy {
    Balance,
    LastModifiedLedger,
}

impl AccountSortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountSortBy::Balance => "balance",
            AccountSortBy::LastModifiedLedger => "last_modified_ledger",
        }
    }
}

impl std::str::FromStr for AccountSortBy {
    type Err = crate::error::QueryError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balance" => Ok(AccountSortBy::Balance),
            "last_modified_ledger" => Ok(AccountSortBy::LastModifiedLedger),
            other => Err(crate::error::QueryError::InvalidArgument(format!(
                "unsupported sort_by for accounts_list: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Signing key weights for an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signers {
    pub account_id: String,
    pub master_weight: i32,
    pub signers: Vec<Signer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Signer {
    pub key: String,
    pub weight: i32,
    pub signer_type: String,
}

/// Native + trustline balances for an account at the current tier view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balances {
    pub account_id: String,
    pub native_balance: String,
    pub trustlines: Vec<TrustlineBalance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustlineBalance {
    pub asset: String,
    pub asset_type: String,
    pub balance: String,
    pub limit: String,
}

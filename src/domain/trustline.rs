use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trustline state, keyed by (account_id, asset_code, asset_issuer, asset_type) (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrustlineState {
    pub account_id: String,
    pub asset_code: String,
    pub asset_issuer: String,
    pub asset_type: String,
    pub balance: Decimal,
    pub trust_limit: Decimal,
    pub buying_liabilities: Decimal,
    pub selling_liabilities: Decimal,
    pub authorized: bool,
    pub authorized_to_maintain_liabilities: bool,
    pub last_modified_ledger: i64,
}

/// SCD2 row used for point-in-time holder reconstruction (§4.5 op 3).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrustlineSnapshotRow {
    pub account_id: String,
    pub asset_code: String,
    pub asset_issuer: String,
    pub balance: Decimal,
    pub ledger_sequence: i64,
    pub closed_at: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
}

/// A holder entry in `token_holders`/`asset_holders_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holder {
    pub account_id: String,
    pub balance: String,
}

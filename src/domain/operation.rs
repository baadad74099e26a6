use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Enriched operation, keyed by (transaction_hash, operation_index) (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EnrichedOp {
    pub transaction_hash: String,
    pub operation_index: i32,
    pub ledger_sequence: i64,
    pub ledger_close_time: DateTime<Utc>,
    pub source_account: String,
    pub operation_type: String,
    pub payload: Value,
    pub successful: bool,
}

/// Unified token transfer over classic payments and Soroban transfers (§3.1).
///
/// Classic vs. contract-token deduplication when a Soroban invocation wraps
/// a classic payment is underspecified (§9 open question): both rows are
/// emitted, distinguished by `source_type`, never collapsed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TokenTransfer {
    pub transaction_hash: String,
    pub ledger_sequence: i64,
    pub source_type: String,
    pub from_account: String,
    pub to_account: String,
    pub contract_id: Option<String>,
    pub asset_code: String,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferGroupBy {
    Asset,
    SourceType,
    Hour,
    Day,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TransferStats {
    pub group_key: String,
    pub transfer_count: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TradeRow {
    pub ledger_sequence: i64,
    pub transaction_hash: String,
    pub operation_index: i32,
    pub base_asset: String,
    pub counter_asset: String,
    pub base_amount: Decimal,
    pub counter_amount: Decimal,
    pub price: Decimal,
    pub seller_id: String,
    pub buyer_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeGroupBy {
    Pair,
    Hour,
    Day,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TradeStats {
    pub group_key: String,
    pub trade_count: i64,
    pub volume: Decimal,
}

/// Event row keyed by (ledger_seq, tx_hash, op_index, intra-op index) (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Effect {
    pub ledger_sequence: i64,
    pub transaction_hash: String,
    pub operation_index: i32,
    pub sub_index: i32,
    pub effect_type: String,
    pub account_id: String,
    pub details: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EffectTypeCount {
    pub effect_type: String,
    pub name: String,
    pub count: i64,
}

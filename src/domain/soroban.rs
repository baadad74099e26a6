use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Soroban contract bytecode, keyed by wasm hash (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContractCode {
    pub hash: String,
    pub contract_id: Option<String>,
    pub size_bytes: i64,
    pub last_modified_ledger: i64,
}

/// Time-to-live entry for a contract data/code key.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ttl {
    pub key_hash: String,
    pub live_until_ledger: i64,
    pub last_modified_ledger: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EvictedKey {
    pub key_hash: String,
    pub contract_id: Option<String>,
    pub evicted_at_ledger: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RestoredKey {
    pub key_hash: String,
    pub contract_id: Option<String>,
    pub restored_at_ledger: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SorobanConfig {
    pub ledger_sequence: i64,
    pub max_contract_size_bytes: i64,
    pub max_contract_data_key_size_bytes: i64,
    pub max_contract_data_entry_size_bytes: i64,
    pub min_temp_entry_ttl: i64,
    pub min_persistent_entry_ttl: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    Temporary,
    Persistent,
}

/// Soroban smart-contract key/value state (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContractData {
    pub contract_id: String,
    pub key_hash: String,
    pub durability: String,
    pub key: Value,
    pub value: Value,
    pub last_modified_ledger: i64,
}

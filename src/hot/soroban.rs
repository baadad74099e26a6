use sqlx::{Postgres, QueryBuilder};

use crate::cursor::SorobanKeyCursor;
use crate::domain::{ContractCode, ContractData, EvictedKey, RestoredKey, SorobanConfig, Ttl};
use crate::error::QueryError;

use super::HotStore;

impl HotStore {
    pub async fn contract_code(&self, hash: &str) -> Result<Option<ContractCode>, QueryError> {
        Ok(sqlx::query_as("SELECT * FROM contract_code WHERE hash = $1")
            .bind(hash)
            .fetch_optional(self.pool())
            .await?)
    }

    pub async fn ttl(&self, key_hash: &str) -> Result<Option<Ttl>, QueryError> {
        Ok(sqlx::query_as("SELECT * FROM ttl WHERE key_hash = $1")
            .bind(key_hash)
            .fetch_optional(self.pool())
            .await?)
    }

    pub async fn ttl_expiring(
        &self,
        current_ledger: i64,
        within_ledgers: i64,
        limit: i64,
        cursor: Option<&SorobanKeyCursor>,
    ) -> Result<Vec<Ttl>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT key_hash, live_until_ledger, last_modified_ledger FROM ttl
             WHERE live_until_ledger > ",
        );
        qb.push_bind(current_ledger);
        qb.push(" AND live_until_ledger <= ");
        qb.push_bind(current_ledger + within_ledgers);
        if let Some(c) = cursor {
            qb.push(" AND (last_modified_ledger, key_hash) < (");
            qb.push_bind(c.ledger_seq);
            qb.push(", ");
            qb.push_bind(c.key_hash.clone());
            qb.push(")");
        }
        qb.push(" ORDER BY last_modified_ledger DESC, key_hash ASC LIMIT ");
        qb.push_bind(limit);
        Ok(qb.build_query_as().fetch_all(self.pool()).await?)
    }

    pub async fn ttl_expired(
        &self,
        current_ledger: i64,
        limit: i64,
        cursor: Option<&SorobanKeyCursor>,
    ) -> Result<Vec<Ttl>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT key_hash, live_until_ledger, last_modified_ledger FROM ttl
             WHERE live_until_ledger <= ",
        );
        qb.push_bind(current_ledger);
        if let Some(c) = cursor {
            qb.push(" AND (last_modified_ledger, key_hash) < (");
            qb.push_bind(c.ledger_seq);
            qb.push(", ");
            qb.push_bind(c.key_hash.clone());
            qb.push(")");
        }
        qb.push(" ORDER BY last_modified_ledger DESC, key_hash ASC LIMIT ");
        qb.push_bind(limit);
        Ok(qb.build_query_as().fetch_all(self.pool()).await?)
    }

    pub async fn evicted_keys(
        &self,
        limit: i64,
        cursor: Option<&SorobanKeyCursor>,
    ) -> Result<Vec<EvictedKey>, QueryError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT key_hash, contract_id, evicted_at_ledger FROM evicted_keys WHERE 1 = 1");
        if let Some(c) = cursor {
            qb.push(" AND (evicted_at_ledger, key_hash) < (");
            qb.push_bind(c.ledger_seq);
            qb.push(", ");
            qb.push_bind(c.key_hash.clone());
            qb.push(")");
        }
        qb.push(" ORDER BY evicted_at_ledger DESC, key_hash ASC LIMIT ");
        qb.push_bind(limit);
        Ok(qb.build_query_as().fetch_all(self.pool()).await?)
    }

    pub async fn restored_keys(
        &self,
        limit: i64,
        cursor: Option<&SorobanKeyCursor>,
    ) -> Result<Vec<RestoredKey>, QueryError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT key_hash, contract_id, restored_at_ledger FROM restored_keys WHERE 1 = 1");
        if let Some(c) = cursor {
            qb.push(" AND (restored_at_ledger, key_hash) < (");
            qb.push_bind(c.ledger_seq);
            qb.push(", ");
            qb.push_bind(c.key_hash.clone());
            qb.push(")");
        }
        qb.push(" ORDER BY restored_at_ledger DESC, key_hash ASC LIMIT ");
        qb.push_bind(limit);
        Ok(qb.build_query_as().fetch_all(self.pool()).await?)
    }

    pub async fn soroban_config(&self) -> Result<Option<SorobanConfig>, QueryError> {
        let row: Option<(i64, i64, i64, i64, i64, i64)> = sqlx::query_as(
            "SELECT ledger_sequence, max_contract_size_bytes, max_contract_data_key_size_bytes,
                    max_contract_data_entry_size_bytes, min_temp_entry_ttl, min_persistent_entry_ttl
             FROM soroban_network_config ORDER BY ledger_sequence DESC LIMIT 1",
        )
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(
            |(
                ledger_sequence,
                max_contract_size_bytes,
                max_contract_data_key_size_bytes,
                max_contract_data_entry_size_bytes,
                min_temp_entry_ttl,
                min_persistent_entry_ttl,
            )| SorobanConfig {
                ledger_sequence,
                max_contract_size_bytes,
                max_contract_data_key_size_bytes,
                max_contract_data_entry_size_bytes,
                min_temp_entry_ttl,
                min_persistent_entry_ttl,
            },
        ))
    }

    pub async fn contract_data(
        &self,
        contract_id: &str,
        durability: Option<&str>,
        key_hash: Option<&str>,
        limit: i64,
        cursor: Option<&SorobanKeyCursor>,
    ) -> Result<Vec<ContractData>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT contract_id, key_hash, durability, key, value, last_modified_ledger
             FROM contract_data WHERE contract_id = ",
        );
        qb.push_bind(contract_id.to_string());
        if let Some(d) = durability {
            qb.push(" AND durability = ");
            qb.push_bind(d.to_string());
        }
        if let Some(k) = key_hash {
            qb.push(" AND key_hash = ");
            qb.push_bind(k.to_string());
        }
        if let Some(c) = cursor {
            qb.push(" AND (last_modified_ledger, key_hash) < (");
            qb.push_bind(c.ledger_seq);
            qb.push(", ");
            qb.push_bind(c.key_hash.clone());
            qb.push(")");
        }
        qb.push(" ORDER BY last_modified_ledger DESC, key_hash ASC LIMIT ");
        qb.push_bind(limit);
        Ok(qb.build_query_as().fetch_all(self.pool()).await?)
    }
}

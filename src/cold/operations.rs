use serde_json::Value;

use crate::domain::EnrichedOp;
use crate::error::QueryError;

use super::accounts::parse_rfc3339;
use super::{ColdParam, ColdStore};

impl ColdStore {
    pub async fn operations(
        &self,
        account_id: Option<&str>,
        start_ledger: Option<i64>,
        end_ledger: Option<i64>,
        before_ledger_seq: Option<i64>,
        before_op_index: Option<i32>,
        limit: i64,
    ) -> Result<Vec<EnrichedOp>, QueryError> {
        let table = self.table("operations_enriched");
        let mut sql = format!(
            "SELECT transaction_hash, operation_index, ledger_sequence, ledger_close_time,
                    source_account, operation_type, payload, successful
             FROM {table} WHERE 1 = 1"
        );
        let mut params = vec![];
        if let Some(account_id) = account_id {
            sql.push_str(" AND source_account = ?");
            params.push(ColdParam::Text(account_id.to_string()));
        }
        if let Some(start) = start_ledger {
            sql.push_str(" AND ledger_sequence >= ?");
            params.push(ColdParam::I64(start));
        }
        if let Some(end) = end_ledger {
            sql.push_str(" AND ledger_sequence <= ?");
            params.push(ColdParam::I64(end));
        }
        if let (Some(seq), Some(idx)) = (before_ledger_seq, before_op_index) {
            sql.push_str(" AND (ledger_sequence < ? OR (ledger_sequence = ? AND operation_index < ?))");
            params.push(ColdParam::I64(seq));
            params.push(ColdParam::I64(seq));
            params.push(ColdParam::I64(idx as i64));
        }
        sql.push_str(" ORDER BY ledger_sequence DESC, operation_index DESC LIMIT ?");
        params.push(ColdParam::I64(limit));

        self.query(sql, params, |row| {
            let ledger_close_time_raw: String = row.get(3)?;
            let payload_raw: String = row.get(6)?;
            Ok(EnrichedOp {
                transaction_hash: row.get(0)?,
                operation_index: row.get(1)?,
                ledger_sequence: row.get(2)?,
                ledger_close_time: parse_rfc3339(&ledger_close_time_raw)?,
                source_account: row.get(4)?,
                operation_type: row.get(5)?,
                payload: serde_json::from_str::<Value>(&payload_raw).unwrap_or(Value::Null),
                successful: row.get(7)?,
            })
        })
        .await
    }

    /// Payment-operation SCD over `[start, end]`, sorted
    /// `(ledger_sequence asc, operation_index asc)` — the source feed for
    /// the `transactions` archive artifact (§6.3, §4.6).
    pub async fn payment_operations_in_period(
        &self,
        asset_code: &str,
        asset_issuer: &str,
        start_ledger_close: &str,
        end_ledger_close: &str,
        include_failed: bool,
    ) -> Result<Vec<EnrichedOp>, QueryError> {
        let table = self.table("operations_enriched");
        let mut sql = format!(
            "SELECT transaction_hash, operation_index, ledger_sequence, ledger_close_time,
                    source_account, operation_type, payload, successful
             FROM {table}
             WHERE operation_type IN ('payment', 'path_payment_strict_send', 'path_payment_strict_receive')
               AND ledger_close_time >= ? AND ledger_close_time < ?
               AND payload->>'asset_code' = ? AND payload->>'asset_issuer' = ?"
        );
        if !include_failed {
            sql.push_str(" AND successful = true");
        }
        sql.push_str(" ORDER BY ledger_sequence ASC, operation_index ASC");

        let params = vec![
            ColdParam::Text(start_ledger_close.to_string()),
            ColdParam::Text(end_ledger_close.to_string()),
            ColdParam::Text(asset_code.to_string()),
            ColdParam::Text(asset_issuer.to_string()),
        ];

        self.query(sql, params, |row| {
            let ledger_close_time_raw: String = row.get(3)?;
            let payload_raw: String = row.get(6)?;
            Ok(EnrichedOp {
                transaction_hash: row.get(0)?,
                operation_index: row.get(1)?,
                ledger_sequence: row.get(2)?,
                ledger_close_time: parse_rfc3339(&ledger_close_time_raw)?,
                source_account: row.get(4)?,
                operation_type: row.get(5)?,
                payload: serde_json::from_str::<Value>(&payload_raw).unwrap_or(Value::Null),
                successful: row.get(7)?,
            })
        })
        .await
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};

use crate::cursor::{EventCursor, OperationCursor, TransferCursor};
use crate::domain::{Effect, EffectTypeCount, EnrichedOp, TokenTransfer, TradeRow, TradeStats, TransferStats};
use crate::error::QueryError;

use super::HotStore;

/// Filters for `operations(...)`. `cursor` and `start_ledger` are mutually
/// exclusive (§6.1); enforced by the caller (`crate::facade`), not here.
#[derive(Debug, Clone, Default)]
pub struct OperationFilters {
    pub account_id: Option<String>,
    pub tx_hash: Option<String>,
    pub payments_only: bool,
    pub soroban_only: bool,
    pub start_ledger: Option<i64>,
    pub end_ledger: Option<i64>,
}

const PAYMENT_OP_TYPES: &[&str] = &["payment", "path_payment_strict_send", "path_payment_strict_receive"];
const SOROBAN_OP_TYPES: &[&str] = &["invoke_host_function", "extend_footprint_ttl", "restore_footprint"];

impl HotStore {
    pub async fn operations(
        &self,
        filters: &OperationFilters,
        limit: i64,
        cursor: Option<&OperationCursor>,
    ) -> Result<Vec<EnrichedOp>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT transaction_hash, operation_index, ledger_sequence, ledger_close_time,
                    source_account, operation_type, payload, successful
             FROM operations_enriched WHERE 1 = 1",
        );

        if let Some(ref account_id) = filters.account_id {
            qb.push(" AND source_account = ");
            qb.push_bind(account_id.clone());
        }
        if let Some(ref tx_hash) = filters.tx_hash {
            qb.push(" AND transaction_hash = ");
            qb.push_bind(tx_hash.clone());
        }
        if filters.payments_only {
            qb.push(" AND operation_type = ANY(");
            qb.push_bind(PAYMENT_OP_TYPES.iter().map(|s| s.to_string()).collect::<Vec<_>>());
            qb.push(")");
        }
        if filters.soroban_only {
            qb.push(" AND operation_type = ANY(");
            qb.push_bind(SOROBAN_OP_TYPES.iter().map(|s| s.to_string()).collect::<Vec<_>>());
            qb.push(")");
        }
        if let Some(start) = filters.start_ledger {
            qb.push(" AND ledger_sequence >= ");
            qb.push_bind(start);
        }
        if let Some(end) = filters.end_ledger {
            qb.push(" AND ledger_sequence <= ");
            qb.push_bind(end);
        }
        if let Some(c) = cursor {
            qb.push(" AND (ledger_sequence < ");
            qb.push_bind(c.ledger_seq);
            qb.push(" OR (ledger_sequence = ");
            qb.push_bind(c.ledger_seq);
            qb.push(" AND operation_index < ");
            qb.push_bind(c.op_index);
            qb.push("))");
        }

        qb.push(" ORDER BY ledger_sequence DESC, operation_index DESC LIMIT ");
        qb.push_bind(limit);

        let rows: Vec<EnrichedOp> = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows)
    }

    pub async fn token_transfers(
        &self,
        source_type: Option<&str>,
        asset_code: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        limit: i64,
        cursor: Option<&TransferCursor>,
    ) -> Result<Vec<TokenTransfer>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT transaction_hash, ledger_sequence, source_type, from_account, to_account,
                    contract_id, asset_code, amount, timestamp
             FROM token_transfers WHERE timestamp >= ",
        );
        qb.push_bind(start_time);
        qb.push(" AND timestamp <= ");
        qb.push_bind(end_time);

        if let Some(st) = source_type {
            qb.push(" AND source_type = ");
            qb.push_bind(st.to_string());
        }
        if let Some(code) = asset_code {
            qb.push(" AND asset_code = ");
            qb.push_bind(code.to_string());
        }
        if let Some(from) = from {
            qb.push(" AND from_account = ");
            qb.push_bind(from.to_string());
        }
        if let Some(to) = to {
            qb.push(" AND to_account = ");
            qb.push_bind(to.to_string());
        }
        if let Some(c) = cursor {
            let ts: DateTime<Utc> = c
                .timestamp
                .parse()
                .map_err(|_| QueryError::InvalidCursor(format!("unparseable timestamp: {}", c.timestamp)))?;
            qb.push(" AND (ledger_sequence < ");
            qb.push_bind(c.ledger_seq);
            qb.push(" OR (ledger_sequence = ");
            qb.push_bind(c.ledger_seq);
            qb.push(" AND timestamp < ");
            qb.push_bind(ts);
            qb.push("))");
        }

        qb.push(" ORDER BY ledger_sequence DESC, timestamp DESC LIMIT ");
        qb.push_bind(limit);

        let rows: Vec<TokenTransfer> = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows)
    }

    pub async fn token_transfer_stats(
        &self,
        group_by: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Vec<TransferStats>, QueryError> {
        let group_expr = match group_by {
            "asset" => "asset_code",
            "source_type" => "source_type",
            "hour" => "date_trunc('hour', timestamp)::text",
            "day" => "date_trunc('day', timestamp)::text",
            other => {
                return Err(QueryError::InvalidArgument(format!(
                    "unsupported group_by for token_transfer_stats: {other}"
                )))
            }
        };

        let sql = format!(
            "SELECT {group_expr} AS group_key, COUNT(*) AS transfer_count, SUM(amount) AS total_amount
             FROM token_transfers WHERE timestamp >= $1 AND timestamp <= $2
             GROUP BY {group_expr} ORDER BY group_key"
        );

        let rows: Vec<(String, i64, Decimal)> = sqlx::query_as(&sql)
            .bind(start_time)
            .bind(end_time)
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(group_key, transfer_count, total_amount)| TransferStats {
                group_key,
                transfer_count,
                total_amount,
            })
            .collect())
    }

    pub async fn trades(
        &self,
        base_asset: Option<&str>,
        counter_asset: Option<&str>,
        limit: i64,
        cursor: Option<&EventCursor>,
    ) -> Result<Vec<TradeRow>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT ledger_sequence, transaction_hash, operation_index,
                    base_asset, counter_asset, base_amount, counter_amount, price, seller_id, buyer_id
             FROM trades WHERE 1 = 1",
        );
        if let Some(base) = base_asset {
            qb.push(" AND base_asset = ");
            qb.push_bind(base.to_string());
        }
        if let Some(counter) = counter_asset {
            qb.push(" AND counter_asset = ");
            qb.push_bind(counter.to_string());
        }
        if let Some(c) = cursor {
            qb.push(" AND (ledger_sequence, transaction_hash, operation_index) < (");
            qb.push_bind(c.ledger_seq);
            qb.push(", ");
            qb.push_bind(c.tx_hash.clone());
            qb.push(", ");
            qb.push_bind(c.op_index);
            qb.push(")");
        }
        qb.push(" ORDER BY ledger_sequence DESC, transaction_hash DESC, operation_index DESC LIMIT ");
        qb.push_bind(limit);

        let rows: Vec<TradeRow> = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows)
    }

    pub async fn trade_stats(
        &self,
        group_by: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Vec<TradeStats>, QueryError> {
        let group_expr = match group_by {
            "pair" => "base_asset || '/' || counter_asset",
            "hour" => "date_trunc('hour', settled_at)::text",
            "day" => "date_trunc('day', settled_at)::text",
            other => {
                return Err(QueryError::InvalidArgument(format!(
                    "unsupported group_by for trade_stats: {other}"
                )))
            }
        };
        let sql = format!(
            "SELECT {group_expr} AS group_key, COUNT(*) AS trade_count, SUM(counter_amount) AS volume
             FROM trades WHERE settled_at >= $1 AND settled_at <= $2
             GROUP BY {group_expr} ORDER BY group_key"
        );
        let rows: Vec<(String, i64, Decimal)> = sqlx::query_as(&sql)
            .bind(start_time)
            .bind(end_time)
            .fetch_all(self.pool())
            .await?;
        Ok(rows
            .into_iter()
            .map(|(group_key, trade_count, volume)| TradeStats {
                group_key,
                trade_count,
                volume,
            })
            .collect())
    }

    pub async fn effects(
        &self,
        account_id: Option<&str>,
        effect_type: Option<&str>,
        limit: i64,
        cursor: Option<&EventCursor>,
    ) -> Result<Vec<Effect>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT ledger_sequence, transaction_hash, operation_index, sub_index,
                    effect_type, account_id, details
             FROM effects WHERE 1 = 1",
        );
        if let Some(account_id) = account_id {
            qb.push(" AND account_id = ");
            qb.push_bind(account_id.to_string());
        }
        if let Some(effect_type) = effect_type {
            qb.push(" AND effect_type = ");
            qb.push_bind(effect_type.to_string());
        }
        if let Some(c) = cursor {
            qb.push(" AND (ledger_sequence, transaction_hash, operation_index, sub_index) < (");
            qb.push_bind(c.ledger_seq);
            qb.push(", ");
            qb.push_bind(c.tx_hash.clone());
            qb.push(", ");
            qb.push_bind(c.op_index);
            qb.push(", ");
            qb.push_bind(c.sub_index);
            qb.push(")");
        }
        qb.push(" ORDER BY ledger_sequence DESC, transaction_hash DESC, operation_index DESC, sub_index DESC LIMIT ");
        qb.push_bind(limit);

        let rows: Vec<Effect> = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows)
    }

    pub async fn effect_types(&self) -> Result<Vec<EffectTypeCount>, QueryError> {
        let rows: Vec<EffectTypeCount> = sqlx::query_as(
            "SELECT effect_type, effect_type AS name, COUNT(*) AS count
             FROM effects GROUP BY effect_type ORDER BY count DESC",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}

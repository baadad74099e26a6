//! Artifact producers (§4.6): each is pure from its inputs to a byte
//! buffer plus a checksum. None of them mutate job state — [`crate::archive::ArchiveEngine`]
//! is the only place that writes to an [`crate::domain::ArchiveJob`].

use std::io::Cursor;

use arrow::array::{BooleanArray, Int32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

use crate::asset::Asset;
use crate::cold::ColdStore;
use crate::domain::{ArchiveFormat, Artifact, SupplyInterval};
use crate::error::QueryError;
use crate::snapshot::SnapshotReader;

use super::canonical::{canonical_json, checksum_of_bytes};

/// Canonical row shape for the `transactions` artifact (§6.3). Field order
/// is the checksum's canonical order.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRow {
    pub ledger_sequence: i64,
    pub closed_at: String,
    pub transaction_hash: String,
    pub operation_index: i32,
    pub operation_type: String,
    pub from_account: String,
    pub to_account: String,
    pub amount: String,
    pub successful: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceRow {
    pub account_id: String,
    pub balance: String,
    pub percent_of_supply: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplyRow {
    pub timestamp: String,
    pub ledger_sequence: i64,
    pub total_supply: String,
    pub circulating_supply: String,
    pub issuer_balance: String,
    pub holder_count: i32,
    pub supply_change: Option<String>,
    pub supply_change_percent: Option<String>,
}

pub(crate) fn extract_string(payload: &Value, key: &str) -> String {
    match payload.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// `transactions.{json,csv,parquet}`: payment-op SCD over the period,
/// `(ledger_sequence asc, operation_index asc)` (§6.3). The `successful`
/// column is the archive's own source of truth for status, so the
/// producer pulls every row — failed and successful alike — rather than
/// filtering server-side.
pub async fn produce_transactions(
    cold: &ColdStore,
    asset: &Asset,
    start: NaiveDate,
    end: NaiveDate,
    format: ArchiveFormat,
) -> Result<Artifact, QueryError> {
    let start_str = start.and_hms_opt(0, 0, 0).unwrap().and_utc().to_rfc3339();
    let end_str = end.and_hms_opt(0, 0, 0).unwrap().and_utc().to_rfc3339();
    let ops = cold
        .payment_operations_in_period(asset.code(), asset.issuer().unwrap_or_default(), &start_str, &end_str, true)
        .await?;

    let rows: Vec<TransactionRow> = ops
        .into_iter()
        .map(|op| TransactionRow {
            ledger_sequence: op.ledger_sequence,
            closed_at: op.ledger_close_time.to_rfc3339(),
            transaction_hash: op.transaction_hash,
            operation_index: op.operation_index,
            operation_type: op.operation_type,
            from_account: if extract_string(&op.payload, "from").is_empty() {
                op.source_account.clone()
            } else {
                extract_string(&op.payload, "from")
            },
            to_account: extract_string(&op.payload, "to"),
            amount: extract_string(&op.payload, "amount"),
            successful: op.successful,
        })
        .collect();

    build_artifact("transactions", rows, format, transactions_to_parquet)
}

/// `balances_YYYY-MM-DD.{json,csv,parquet}`: SCD2 holders at `snapshot_date`,
/// sorted `balance desc` (§6.3).
pub async fn produce_balance_snapshot(
    cold: &ColdStore,
    asset: &Asset,
    snapshot_date: NaiveDate,
    format: ArchiveFormat,
) -> Result<Artifact, QueryError> {
    let at = snapshot_date
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| QueryError::InvalidArgument("invalid snapshot date".to_string()))?
        .and_utc();

    let supply = cold.holders_and_supply_at(asset.code(), asset.issuer().unwrap_or_default(), at).await?;

    let balance_rows: Vec<(String, String)> = match asset {
        Asset::Native => cold
            .account_holders_at(at, None, i64::MAX)
            .await?
            .into_iter()
            .map(|r| (r.account_id, r.balance.to_string()))
            .collect(),
        Asset::Credit { code, issuer } => cold
            .trustline_holders_at(code, issuer, at, None, i64::MAX)
            .await?
            .into_iter()
            .map(|r| (r.account_id, r.balance.to_string()))
            .collect(),
    };
    let holders: Vec<(String, BigDecimal)> = balance_rows
        .into_iter()
        .map(|(account_id, balance)| {
            (
                account_id,
                BigDecimal::from_str(&balance).unwrap_or_else(|_| BigDecimal::zero()),
            )
        })
        .collect();

    let rows: Vec<BalanceRow> = holders
        .into_iter()
        .map(|(account_id, balance)| {
            let percent = if supply.total_supply.is_zero() {
                BigDecimal::zero()
            } else {
                (&balance / &supply.total_supply) * BigDecimal::from(100)
            };
            BalanceRow {
                account_id,
                balance: balance.to_string(),
                percent_of_supply: format!("{:.2}", percent),
            }
        })
        .collect();

    let name = format!("balances_{}", snapshot_date.format("%Y-%m-%d"));
    build_artifact(&name, rows, format, balances_to_parquet)
}

/// `supply_timeline.{json,csv,parquet}`: daily SCD2 aggregate across the
/// period, `timestamp asc` (§6.3). Always daily for the archive artifact,
/// independent of the `supply_timeline` query operation's configurable
/// interval (§4.6).
pub async fn produce_supply_timeline(
    snapshot: &SnapshotReader,
    code: &str,
    issuer: &str,
    start: NaiveDate,
    end: NaiveDate,
    format: ArchiveFormat,
) -> Result<Artifact, QueryError> {
    let resp = snapshot.supply_timeline(code, issuer, start, end, SupplyInterval::OneDay).await?;
    let rows: Vec<SupplyRow> = resp
        .points
        .into_iter()
        .map(|p| SupplyRow {
            timestamp: p.timestamp.to_rfc3339(),
            ledger_sequence: p.ledger_sequence,
            total_supply: p.total_supply,
            circulating_supply: p.circulating_supply,
            issuer_balance: p.issuer_balance,
            holder_count: p.holder_count as i32,
            supply_change: p.supply_change,
            supply_change_percent: p.supply_change_percent,
        })
        .collect();

    build_artifact("supply_timeline", rows, format, supply_to_parquet)
}

fn build_artifact<T, F>(name: &str, rows: Vec<T>, format: ArchiveFormat, to_parquet: F) -> Result<Artifact, QueryError>
where
    T: Serialize,
    F: Fn(&[T]) -> Result<Vec<u8>, QueryError>,
{
    let row_count = rows.len();
    let checksum = checksum_of_bytes(&canonical_json(&rows)?);

    let (file_name, bytes) = match format {
        ArchiveFormat::Json => (format!("{name}.json"), canonical_json(&rows)?),
        ArchiveFormat::Csv => {
            let mut writer = csv::Writer::from_writer(vec![]);
            for row in &rows {
                writer
                    .serialize(row)
                    .map_err(|e| QueryError::Internal(format!("csv encode failed for {name}: {e}")))?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| QueryError::Internal(format!("csv flush failed for {name}: {e}")))?;
            (format!("{name}.csv"), bytes)
        }
        ArchiveFormat::Parquet => (format!("{name}.parquet"), to_parquet(&rows)?),
    };

    Ok(Artifact {
        name: file_name,
        format,
        row_count,
        checksum,
        bytes,
    })
}

fn write_batch(schema: Arc<Schema>, batch: RecordBatch) -> Result<Vec<u8>, QueryError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut writer = ArrowWriter::try_new(&mut buf, schema, None)
            .map_err(|e| QueryError::Internal(format!("parquet writer init failed: {e}")))?;
        writer
            .write(&batch)
            .map_err(|e| QueryError::Internal(format!("parquet write failed: {e}")))?;
        writer.close().map_err(|e| QueryError::Internal(format!("parquet close failed: {e}")))?;
    }
    Ok(buf.into_inner())
}

fn transactions_to_parquet(rows: &[TransactionRow]) -> Result<Vec<u8>, QueryError> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("ledger_sequence", DataType::Int64, false),
        Field::new("closed_at", DataType::Utf8, false),
        Field::new("transaction_hash", DataType::Utf8, false),
        Field::new("operation_index", DataType::Int32, false),
        Field::new("operation_type", DataType::Utf8, false),
        Field::new("from_account", DataType::Utf8, false),
        Field::new("to_account", DataType::Utf8, false),
        Field::new("amount", DataType::Utf8, false),
        Field::new("successful", DataType::Boolean, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.ledger_sequence))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.closed_at.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.transaction_hash.as_str()))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.operation_index))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.operation_type.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.from_account.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.to_account.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.amount.as_str()))),
            Arc::new(BooleanArray::from_iter(rows.iter().map(|r| Some(r.successful)))),
        ],
    )
    .map_err(|e| QueryError::Internal(format!("arrow batch build failed: {e}")))?;
    write_batch(schema, batch)
}

fn balances_to_parquet(rows: &[BalanceRow]) -> Result<Vec<u8>, QueryError> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("account_id", DataType::Utf8, false),
        Field::new("balance", DataType::Utf8, false),
        Field::new("percent_of_supply", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.account_id.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.balance.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.percent_of_supply.as_str()))),
        ],
    )
    .map_err(|e| QueryError::Internal(format!("arrow batch build failed: {e}")))?;
    write_batch(schema, batch)
}

fn supply_to_parquet(rows: &[SupplyRow]) -> Result<Vec<u8>, QueryError> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("timestamp", DataType::Utf8, false),
        Field::new("ledger_sequence", DataType::Int64, false),
        Field::new("total_supply", DataType::Utf8, false),
        Field::new("circulating_supply", DataType::Utf8, false),
        Field::new("issuer_balance", DataType::Utf8, false),
        Field::new("holder_count", DataType::Int32, false),
        Field::new("supply_change", DataType::Utf8, true),
        Field::new("supply_change_percent", DataType::Utf8, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.timestamp.as_str()))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.ledger_sequence))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.total_supply.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.circulating_supply.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.issuer_balance.as_str()))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.holder_count))),
            Arc::new(StringArray::from(rows.iter().map(|r| r.supply_change.as_deref()).collect::<Vec<_>>())),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.supply_change_percent.as_deref()).collect::<Vec<_>>(),
            )),
        ],
    )
    .map_err(|e| QueryError::Internal(format!("arrow batch build failed: {e}")))?;
    write_batch(schema, batch)
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::domain::{AccountSnapshot, AccountSnapshotRow, AccountState};
use crate::error::QueryError;

use super::{ColdParam, ColdStore};

impl ColdStore {
    /// Latest version per account key in `accounts_current` (§4.4
    /// deduplication: the cold tier may hold several versions per key; a
    /// window-ranked "latest per key" projection runs before any merge).
    pub async fn accounts_current_latest(&self, limit: i64, after_account_id: Option<String>) -> Result<Vec<AccountState>, QueryError> {
        let table = self.table("accounts_current");
        let sql = format!(
            "WITH ranked AS (
                SELECT account_id, balance, sequence_number, subentry_count,
                       threshold_low, threshold_medium, threshold_high, flags,
                       home_domain, sponsor, last_modified_ledger,
                       ROW_NUMBER() OVER (PARTITION BY account_id ORDER BY last_modified_ledger DESC) AS rn
                FROM {table}
            )
            SELECT account_id, balance, sequence_number, subentry_count,
                   threshold_low, threshold_medium, threshold_high, flags,
                   home_domain, sponsor, last_modified_ledger
            FROM ranked WHERE rn = 1 {filter}
            ORDER BY account_id ASC LIMIT ?",
            filter = if after_account_id.is_some() { "AND account_id > ?" } else { "" }
        );

        let mut params: Vec<ColdParam> = vec![];
        if let Some(after) = after_account_id {
            params.push(ColdParam::Text(after));
        }
        params.push(ColdParam::I64(limit));

        self.query(sql, params, |row| {
            Ok(AccountState {
                account_id: row.get(0)?,
                balance: decimal(row, 1)?,
                sequence_number: row.get(2)?,
                subentry_count: row.get(3)?,
                threshold_low: row.get(4)?,
                threshold_medium: row.get(5)?,
                threshold_high: row.get(6)?,
                flags: row.get(7)?,
                home_domain: row.get(8)?,
                sponsor: row.get(9)?,
                last_modified_ledger: row.get(10)?,
            })
        })
        .await
    }

    /// Single-key lookup used as the cold-tier fallback for `account_current`
    /// when the hot tier has no row for the account (§4.4).
    pub async fn account_current(&self, account_id: &str) -> Result<Option<AccountState>, QueryError> {
        let table = self.table("accounts_current");
        let sql = format!(
            "SELECT account_id, balance, sequence_number, subentry_count,
                    threshold_low, threshold_medium, threshold_high, flags,
                    home_domain, sponsor, last_modified_ledger
             FROM {table} WHERE account_id = ?
             ORDER BY last_modified_ledger DESC LIMIT 1"
        );
        let rows = self
            .query(sql, vec![ColdParam::Text(account_id.to_string())], |row| {
                Ok(AccountState {
                    account_id: row.get(0)?,
                    balance: decimal(row, 1)?,
                    sequence_number: row.get(2)?,
                    subentry_count: row.get(3)?,
                    threshold_low: row.get(4)?,
                    threshold_medium: row.get(5)?,
                    threshold_high: row.get(6)?,
                    flags: row.get(7)?,
                    home_domain: row.get(8)?,
                    sponsor: row.get(9)?,
                    last_modified_ledger: row.get(10)?,
                })
            })
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn account_history(
        &self,
        account_id: &str,
        limit: i64,
        cursor_ledger_seq: Option<i64>,
    ) -> Result<Vec<AccountSnapshot>, QueryError> {
        let table = self.table("accounts_history");
        let sql = format!(
            "SELECT account_id, balance, sequence_number, ledger_sequence, closed_at
             FROM {table} WHERE account_id = ? {filter}
             ORDER BY ledger_sequence DESC LIMIT ?",
            filter = if cursor_ledger_seq.is_some() { "AND ledger_sequence < ?" } else { "" }
        );
        let mut params = vec![ColdParam::Text(account_id.to_string())];
        if let Some(seq) = cursor_ledger_seq {
            params.push(ColdParam::I64(seq));
        }
        params.push(ColdParam::I64(limit));

        self.query(sql, params, |row| {
            let balance = decimal(row, 1)?;
            let closed_at_raw: String = row.get(4)?;
            Ok(AccountSnapshot {
                account_id: row.get(0)?,
                balance: balance.to_string(),
                sequence_number: row.get(2)?,
                ledger_sequence: row.get(3)?,
                closed_at: parse_rfc3339(&closed_at_raw)?,
            })
        })
        .await
    }

    /// SCD2 validity predicate over `accounts_snapshot` (§4.5 op 1, §3.2):
    /// the unique row with `valid_from <= t < valid_to` (or `valid_to IS NULL`).
    pub async fn account_at(&self, account_id: &str, at: DateTime<Utc>) -> Result<Option<AccountSnapshotRow>, QueryError> {
        let table = self.table("accounts_snapshot");
        let sql = format!(
            "SELECT account_id, balance, sequence_number, subentry_count, flags,
                    home_domain, sponsor, ledger_sequence, closed_at, valid_to
             FROM {table}
             WHERE account_id = ? AND closed_at <= ? AND (valid_to IS NULL OR valid_to > ?)
             ORDER BY closed_at DESC LIMIT 1"
        );
        let at_str = at.to_rfc3339();
        let rows = self
            .query(
                sql,
                vec![
                    ColdParam::Text(account_id.to_string()),
                    ColdParam::Text(at_str.clone()),
                    ColdParam::Text(at_str),
                ],
                |row| {
                    let balance = decimal(row, 1)?;
                    let closed_at_raw: String = row.get(8)?;
                    let valid_to_raw: Option<String> = row.get(9)?;
                    Ok(AccountSnapshotRow {
                        account_id: row.get(0)?,
                        balance,
                        sequence_number: row.get(2)?,
                        subentry_count: row.get(3)?,
                        flags: row.get(4)?,
                        home_domain: row.get(5)?,
                        sponsor: row.get(6)?,
                        ledger_sequence: row.get(7)?,
                        closed_at: parse_rfc3339(&closed_at_raw)?,
                        valid_to: valid_to_raw.as_deref().map(parse_rfc3339).transpose()?,
                    })
                },
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// XLM holders at `t`, mirroring
    /// [`crate::hot::HotStore::account_holders_at`] over the cold tier's
    /// `accounts_snapshot` table (§4.5 op 3).
    pub async fn account_holders_at(
        &self,
        at: DateTime<Utc>,
        min_balance: Option<String>,
        limit: i64,
    ) -> Result<Vec<AccountSnapshotRow>, QueryError> {
        let table = self.table("accounts_snapshot");
        let at_str = at.to_rfc3339();
        let mut sql = format!(
            "SELECT account_id, balance, sequence_number, subentry_count, flags,
                    home_domain, sponsor, ledger_sequence, closed_at, valid_to
             FROM {table}
             WHERE closed_at <= ? AND (valid_to IS NULL OR valid_to > ?)
               AND CAST(balance AS DECIMAL(38,7)) > 0"
        );
        let mut params = vec![ColdParam::Text(at_str.clone()), ColdParam::Text(at_str)];
        if let Some(min) = min_balance {
            sql.push_str(" AND CAST(balance AS DECIMAL(38,7)) >= CAST(? AS DECIMAL(38,7))");
            params.push(ColdParam::Text(min));
        }
        sql.push_str(" ORDER BY CAST(balance AS DECIMAL(38,7)) DESC, account_id ASC LIMIT ?");
        params.push(ColdParam::I64(limit));

        self.query(sql, params, |row| {
            let balance = decimal(row, 1)?;
            let closed_at_raw: String = row.get(8)?;
            let valid_to_raw: Option<String> = row.get(9)?;
            Ok(AccountSnapshotRow {
                account_id: row.get(0)?,
                balance,
                sequence_number: row.get(2)?,
                subentry_count: row.get(3)?,
                flags: row.get(4)?,
                home_domain: row.get(5)?,
                sponsor: row.get(6)?,
                ledger_sequence: row.get(7)?,
                closed_at: parse_rfc3339(&closed_at_raw)?,
                valid_to: valid_to_raw.as_deref().map(parse_rfc3339).transpose()?,
            })
        })
        .await
    }
}

pub(crate) fn decimal(row: &duckdb::Row<'_>, idx: usize) -> duckdb::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw).map_err(|e| {
        duckdb::Error::FromSqlConversionFailure(idx, duckdb::types::Type::Text, Box::new(e))
    })
}

/// Parses a cold-store timestamp column, surfacing a conversion error on
/// malformed input rather than substituting the current time — a silent
/// fallback here would feed a non-reproducible value into every archive
/// artifact built from this row (§9: surface an error, the same rule
/// applied to `asset::parse_stroops`).
pub(crate) fn parse_rfc3339(s: &str) -> duckdb::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| duckdb::Error::FromSqlConversionFailure(0, duckdb::types::Type::Text, Box::new(e)))
}

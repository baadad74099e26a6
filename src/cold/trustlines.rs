use chrono::{DateTime, Utc};

use crate::domain::{Holder, TrustlineSnapshotRow};
use crate::error::QueryError;

use super::accounts::{decimal, parse_rfc3339};
use super::{ColdParam, ColdStore};

impl ColdStore {
    pub async fn token_holders(
        &self,
        code: &str,
        issuer: &str,
        min_balance: Option<String>,
        limit: i64,
        after: Option<(String, String)>,
    ) -> Result<Vec<Holder>, QueryError> {
        let table = self.table("trustlines_current");
        let mut sql = format!(
            "SELECT account_id, balance FROM {table}
             WHERE asset_code = ? AND asset_issuer = ? AND CAST(balance AS DECIMAL(38,7)) > 0"
        );
        let mut params = vec![ColdParam::Text(code.to_string()), ColdParam::Text(issuer.to_string())];

        if let Some(min) = &min_balance {
            sql.push_str(" AND CAST(balance AS DECIMAL(38,7)) >= CAST(? AS DECIMAL(38,7))");
            params.push(ColdParam::Text(min.clone()));
        }
        if let Some((balance, account_id)) = &after {
            sql.push_str(
                " AND (CAST(balance AS DECIMAL(38,7)) < CAST(? AS DECIMAL(38,7))
                       OR (CAST(balance AS DECIMAL(38,7)) = CAST(? AS DECIMAL(38,7)) AND account_id > ?))",
            );
            params.push(ColdParam::Text(balance.clone()));
            params.push(ColdParam::Text(balance.clone()));
            params.push(ColdParam::Text(account_id.clone()));
        }
        sql.push_str(" ORDER BY CAST(balance AS DECIMAL(38,7)) DESC, account_id ASC LIMIT ?");
        params.push(ColdParam::I64(limit));

        self.query(sql, params, |row| {
            let balance = decimal(row, 1)?;
            Ok(Holder {
                account_id: row.get(0)?,
                balance: balance.to_string(),
            })
        })
        .await
    }

    /// SCD2 holders-at-time projection, `balance > 0` at `at` (§4.5 op 3).
    pub async fn trustline_holders_at(
        &self,
        code: &str,
        issuer: &str,
        at: DateTime<Utc>,
        min_balance: Option<String>,
        limit: i64,
    ) -> Result<Vec<TrustlineSnapshotRow>, QueryError> {
        let table = self.table("trustlines_snapshot");
        let at_str = at.to_rfc3339();
        let mut sql = format!(
            "SELECT account_id, asset_code, asset_issuer, balance, ledger_sequence, closed_at, valid_to
             FROM {table}
             WHERE asset_code = ? AND asset_issuer = ?
               AND closed_at <= ? AND (valid_to IS NULL OR valid_to > ?)
               AND CAST(balance AS DECIMAL(38,7)) > 0"
        );
        let mut params = vec![
            ColdParam::Text(code.to_string()),
            ColdParam::Text(issuer.to_string()),
            ColdParam::Text(at_str.clone()),
            ColdParam::Text(at_str),
        ];
        if let Some(min) = min_balance {
            sql.push_str(" AND CAST(balance AS DECIMAL(38,7)) >= CAST(? AS DECIMAL(38,7))");
            params.push(ColdParam::Text(min));
        }
        sql.push_str(" ORDER BY CAST(balance AS DECIMAL(38,7)) DESC, account_id ASC LIMIT ?");
        params.push(ColdParam::I64(limit));

        self.query(sql, params, |row| {
            let balance = decimal(row, 3)?;
            let closed_at_raw: String = row.get(5)?;
            let valid_to_raw: Option<String> = row.get(6)?;
            Ok(TrustlineSnapshotRow {
                account_id: row.get(0)?,
                asset_code: row.get(1)?,
                asset_issuer: row.get(2)?,
                balance,
                ledger_sequence: row.get(4)?,
                closed_at: parse_rfc3339(&closed_at_raw)?,
                valid_to: valid_to_raw.as_deref().map(parse_rfc3339).transpose()?,
            })
        })
        .await
    }

    /// All of one account's trustline rows valid at `at`, balance > 0
    /// (§4.5 op 2: portfolio-at-time).
    pub async fn account_trustlines_at(
        &self,
        account_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Vec<TrustlineSnapshotRow>, QueryError> {
        let table = self.table("trustlines_snapshot");
        let at_str = at.to_rfc3339();
        let sql = format!(
            "SELECT account_id, asset_code, asset_issuer, balance, ledger_sequence, closed_at, valid_to
             FROM {table}
             WHERE account_id = ? AND closed_at <= ? AND (valid_to IS NULL OR valid_to > ?)
               AND CAST(balance AS DECIMAL(38,7)) > 0
             ORDER BY asset_code ASC"
        );
        self.query(
            sql,
            vec![
                ColdParam::Text(account_id.to_string()),
                ColdParam::Text(at_str.clone()),
                ColdParam::Text(at_str),
            ],
            |row| {
                let balance = decimal(row, 3)?;
                let closed_at_raw: String = row.get(5)?;
                let valid_to_raw: Option<String> = row.get(6)?;
                Ok(TrustlineSnapshotRow {
                    account_id: row.get(0)?,
                    asset_code: row.get(1)?,
                    asset_issuer: row.get(2)?,
                    balance,
                    ledger_sequence: row.get(4)?,
                    closed_at: parse_rfc3339(&closed_at_raw)?,
                    valid_to: valid_to_raw.as_deref().map(parse_rfc3339).transpose()?,
                })
            },
        )
        .await
    }
}

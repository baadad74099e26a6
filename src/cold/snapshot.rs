use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use std::str::FromStr;

use crate::error::QueryError;

use super::{ColdParam, ColdStore};

/// One point of a daily supply/holder aggregate, computed with
/// arbitrary-precision decimal arithmetic (§4.5 op 5, §9): network-wide
/// sums can exceed 2^63 stroops, so this never routes through `i64` or
/// `f64` — every balance is summed as a [`BigDecimal`] parsed from its
/// authoritative decimal-string form.
#[derive(Debug, Clone)]
pub struct SupplyPoint {
    pub snapshot_ledger: i64,
    pub total_supply: BigDecimal,
    pub holder_count: i64,
}

impl ColdStore {
    /// Aggregate SUM(balance) and DISTINCT-count of holders for `asset` at
    /// `at`, summing client-side in arbitrary precision rather than
    /// delegating to the engine's fixed-width DECIMAL (§9).
    pub async fn holders_and_supply_at(
        &self,
        code: &str,
        issuer: &str,
        at: DateTime<Utc>,
    ) -> Result<SupplyPoint, QueryError> {
        let table = self.table("trustlines_snapshot");
        let at_str = at.to_rfc3339();
        let sql = format!(
            "SELECT balance, ledger_sequence FROM {table}
             WHERE asset_code = ? AND asset_issuer = ?
               AND closed_at <= ? AND (valid_to IS NULL OR valid_to > ?)
               AND CAST(balance AS DECIMAL(38,7)) > 0"
        );
        let rows: Vec<(String, i64)> = self
            .query(
                sql,
                vec![
                    ColdParam::Text(code.to_string()),
                    ColdParam::Text(issuer.to_string()),
                    ColdParam::Text(at_str.clone()),
                    ColdParam::Text(at_str),
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .await?;

        let mut total = BigDecimal::from(0);
        let mut max_ledger = 0i64;
        for (balance, ledger_sequence) in &rows {
            let parsed = BigDecimal::from_str(balance)
                .map_err(|e| QueryError::Internal(format!("corrupt balance in cold store: {e}")))?;
            total += parsed;
            max_ledger = max_ledger.max(*ledger_sequence);
        }

        Ok(SupplyPoint {
            snapshot_ledger: max_ledger,
            total_supply: total,
            holder_count: rows.len() as i64,
        })
    }

    /// The issuing account's own trustline-equivalent balance at `at`,
    /// used to derive `circulating_supply = total_supply - issuer_balance`.
    pub async fn issuer_balance_at(
        &self,
        code: &str,
        issuer: &str,
        at: DateTime<Utc>,
    ) -> Result<BigDecimal, QueryError> {
        let table = self.table("accounts_snapshot");
        let at_str = at.to_rfc3339();
        // The issuer's reserve of its own credit asset is tracked as a
        // pseudo-trustline row keyed by the issuer account itself.
        let trustlines = self.table("trustlines_snapshot");
        let sql = format!(
            "SELECT balance FROM {trustlines}
             WHERE asset_code = ? AND asset_issuer = ? AND account_id = ?
               AND closed_at <= ? AND (valid_to IS NULL OR valid_to > ?)
             ORDER BY closed_at DESC LIMIT 1"
        );
        let _ = table; // issuer balance is a trustline-shaped row, not an account row
        let rows: Vec<String> = self
            .query(
                sql,
                vec![
                    ColdParam::Text(code.to_string()),
                    ColdParam::Text(issuer.to_string()),
                    ColdParam::Text(issuer.to_string()),
                    ColdParam::Text(at_str.clone()),
                    ColdParam::Text(at_str),
                ],
                |row| row.get::<_, String>(0),
            )
            .await?;

        match rows.into_iter().next() {
            Some(s) => BigDecimal::from_str(&s)
                .map_err(|e| QueryError::Internal(format!("corrupt issuer balance in cold store: {e}"))),
            None => Ok(BigDecimal::from(0)),
        }
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};

use crate::asset::Asset;
use crate::cursor::TokenHolderCursor;
use crate::domain::{Holder, TrustlineSnapshotRow};
use crate::error::QueryError;

use super::HotStore;

impl HotStore {
    /// `token_holders(asset, filters)`, paginated `(balance desc, account_id asc)`.
    pub async fn token_holders(
        &self,
        asset: &Asset,
        min_balance: Option<Decimal>,
        limit: i64,
        cursor: Option<&TokenHolderCursor>,
    ) -> Result<Vec<Holder>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT account_id, balance FROM trustlines_current
             WHERE asset_code = ",
        );
        qb.push_bind(asset.code().to_string());
        qb.push(" AND asset_issuer = ");
        qb.push_bind(asset.issuer().unwrap_or_default().to_string());
        qb.push(" AND balance > 0");

        if let Some(min) = min_balance {
            qb.push(" AND balance >= ");
            qb.push_bind(min);
        }

        if let Some(c) = cursor {
            let balance: Decimal = c
                .balance
                .parse()
                .map_err(|_| QueryError::InvalidCursor(format!("unparseable balance: {}", c.balance)))?;
            qb.push(" AND (balance < ");
            qb.push_bind(balance);
            qb.push(" OR (balance = ");
            qb.push_bind(balance);
            qb.push(" AND account_id > ");
            qb.push_bind(c.account_id.clone());
            qb.push("))");
        }

        qb.push(" ORDER BY balance DESC, account_id ASC LIMIT ");
        qb.push_bind(limit);

        let rows: Vec<(String, Decimal)> = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows
            .into_iter()
            .map(|(account_id, balance)| Holder {
                account_id,
                balance: balance.to_string(),
            })
            .collect())
    }

    /// All of one account's trustline rows valid at `at`, balance > 0
    /// (§4.5 op 2: portfolio-at-time).
    pub async fn account_trustlines_at(
        &self,
        account_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Vec<TrustlineSnapshotRow>, QueryError> {
        let rows: Vec<TrustlineSnapshotRow> = sqlx::query_as(
            "SELECT account_id, asset_code, asset_issuer, balance, ledger_sequence, closed_at, valid_to
             FROM trustlines_snapshot
             WHERE account_id = $1 AND closed_at <= $2 AND (valid_to IS NULL OR valid_to > $2)
               AND balance > 0
             ORDER BY asset_code ASC",
        )
        .bind(account_id)
        .bind(at)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// SCD2 holders-at-time over the hot tier's (windowed) snapshot table,
    /// mirroring [`crate::cold::ColdStore::trustline_holders_at`] (§4.5 op 3).
    pub async fn trustline_holders_at(
        &self,
        code: &str,
        issuer: &str,
        at: DateTime<Utc>,
        min_balance: Option<Decimal>,
        limit: i64,
    ) -> Result<Vec<TrustlineSnapshotRow>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT account_id, asset_code, asset_issuer, balance, ledger_sequence, closed_at, valid_to
             FROM trustlines_snapshot WHERE asset_code = ",
        );
        qb.push_bind(code.to_string());
        qb.push(" AND asset_issuer = ");
        qb.push_bind(issuer.to_string());
        qb.push(" AND closed_at <= ");
        qb.push_bind(at);
        qb.push(" AND (valid_to IS NULL OR valid_to > ");
        qb.push_bind(at);
        qb.push(") AND balance > 0");
        if let Some(min) = min_balance {
            qb.push(" AND balance >= ");
            qb.push_bind(min);
        }
        qb.push(" ORDER BY balance DESC LIMIT ");
        qb.push_bind(limit);

        let rows: Vec<TrustlineSnapshotRow> = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows)
    }
}

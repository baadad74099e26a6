use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};

use crate::cursor::AccountListCursor;
use crate::domain::{AccountSnapshot, AccountState, Balances, Signer, Signers, SortOrder, TrustlineBalance};
use crate::error::QueryError;

use super::HotStore;

impl HotStore {
    /// `account_current(account_id)`.
    pub async fn account_current(&self, account_id: &str) -> Result<Option<AccountState>, QueryError> {
        let row = sqlx::query_as::<_, AccountState>(
            "SELECT account_id, balance, sequence_number, subentry_count,
                    threshold_low, threshold_medium, threshold_high, flags,
                    home_domain, sponsor, last_modified_ledger
             FROM accounts_current WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    /// `account_history(account_id, limit, cursor?)`, paginated `ledger_seq desc`.
    pub async fn account_history(
        &self,
        account_id: &str,
        limit: i64,
        cursor_ledger_seq: Option<i64>,
    ) -> Result<Vec<AccountSnapshot>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT account_id, balance, sequence_number, ledger_sequence, closed_at
             FROM accounts_history WHERE account_id = ",
        );
        qb.push_bind(account_id.to_string());
        if let Some(seq) = cursor_ledger_seq {
            qb.push(" AND ledger_sequence < ");
            qb.push_bind(seq);
        }
        qb.push(" ORDER BY ledger_sequence DESC LIMIT ");
        qb.push_bind(limit);

        #[derive(sqlx::FromRow)]
        struct Row {
            account_id: String,
            balance: Decimal,
            sequence_number: i64,
            ledger_sequence: i64,
            closed_at: DateTime<Utc>,
        }

        let rows: Vec<Row> = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows
            .into_iter()
            .map(|r| AccountSnapshot {
                account_id: r.account_id,
                balance: r.balance.to_string(),
                sequence_number: r.sequence_number,
                ledger_sequence: r.ledger_sequence,
                closed_at: r.closed_at,
            })
            .collect())
    }

    /// `accounts_list(filters)`, cursor-paginated over `accounts_current`.
    ///
    /// Builds a strict tie-broken inequality matching the cursor's sort
    /// axis, e.g. for descending balance: `(balance < ?) OR (balance = ?
    /// AND account_id > ?)` (§4.2).
    pub async fn accounts_list(
        &self,
        sort_by: &str,
        sort_order: SortOrder,
        min_balance: Option<Decimal>,
        limit: i64,
        cursor: Option<&AccountListCursor>,
    ) -> Result<Vec<AccountState>, QueryError> {
        let sort_column = match sort_by {
            "balance" => "balance",
            "last_modified_ledger" => "last_modified_ledger",
            other => {
                return Err(QueryError::InvalidArgument(format!(
                    "unsupported sort_by for accounts_list: {other}"
                )))
            }
        };

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT account_id, balance, sequence_number, subentry_count,
                    threshold_low, threshold_medium, threshold_high, flags,
                    home_domain, sponsor, last_modified_ledger
             FROM accounts_current WHERE 1 = 1",
        );

        if let Some(min) = min_balance {
            qb.push(" AND balance >= ");
            qb.push_bind(min);
        }

        if let Some(c) = cursor {
            let cmp = match sort_order {
                SortOrder::Desc => "<",
                SortOrder::Asc => ">",
            };
            qb.push(format!(" AND ({sort_column} {cmp} "));
            if sort_column == "balance" {
                let balance: Decimal = c
                    .balance
                    .parse()
                    .map_err(|_| QueryError::InvalidCursor(format!("unparseable balance: {}", c.balance)))?;
                qb.push_bind(balance);
            } else {
                qb.push_bind(c.last_modified_ledger.unwrap_or(0));
            }
            qb.push(format!(" OR ({sort_column} = "));
            if sort_column == "balance" {
                let balance: Decimal = c.balance.parse().unwrap_or(Decimal::ZERO);
                qb.push_bind(balance);
            } else {
                qb.push_bind(c.last_modified_ledger.unwrap_or(0));
            }
            qb.push(" AND account_id > ");
            qb.push_bind(c.account_id.clone());
            qb.push("))");
        }

        qb.push(format!(
            " ORDER BY {sort_column} {}, account_id ASC LIMIT ",
            sort_order.as_str()
        ));
        qb.push_bind(limit);

        let rows: Vec<AccountState> = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows)
    }

    /// `account_signers(account_id)`.
    pub async fn account_signers(&self, account_id: &str) -> Result<Option<Signers>, QueryError> {
        let master_weight: Option<(i32,)> = sqlx::query_as(
            "SELECT threshold_low FROM accounts_current WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(self.pool())
        .await?;
        let Some((master_weight,)) = master_weight else {
            return Ok(None);
        };

        let signers: Vec<Signer> = sqlx::query_as(
            "SELECT key, weight, signer_type FROM account_signers WHERE account_id = $1 ORDER BY key",
        )
        .bind(account_id)
        .fetch_all(self.pool())
        .await?;

        Ok(Some(Signers {
            account_id: account_id.to_string(),
            master_weight,
            signers,
        }))
    }

    /// `account_balances(account_id)`: native balance plus all trustlines.
    pub async fn account_balances(&self, account_id: &str) -> Result<Option<Balances>, QueryError> {
        let Some(account) = self.account_current(account_id).await? else {
            return Ok(None);
        };

        let trustlines: Vec<TrustlineBalance> = sqlx::query_as::<_, (String, String, Decimal, Decimal)>(
            "SELECT asset_code || ':' || asset_issuer, asset_type, balance, trust_limit
             FROM trustlines_current WHERE account_id = $1 ORDER BY asset_code",
        )
        .bind(account_id)
        .fetch_all(self.pool())
        .await?
        .into_iter()
        .map(|(asset, asset_type, balance, limit)| TrustlineBalance {
            asset,
            asset_type,
            balance: balance.to_string(),
            limit: limit.to_string(),
        })
        .collect();

        Ok(Some(Balances {
            account_id: account_id.to_string(),
            native_balance: account.balance.to_string(),
            trustlines,
        }))
    }

    /// SCD2 validity predicate over `accounts_snapshot`, restricted to the
    /// hot tier's retention window (§4.2, §3.2): `created_at <= t AND
    /// (valid_to IS NULL OR valid_to > t)`.
    pub async fn account_at(
        &self,
        account_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<crate::domain::AccountSnapshotRow>, QueryError> {
        let row = sqlx::query_as::<_, crate::domain::AccountSnapshotRow>(
            "SELECT account_id, balance, sequence_number, subentry_count, flags,
                    home_domain, sponsor, ledger_sequence, closed_at, valid_to
             FROM accounts_snapshot
             WHERE account_id = $1 AND closed_at <= $2 AND (valid_to IS NULL OR valid_to > $2)
             ORDER BY closed_at DESC LIMIT 1",
        )
        .bind(account_id)
        .bind(at)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    /// XLM holders at `t`, i.e. accounts whose native balance is positive
    /// under the SCD2 validity predicate (§4.5 op 3: `asset_holders_at`
    /// for the native asset has no trustline row to consult).
    pub async fn account_holders_at(
        &self,
        at: DateTime<Utc>,
        min_balance: Option<Decimal>,
        limit: i64,
    ) -> Result<Vec<crate::domain::AccountSnapshotRow>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT account_id, balance, sequence_number, subentry_count, flags,
                    home_domain, sponsor, ledger_sequence, closed_at, valid_to
             FROM accounts_snapshot WHERE closed_at <= ",
        );
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

        let rows: Vec<crate::domain::AccountSnapshotRow> = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows)
    }
}

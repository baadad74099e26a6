use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};

use crate::cursor::{AssetListCursor, IdCursor};
use crate::domain::{AssetSummary, ClaimableBalance, LiquidityPool, Offer, SortOrder, TokenStats};
use crate::error::QueryError;

use super::HotStore;

/// Backing CTE for `asset_list`/`token_stats`: one row per `(code, issuer)`
/// pair seen in `trustlines_current`, with a 24h transfer window rolled up
/// from `token_transfers`. There is no materialized per-asset table, so
/// both operations aggregate from first principles on every call (§6.1).
const ASSET_AGG_CTE: &str = "
    WITH agg AS (
        SELECT
            t.asset_code AS code,
            t.asset_issuer AS issuer,
            MAX(t.asset_type) AS asset_type,
            COUNT(*) FILTER (WHERE t.balance > 0) AS holder_count,
            COALESCE(SUM(t.balance) FILTER (WHERE t.balance > 0), 0) AS circulating_supply,
            COALESCE((
                SELECT SUM(x.amount) FROM token_transfers x
                WHERE x.asset_code = t.asset_code AND x.timestamp >= NOW() - INTERVAL '24 hours'
            ), 0) AS volume_24h,
            COALESCE((
                SELECT COUNT(*) FROM token_transfers x
                WHERE x.asset_code = t.asset_code AND x.timestamp >= NOW() - INTERVAL '24 hours'
            ), 0) AS transfers_24h
        FROM trustlines_current t
        GROUP BY t.asset_code, t.asset_issuer
    )
";

impl HotStore {
    pub async fn offers(&self, limit: i64, cursor: Option<&IdCursor>) -> Result<Vec<Offer>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT offer_id, seller_id, selling_asset, buying_asset, amount, price_n, price_d, last_modified_ledger
             FROM offers WHERE 1 = 1",
        );
        if let Some(c) = cursor {
            let id: i64 = c
                .id
                .parse()
                .map_err(|_| QueryError::InvalidCursor(format!("unparseable offer id: {}", c.id)))?;
            qb.push(" AND offer_id > ");
            qb.push_bind(id);
        }
        qb.push(" ORDER BY offer_id ASC LIMIT ");
        qb.push_bind(limit);
        Ok(qb.build_query_as().fetch_all(self.pool()).await?)
    }

    pub async fn offer_by_id(&self, offer_id: i64) -> Result<Option<Offer>, QueryError> {
        Ok(sqlx::query_as("SELECT * FROM offers WHERE offer_id = $1")
            .bind(offer_id)
            .fetch_optional(self.pool())
            .await?)
    }

    pub async fn offers_by_pair(
        &self,
        selling_asset: &str,
        buying_asset: &str,
        limit: i64,
        cursor: Option<&IdCursor>,
    ) -> Result<Vec<Offer>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT offer_id, seller_id, selling_asset, buying_asset, amount, price_n, price_d, last_modified_ledger
             FROM offers WHERE selling_asset = ",
        );
        qb.push_bind(selling_asset.to_string());
        qb.push(" AND buying_asset = ");
        qb.push_bind(buying_asset.to_string());
        if let Some(c) = cursor {
            let id: i64 = c
                .id
                .parse()
                .map_err(|_| QueryError::InvalidCursor(format!("unparseable offer id: {}", c.id)))?;
            qb.push(" AND offer_id > ");
            qb.push_bind(id);
        }
        qb.push(" ORDER BY offer_id ASC LIMIT ");
        qb.push_bind(limit);
        Ok(qb.build_query_as().fetch_all(self.pool()).await?)
    }

    pub async fn liquidity_pools(
        &self,
        limit: i64,
        cursor: Option<&IdCursor>,
    ) -> Result<Vec<LiquidityPool>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT pool_id, pool_type, asset_a, asset_b, reserve_a, reserve_b, total_shares,
                    trustline_count, last_modified_ledger
             FROM liquidity_pools WHERE 1 = 1",
        );
        if let Some(c) = cursor {
            qb.push(" AND pool_id > ");
            qb.push_bind(c.id.clone());
        }
        qb.push(" ORDER BY pool_id ASC LIMIT ");
        qb.push_bind(limit);
        Ok(qb.build_query_as().fetch_all(self.pool()).await?)
    }

    pub async fn liquidity_pool_by_id(&self, pool_id: &str) -> Result<Option<LiquidityPool>, QueryError> {
        Ok(sqlx::query_as("SELECT * FROM liquidity_pools WHERE pool_id = $1")
            .bind(pool_id)
            .fetch_optional(self.pool())
            .await?)
    }

    pub async fn liquidity_pools_by_asset(
        &self,
        asset: &str,
        limit: i64,
        cursor: Option<&IdCursor>,
    ) -> Result<Vec<LiquidityPool>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT pool_id, pool_type, asset_a, asset_b, reserve_a, reserve_b, total_shares,
                    trustline_count, last_modified_ledger
             FROM liquidity_pools WHERE (asset_a = ",
        );
        qb.push_bind(asset.to_string());
        qb.push(" OR asset_b = ");
        qb.push_bind(asset.to_string());
        qb.push(")");
        if let Some(c) = cursor {
            qb.push(" AND pool_id > ");
            qb.push_bind(c.id.clone());
        }
        qb.push(" ORDER BY pool_id ASC LIMIT ");
        qb.push_bind(limit);
        Ok(qb.build_query_as().fetch_all(self.pool()).await?)
    }

    pub async fn claimable_balances(
        &self,
        limit: i64,
        cursor: Option<&IdCursor>,
    ) -> Result<Vec<ClaimableBalance>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT balance_id, asset, amount, sponsor, last_modified_ledger
             FROM claimable_balances WHERE 1 = 1",
        );
        if let Some(c) = cursor {
            qb.push(" AND balance_id > ");
            qb.push_bind(c.id.clone());
        }
        qb.push(" ORDER BY balance_id ASC LIMIT ");
        qb.push_bind(limit);
        Ok(qb.build_query_as().fetch_all(self.pool()).await?)
    }

    pub async fn claimable_balance_by_id(&self, balance_id: &str) -> Result<Option<ClaimableBalance>, QueryError> {
        Ok(sqlx::query_as("SELECT * FROM claimable_balances WHERE balance_id = $1")
            .bind(balance_id)
            .fetch_optional(self.pool())
            .await?)
    }

    pub async fn claimable_balances_by_asset(
        &self,
        asset: &str,
        limit: i64,
        cursor: Option<&IdCursor>,
    ) -> Result<Vec<ClaimableBalance>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT balance_id, asset, amount, sponsor, last_modified_ledger
             FROM claimable_balances WHERE asset = ",
        );
        qb.push_bind(asset.to_string());
        if let Some(c) = cursor {
            qb.push(" AND balance_id > ");
            qb.push_bind(c.id.clone());
        }
        qb.push(" ORDER BY balance_id ASC LIMIT ");
        qb.push_bind(limit);
        Ok(qb.build_query_as().fetch_all(self.pool()).await?)
    }

    /// `asset_list(filters)`, cursor-paginated over the per-asset aggregate
    /// in [`ASSET_AGG_CTE`]. `holder_count`/`transfers_24h` cursors bound on
    /// the cursor's integer field; `volume_24h`/`circulating_supply`
    /// cursors bound on its decimal field. Final tie-break is `(code,
    /// issuer)` ascending (§6.1).
    #[allow(clippy::too_many_arguments)]
    pub async fn asset_list(
        &self,
        sort_by: &str,
        sort_order: SortOrder,
        min_holders: Option<i64>,
        min_volume: Option<Decimal>,
        asset_type: Option<&str>,
        search: Option<&str>,
        limit: i64,
        cursor: Option<&AssetListCursor>,
    ) -> Result<Vec<AssetSummary>, QueryError> {
        let sort_column = match sort_by {
            "holder_count" => "holder_count",
            "volume_24h" => "volume_24h",
            "transfers_24h" => "transfers_24h",
            "circulating_supply" => "circulating_supply",
            other => {
                return Err(QueryError::InvalidArgument(format!(
                    "unsupported sort_by for asset_list: {other}"
                )))
            }
        };
        let integer_bound = matches!(sort_column, "holder_count" | "transfers_24h");

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(ASSET_AGG_CTE);
        qb.push("SELECT code, issuer, asset_type, holder_count, volume_24h, transfers_24h, circulating_supply FROM agg WHERE 1 = 1");

        if let Some(min) = min_holders {
            qb.push(" AND holder_count >= ");
            qb.push_bind(min);
        }
        if let Some(min) = min_volume {
            qb.push(" AND volume_24h >= ");
            qb.push_bind(min);
        }
        if let Some(at) = asset_type {
            qb.push(" AND asset_type = ");
            qb.push_bind(at.to_string());
        }
        if let Some(s) = search {
            qb.push(" AND code ILIKE ");
            qb.push_bind(format!("%{s}%"));
        }

        if let Some(c) = cursor {
            let cmp = match sort_order {
                SortOrder::Desc => "<",
                SortOrder::Asc => ">",
            };
            qb.push(format!(" AND ({sort_column} {cmp} "));
            if integer_bound {
                qb.push_bind(c.holder_count);
            } else {
                let bound: Decimal = c
                    .volume_24h
                    .parse()
                    .map_err(|_| QueryError::InvalidCursor(format!("unparseable volume_24h: {}", c.volume_24h)))?;
                qb.push_bind(bound);
            }
            qb.push(format!(" OR ({sort_column} = "));
            if integer_bound {
                qb.push_bind(c.holder_count);
            } else {
                let bound: Decimal = c.volume_24h.parse().unwrap_or(Decimal::ZERO);
                qb.push_bind(bound);
            }
            qb.push(" AND (code > ");
            qb.push_bind(c.code.clone());
            qb.push(" OR (code = ");
            qb.push_bind(c.code.clone());
            qb.push(" AND issuer > ");
            qb.push_bind(c.issuer.clone());
            qb.push("))))");
        }

        qb.push(format!(
            " ORDER BY {sort_column} {}, code ASC, issuer ASC LIMIT ",
            sort_order.as_str()
        ));
        qb.push_bind(limit);

        let rows: Vec<AssetSummary> = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows)
    }

    /// Total row count for an `asset_list` filter set, ignoring pagination.
    /// Shares the same `WHERE` clauses as `asset_list` so `total` and the
    /// paginated page are always counting the same population.
    pub async fn asset_list_total(
        &self,
        min_holders: Option<i64>,
        min_volume: Option<Decimal>,
        asset_type: Option<&str>,
        search: Option<&str>,
    ) -> Result<i64, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(ASSET_AGG_CTE);
        qb.push("SELECT COUNT(*) FROM agg WHERE 1 = 1");
        if let Some(min) = min_holders {
            qb.push(" AND holder_count >= ");
            qb.push_bind(min);
        }
        if let Some(min) = min_volume {
            qb.push(" AND volume_24h >= ");
            qb.push_bind(min);
        }
        if let Some(at) = asset_type {
            qb.push(" AND asset_type = ");
            qb.push_bind(at.to_string());
        }
        if let Some(s) = search {
            qb.push(" AND code ILIKE ");
            qb.push_bind(format!("%{s}%"));
        }
        let (count,): (i64,) = qb.build_query_as().fetch_one(self.pool()).await?;
        Ok(count)
    }

    /// `token_stats(asset)`: the same per-asset aggregate as `asset_list`,
    /// narrowed to one `(code, issuer)` pair.
    pub async fn token_stats(&self, code: &str, issuer: &str) -> Result<Option<TokenStats>, QueryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(ASSET_AGG_CTE);
        qb.push("SELECT code, issuer, asset_type, holder_count, volume_24h, transfers_24h, circulating_supply FROM agg WHERE code = ");
        qb.push_bind(code.to_string());
        qb.push(" AND issuer = ");
        qb.push_bind(issuer.to_string());

        let row: Option<AssetSummary> = qb.build_query_as().fetch_optional(self.pool()).await?;
        Ok(row.map(|r| TokenStats {
            asset: format!("{}:{}", r.code, r.issuer),
            holder_count: r.holder_count,
            circulating_supply: r.circulating_supply.to_string(),
            volume_24h: r.volume_24h.to_string(),
            transfers_24h: r.transfers_24h,
        }))
    }
}

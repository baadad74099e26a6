use crate::domain::{ClaimableBalance, LiquidityPool, Offer};
use crate::error::QueryError;

use super::accounts::decimal;
use super::{ColdParam, ColdStore};

impl ColdStore {
    pub async fn offers(&self, limit: i64, after_id: Option<i64>) -> Result<Vec<Offer>, QueryError> {
        let table = self.table("offers");
        let mut sql = format!(
            "SELECT offer_id, seller_id, selling_asset, buying_asset, amount, price_n, price_d, last_modified_ledger
             FROM {table} WHERE 1 = 1"
        );
        let mut params = vec![];
        if let Some(id) = after_id {
            sql.push_str(" AND offer_id > ?");
            params.push(ColdParam::I64(id));
        }
        sql.push_str(" ORDER BY offer_id ASC LIMIT ?");
        params.push(ColdParam::I64(limit));

        self.query(sql, params, |row| {
            Ok(Offer {
                offer_id: row.get(0)?,
                seller_id: row.get(1)?,
                selling_asset: row.get(2)?,
                buying_asset: row.get(3)?,
                amount: decimal(row, 4)?,
                price_n: row.get(5)?,
                price_d: row.get(6)?,
                last_modified_ledger: row.get(7)?,
            })
        })
        .await
    }

    pub async fn liquidity_pools(&self, limit: i64, after_id: Option<String>) -> Result<Vec<LiquidityPool>, QueryError> {
        let table = self.table("liquidity_pools");
        let mut sql = format!(
            "SELECT pool_id, pool_type, asset_a, asset_b, reserve_a, reserve_b, total_shares,
                    trustline_count, last_modified_ledger
             FROM {table} WHERE 1 = 1"
        );
        let mut params = vec![];
        if let Some(id) = after_id {
            sql.push_str(" AND pool_id > ?");
            params.push(ColdParam::Text(id));
        }
        sql.push_str(" ORDER BY pool_id ASC LIMIT ?");
        params.push(ColdParam::I64(limit));

        self.query(sql, params, |row| {
            Ok(LiquidityPool {
                pool_id: row.get(0)?,
                pool_type: row.get(1)?,
                asset_a: row.get(2)?,
                asset_b: row.get(3)?,
                reserve_a: decimal(row, 4)?,
                reserve_b: decimal(row, 5)?,
                total_shares: decimal(row, 6)?,
                trustline_count: row.get(7)?,
                last_modified_ledger: row.get(8)?,
            })
        })
        .await
    }

    pub async fn claimable_balances(&self, limit: i64, after_id: Option<String>) -> Result<Vec<ClaimableBalance>, QueryError> {
        let table = self.table("claimable_balances");
        let mut sql = format!(
            "SELECT balance_id, asset, amount, sponsor, last_modified_ledger FROM {table} WHERE 1 = 1"
        );
        let mut params = vec![];
        if let Some(id) = after_id {
            sql.push_str(" AND balance_id > ?");
            params.push(ColdParam::Text(id));
        }
        sql.push_str(" ORDER BY balance_id ASC LIMIT ?");
        params.push(ColdParam::I64(limit));

        self.query(sql, params, |row| {
            Ok(ClaimableBalance {
                balance_id: row.get(0)?,
                asset: row.get(1)?,
                amount: decimal(row, 2)?,
                sponsor: row.get(3)?,
                last_modified_ledger: row.get(4)?,
            })
        })
        .await
    }
}

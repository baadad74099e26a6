use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A standing offer on the classic DEX (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Offer {
    pub offer_id: i64,
    pub seller_id: String,
    pub selling_asset: String,
    pub buying_asset: String,
    pub amount: Decimal,
    pub price_n: i64,
    pub price_d: i64,
    pub last_modified_ledger: i64,
}

/// A liquidity pool (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LiquidityPool {
    pub pool_id: String,
    pub pool_type: String,
    pub asset_a: String,
    pub asset_b: String,
    pub reserve_a: Decimal,
    pub reserve_b: Decimal,
    pub total_shares: Decimal,
    pub trustline_count: i64,
    pub last_modified_ledger: i64,
}

/// A claimable balance (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClaimableBalance {
    pub balance_id: String,
    pub asset: String,
    pub amount: Decimal,
    pub sponsor: Option<String>,
    pub last_modified_ledger: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSortBy {
    HolderCount,
    Volume24h,
    Transfers24h,
    CirculatingSupply,
}

impl AssetSortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetSortBy::HolderCount => "holder_count",
            AssetSortBy::Volume24h => "volume_24h",
            AssetSortBy::Transfers24h => "transfers_24h",
            AssetSortBy::CirculatingSupply => "circulating_supply",
        }
    }
}

impl std::str::FromStr for AssetSortBy {
    type Err = crate::error::QueryError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "holder_count" => Ok(AssetSortBy::HolderCount),
            "volume_24h" => Ok(AssetSortBy::Volume24h),
            "transfers_24h" => Ok(AssetSortBy::Transfers24h),
            "circulating_supply" => Ok(AssetSortBy::CirculatingSupply),
            other => Err(crate::error::QueryError::InvalidArgument(format!(
                "unsupported sort_by for asset_list: {other}"
            ))),
        }
    }
}

/// Summary row for `asset_list`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AssetSummary {
    pub code: String,
    pub issuer: String,
    pub asset_type: String,
    pub holder_count: i64,
    pub volume_24h: Decimal,
    pub transfers_24h: i64,
    pub circulating_supply: Decimal,
}

/// `asset_list(filters)` response (§6.1): the paginated page plus `total`,
/// the count of the same filtered population ignoring pagination.
#[derive(Debug, Clone, Serialize)]
pub struct AssetListResp {
    pub items: Vec<AssetSummary>,
    pub count: usize,
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub has_more: bool,
    pub generated_at: DateTime<Utc>,
}

/// `token_stats(asset)` aggregate response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStats {
    pub asset: String,
    pub holder_count: i64,
    pub circulating_supply: String,
    pub volume_24h: String,
    pub transfers_24h: i64,
}

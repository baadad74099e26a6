//! Filter/parameter bundles accepted by the [`super::QueryFacade`] listing
//! operations (§6.1). Grouped per operation the way the teacher's route
//! handlers group query-string parameters into one struct before dispatch.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{AccountSortBy, AssetSortBy, SortOrder};
use crate::hot::OperationFilters;

#[derive(Debug, Clone, Default)]
pub struct AccountsListFilters {
    pub sort_by: AccountSortBy,
    pub sort_order: SortOrder,
    pub min_balance: Option<Decimal>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

impl Default for AccountSortBy {
    fn default() -> Self {
        AccountSortBy::Balance
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssetListFilters {
    pub sort_by: AssetSortBy,
    pub sort_order: SortOrder,
    pub min_holders: Option<i64>,
    pub min_volume: Option<Decimal>,
    pub asset_type: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

impl Default for AssetSortBy {
    fn default() -> Self {
        AssetSortBy::HolderCount
    }
}

#[derive(Debug, Clone, Default)]
pub struct TokenHoldersFilters {
    pub min_balance: Option<Decimal>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OperationsListFilters {
    pub filters: OperationFilters,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransfersFilters {
    pub source_type: Option<String>,
    pub asset_code: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TradesFilters {
    pub base_asset: Option<String>,
    pub counter_asset: Option<String>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EffectsFilters {
    pub account_id: Option<String>,
    pub effect_type: Option<String>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

use tokio_util::sync::CancellationToken;

use crate::cursor::{EventCursor, OperationCursor, TransferCursor};
use crate::domain::{Effect, EffectTypeCount, EnrichedOp, TokenTransfer, TradeRow, TradeStats, TransferStats};
use crate::error::QueryError;

use super::{normalize_limit, with_cancel, EffectsFilters, ListResponse, OperationsListFilters, QueryFacade, TradesFilters, TransfersFilters};

impl QueryFacade {
    /// `operations(filters)` (§6.1, §4.4). `cursor` and `filters.start_ledger`
    /// are mutually exclusive.
    pub async fn operations(
        &self,
        cancel: CancellationToken,
        filters: &OperationsListFilters,
    ) -> Result<ListResponse<EnrichedOp>, QueryError> {
        let limit = normalize_limit(filters.limit)?;
        let cursor = filters.cursor.as_deref().map(OperationCursor::decode).transpose()?;
        if cursor.is_some() && filters.filters.start_ledger.is_some() {
            return Err(QueryError::InvalidArgument(
                "cursor and start_ledger are mutually exclusive for operations".into(),
            ));
        }

        let (rows, has_more) = with_cancel(&cancel, self.tiered().operations(&filters.filters, limit, cursor.as_ref())).await?;

        let next_cursor = if has_more {
            rows.last().map(|r| {
                OperationCursor {
                    ledger_seq: r.ledger_sequence,
                    op_index: r.operation_index,
                }
                .encode()
            })
        } else {
            None
        };

        Ok(ListResponse::new(rows, next_cursor, has_more))
    }

    /// `token_transfers(filters)` (§6.1). Hot-only: the live transfer feed
    /// has no cold-tier mirror — historical transfer data is served through
    /// the `transactions` archive artifact instead (§4.6).
    #[allow(clippy::too_many_arguments)]
    pub async fn token_transfers(&self, cancel: CancellationToken, filters: &TransfersFilters) -> Result<ListResponse<TokenTransfer>, QueryError> {
        let limit = normalize_limit(filters.limit)?;
        let cursor = filters.cursor.as_deref().map(TransferCursor::decode).transpose()?;

        let rows = with_cancel(
            &cancel,
            self.tiered().hot().token_transfers(
                filters.source_type.as_deref(),
                filters.asset_code.as_deref(),
                filters.from.as_deref(),
                filters.to.as_deref(),
                filters.start_time,
                filters.end_time,
                limit.saturating_add(1),
                cursor.as_ref(),
            ),
        )
        .await?;

        let has_more = rows.len() as i64 > limit;
        let mut rows = rows;
        rows.truncate(limit as usize);
        let next_cursor = if has_more {
            rows.last().map(|r| {
                TransferCursor {
                    ledger_seq: r.ledger_sequence,
                    timestamp: r.timestamp.to_rfc3339(),
                }
                .encode()
            })
        } else {
            None
        };

        Ok(ListResponse::new(rows, next_cursor, has_more))
    }

    /// `token_transfer_stats(group_by, period)` (§6.1). Hot-only, same
    /// reasoning as `token_transfers`.
    pub async fn token_transfer_stats(
        &self,
        cancel: CancellationToken,
        group_by: &str,
        start_time: chrono::DateTime<chrono::Utc>,
        end_time: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<TransferStats>, QueryError> {
        with_cancel(&cancel, self.tiered().hot().token_transfer_stats(group_by, start_time, end_time)).await
    }

    /// `trades(filters)` (§6.1). Hot-only.
    pub async fn trades(&self, cancel: CancellationToken, filters: &TradesFilters) -> Result<ListResponse<TradeRow>, QueryError> {
        let limit = normalize_limit(filters.limit)?;
        let cursor = filters.cursor.as_deref().map(EventCursor::decode).transpose()?;

        let rows = with_cancel(
            &cancel,
            self.tiered().hot().trades(
                filters.base_asset.as_deref(),
                filters.counter_asset.as_deref(),
                limit.saturating_add(1),
                cursor.as_ref(),
            ),
        )
        .await?;

        let has_more = rows.len() as i64 > limit;
        let mut rows = rows;
        rows.truncate(limit as usize);
        let next_cursor = next_event_cursor(&rows, has_more);

        Ok(ListResponse::new(rows, next_cursor, has_more))
    }

    /// `trades_by_pair(base, counter, filters)` (§6.1): `trades` narrowed
    /// to one asset pair.
    pub async fn trades_by_pair(
        &self,
        cancel: CancellationToken,
        base_asset: &str,
        counter_asset: &str,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<ListResponse<TradeRow>, QueryError> {
        let filters = TradesFilters {
            base_asset: Some(base_asset.to_string()),
            counter_asset: Some(counter_asset.to_string()),
            limit,
            cursor: cursor.map(str::to_string),
        };
        self.trades(cancel, &filters).await
    }

    /// `trade_stats(group_by, period)` (§6.1). Hot-only.
    pub async fn trade_stats(
        &self,
        cancel: CancellationToken,
        group_by: &str,
        start_time: chrono::DateTime<chrono::Utc>,
        end_time: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<TradeStats>, QueryError> {
        with_cancel(&cancel, self.tiered().hot().trade_stats(group_by, start_time, end_time)).await
    }

    /// `effects(filters)` (§6.1). Hot-only.
    pub async fn effects(&self, cancel: CancellationToken, filters: &EffectsFilters) -> Result<ListResponse<Effect>, QueryError> {
        let limit = normalize_limit(filters.limit)?;
        let cursor = filters.cursor.as_deref().map(EventCursor::decode).transpose()?;

        let rows = with_cancel(
            &cancel,
            self.tiered().hot().effects(
                filters.account_id.as_deref(),
                filters.effect_type.as_deref(),
                limit.saturating_add(1),
                cursor.as_ref(),
            ),
        )
        .await?;

        let has_more = rows.len() as i64 > limit;
        let mut rows = rows;
        rows.truncate(limit as usize);
        let next_cursor = if has_more {
            rows.last().map(|r| {
                EventCursor {
                    ledger_seq: r.ledger_sequence,
                    tx_hash: r.transaction_hash.clone(),
                    op_index: r.operation_index,
                    sub_index: r.sub_index,
                }
                .encode()
            })
        } else {
            None
        };

        Ok(ListResponse::new(rows, next_cursor, has_more))
    }

    /// `effect_types()` (§6.1): the distinct effect types observed, with
    /// counts, for building a filter UI. Hot-only.
    pub async fn effect_types(&self, cancel: CancellationToken) -> Result<Vec<EffectTypeCount>, QueryError> {
        with_cancel(&cancel, self.tiered().hot().effect_types()).await
    }
}

fn next_event_cursor(rows: &[TradeRow], has_more: bool) -> Option<String> {
    if !has_more {
        return None;
    }
    rows.last().map(|r| {
        EventCursor {
            ledger_seq: r.ledger_sequence,
            tx_hash: r.transaction_hash.clone(),
            op_index: r.operation_index,
            sub_index: 0,
        }
        .encode()
    })
}

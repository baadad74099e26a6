//! Soroban smart-contract state operations (§6.1 "Soroban"). All hot-only:
//! contract code, TTL and eviction/restoration bookkeeping are recent-state
//! concerns tracked by the ingestion pipeline directly into the row-store,
//! with no cold-tier historical mirror in this tree.

use tokio_util::sync::CancellationToken;

use crate::cursor::SorobanKeyCursor;
use crate::domain::{ContractCode, ContractData, EvictedKey, RestoredKey, SorobanConfig, Ttl};
use crate::error::QueryError;

use super::{normalize_limit, with_cancel, ListResponse, QueryFacade};

impl QueryFacade {
    /// `contract_code(hash)` (§6.1).
    pub async fn contract_code(&self, cancel: CancellationToken, hash: &str) -> Result<Option<ContractCode>, QueryError> {
        if hash.is_empty() {
            return Err(QueryError::MissingArgument("hash"));
        }
        with_cancel(&cancel, self.tiered().hot().contract_code(hash)).await
    }

    /// `ttl(key_hash)` (§6.1).
    pub async fn ttl(&self, cancel: CancellationToken, key_hash: &str) -> Result<Option<Ttl>, QueryError> {
        if key_hash.is_empty() {
            return Err(QueryError::MissingArgument("key_hash"));
        }
        with_cancel(&cancel, self.tiered().hot().ttl(key_hash)).await
    }

    /// `ttl_expiring(current_ledger, within_ledgers, limit, cursor?)` (§6.1):
    /// entries whose `live_until_ledger` falls in `(current_ledger,
    /// current_ledger + within_ledgers]`.
    pub async fn ttl_expiring(
        &self,
        cancel: CancellationToken,
        current_ledger: i64,
        within_ledgers: i64,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<ListResponse<Ttl>, QueryError> {
        if within_ledgers <= 0 {
            return Err(QueryError::InvalidArgument("within_ledgers must be positive".into()));
        }
        let limit = normalize_limit(limit)?;
        let cursor = cursor.map(SorobanKeyCursor::decode).transpose()?;
        let rows = with_cancel(
            &cancel,
            self.tiered()
                .hot()
                .ttl_expiring(current_ledger, within_ledgers, limit.saturating_add(1), cursor.as_ref()),
        )
        .await?;
        Ok(page_by_ledger_and_key(rows, limit, |t| (t.last_modified_ledger, t.key_hash.clone())))
    }

    /// `ttl_expired(current_ledger, limit, cursor?)` (§6.1).
    pub async fn ttl_expired(
        &self,
        cancel: CancellationToken,
        current_ledger: i64,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<ListResponse<Ttl>, QueryError> {
        let limit = normalize_limit(limit)?;
        let cursor = cursor.map(SorobanKeyCursor::decode).transpose()?;
        let rows = with_cancel(&cancel, self.tiered().hot().ttl_expired(current_ledger, limit.saturating_add(1), cursor.as_ref())).await?;
        Ok(page_by_ledger_and_key(rows, limit, |t| (t.last_modified_ledger, t.key_hash.clone())))
    }

    /// `evicted_keys(limit, cursor?)` (§6.1).
    pub async fn evicted_keys(
        &self,
        cancel: CancellationToken,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<ListResponse<EvictedKey>, QueryError> {
        let limit = normalize_limit(limit)?;
        let cursor = cursor.map(SorobanKeyCursor::decode).transpose()?;
        let rows = with_cancel(&cancel, self.tiered().hot().evicted_keys(limit.saturating_add(1), cursor.as_ref())).await?;
        Ok(page_by_ledger_and_key(rows, limit, |k| (k.evicted_at_ledger, k.key_hash.clone())))
    }

    /// `restored_keys(limit, cursor?)` (§6.1).
    pub async fn restored_keys(
        &self,
        cancel: CancellationToken,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<ListResponse<RestoredKey>, QueryError> {
        let limit = normalize_limit(limit)?;
        let cursor = cursor.map(SorobanKeyCursor::decode).transpose()?;
        let rows = with_cancel(&cancel, self.tiered().hot().restored_keys(limit.saturating_add(1), cursor.as_ref())).await?;
        Ok(page_by_ledger_and_key(rows, limit, |k| (k.restored_at_ledger, k.key_hash.clone())))
    }

    /// `soroban_config()` (§6.1): the most recently observed network
    /// config snapshot.
    pub async fn soroban_config(&self, cancel: CancellationToken) -> Result<Option<SorobanConfig>, QueryError> {
        with_cancel(&cancel, self.tiered().hot().soroban_config()).await
    }

    /// `contract_data(contract_id, durability?, key_hash?, limit, cursor?)` (§6.1).
    pub async fn contract_data(
        &self,
        cancel: CancellationToken,
        contract_id: &str,
        durability: Option<&str>,
        key_hash: Option<&str>,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<ListResponse<ContractData>, QueryError> {
        if contract_id.is_empty() {
            return Err(QueryError::MissingArgument("contract_id"));
        }
        let limit = normalize_limit(limit)?;
        let cursor = cursor.map(SorobanKeyCursor::decode).transpose()?;
        let rows = with_cancel(
            &cancel,
            self.tiered()
                .hot()
                .contract_data(contract_id, durability, key_hash, limit.saturating_add(1), cursor.as_ref()),
        )
        .await?;
        Ok(page_by_ledger_and_key(rows, limit, |d| (d.last_modified_ledger, d.key_hash.clone())))
    }
}

/// Shared `(ledger_seq desc, key_hash asc)` cursor pagination for the
/// overfetch-by-one Soroban key listings above.
fn page_by_ledger_and_key<T>(mut rows: Vec<T>, limit: i64, key_of: impl Fn(&T) -> (i64, String)) -> ListResponse<T> {
    let has_more = rows.len() as i64 > limit;
    rows.truncate(limit as usize);
    let next_cursor = if has_more {
        rows.last().map(|r| {
            let (ledger_seq, key_hash) = key_of(r);
            SorobanKeyCursor { ledger_seq, key_hash }.encode()
        })
    } else {
        None
    };
    ListResponse::new(rows, next_cursor, has_more)
}

//! C7: the query façade (§4.7).
//!
//! [`QueryFacade`] is the one entry point a collaborator (an RPC handler,
//! a CLI, a test) is meant to hold. It owns no storage itself; it holds a
//! [`TieredStore`], a [`SnapshotReader`] and an [`ArchiveEngine`] and is
//! responsible for everything argument parsing, cursor decoding and
//! limit/cap enforcement needs to happen exactly once rather than once per
//! adapter. Every operation takes a [`CancellationToken`] first (§6.5):
//! cooperative cancellation is applied here, racing the underlying tier
//! call via `tokio::select!`, rather than threaded through every hot/cold
//! method — those already run to completion quickly enough (a single SQL
//! round-trip or DuckDB scan) that the only place waiting ever compounds
//! is across this façade's own operation boundary.

mod accounts;
mod archive;
mod events;
mod request;
mod snapshot;
mod soroban;
mod state;

pub use request::*;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::archive::ArchiveEngine;
use crate::error::QueryError;
use crate::snapshot::SnapshotReader;
use crate::tiered::TieredStore;

/// Default page size when a caller doesn't specify `limit` (§6.1).
pub const DEFAULT_LIMIT: i64 = 50;
/// Hard upper bound on `limit` for any listing operation (§5).
pub const MAX_LIMIT: i64 = 200;
const MIN_LIMIT: i64 = 1;

/// Hard cap on bulk id lookups without an explicit named operation budget
/// (§5 "bulk lookup" cap, distinct from [`crate::snapshot::MAX_BATCH_ACCOUNTS`]).
pub const MAX_BULK_IDS: usize = 1000;

/// Uniform listing-operation envelope (§4.7, §6.1): every multi-row
/// operation returns this shape rather than a bare `Vec<T>`.
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub has_more: bool,
    pub generated_at: DateTime<Utc>,
}

impl<T> ListResponse<T> {
    pub(crate) fn new(items: Vec<T>, cursor: Option<String>, has_more: bool) -> Self {
        ListResponse {
            count: items.len(),
            items,
            cursor,
            has_more,
            generated_at: Utc::now(),
        }
    }
}

/// Resolves a caller-supplied `limit` against [`DEFAULT_LIMIT`]/[`MAX_LIMIT`].
pub(crate) fn normalize_limit(limit: Option<i64>) -> Result<i64, QueryError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if limit < MIN_LIMIT {
        return Err(QueryError::InvalidArgument(format!("limit must be >= {MIN_LIMIT}")));
    }
    Ok(limit.min(MAX_LIMIT))
}

/// Races `fut` against `cancel`, turning an observed cancellation into
/// [`QueryError::CancelledOrTimedOut`] (§6.5).
pub(crate) async fn with_cancel<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, QueryError>>,
) -> Result<T, QueryError> {
    tokio::select! {
        res = fut => res,
        _ = cancel.cancelled() => Err(QueryError::CancelledOrTimedOut),
    }
}

#[derive(Clone)]
pub struct QueryFacade {
    tiered: TieredStore,
    snapshot: SnapshotReader,
    archive: ArchiveEngine,
}

impl QueryFacade {
    pub fn new(tiered: TieredStore, snapshot: SnapshotReader, archive: ArchiveEngine) -> Self {
        Self { tiered, snapshot, archive }
    }

    pub fn tiered(&self) -> &TieredStore {
        &self.tiered
    }

    pub fn snapshot(&self) -> &SnapshotReader {
        &self.snapshot
    }

    pub fn archive(&self) -> &ArchiveEngine {
        &self.archive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_limit_applies_default_and_cap() {
        assert_eq!(normalize_limit(None).unwrap(), DEFAULT_LIMIT);
        assert_eq!(normalize_limit(Some(10_000)).unwrap(), MAX_LIMIT);
        assert_eq!(normalize_limit(Some(5)).unwrap(), 5);
    }

    #[test]
    fn normalize_limit_rejects_non_positive() {
        assert!(normalize_limit(Some(0)).is_err());
        assert!(normalize_limit(Some(-1)).is_err());
    }
}

use thiserror::Error;

/// Structured error surfaced to callers of [`crate::facade::QueryFacade`].
///
/// Every variant maps to one of the abstract error kinds in the operation
/// catalog: no stack traces cross this boundary, only a code and a message.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("cursor sort mismatch: cursor was created with sort_by={cursor_sort_by}, sort_order={cursor_sort_order}")]
    CursorSortMismatch {
        cursor_sort_by: String,
        cursor_sort_order: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("tier unavailable: hot={hot}, cold={cold}")]
    TierUnavailable { hot: String, cold: String },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("cancelled or timed out")]
    CancelledOrTimedOut,
}

impl QueryError {
    /// The stable error code exposed to collaborators alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::MissingArgument(_) => "missing_argument",
            QueryError::InvalidArgument(_) => "invalid_argument",
            QueryError::InvalidCursor(_) => "invalid_cursor",
            QueryError::CursorSortMismatch { .. } => "cursor_sort_mismatch",
            QueryError::NotFound(_) => "not_found",
            QueryError::Conflict(_) => "conflict",
            QueryError::TierUnavailable { .. } => "tier_unavailable",
            QueryError::Internal(_) => "internal",
            QueryError::CancelledOrTimedOut => "cancelled_or_timed_out",
        }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(e: sqlx::Error) -> Self {
        QueryError::Internal(format!("hot store: {e}"))
    }
}

impl From<duckdb::Error> for QueryError {
    fn from(e: duckdb::Error) -> Self {
        QueryError::Internal(format!("cold store: {e}"))
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

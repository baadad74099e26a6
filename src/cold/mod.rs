//! C3: typed façade over the cold columnar lake.
//!
//! The cold store is an object-store-backed table set accessed through an
//! embedded analytical engine (`duckdb`, `bundled` feature — no external
//! server process). On construction it installs/loads the extensions it
//! needs, configures object-store credentials, and attaches the catalog
//! under a fixed name so tables are addressed `catalog.schema.table`
//! (§4.3). Same typed operations as the hot adapter where schemas overlap;
//! additional large/aggregate scans live only here.

mod accounts;
mod market;
mod operations;
mod snapshot;
mod trustlines;

use std::sync::Arc;

use duckdb::Connection;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task;

use crate::error::QueryError;

pub use snapshot::SupplyPoint;

/// Object-store credentials and catalog placement for the cold tier.
#[derive(Debug, Clone)]
pub struct ColdStoreConfig {
    /// e.g. `s3://stellar-analytics-lake/gold`
    pub bucket_uri: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Name the catalog is attached under; tables are `<catalog>.<schema>.<table>`.
    pub catalog: String,
    pub metadata_schema: String,
}

/// Façade over the embedded analytical engine. `duckdb::Connection` is not
/// `Sync`; queries run on the blocking thread pool behind a `tokio::sync::Mutex`
/// so the handle can be shared across concurrent requests (§5) without
/// blocking the async runtime.
#[derive(Clone)]
pub struct ColdStore {
    conn: Arc<AsyncMutex<Connection>>,
    catalog: String,
    schema: String,
}

impl ColdStore {
    /// Open the embedded engine, install/load the extensions the cold tier
    /// needs, configure object-store credentials, and attach the catalog.
    pub fn connect(config: &ColdStoreConfig) -> Result<Self, QueryError> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("INSTALL httpfs; LOAD httpfs; INSTALL parquet; LOAD parquet;")?;

        conn.execute(
            &format!(
                "CREATE SECRET cold_store_s3 (
                    TYPE s3,
                    KEY_ID '{}',
                    SECRET '{}',
                    REGION '{}'
                )",
                config.access_key_id.replace('\'', "''"),
                config.secret_access_key.replace('\'', "''"),
                config.region.replace('\'', "''"),
            ),
            [],
        )?;

        conn.execute(
            &format!(
                "ATTACH '{}' AS {} (TYPE parquet, METADATA_SCHEMA '{}')",
                config.bucket_uri.replace('\'', "''"),
                config.catalog,
                config.metadata_schema.replace('\'', "''"),
            ),
            [],
        )?;

        Ok(Self {
            conn: Arc::new(AsyncMutex::new(conn)),
            catalog: config.catalog.clone(),
            schema: config.metadata_schema.clone(),
        })
    }

    /// Fully-qualified `catalog.schema.table` reference.
    pub fn table(&self, name: &str) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, name)
    }

    /// Run a blocking DuckDB query on the executor's blocking pool,
    /// mapping each returned row with `f`. Cooperative cancellation:
    /// callers race this against their own deadline with `tokio::select!`
    /// (the query itself cannot be interrupted mid-scan once dispatched,
    /// matching duckdb-rs's synchronous execution model).
    pub(crate) async fn query<T, F>(&self, sql: String, params: Vec<ColdParam>, f: F) -> Result<Vec<T>, QueryError>
    where
        T: Send + 'static,
        F: Fn(&duckdb::Row<'_>) -> duckdb::Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        task::spawn_blocking(move || {
            let guard = conn.blocking_lock();
            let mut stmt = guard.prepare(&sql)?;
            let bound: Vec<&dyn duckdb::ToSql> = params.iter().map(|p| p as &dyn duckdb::ToSql).collect();
            let rows = stmt.query_map(bound.as_slice(), f)?;
            rows.collect::<duckdb::Result<Vec<T>>>()
        })
        .await
        .map_err(|e| QueryError::Internal(format!("cold store task panicked: {e}")))?
        .map_err(QueryError::from)
    }
}

/// Owned, `'static` parameter value for a cold-tier query, since the bound
/// statement is dispatched onto a blocking task.
#[derive(Debug, Clone)]
pub enum ColdParam {
    Text(String),
    I64(i64),
    F64(f64),
    Bool(bool),
}

impl duckdb::ToSql for ColdParam {
    fn to_sql(&self) -> duckdb::Result<duckdb::types::ToSqlOutput<'_>> {
        match self {
            ColdParam::Text(s) => s.to_sql(),
            ColdParam::I64(v) => v.to_sql(),
            ColdParam::F64(v) => v.to_sql(),
            ColdParam::Bool(v) => v.to_sql(),
        }
    }
}

impl From<&str> for ColdParam {
    fn from(s: &str) -> Self {
        ColdParam::Text(s.to_string())
    }
}
impl From<String> for ColdParam {
    fn from(s: String) -> Self {
        ColdParam::Text(s)
    }
}
impl From<i64> for ColdParam {
    fn from(v: i64) -> Self {
        ColdParam::I64(v)
    }
}

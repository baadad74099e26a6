//! Domain value types returned by the query façade (§3.1).
//!
//! These are plain serde structs. Rows read off the hot tier derive
//! `sqlx::FromRow` the way the teacher's `Balance`/`Trade` models do; rows
//! read off the cold tier are assembled by hand from a `duckdb::Row` since
//! no `FromRow`-equivalent derive exists for that driver.

mod account;
mod archive;
mod compliance;
mod market;
mod operation;
mod snapshot;
mod soroban;
mod trustline;

pub use account::*;
pub use archive::*;
pub use compliance::*;
pub use market::*;
pub use operation::*;
pub use snapshot::*;
pub use soroban::*;
pub use trustline::*;

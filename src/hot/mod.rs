//! C2: typed façade over the hot row-store.
//!
//! The hot store holds the most recent ~10-20 minutes of writes. Every
//! query here is a parameterized `sqlx` call — no string concatenation of
//! untrusted input, matching the teacher's `Balance`/`Trade` model
//! convention. Results are handed back as domain values with balances as
//! decimal strings (§3.3); the optional stroops form is attached by the
//! caller via [`crate::asset::BalanceAmount`].

mod accounts;
mod market;
mod operations;
mod soroban;
mod trustlines;

use sqlx::PgPool;

/// Thin wrapper around the row-store connection pool. Shared across
/// requests; the pool itself tolerates concurrent use (§5).
#[derive(Clone)]
pub struct HotStore {
    pool: PgPool,
}

impl HotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub use accounts::*;
pub use market::*;
pub use operations::*;
pub use soroban::*;
pub use trustlines::*;

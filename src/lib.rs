//! Unified tiered-storage query engine for a Stellar analytics lake (§1).
//!
//! Collaborators (the HTTP router, CLI, config loader — all out of scope
//! here) construct a [`hot::HotStore`] and a [`cold::ColdStore`], combine
//! them into a [`tiered::TieredStore`], and drive everything through
//! [`facade::QueryFacade`] (C7), which is the only type an external
//! caller needs to hold.

pub mod archive;
pub mod asset;
pub mod cold;
pub mod cursor;
pub mod domain;
pub mod error;
pub mod facade;
pub mod hot;
pub mod snapshot;
pub mod tiered;

pub use asset::Asset;
pub use error::{QueryError, QueryResult};
pub use facade::QueryFacade;

//! # DataStore Module
//!
//! Persistence for the collaborators that sit around the summarization core:
//! the per-user credit ledger, the per-video summary cache and the request log.
//!
//! The module uses sqlx for database operations and exposes the [`DataStore`]
//! trait so the request processor can be exercised against in-memory mocks.

mod datastore;
mod domain;

pub use datastore::postgres::PgDataStore;
pub use datastore::DataStore;
pub use domain::{
    CachedSummary, InsufficientCredits, RequestLog, RequestStatus, UsageTransaction,
};

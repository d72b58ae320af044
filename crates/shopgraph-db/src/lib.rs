//! Shopgraph Database Layer
//!
//! Reads the relational shop dataset (Postgres) as full-table snapshots.

pub mod extract;
pub mod pool;

pub use extract::{extract_all, SourceSnapshot, SourceStore, Table};
pub use pool::{DbError, DbResult, PgSource, PostgresConfig};

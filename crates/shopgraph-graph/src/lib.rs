//! # Shopgraph Graph
//!
//! Neo4j side of the shop migration.
//!
//! Provides the graph client, schema initialization, batched idempotent
//! loading of the source snapshot, and the end-to-end pipeline.

pub mod client;
pub mod cypher;
pub mod error;
pub mod load;
pub mod memory;
pub mod schema;
pub mod sink;
pub mod sync;

pub use client::{GraphClient, GraphConfig, GraphCounts};
pub use error::{GraphError, GraphResult, LoadError, PipelineError};
pub use load::{GraphLoader, KindReport, LoadReport};
pub use memory::MemoryGraph;
pub use sink::{GraphSink, WriteBatch};
pub use sync::{run_pipeline, PipelineOptions, SyncReport};

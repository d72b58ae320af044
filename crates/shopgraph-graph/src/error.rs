//! Error types for graph access and the pipeline.

use shopgraph_core::{CoreError, EntityKind};
use shopgraph_db::DbError;
use thiserror::Error;

/// Graph store error types.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),

    #[error("Invalid graph configuration: {0}")]
    Config(String),

    #[error("Write rejected: {0}")]
    Rejected(String),
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// A batch write that failed. Batches before `batch` stay committed.
#[derive(Error, Debug)]
#[error("Failed to load {kind} batch {batch} ({rows} rows): {source}")]
pub struct LoadError {
    pub kind: EntityKind,
    pub batch: usize,
    pub rows: usize,
    #[source]
    pub source: GraphError,
}

/// Fatal pipeline failures. Every variant aborts the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Readiness(CoreError),

    #[error("Invalid schema definition: {0}")]
    SchemaSyntax(CoreError),

    #[error("Schema statement failed: {statement}: {source}")]
    SchemaApply {
        statement: String,
        #[source]
        source: GraphError,
    },

    #[error("Extraction failed: {0}")]
    Extraction(#[from] DbError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

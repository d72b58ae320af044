//! Relational to graph migration pipeline.
//!
//! Waits for both stores, applies the graph schema, extracts a full
//! snapshot of the source, and loads it. Strictly sequential: each stage
//! completes before the next begins.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use shopgraph_core::{await_ready, EntityKind, RetryPolicy, DEFAULT_BATCH_SIZE};
use shopgraph_db::{extract_all, SourceStore};
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::load::{GraphLoader, LoadReport};
use crate::schema::apply_schema;
use crate::sink::GraphSink;

/// Knobs for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub retry: RetryPolicy,
    pub batch_size: NonZeroUsize,
    /// Schema definition text; `None` skips schema initialization.
    pub schema: Option<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            schema: None,
        }
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub extracted: BTreeMap<EntityKind, usize>,
    pub schema_statements: usize,
    pub load: LoadReport,
}

/// Run the full migration from `source` into `graph`.
pub async fn run_pipeline<S, G>(source: &S, graph: &G, options: &PipelineOptions) -> Result<SyncReport, PipelineError>
where
    S: SourceStore + ?Sized,
    G: GraphSink + ?Sized,
{
    info!("Starting shop graph migration");

    await_ready("source store", &options.retry, || source.probe())
        .await
        .map_err(PipelineError::Readiness)?;
    await_ready("graph store", &options.retry, || graph.probe())
        .await
        .map_err(PipelineError::Readiness)?;

    let schema_statements = match &options.schema {
        Some(definition) => apply_schema(graph, definition).await?,
        None => {
            warn!("No schema definition found, continuing without schema");
            0
        }
    };

    let snapshot = extract_all(source).await?;
    let extracted = EntityKind::LOAD_ORDER
        .iter()
        .map(|kind| (*kind, snapshot.len(*kind)))
        .collect();

    let load = GraphLoader::new(graph, options.batch_size)
        .load_snapshot(&snapshot)
        .await?;

    info!(
        batches = load.total_batches(),
        unmapped_events = load.unmapped_events,
        "Migration complete"
    );

    Ok(SyncReport {
        extracted,
        schema_statements,
        load,
    })
}

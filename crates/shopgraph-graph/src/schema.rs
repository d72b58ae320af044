//! Graph schema initialization (constraints and maintenance statements).

use std::io;
use std::path::Path;

use shopgraph_core::split_statements;
use tracing::info;

use crate::error::PipelineError;
use crate::sink::GraphSink;

/// Read a schema definition file. A missing file is `Ok(None)`.
pub fn read_definition(path: &Path) -> io::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Apply every statement of `definition`, in order.
///
/// Statements are expected to be idempotent: the full definition is applied
/// on every run. Returns the number of statements executed.
pub async fn apply_schema<G>(graph: &G, definition: &str) -> Result<usize, PipelineError>
where
    G: GraphSink + ?Sized,
{
    let statements = split_statements(definition).map_err(PipelineError::SchemaSyntax)?;
    info!("Applying graph schema ({} statements)...", statements.len());

    for statement in &statements {
        info!("Running Cypher statement: {}...", preview(statement));
        graph
            .run_statement(statement)
            .await
            .map_err(|source| PipelineError::SchemaApply {
                statement: statement.clone(),
                source,
            })?;
    }

    info!("Graph schema applied ({} statements)", statements.len());
    Ok(statements.len())
}

/// First 80 characters of a statement.
fn preview(statement: &str) -> &str {
    match statement.char_indices().nth(80) {
        Some((end, _)) => &statement[..end],
        None => statement,
    }
}

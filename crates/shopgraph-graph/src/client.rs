//! Neo4j connection client.

use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use tracing::trace;

use crate::cypher;
use crate::error::{GraphError, GraphResult};
use crate::sink::{GraphSink, WriteBatch};

/// Configuration for connecting to Neo4j.
#[derive(Clone, Deserialize)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://neo4j:7687".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
        }
    }
}

impl fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Client for the target graph store.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Create a new GraphClient from config.
    ///
    /// Note: neo4rs uses a lazy deadpool, so `Graph::connect` only creates the
    /// pool object and does NOT establish a real bolt connection yet. The
    /// readiness gate's `RETURN 1` probe is what first reaches the server.
    pub async fn connect(config: &GraphConfig) -> GraphResult<Self> {
        if config.uri.trim().is_empty() {
            return Err(GraphError::Config("NEO4J_URI is empty".to_string()));
        }

        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(1) // one handle for the whole run
            .fetch_size(500)
            .build()?;

        let graph = Graph::connect(neo4j_config).await?;
        Ok(Self { graph })
    }

    /// Execute a Cypher query that returns no results.
    pub async fn execute(&self, query: Query) -> GraphResult<()> {
        self.graph.run(query).await?;
        Ok(())
    }

    /// Execute a Cypher query and return results as rows.
    pub async fn query(&self, query: Query) -> GraphResult<Vec<neo4rs::Row>> {
        let mut result = self.graph.execute(query).await?;

        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a Cypher query and return a single scalar value.
    pub async fn query_scalar<T: DeserializeOwned>(&self, query: Query, field: &str) -> GraphResult<Option<T>> {
        let rows = self.query(query).await?;
        match rows.into_iter().next() {
            Some(row) => {
                let val: T = row.get(field).map_err(|e| {
                    GraphError::Rejected(format!("Failed to get field '{}': {:?}", field, e))
                })?;
                Ok(Some(val))
            }
            None => Ok(None),
        }
    }

    /// Get node and relationship counts for the run summary.
    pub async fn get_counts(&self) -> GraphResult<GraphCounts> {
        let node_query = Query::new("MATCH (n) RETURN count(n) as count".to_string());
        let rel_query = Query::new("MATCH ()-[r]->() RETURN count(r) as count".to_string());

        let node_count: i64 = self.query_scalar(node_query, "count").await?.unwrap_or(0);
        let rel_count: i64 = self.query_scalar(rel_query, "count").await?.unwrap_or(0);

        Ok(GraphCounts {
            nodes: node_count as usize,
            relationships: rel_count as usize,
        })
    }
}

#[async_trait]
impl GraphSink for GraphClient {
    async fn probe(&self) -> GraphResult<()> {
        self.execute(Query::new("RETURN 1".to_string())).await
    }

    async fn run_statement(&self, statement: &str) -> GraphResult<()> {
        self.execute(Query::new(statement.to_string())).await
    }

    async fn write(&self, batch: &WriteBatch<'_>) -> GraphResult<()> {
        trace!(kind = %batch.kind(), rows = batch.len(), "Writing batch");
        // Auto-commit: each batch is its own transaction.
        self.execute(cypher::render(batch)).await
    }
}

/// Node and relationship counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphCounts {
    pub nodes: usize,
    pub relationships: usize,
}

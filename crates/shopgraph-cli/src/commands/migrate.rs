//! Full migration command.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::Args;
use shopgraph_core::{CoreError, RetryPolicy};
use shopgraph_db::{PgSource, PostgresConfig};
use shopgraph_graph::schema::read_definition;
use shopgraph_graph::{run_pipeline, GraphClient, GraphConfig, PipelineOptions};
use tracing::{info, warn};

use super::serve::ServeArgs;
use crate::output;

#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    /// Postgres host
    #[arg(long, env = "POSTGRES_HOST", default_value = "postgres")]
    pub pg_host: String,

    /// Postgres port
    #[arg(long, env = "POSTGRES_PORT", default_value_t = 5432)]
    pub pg_port: u16,

    /// Postgres database name
    #[arg(long, env = "POSTGRES_DB", default_value = "shop")]
    pub pg_database: String,

    /// Postgres user
    #[arg(long, env = "POSTGRES_USER", default_value = "app")]
    pub pg_user: String,

    /// Postgres password
    #[arg(long, env = "POSTGRES_PASSWORD", default_value = "appsecret", hide_env_values = true)]
    pub pg_password: String,

    /// Neo4j Bolt URI
    #[arg(long, env = "NEO4J_URI", default_value = "bolt://neo4j:7687")]
    pub neo4j_uri: String,

    /// Neo4j user
    #[arg(long, env = "NEO4J_USER", default_value = "neo4j")]
    pub neo4j_user: String,

    /// Neo4j password
    #[arg(long, env = "NEO4J_PASSWORD", default_value = "password", hide_env_values = true)]
    pub neo4j_password: String,

    /// Cypher schema file; skipped with a warning when absent
    #[arg(long, env = "SCHEMA_PATH", default_value = "schema/queries.cypher")]
    pub schema_path: PathBuf,

    /// Rows per write batch
    #[arg(long, env = "ETL_BATCH_SIZE", default_value_t = 1000)]
    pub batch_size: usize,

    /// Seconds to wait for each store before giving up
    #[arg(long, env = "READINESS_TIMEOUT_SECS", default_value_t = 60)]
    pub readiness_timeout: u64,

    /// Seconds between readiness probes
    #[arg(long, env = "READINESS_INTERVAL_SECS", default_value_t = 2)]
    pub readiness_interval: u64,

    /// Give up after this many probes even if time remains
    #[arg(long, env = "READINESS_MAX_ATTEMPTS")]
    pub readiness_max_attempts: Option<u32>,

    /// Keep the health endpoint up while migrating
    #[arg(long, env = "SERVE_HEALTH", value_parser = BoolishValueParser::new())]
    pub serve_health: bool,

    #[command(flatten)]
    pub health: ServeArgs,
}

impl MigrateArgs {
    fn postgres_config(&self) -> PostgresConfig {
        PostgresConfig {
            host: self.pg_host.clone(),
            port: self.pg_port,
            database: self.pg_database.clone(),
            user: self.pg_user.clone(),
            password: self.pg_password.clone(),
        }
    }

    fn graph_config(&self) -> GraphConfig {
        GraphConfig {
            uri: self.neo4j_uri.clone(),
            user: self.neo4j_user.clone(),
            password: self.neo4j_password.clone(),
        }
    }

    fn retry_policy(&self) -> Result<RetryPolicy, CoreError> {
        if self.readiness_interval == 0 {
            return Err(CoreError::config("READINESS_INTERVAL_SECS must be at least 1"));
        }
        Ok(RetryPolicy {
            interval: Duration::from_secs(self.readiness_interval),
            timeout: Duration::from_secs(self.readiness_timeout),
            max_attempts: self.readiness_max_attempts,
        })
    }

    fn batch_size(&self) -> Result<NonZeroUsize, CoreError> {
        NonZeroUsize::new(self.batch_size)
            .ok_or_else(|| CoreError::config("ETL_BATCH_SIZE must be at least 1"))
    }
}

pub async fn execute(args: MigrateArgs) -> Result<()> {
    let batch_size = args.batch_size()?;
    let retry = args.retry_policy()?;

    let schema = read_definition(&args.schema_path)
        .with_context(|| format!("Failed to read schema file {}", args.schema_path.display()))?;
    match &schema {
        Some(_) => info!("Using graph schema from {}", args.schema_path.display()),
        None => warn!("Schema file {} not found", args.schema_path.display()),
    }

    let options = PipelineOptions {
        retry,
        batch_size,
        schema,
    };

    let health = args.serve_health.then(|| {
        let ServeArgs { host, port } = args.health.clone();
        tokio::spawn(async move {
            if let Err(e) = shopgraph_web::run_server(&host, port).await {
                warn!("Health endpoint stopped: {:#}", e);
            }
        })
    });

    let source = PgSource::connect_lazy(&args.postgres_config());
    let graph = GraphClient::connect(&args.graph_config())
        .await
        .context("Failed to configure Neo4j client")?;

    let result = run_pipeline(&source, &graph, &options).await;

    if let Some(handle) = health {
        handle.abort();
    }
    let report = result.context("Migration failed")?;

    let counts = match graph.get_counts().await {
        Ok(counts) => Some(counts),
        Err(e) => {
            warn!("Could not read graph totals: {}", e);
            None
        }
    };

    output::print_report(&report, counts.as_ref());
    Ok(())
}

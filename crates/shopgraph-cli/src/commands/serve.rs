//! Liveness endpoint command.

use anyhow::Result;
use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind the health endpoint on
    #[arg(long = "health-host", env = "HEALTH_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the health endpoint
    #[arg(long = "health-port", env = "HEALTH_PORT", default_value_t = 8000)]
    pub port: u16,
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    shopgraph_web::run_server(&args.host, args.port).await
}

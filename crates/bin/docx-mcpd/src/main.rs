//! Daemon entry point for the docx MCP server.
//!
//! Loads configuration from flags and the environment, opens the database and
//! blob store, starts the export workers and cache sweeper, then serves MCP
//! (stdio and/or streamable HTTP) and the REST API side by side. Logs go to
//! stderr so the stdio transport stays clean.

mod config;
mod database;

use docx_api::ApiServer;
use docx_core::control::DocxControlPlane;
use docx_core::store::{BlobStore, SurrealDocStore};
use docx_mcp::server::{serve_stdio, serve_streamable_http};
use tokio::task::JoinSet;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DocxConfig;
use crate::database::connect_database;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn init_logging(config: &DocxConfig) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(layer.json()).init();
    } else {
        registry.with(layer.compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = DocxConfig::from_args()?;
    init_logging(&config);
    info!("starting docx-mcpd v{}", env!("CARGO_PKG_VERSION"));

    let db = connect_database(&config).await?;
    let blobs = BlobStore::open(&config.data_dir).await?;
    info!(data_dir = %config.data_dir.display(), "blob store ready");

    let control = DocxControlPlane::new(SurrealDocStore::new(db), blobs)
        .with_cache(config.cache_config())
        .with_max_document_bytes(config.max_document_bytes)
        .with_export_queue(config.export_queue_config());
    let _sweeper = control.cache().clone().spawn_sweeper();

    let mut servers: JoinSet<Result<(), BoxError>> = JoinSet::new();
    if config.mcp_serve {
        servers.spawn(serve_streamable_http(control.clone(), config.mcp_http_config()));
    }
    if config.api_serve {
        servers.spawn(ApiServer::new(control.clone(), config.api_config()).serve());
    }
    if config.enable_stdio {
        info!("serving MCP over stdio");
        servers.spawn(serve_stdio(control));
    }

    // The first transport to stop ends the daemon; stdio stops when the client
    // closes the pipe.
    if let Some(finished) = servers.join_next().await {
        finished??;
    }
    servers.shutdown().await;
    info!("docx-mcpd stopped");
    Ok(())
}

#![forbid(unsafe_code)]

mod cli;
mod entry;
mod server;
mod support;
mod tools;

pub(crate) use support::*;

use clap::Parser;
use dm_service::DocService;

const MCP_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "docmirror-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub(crate) struct McpServer {
    initialized: bool,
    service: DocService,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::Args::parse();
    init_logging(&args.log);

    let config = args.service_config();
    let service = DocService::open(config)?;
    tracing::info!(version = SERVER_VERSION, "serving on stdio");

    let mut server = McpServer::new(service);
    let result = entry::run_stdio(&mut server);
    if let Err(err) = &result {
        tracing::error!(error = %err, "stdio loop failed");
    }
    result
}

// Stdout carries the protocol, so logs go to stderr.
fn init_logging(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

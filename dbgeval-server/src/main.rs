//! dbgeval Server
//!
//! JSON-RPC server that lets a debugger front-end evaluate array accesses
//! against loaded snapshots. Communicates via stdin/stdout for easy
//! subprocess management.

use std::io::{self, BufRead, Write};
use anyhow::Result;
use tracing::{info, error, debug};
use tracing_subscriber::EnvFilter;
use dbgeval_core::protocol::RpcMessage;
use dbgeval_core::{Request, Response};

mod config;
mod handler;

use config::ServerConfig;

fn main() -> Result<()> {
    let config = ServerConfig::from_env();

    // Initialize logging to stderr (stdout is for JSON-RPC)
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_new(&config.log_filter)?)
        .init();

    info!("dbgeval-server starting...");
    debug!("Configuration: {:?}", config);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    let mut handler = handler::Handler::new(config);

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to read line: {}", e);
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        debug!("Received: {}", line);

        let mut shutdown = false;
        let response = match serde_json::from_str::<RpcMessage<Request>>(&line) {
            Ok(msg) => {
                shutdown = matches!(msg.content, Request::Shutdown);
                let result = handler.handle(&msg.content);
                RpcMessage::new(msg.id.unwrap_or(0), result)
            }
            Err(e) => {
                RpcMessage::new(0, Response::error(format!("Parse error: {}", e)))
            }
        };

        // Send response
        let response_json = serde_json::to_string(&response)?;
        debug!("Sending: {}", response_json);
        writeln!(stdout, "{}", response_json)?;
        stdout.flush()?;

        if shutdown {
            break;
        }
    }

    info!("dbgeval-server shutting down");
    Ok(())
}

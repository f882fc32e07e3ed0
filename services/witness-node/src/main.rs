use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use witness_core::{logging, ChainEvent, NodeConfig};
use witness_engine::{Dispatcher, EventRouter, WitnessNode};

const NODE_PROTOCOL_VERSION: u32 = 1;
const NODE_RUNTIME_VERSION: u32 = 1;
const FEED_CAPACITY: usize = 1024;

#[derive(Debug, Serialize)]
struct NodeVersionHandshake {
    version: &'static str,
    runtime_version: u32,
    protocol_version: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--version-json") {
        let handshake = NodeVersionHandshake {
            version: env!("CARGO_PKG_VERSION"),
            runtime_version: NODE_RUNTIME_VERSION,
            protocol_version: NODE_PROTOCOL_VERSION,
        };
        println!("{}", serde_json::to_string(&handshake)?);
        return Ok(());
    }

    let config_path = parse_config_path(&args)?;
    let config = NodeConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    logging::init_with(config.node.log_format);
    info!(config = %config_path.display(), "Starting witness node");

    let mut node = WitnessNode::open(config).context("starting witness node")?;
    let dispatcher = Arc::new(node.dispatcher());
    let router = match node.store() {
        Some(_) => Some(node.spawn_channel_engines(FEED_CAPACITY)?),
        None => None,
    };

    let stopped = serve_stdin(&node, dispatcher, router).await?;
    if stopped {
        node.shutdown();
    }
    node.join().await?;

    info!("Witness node stopped");
    Ok(())
}

/// Read newline-delimited JSON from stdin until shutdown: objects with a
/// `method` are requests answered on stdout, anything else is a chain event.
///
/// Returns `true` when shutdown was requested and `false` when stdin closed.
async fn serve_stdin(
    node: &WitnessNode,
    dispatcher: Arc<Dispatcher>,
    router: Option<EventRouter>,
) -> Result<bool> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut shutdown = node.shutdown_signal();

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received ctrl-c");
                return Ok(true);
            }
            _ = shutdown.changed() => return Ok(true),
            line = lines.next_line() => line.context("reading stdin")?,
        };

        let Some(line) = line else {
            info!("Input closed; draining event feeds");
            return Ok(false);
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed input line");
                continue;
            }
        };

        if value.get("method").is_some() {
            let dispatcher = Arc::clone(&dispatcher);
            let request = line.to_string();
            let response = tokio::task::spawn_blocking(move || dispatcher.handle_line(&request))
                .await
                .context("request handler panicked")?;
            stdout.write_all(response.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
            continue;
        }

        let Some(router) = router.as_ref() else {
            warn!("Stateless node ignores chain events");
            continue;
        };
        match serde_json::from_value::<ChainEvent>(value) {
            Ok(event) => {
                if let Err(e) = router.route(event).await {
                    error!(error = %e, "Event feed closed");
                    return Ok(true);
                }
            }
            Err(e) => warn!(error = %e, "Ignoring malformed chain event"),
        }
    }
}

fn parse_config_path(args: &[String]) -> Result<PathBuf> {
    let mut args_iter = args.iter();
    while let Some(arg) = args_iter.next() {
        if arg == "--config" {
            if let Some(path) = args_iter.next() {
                return Ok(PathBuf::from(path));
            }
            bail!("--config was provided without a path");
        }
    }

    bail!("missing required --config <path> argument")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_config_path() {
        let path = parse_config_path(&args(&["witness-node", "--config", "node.toml"])).unwrap();
        assert_eq!(path, PathBuf::from("node.toml"));
    }

    #[test]
    fn test_parse_config_path_errors() {
        assert!(parse_config_path(&args(&["witness-node"])).is_err());
        assert!(parse_config_path(&args(&["witness-node", "--config"])).is_err());
    }
}

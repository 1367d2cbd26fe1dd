//!
//! forkful server binary
//! ----------------------
//! Command-line entry point for the ordering backend. Settings come from
//! environment variables; `--http-port` and `--db-folder` override them.

use anyhow::Result;
use std::env;

use forkful::config::ServerConfig;

fn parse_port_arg(args: &[String], flag: &str) -> Result<Option<u16>> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag {
            let raw = args.get(i + 1).ok_or_else(|| anyhow::anyhow!("{} expects a value", flag))?;
            return raw.parse::<u16>().map(Some).map_err(|_| anyhow::anyhow!("{} is not a valid port: {}", flag, raw));
        }
        i += 1;
    }
    Ok(None)
}

fn parse_string_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).cloned()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[tokio::main]
async fn main() -> Result<()> {
    println!(r"    ____           __    ____      __
   / __/___  _____/ /__ / __/_  __/ /
  / /_/ __ \/ ___/ //_// /_/ / / / /
 / __/ /_/ / /  / ,<  / __/ /_/ / /
/_/  \____/_/  /_/|_|/_/  \__,_/_/  ");

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("forkful Server\n\nUSAGE:\n  forkful_server [--http-port N] [--db-folder PATH]\n\nOPTIONS:\n  --http-port N       HTTP API port (env: FORKFUL_HTTP_PORT, default 7000)\n  --db-folder PATH    Document store folder (env: FORKFUL_DB_FOLDER, default dbs)\n\nREQUIRED ENVIRONMENT:\n  AUTH0_AUDIENCE, AUTH0_ISSUER_BASE_URL,\n  CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY, CLOUDINARY_API_SECRET\n\nOPTIONAL ENVIRONMENT:\n  FORKFUL_SNAPSHOT_INTERVAL_MS  Snapshot flush interval (default 5000)\n  RUST_LOG                      Log filter (default info)\n");
        return Ok(());
    }

    let mut cfg = ServerConfig::from_env()?;

    // CLI arguments override environment
    if let Some(port) = parse_port_arg(&args, "--http-port")? { cfg.http_port = port; }
    if let Some(root) = parse_string_arg(&args, "--db-folder") { cfg.db_root = root; }

    println!("forkful starting: http={}, db_root={}", cfg.http_port, cfg.db_root);
    tracing::info!(target: "forkful::startup", "Using port: http={}, db_root={}", cfg.http_port, cfg.db_root);
    forkful::server::run_with_config(cfg).await
}

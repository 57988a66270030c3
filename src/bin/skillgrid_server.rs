//!
//! skillgrid server binary
//! -----------------------
//! Command-line entry point for starting the skillgrid HTTP server.
//! Supports configuration via CLI flags and environment variables.

use anyhow::Result;
use std::env;

fn parse_port_env(name: &str) -> Option<u16> {
    match env::var(name) {
        Ok(val) => val.parse::<u16>().ok(),
        Err(_) => None,
    }
}

fn parse_port_arg(args: &[String], flag: &str) -> Option<u16> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag
            && i + 1 < args.len() {
                return args[i + 1].parse::<u16>().ok();
            }
        i += 1;
    }
    None
}

fn parse_path_arg(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag {
            if i + 1 < args.len() {
                return Some(args[i + 1].clone());
            }
            break;
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber with env filter if provided
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("skillgrid Server\n\nUSAGE:\n  skillgrid_server [--http-port N] [--data-folder PATH]\n\nOPTIONS:\n  --http-port N       HTTP API port (env: SKILLGRID_HTTP_PORT, default 8080)\n  --data-folder PATH  Data root folder (env: SKILLGRID_DATA_FOLDER, default data)\n");
        return Ok(());
    }

    // Defaults
    let default_http: u16 = 8080;
    let default_root: &str = "data";

    // Environment variables
    let env_http = parse_port_env("SKILLGRID_HTTP_PORT");
    let env_root = env::var("SKILLGRID_DATA_FOLDER").ok();

    // CLI arguments override environment
    let arg_http = parse_port_arg(&args, "--http-port");
    let arg_root = parse_path_arg(&args, "--data-folder");

    let http_port = arg_http.or(env_http).unwrap_or(default_http);
    let data_root = arg_root.or(env_root).unwrap_or_else(|| default_root.to_string());

    println!("skillgrid starting: http={}, data_root={}", http_port, data_root);
    tracing::info!("Using port: http={}, data_root={}", http_port, data_root);
    skillgrid::server::run_with_port(http_port, &data_root).await
}

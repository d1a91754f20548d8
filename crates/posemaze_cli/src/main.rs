//! Native runner for the gesture maze.
//!
//! Replays recorded classifier output through the same game core the browser
//! app uses, so smoothing and movement timing can be checked without a webcam.
//!
//! Examples:
//!   posemaze replay --builtin
//!   posemaze replay traces/sample.json --realtime
//!   posemaze layout
//!   posemaze --config my.json config
//!
//! Logging is controlled with `RUST_LOG` (default `info`).

mod config;
mod error;
mod paths;
mod runner;
mod trace;

use std::path::PathBuf;
use std::process;

use posemaze_game::GridMaze;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{load_config, read_json};
use crate::paths::AppPaths;
use crate::runner::{run_replay, ReplayOptions};
use crate::trace::Trace;

fn usage() -> ! {
    eprintln!("posemaze (gesture maze trace runner)");
    eprintln!("Usage: posemaze [--config path] [--realtime] <command> [args]\n");
    eprintln!("Commands:");
    eprintln!("  replay <trace.json|--builtin>  Replay classifier output and print a summary");
    eprintln!("  layout                         Print the maze");
    eprintln!("  config                         Print the effective config as JSON");
    eprintln!("  paths                          Show the config directory and file");
    process::exit(1);
}

struct Args {
    config: Option<PathBuf>,
    realtime: bool,
    rest: Vec<String>,
}

fn parse_args() -> Args {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = None;
    let mut realtime = false;

    loop {
        match args.first().map(String::as_str) {
            Some("--config") if args.len() >= 2 => {
                config = Some(PathBuf::from(&args[1]));
                args.drain(0..2);
            }
            Some("--realtime") => {
                realtime = true;
                args.remove(0);
            }
            Some("-h") | Some("--help") | None => usage(),
            _ => break,
        }
    }

    Args {
        config,
        realtime,
        rest: args,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();

    let paths = match AppPaths::new() {
        Ok(p) => Some(p),
        Err(e) => {
            warn!("{}; using built-in defaults", e);
            None
        }
    };

    match args.rest[0].as_str() {
        "replay" => {
            let Some(source) = args.rest.get(1) else {
                usage();
            };
            let trace = if source == "--builtin" {
                Trace::builtin_route_to_goal()
            } else {
                let path = PathBuf::from(source);
                info!("Loading trace from {:?}", path);
                let mut trace: Trace = read_json(&path)?;
                if trace.name.is_empty() {
                    trace.name = path.display().to_string();
                }
                trace
            };

            let cfg = load_config(args.config.as_deref(), paths.as_ref())?;
            let opts = ReplayOptions {
                realtime: args.realtime,
            };
            let shutdown = async {
                if tokio::signal::ctrl_c().await.is_err() {
                    // No signal handler; run to completion.
                    std::future::pending::<()>().await;
                }
            };
            let summary = run_replay(cfg, trace, opts, shutdown).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "layout" => {
            print!("{}", GridMaze::new());
        }
        "config" => {
            let cfg = load_config(args.config.as_deref(), paths.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
        "paths" => match &paths {
            Some(p) => {
                println!("Config directory: {}", p.config_dir().display());
                println!("Config file:      {}", p.config_file().display());
            }
            None => {
                eprintln!("No config directory on this platform");
                process::exit(1);
            }
        },
        _ => usage(),
    }

    Ok(())
}

use std::env;
use std::process::exit;

use clap::Parser;
use conflict_atlas::AtlasResult;
use conflict_atlas::config::args::Args;
use conflict_atlas::config::file::{Config, read_config};
use conflict_atlas::logging::{ensure_core_log_level_matches, init_tracing};
use conflict_atlas::srv::new_server;
use conflict_atlas_core::env::OsEnv;
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

async fn start(args: Args) -> AtlasResult<()> {
    info!("Starting Conflict Atlas v{VERSION}");

    let env = OsEnv::default();
    let save_config = args.meta.save_config.clone();
    let mut config = if let Some(ref cfg_filename) = args.meta.config {
        info!("Using {}", cfg_filename.display());
        read_config(cfg_filename, &env)?
    } else {
        info!("Config file is not specified, reading the database connection from the environment");
        Config::default()
    };

    args.merge_into_config(&mut config, &env)?;
    config.finalize()?;
    let state = config.resolve().await?;

    if let Some(file_name) = save_config {
        config.save_to_file(file_name.as_path())?;
    } else {
        info!("Use --save-config to save or print the configuration.");
    }

    let (server, listen_addresses) = new_server(config.srv, state)?;
    info!("Conflict Atlas has been started on {listen_addresses}.");
    info!("Use http://{listen_addresses}/world-polygons to get the world polygons.");

    server.await
}

#[tokio::main]
async fn main() {
    let filter = ensure_core_log_level_matches(env::var("RUST_LOG").ok(), "conflict_atlas=");
    if let Err(e) = init_tracing(&filter, env::var("CONFLICT_ATLAS_FORMAT").ok()) {
        eprintln!("{e}");
        exit(1);
    }

    let args = Args::parse();
    if let Err(e) = start(args).await {
        // Ensure the message is printed, even if the logging is disabled
        if log::log_enabled!(log::Level::Error) {
            error!("{e}");
        } else {
            eprintln!("{e}");
        }
        exit(1);
    }
}

use conflict_atlas_core::env::Env;
use tracing::{info, warn};

use crate::config::file::srv::{KEEP_ALIVE_DEFAULT, LISTEN_ADDRESSES_DEFAULT, SrvConfig};

#[derive(clap::Args, Debug, PartialEq, Default)]
#[command(about, version)]
pub struct SrvArgs {
    #[arg(help = format!("Connection keep alive timeout. [DEFAULT: {KEEP_ALIVE_DEFAULT}]"), short, long)]
    pub keep_alive: Option<u64>,
    #[arg(help = format!("The socket address to bind. [DEFAULT: {LISTEN_ADDRESSES_DEFAULT}, or 0.0.0.0:$PORT]"), short, long)]
    pub listen_addresses: Option<String>,
    /// Number of web server workers
    #[arg(short = 'W', long)]
    pub workers: Option<usize>,
}

impl SrvArgs {
    pub(crate) fn merge_into_config<'a>(self, srv_config: &mut SrvConfig, env: &impl Env<'a>) {
        // Override config values with the ones from the command line
        if self.keep_alive.is_some() {
            srv_config.keep_alive = self.keep_alive;
        }
        if self.listen_addresses.is_some() {
            srv_config.listen_addresses = self.listen_addresses;
        }
        if self.workers.is_some() {
            srv_config.worker_processes = self.workers;
        }

        if srv_config.listen_addresses.is_none()
            && let Some(port) = env.get_env_str("PORT")
        {
            match port.parse::<u16>() {
                Ok(port) => {
                    info!("Using env var PORT={port} to set the listen address");
                    srv_config.listen_addresses = Some(format!("0.0.0.0:{port}"));
                }
                Err(e) => warn!("Env var PORT is not a valid port number '{port}': {e}"),
            }
        }
    }
}

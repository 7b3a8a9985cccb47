use std::path::PathBuf;

use conflict_atlas_core::env::Env;
use conflict_atlas_core::postgres::{POOL_SIZE_DEFAULT, PgSslCerts};
use tracing::{info, warn};

use crate::AtlasError::{MultipleConnections, UnrecognizableConnections};
use crate::AtlasResult;
use crate::config::file::postgres::PostgresConfig;

#[derive(clap::Args, Debug, PartialEq, Default, Clone)]
#[command(about, version)]
pub struct PgArgs {
    /// Loads trusted root certificates from a file. The file should contain a sequence of PEM-formatted CA certificates.
    #[arg(long)]
    pub ca_root_file: Option<PathBuf>,
    #[arg(help = format!("Maximum Postgres connections pool size [DEFAULT: {POOL_SIZE_DEFAULT}]"), short, long)]
    pub pool_size: Option<usize>,
}

impl PgArgs {
    /// Build the database section from CLI connection strings or the environment.
    ///
    /// Returns `None` if no connection could be found anywhere.
    pub fn into_config<'a>(
        self,
        connections: Vec<String>,
        env: &impl Env<'a>,
    ) -> AtlasResult<Option<PostgresConfig>> {
        let Some(connection_string) = Self::extract_conn_string(connections, env)? else {
            return Ok(None);
        };
        Ok(Some(PostgresConfig {
            connection_string: Some(connection_string),
            ssl_certificates: self.get_certs(env),
            pool_size: self.pool_size,
            ..PostgresConfig::default()
        }))
    }

    /// Apply CLI parameters from `self` to the configuration loaded from the config file `pg_config`
    pub fn override_config<'a>(self, pg_config: &mut PostgresConfig, env: &impl Env<'a>) {
        // This ensures that if a new parameter is added to the struct, it will not be forgotten here
        let Self {
            ca_root_file,
            pool_size,
        } = self;

        if let Some(value) = pool_size {
            info!("Overriding configured pool size to {value} because of a CLI parameter");
            pg_config.pool_size = pool_size;
        }
        if let Some(value) = &ca_root_file {
            info!(
                "Overriding root certificate file to {} because of a CLI parameter",
                value.display()
            );
            pg_config.ssl_certificates.ssl_root_cert = ca_root_file;
        }

        for v in [
            "DATABASE_URL",
            "PGHOST",
            "PGDATABASE",
            "PGSSLCERT",
            "PGSSLKEY",
            "PGSSLROOTCERT",
        ] {
            // We don't want to warn about these in case they were used in the config file expansion
            if env.has_unused_var(v) {
                warn!(
                    "Environment variable {v} is set, but will be ignored because a configuration file was loaded. Any environment variables can be used inside the config yaml file."
                );
            }
        }
    }

    fn extract_conn_string<'a>(
        connections: Vec<String>,
        env: &impl Env<'a>,
    ) -> AtlasResult<Option<String>> {
        let (mut pg, other): (Vec<_>, Vec<_>) = connections
            .into_iter()
            .partition(|s| is_postgresql_string(s));
        if !other.is_empty() {
            return Err(UnrecognizableConnections(other));
        }
        if pg.len() > 1 {
            return Err(MultipleConnections(pg));
        }
        if let Some(s) = pg.pop() {
            return Ok(Some(s));
        }

        if let Some(s) = env.get_env_str("DATABASE_URL") {
            if is_postgresql_string(&s) {
                info!("Using env var DATABASE_URL to connect to PostgreSQL");
                return Ok(Some(s));
            }
            warn!("Environment var DATABASE_URL is not a valid postgres connection string");
        }

        let from_parts = env.pg_connection_string();
        if from_parts.is_some() {
            info!("Using PGHOST/PGPORT/PGUSER/PGPASSWORD/PGDATABASE to connect to PostgreSQL");
        }
        Ok(from_parts)
    }

    fn get_certs<'a>(&self, env: &impl Env<'a>) -> PgSslCerts {
        let mut result = PgSslCerts {
            ssl_cert: Self::parse_env_var(env, "PGSSLCERT", "ssl certificate"),
            ssl_key: Self::parse_env_var(env, "PGSSLKEY", "ssl key for certificate"),
            ssl_root_cert: self.ca_root_file.clone(),
        };
        if result.ssl_root_cert.is_none() {
            result.ssl_root_cert = Self::parse_env_var(env, "PGSSLROOTCERT", "root certificate(s)");
        }
        result
    }

    fn parse_env_var<'a>(env: &impl Env<'a>, env_var: &str, info: &str) -> Option<PathBuf> {
        let path = env.var_os(env_var).map(PathBuf::from);
        if let Some(p) = &path {
            let p = p.display();
            info!("Using env {env_var}={p} to load {info}");
        }
        path
    }
}

#[must_use]
fn is_postgresql_string(s: &str) -> bool {
    s.starts_with("postgresql://") || s.starts_with("postgres://")
}

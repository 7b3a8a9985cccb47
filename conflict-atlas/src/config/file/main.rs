use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;
use std::sync::Arc;

use conflict_atlas_core::polygons::GeometryProvider;
use serde::{Deserialize, Serialize};
use subst::VariableMap;
use tracing::{debug, info, warn};

use crate::AtlasResult;
use crate::config::file::map::{MapConfig, MapSettings};
use crate::config::file::srv::SrvConfig;
use crate::config::file::{
    ConfigFileError, ConfigFileResult, ConfigurationLivecycleHooks, UnrecognizedKeys,
    UnrecognizedValues, copy_unrecognized_keys_from_config,
};

/// Everything the HTTP handlers need, shared by all workers.
#[derive(Clone, Debug)]
pub struct ServerState {
    pub polygons: Arc<dyn GeometryProvider>,
    pub map: MapSettings,
}

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub srv: SrvConfig,

    #[cfg(feature = "postgres")]
    pub postgres: Option<crate::config::file::postgres::PostgresConfig>,

    pub map: Option<MapConfig>,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl Config {
    /// Validate every section and report keys that were not understood
    pub fn finalize(&mut self) -> AtlasResult<UnrecognizedKeys> {
        self.srv.finalize()?;
        let mut res = self.srv.get_unrecognized_keys();
        copy_unrecognized_keys_from_config(&mut res, "", &self.unrecognized);

        #[cfg(feature = "postgres")]
        if let Some(pg) = &mut self.postgres {
            pg.finalize()?;
            res.extend(pg.get_unrecognized_keys_with_prefix("postgres."));
        }

        if let Some(map) = &mut self.map {
            map.finalize()?;
            res.extend(map.get_unrecognized_keys_with_prefix("map."));
        }

        for key in &res {
            warn!(
                "Ignoring unrecognized configuration key '{key}'. Please check your configuration file for typos."
            );
        }

        #[cfg(feature = "postgres")]
        let has_database = self.postgres.is_some();
        #[cfg(not(feature = "postgres"))]
        let has_database = false;

        if has_database {
            Ok(res)
        } else {
            Err(ConfigFileError::NoDatabase.into())
        }
    }

    /// Connect to the database and build the state shared by the handlers.
    pub async fn resolve(&self) -> AtlasResult<ServerState> {
        init_aws_lc_tls();
        let map = self.map.clone().unwrap_or_default().settings();
        debug!("Map client settings: {map:?}");

        #[cfg(feature = "postgres")]
        if let Some(pg) = &self.postgres {
            let polygons = pg.resolve().await?;
            return Ok(ServerState {
                polygons: Arc::new(polygons),
                map,
            });
        }

        Err(ConfigFileError::NoDatabase.into())
    }

    pub fn save_to_file(&self, file_name: &Path) -> ConfigFileResult<()> {
        let yaml = serde_yaml::to_string(&self).map_err(ConfigFileError::ConfigSerializeError)?;
        if file_name.as_os_str() == OsStr::new("-") {
            info!("Current system configuration:");
            println!("\n\n{yaml}\n");
            Ok(())
        } else {
            info!(
                "Saving config to {}, use --config to load it",
                file_name.display()
            );
            File::create(file_name)
                .map_err(|e| ConfigFileError::ConfigWriteError(e, file_name.to_path_buf()))?
                .write_all(yaml.as_bytes())
                .map_err(|e| ConfigFileError::ConfigWriteError(e, file_name.to_path_buf()))?;
            Ok(())
        }
    }
}

/// Read config from a file
pub fn read_config<'a, M>(file_name: &Path, env: &'a M) -> ConfigFileResult<Config>
where
    M: VariableMap<'a>,
    M::Value: AsRef<str>,
{
    let mut file = File::open(file_name)
        .map_err(|e| ConfigFileError::ConfigLoadError(e, file_name.into()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| ConfigFileError::ConfigLoadError(e, file_name.into()))?;
    parse_config(&contents, env, file_name)
}

/// Parse a YAML config, expanding `${VAR}` references from `env`
pub fn parse_config<'a, M>(contents: &str, env: &'a M, file_name: &Path) -> ConfigFileResult<Config>
where
    M: VariableMap<'a>,
    M::Value: AsRef<str>,
{
    subst::yaml::from_str(contents, env)
        .map_err(|e| ConfigFileError::ConfigParseError(e, file_name.into()))
}

/// Install the process-wide rustls crypto provider once.
pub fn init_aws_lc_tls() {
    // https://github.com/rustls/rustls/issues/1877
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        debug!("A rustls crypto provider is already installed");
    }
}

#[cfg(all(test, feature = "postgres"))]
mod tests {
    use conflict_atlas_core::env::FauxEnv;
    use conflict_atlas_core::polygons::PolygonQuery;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::AtlasError;
    use crate::config::file::cors::CorsConfig;
    use crate::config::file::map::DeployEnvironment;
    use crate::config::file::postgres::PostgresConfig;

    fn parse_cfg(yaml: &str, env: &FauxEnv) -> Config {
        parse_config(yaml, env, Path::new("<test>")).unwrap()
    }

    #[test]
    fn parse_full_config() {
        let env: FauxEnv = [("DATABASE_URL", "postgres://atlas@db/acled")]
            .into_iter()
            .collect();
        let mut config = parse_cfg(
            indoc! {"
                listen_addresses: '127.0.0.1:4000'
                keep_alive: 30
                cors: false
                postgres:
                  connection_string: ${DATABASE_URL}
                  pool_size: 4
                  polygons:
                    table: countries
                map:
                  environment: networked
                  networked_tile_url: https://tiles.example.org/data
            "},
            &env,
        );
        let res = config.finalize().unwrap();
        assert!(res.is_empty(), "unrecognized config: {res:?}");

        assert_eq!(
            config,
            Config {
                srv: SrvConfig {
                    keep_alive: Some(30),
                    listen_addresses: Some("127.0.0.1:4000".to_string()),
                    worker_processes: None,
                    cors: Some(CorsConfig::SimpleFlag(false)),
                },
                postgres: Some(PostgresConfig {
                    connection_string: Some("postgres://atlas@db/acled".to_string()),
                    pool_size: Some(4),
                    polygons: Some(PolygonQuery {
                        table: "countries".to_string(),
                        ..PolygonQuery::default()
                    }),
                    ..PostgresConfig::default()
                }),
                map: Some(MapConfig {
                    environment: Some(DeployEnvironment::Networked),
                    networked_tile_url: Some("https://tiles.example.org/data".to_string()),
                    ..MapConfig::default()
                }),
                unrecognized: UnrecognizedValues::default(),
            }
        );
    }

    #[test]
    fn unrecognized_keys_are_reported() {
        let mut config = parse_cfg(
            indoc! {"
                listen_adresses: '0.0.0.0:4000'
                postgres:
                  connection_string: postgres://localhost/acled
                  pool_sise: 3
                map:
                  tiles: http://localhost:8080
            "},
            &FauxEnv::default(),
        );
        let res = config.finalize().unwrap();
        assert_eq!(
            res,
            UnrecognizedKeys::from([
                "listen_adresses".to_string(),
                "postgres.pool_sise".to_string(),
                "map.tiles".to_string(),
            ])
        );

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("pool_sise"));
        assert!(yaml.contains("postgres://localhost/acled"));
    }

    #[test]
    fn database_is_required() {
        let mut config = parse_cfg("keep_alive: 10", &FauxEnv::default());
        assert!(matches!(
            config.finalize(),
            Err(AtlasError::ConfigFileError(ConfigFileError::NoDatabase))
        ));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let err = parse_config("keep_alive: [", &FauxEnv::default(), Path::new("atlas.yaml"))
            .unwrap_err();
        assert!(err.to_string().starts_with("Unable to parse config file atlas.yaml"));
    }
}

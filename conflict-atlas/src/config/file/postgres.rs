use conflict_atlas_core::polygons::{PolygonQuery, PostgisPolygons};
use conflict_atlas_core::postgres::{POOL_SIZE_DEFAULT, PgSslCerts, PostgresPool};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::AtlasResult;
use crate::config::file::{
    ConfigFileError, ConfigFileResult, ConfigurationLivecycleHooks, UnrecognizedKeys,
    UnrecognizedValues, copy_unrecognized_keys_from_config,
};

/// The database holding the world polygons.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Database connection string
    pub connection_string: Option<String>,
    #[serde(flatten)]
    pub ssl_certificates: PgSslCerts,
    /// Maximum Postgres connections pool size [DEFAULT: 20]
    pub pool_size: Option<usize>,
    /// Table and columns the polygons are read from
    pub polygons: Option<PolygonQuery>,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl ConfigurationLivecycleHooks for PostgresConfig {
    fn finalize(&mut self) -> ConfigFileResult<()> {
        if self.pool_size == Some(0) {
            return Err(ConfigFileError::PostgresPoolSizeInvalid);
        }
        if self
            .connection_string
            .as_deref()
            .is_none_or(|s| s.trim().is_empty())
        {
            return Err(ConfigFileError::PostgresConnectionStringMissing);
        }
        Ok(())
    }

    fn get_unrecognized_keys(&self) -> UnrecognizedKeys {
        let mut keys = UnrecognizedKeys::new();
        copy_unrecognized_keys_from_config(&mut keys, "", &self.unrecognized);
        keys
    }
}

impl PostgresConfig {
    /// Connect to the database and bind the polygon query to the pool.
    pub async fn resolve(&self) -> AtlasResult<PostgisPolygons> {
        let Some(connection_string) = &self.connection_string else {
            return Err(ConfigFileError::PostgresConnectionStringMissing.into());
        };
        let pool_size = self.pool_size.unwrap_or(POOL_SIZE_DEFAULT);
        let pool = PostgresPool::new(connection_string, &self.ssl_certificates, pool_size).await?;
        let query = self.polygons.clone().unwrap_or_default();
        let polygons = PostgisPolygons::new(pool, &query)?;
        info!(
            "Serving polygons from {}.{} (pool size {pool_size})",
            query.schema, query.table
        );
        Ok(polygons)
    }
}

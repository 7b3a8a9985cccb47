//! Where the web client finds its tiles and the API, per deployment.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::file::{
    ConfigFileError, ConfigFileResult, ConfigurationLivecycleHooks, UnrecognizedKeys,
    UnrecognizedValues,
};

pub const LOCAL_TILE_URL_DEFAULT: &str = "http://localhost:8080/data";
pub const API_URL_DEFAULT: &str = "http://localhost:4000";

#[derive(PartialEq, Eq, Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeployEnvironment {
    /// Tile server and API run on the same machine as the browser
    #[default]
    Local,
    /// Tile server is reached over the network
    Networked,
}

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Which tile server URL the client uses [DEFAULT: local]
    pub environment: Option<DeployEnvironment>,
    /// Tile server base URL for local development
    pub local_tile_url: Option<String>,
    /// Tile server base URL for networked deployments
    pub networked_tile_url: Option<String>,
    /// Base URL of this API as seen by the browser
    pub api_url: Option<String>,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

/// The URLs a web client needs, resolved for the configured environment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSettings {
    pub environment: DeployEnvironment,
    pub tile_base_url: String,
    pub api_url: String,
}

impl ConfigurationLivecycleHooks for MapConfig {
    fn finalize(&mut self) -> ConfigFileResult<()> {
        if self.environment() == DeployEnvironment::Networked && self.networked_tile_url.is_none()
        {
            return Err(ConfigFileError::NetworkedTileUrlMissing);
        }
        for (name, value) in [
            ("map.local_tile_url", &self.local_tile_url),
            ("map.networked_tile_url", &self.networked_tile_url),
            ("map.api_url", &self.api_url),
        ] {
            if let Some(value) = value {
                Url::parse(value)
                    .map_err(|e| ConfigFileError::InvalidMapUrl(e, name, value.clone()))?;
            }
        }
        Ok(())
    }

    fn get_unrecognized_keys(&self) -> UnrecognizedKeys {
        self.unrecognized.keys().cloned().collect()
    }
}

impl MapConfig {
    #[must_use]
    pub fn environment(&self) -> DeployEnvironment {
        self.environment.unwrap_or_default()
    }

    /// Tile server base URL for the configured environment, without a trailing `/`.
    #[must_use]
    pub fn tile_base_url(&self) -> &str {
        let url = match self.environment() {
            DeployEnvironment::Local => self.local_tile_url.as_deref(),
            DeployEnvironment::Networked => self.networked_tile_url.as_deref(),
        };
        url.unwrap_or(LOCAL_TILE_URL_DEFAULT).trim_end_matches('/')
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or(API_URL_DEFAULT)
            .trim_end_matches('/')
    }

    #[must_use]
    pub fn settings(&self) -> MapSettings {
        MapSettings {
            environment: self.environment(),
            tile_base_url: self.tile_base_url().to_string(),
            api_url: self.api_url().to_string(),
        }
    }
}

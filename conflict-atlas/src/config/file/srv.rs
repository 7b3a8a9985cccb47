use serde::{Deserialize, Serialize};

use crate::config::file::cors::CorsConfig;
use crate::config::file::{ConfigFileResult, ConfigurationLivecycleHooks, UnrecognizedKeys};

pub const KEEP_ALIVE_DEFAULT: u64 = 75;
pub const LISTEN_ADDRESSES_DEFAULT: &str = "0.0.0.0:4000";

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct SrvConfig {
    pub keep_alive: Option<u64>,
    pub listen_addresses: Option<String>,
    pub worker_processes: Option<usize>,
    pub cors: Option<CorsConfig>,
}

impl ConfigurationLivecycleHooks for SrvConfig {
    fn finalize(&mut self) -> ConfigFileResult<()> {
        match &self.cors {
            Some(cors) => cors.validate(),
            None => Ok(()),
        }
    }

    fn get_unrecognized_keys(&self) -> UnrecognizedKeys {
        let mut unrecognized = UnrecognizedKeys::new();
        if let Some(CorsConfig::Properties(cors)) = &self.cors {
            unrecognized.extend(cors.get_unrecognized_keys_with_prefix("cors."));
        }
        unrecognized
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::config::file::{ConfigFileError, UnrecognizedValues};
    use crate::config::file::cors::CorsProperties;

    #[test]
    fn parse_config() {
        assert_eq!(
            serde_yaml::from_str::<SrvConfig>(indoc! {"
                keep_alive: 75
                listen_addresses: '0.0.0.0:4000'
                worker_processes: 8
            "})
            .unwrap(),
            SrvConfig {
                keep_alive: Some(75),
                listen_addresses: Some("0.0.0.0:4000".to_string()),
                worker_processes: Some(8),
                ..Default::default()
            }
        );
    }

    #[test]
    fn parse_config_cors() {
        assert_eq!(
            serde_yaml::from_str::<SrvConfig>(indoc! {"
                listen_addresses: '127.0.0.1:4000'
                cors: false
            "})
            .unwrap(),
            SrvConfig {
                listen_addresses: Some("127.0.0.1:4000".to_string()),
                cors: Some(CorsConfig::SimpleFlag(false)),
                ..Default::default()
            }
        );
        let mut cfg = serde_yaml::from_str::<SrvConfig>(indoc! {"
            cors:
              origin:
                - https://atlas.example.org
              max_age: 600
              allow_credentials: true
        "})
        .unwrap();
        assert_eq!(
            cfg.cors,
            Some(CorsConfig::Properties(CorsProperties {
                origin: vec!["https://atlas.example.org".to_string()],
                max_age: Some(600),
                unrecognized: UnrecognizedValues::from([(
                    "allow_credentials".to_string(),
                    serde_yaml::Value::Bool(true)
                )]),
            }))
        );
        cfg.finalize().unwrap();
        assert_eq!(
            cfg.get_unrecognized_keys(),
            UnrecognizedKeys::from(["cors.allow_credentials".to_string()])
        );
    }

    #[test]
    fn cors_without_origin_fails_finalize() {
        let mut cfg = serde_yaml::from_str::<SrvConfig>("cors: {max_age: 600}").unwrap();
        assert!(matches!(
            cfg.finalize(),
            Err(ConfigFileError::CorsNoOriginsConfigured)
        ));
    }
}

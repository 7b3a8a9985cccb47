#![allow(clippy::missing_panics_doc)]
#![allow(clippy::unused_async)]
#![allow(dead_code)]

//
// Shared by the integration tests. Not every test file uses every helper.
//

use std::path::Path;
use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::test::read_body;
use async_trait::async_trait;
use conflict_atlas::config::file::{Config, ServerState, parse_config};
use conflict_atlas_core::env::FauxEnv;
use conflict_atlas_core::polygons::{GeometryProvider, PolygonRow, features_from_rows};
use conflict_atlas_core::{CoreError, CoreResult};
use geojson::FeatureCollection;
use indoc::formatdoc;
use serde_json::json;

/// A provider that never touches a database.
#[derive(Debug, Clone)]
pub struct MockPolygons(pub Result<FeatureCollection, &'static str>);

impl MockPolygons {
    /// Two unit squares, one at the origin and one east of it.
    #[must_use]
    pub fn countries() -> Self {
        let rows = [(1, "Country A", 0.0), (2, "Country B", 10.0)].map(|(id, name, x)| {
            PolygonRow {
                id,
                name: Some(name.to_string()),
                geometry: Some(json!({
                    "type": "Polygon",
                    "coordinates": [[[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0], [x, 0.0]]]
                })),
            }
        });
        Self(Ok(features_from_rows(rows).unwrap()))
    }

    #[must_use]
    pub fn failing(message: &'static str) -> Self {
        Self(Err(message))
    }
}

#[async_trait]
impl GeometryProvider for MockPolygons {
    fn get_id(&self) -> &str {
        "mock"
    }

    async fn get_polygons(&self) -> CoreResult<FeatureCollection> {
        self.0
            .clone()
            .map_err(|message| CoreError::OtherError(message.into()))
    }
}

/// Parse a config with a placeholder database, as the server would after finalizing.
#[must_use]
pub fn mock_cfg(yaml: &str) -> Config {
    let yaml = formatdoc! {"
        {yaml}
        postgres:
          connection_string: postgres://localhost/acled
    "};
    let mut cfg = parse_config(&yaml, &FauxEnv::default(), Path::new("<test>"))
        .expect("config can be parsed as yaml");
    let res = cfg.finalize().expect("config can be finalized");
    assert!(res.is_empty(), "unrecognized config: {res:?}");
    cfg
}

#[must_use]
pub fn mock_state(cfg: &Config, polygons: MockPolygons) -> ServerState {
    ServerState {
        polygons: Arc::new(polygons),
        map: cfg.map.clone().unwrap_or_default().settings(),
    }
}

pub async fn assert_response<B: MessageBody>(response: ServiceResponse<B>) -> ServiceResponse<B> {
    if !response.status().is_success() {
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = read_body(response).await;
        let body = String::from_utf8_lossy(&bytes);
        panic!("response status: {status}\nresponse headers: {headers:?}\nresponse body: {body}");
    }
    response
}

use actix_web::web::Data;
use actix_web::{HttpResponse, get, routes};
use conflict_atlas_core::polygons::GeometryProvider;
use serde::Serialize;
use tracing::{debug, error};

use crate::config::file::map::MapSettings;

/// Body of every failed API response. The cause is logged, never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub error: &'static str,
}

impl ApiError {
    pub const INTERNAL: Self = Self {
        error: "Internal Server Error",
    };
}

/// The whole world as one `FeatureCollection` with `{id, name}` properties.
///
/// Also mounted under `/api` where the web client looks for it.
#[routes]
#[get("/world-polygons")]
#[get("/api/world-polygons")]
pub async fn get_world_polygons(polygons: Data<dyn GeometryProvider>) -> HttpResponse {
    match polygons.get_polygons().await {
        Ok(collection) => {
            debug!(
                "Returning {} polygons from {}",
                collection.features.len(),
                polygons.get_id()
            );
            HttpResponse::Ok().json(collection)
        }
        Err(e) => {
            error!("Unable to load polygons from {}: {e}", polygons.get_id());
            HttpResponse::InternalServerError().json(ApiError::INTERNAL)
        }
    }
}

/// Tile server and API URLs for the configured deployment environment.
#[get("/map-config")]
#[allow(clippy::unused_async)]
pub async fn get_map_config(settings: Data<MapSettings>) -> HttpResponse {
    HttpResponse::Ok().json(settings.get_ref())
}

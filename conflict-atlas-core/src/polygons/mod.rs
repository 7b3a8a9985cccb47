//! The world-polygon projection: one fixed query, one `FeatureCollection`.
//!
//! [`GeometryProvider`] is the seam between the HTTP layer and the database:
//! [`PostgisPolygons`] is the production implementation, tests substitute
//! their own.

use std::fmt::Debug;

use async_trait::async_trait;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

mod bounds;
pub use bounds::{collection_bounds, geometry_bounds};

#[cfg(feature = "postgres")]
mod postgis;
#[cfg(feature = "postgres")]
pub use postgis::PostgisPolygons;

/// Which table and columns the polygon query reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonQuery {
    /// Schema of the table, `public` by default
    pub schema: String,
    /// Table or view with one row per country
    pub table: String,
    /// Integer column used as `properties.id`
    pub id_column: String,
    /// Text column used as `properties.name`
    pub name_column: String,
    /// Geometry column converted with `ST_AsGeoJSON`
    pub geometry_column: String,
}

impl Default for PolygonQuery {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            table: "ne_10m_admin_0_countries".to_string(),
            id_column: "gid".to_string(),
            name_column: "name".to_string(),
            geometry_column: "geom".to_string(),
        }
    }
}

/// One row of the polygon query, before it becomes a [`Feature`].
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonRow {
    /// Record identifier
    pub id: i64,
    /// Display name, may be `NULL` in the database
    pub name: Option<String>,
    /// Geometry as produced by `ST_AsGeoJSON(..)::json`
    pub geometry: Option<JsonValue>,
}

/// Something that can produce the full world-polygon [`FeatureCollection`].
#[async_trait]
pub trait GeometryProvider: Send + Sync + Debug {
    /// Identifier of the underlying data source, used in log messages.
    fn get_id(&self) -> &str;

    /// Run the projection and return every row as a feature.
    ///
    /// Either the complete collection is returned, or an error: never a partial result.
    async fn get_polygons(&self) -> CoreResult<FeatureCollection>;
}

/// Convert one row into a feature with `properties = {id, name}`.
///
/// The geometry is carried over verbatim, a `NULL` geometry stays `null`.
pub fn feature_from_row(row: PolygonRow) -> CoreResult<Feature> {
    let geometry = row
        .geometry
        .map(Geometry::from_json_value)
        .transpose()
        .map_err(|e| CoreError::InvalidGeometry(Box::new(e), row.id))?;

    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), JsonValue::from(row.id));
    properties.insert(
        "name".to_string(),
        row.name.map_or(JsonValue::Null, JsonValue::String),
    );

    Ok(Feature {
        bbox: None,
        geometry,
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// Wrap all rows into a [`FeatureCollection`], one feature per row, in row order.
pub fn features_from_rows<I>(rows: I) -> CoreResult<FeatureCollection>
where
    I: IntoIterator<Item = PolygonRow>,
{
    let features = rows
        .into_iter()
        .map(feature_from_row)
        .collect::<CoreResult<Vec<_>>>()?;
    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

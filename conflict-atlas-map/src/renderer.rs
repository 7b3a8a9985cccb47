use std::fmt::{self, Debug, Display, Formatter};

use geojson::{FeatureCollection, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use tilejson::Bounds;

/// Longitude/latitude pair in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    #[must_use]
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// What part of the world the map is showing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LngLat,
    pub zoom: f64,
}

impl Viewport {
    #[must_use]
    pub const fn new(lng: f64, lat: f64, zoom: f64) -> Self {
        Self {
            center: LngLat::new(lng, lat),
            zoom,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 2.0)
    }
}

/// Layout visibility of a layer, serialized the way style documents spell it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    #[serde(rename = "visible")]
    Visible,
    #[default]
    #[serde(rename = "none")]
    Hidden,
}

impl Display for Visibility {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Visible => "visible",
            Self::Hidden => "none",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceSpec {
    /// In-memory features
    Geojson { data: FeatureCollection },
    /// Tiles fetched from a URL template
    Vector {
        tiles: Vec<String>,
        minzoom: u8,
        maxzoom: u8,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Fill,
    Circle,
}

/// One style layer as handed to the renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_layer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<u8>,
    pub paint: JsonValue,
    pub visibility: Visibility,
}

/// Events a renderer reports back to the overlays.
#[derive(Clone, Debug, PartialEq)]
pub enum MapEvent {
    /// The style finished loading, sources and layers may now be added
    StyleLoad,
    Click {
        layer: String,
        lng_lat: LngLat,
        properties: JsonObject,
    },
    MouseEnter {
        layer: String,
    },
    MouseLeave {
        layer: String,
    },
    Error {
        message: String,
    },
}

/// The drawing engine behind a [`MapCanvas`](crate::canvas::MapCanvas).
///
/// Implementations forward these calls to a real map widget. Removing or hiding
/// something that does not exist must be a no-op.
pub trait MapRenderer: Debug {
    /// Bind to the container element and show the initial viewport.
    fn attach(&mut self, container_id: &str, initial: Viewport);

    fn viewport(&self) -> Viewport;

    /// Move without animation.
    fn jump_to(&mut self, viewport: Viewport);

    /// Animated move.
    fn fly_to(&mut self, viewport: Viewport);

    fn fit_bounds(&mut self, bounds: Bounds, padding: u32);

    fn has_source(&self, id: &str) -> bool;

    fn add_source(&mut self, id: &str, source: SourceSpec);

    fn remove_source(&mut self, id: &str);

    fn has_layer(&self, id: &str) -> bool;

    fn add_layer(&mut self, layer: LayerSpec);

    fn remove_layer(&mut self, id: &str);

    fn set_visibility(&mut self, layer: &str, visibility: Visibility);

    fn show_popup(&mut self, at: LngLat, html: &str);

    /// Set the mouse cursor, an empty string restores the default.
    fn set_cursor(&mut self, cursor: &str);

    /// Text shown in place of the map content while data is not available.
    fn set_placeholder(&mut self, text: Option<&str>);

    /// Release the widget. Nothing is called on the renderer afterwards.
    fn remove(&mut self);
}

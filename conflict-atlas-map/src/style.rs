use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::MapError;
use crate::renderer::{LayerKind, LayerSpec, SourceSpec, Visibility};

/// Highest zoom level any event tile set is generated for.
pub const MAX_ZOOM: u8 = 15;

/// Country outlines served by the tile server as a base layer.
pub const COUNTRIES_DATASET: &str = "ne_10m_admin_0_countries";
pub const COUNTRIES_SOURCE_ID: &str = "countries-tiles";
pub const COUNTRIES_LAYER_ID: &str = "countries-layer";
pub const COUNTRIES_MAX_ZOOM: u8 = 10;

/// One kind of conflict event the map can show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    RecentConflicts,
    Battles,
    Violence,
    HighFatality,
}

/// Vector source for the country base layer, zoom 0 to [`COUNTRIES_MAX_ZOOM`].
#[must_use]
pub fn countries_source(tile_base_url: &str) -> SourceSpec {
    SourceSpec::Vector {
        tiles: vec![format!(
            "{}/{COUNTRIES_DATASET}/{{z}}/{{x}}/{{y}}.pbf",
            tile_base_url.trim_end_matches('/')
        )],
        minzoom: 0,
        maxzoom: COUNTRIES_MAX_ZOOM,
    }
}

/// Always visible fill under the event layers, styled like the GeoJSON polygons.
#[must_use]
pub fn countries_layer() -> LayerSpec {
    LayerSpec {
        id: COUNTRIES_LAYER_ID.to_string(),
        kind: LayerKind::Fill,
        source: COUNTRIES_SOURCE_ID.to_string(),
        source_layer: Some(COUNTRIES_DATASET.to_string()),
        minzoom: None,
        maxzoom: None,
        paint: json!({
            "fill-color": "lightblue",
            "fill-opacity": 0.5,
            "fill-outline-color": "blue"
        }),
        visibility: Visibility::Visible,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorRule {
    /// Color ramp driven by the `fatalities` property
    ByFatalities,
    Fixed(&'static str),
}

/// Everything needed to register and style the layer of one [`Category`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryDescriptor {
    pub category: Category,
    pub id: &'static str,
    pub label: &'static str,
    /// Tile set name, also the source layer inside each tile
    pub dataset: &'static str,
    pub minzoom: u8,
    pub color: ColorRule,
}

/// Indexed by the [`Category`] discriminant.
pub const CATEGORIES: [CategoryDescriptor; 4] = [
    CategoryDescriptor {
        category: Category::RecentConflicts,
        id: "recent-conflicts",
        label: "Recent Conflicts",
        dataset: "recent_conflicts",
        minzoom: 4,
        color: ColorRule::ByFatalities,
    },
    CategoryDescriptor {
        category: Category::Battles,
        id: "battles",
        label: "Battles",
        dataset: "battles",
        minzoom: 4,
        color: ColorRule::Fixed("#e74c3c"),
    },
    CategoryDescriptor {
        category: Category::Violence,
        id: "violence",
        label: "Violence Against Civilians",
        dataset: "violence_against_civilians",
        minzoom: 4,
        color: ColorRule::Fixed("#8e44ad"),
    },
    CategoryDescriptor {
        category: Category::HighFatality,
        id: "high-fatality",
        label: "High Fatality Events",
        dataset: "high_fatality_events",
        minzoom: 3,
        color: ColorRule::ByFatalities,
    },
];

impl Category {
    pub const ALL: [Self; 4] = [
        Self::RecentConflicts,
        Self::Battles,
        Self::Violence,
        Self::HighFatality,
    ];

    #[must_use]
    pub fn descriptor(self) -> &'static CategoryDescriptor {
        &CATEGORIES[self as usize]
    }

    #[must_use]
    pub fn id(self) -> &'static str {
        self.descriptor().id
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        self.descriptor().label
    }

    #[must_use]
    pub fn layer_id(self) -> String {
        format!("{}-layer", self.id())
    }

    #[must_use]
    pub fn source_id(self) -> String {
        format!("{}-source", self.id())
    }

    /// Find the category that owns a rendering layer.
    #[must_use]
    pub fn from_layer_id(layer: &str) -> Option<Self> {
        let id = layer.strip_suffix("-layer")?;
        Self::ALL.into_iter().find(|c| c.id() == id)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Category {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|c| c.id() == s).ok_or_else(|| {
            let known: Vec<_> = Self::ALL.iter().map(|c| c.id()).collect();
            MapError::UnknownCategory(s.to_string(), known.join(", "))
        })
    }
}

fn fatalities() -> Value {
    json!(["to-number", ["get", "fatalities"], 0])
}

impl CategoryDescriptor {
    /// `{base}/{dataset}/{z}/{x}/{y}.pbf`
    #[must_use]
    pub fn tile_url(&self, tile_base_url: &str) -> String {
        format!(
            "{}/{}/{{z}}/{{x}}/{{y}}.pbf",
            tile_base_url.trim_end_matches('/'),
            self.dataset
        )
    }

    #[must_use]
    pub fn source(&self, tile_base_url: &str) -> SourceSpec {
        SourceSpec::Vector {
            tiles: vec![self.tile_url(tile_base_url)],
            minzoom: self.minzoom,
            maxzoom: MAX_ZOOM,
        }
    }

    /// Circle layer for this category, initially hidden.
    #[must_use]
    pub fn layer(&self) -> LayerSpec {
        LayerSpec {
            id: self.category.layer_id(),
            kind: LayerKind::Circle,
            source: self.category.source_id(),
            source_layer: Some(self.dataset.to_string()),
            minzoom: Some(self.minzoom),
            maxzoom: Some(MAX_ZOOM),
            paint: self.paint(),
            visibility: Visibility::Hidden,
        }
    }

    #[must_use]
    pub fn paint(&self) -> Value {
        let color = match self.color {
            ColorRule::Fixed(color) => json!(color),
            ColorRule::ByFatalities => json!([
                "interpolate", ["linear"], fatalities(),
                0, "#fdae61",
                10, "#f46d43",
                50, "#d73027",
                100, "#a50026"
            ]),
        };
        json!({
            "circle-color": color,
            "circle-radius": [
                "interpolate", ["linear"], ["zoom"],
                3, ["interpolate", ["linear"], fatalities(), 0, 2, 100, 8],
                15, ["interpolate", ["linear"], fatalities(), 0, 6, 100, 24]
            ],
            "circle-opacity": 0.8,
            "circle-stroke-color": "#ffffff",
            "circle-stroke-width": 0.5
        })
    }
}

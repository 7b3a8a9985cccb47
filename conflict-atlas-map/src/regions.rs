//! Preset viewports for the region picker.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::canvas::MapCanvas;
use crate::renderer::Viewport;
use crate::{MapError, MapResult};

/// How far [`force_refresh`] moves the center, in degrees.
pub const REFRESH_NUDGE: f64 = 1e-6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    #[default]
    World,
    Africa,
    MiddleEast,
    Europe,
    Asia,
    Americas,
}

impl Region {
    pub const ALL: [Self; 6] = [
        Self::World,
        Self::Africa,
        Self::MiddleEast,
        Self::Europe,
        Self::Asia,
        Self::Americas,
    ];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::World => "world",
            Self::Africa => "africa",
            Self::MiddleEast => "middle-east",
            Self::Europe => "europe",
            Self::Asia => "asia",
            Self::Americas => "americas",
        }
    }

    #[must_use]
    pub fn viewport(self) -> Viewport {
        match self {
            Self::World => Viewport::new(0.0, 20.0, 2.0),
            Self::Africa => Viewport::new(20.0, 5.0, 3.0),
            Self::MiddleEast => Viewport::new(45.0, 29.0, 4.5),
            Self::Europe => Viewport::new(15.0, 50.0, 4.0),
            Self::Asia => Viewport::new(95.0, 30.0, 3.0),
            Self::Americas => Viewport::new(-80.0, 10.0, 2.5),
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Region {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|r| r.id() == s).ok_or_else(|| {
            let known: Vec<_> = Self::ALL.iter().map(|r| r.id()).collect();
            MapError::UnknownRegion(s.to_string(), known.join(", "))
        })
    }
}

/// Animate the map to a preset region.
pub fn fly_to_region(canvas: &MapCanvas, region: Region) -> MapResult<()> {
    debug!("Flying to {region}");
    canvas.fly_to(region.viewport())
}

/// Move the center by a tiny amount and back so the renderer requests tiles again.
pub fn force_refresh(canvas: &MapCanvas) -> MapResult<()> {
    let viewport = canvas.viewport()?;
    let mut nudged = viewport;
    nudged.center.lng += REFRESH_NUDGE;
    canvas.jump_to(nudged)?;
    canvas.jump_to(viewport)
}

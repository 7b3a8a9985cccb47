use std::future::Future;

use log::{debug, info, warn};
use tokio::sync::watch;

use crate::MapResult;
use crate::canvas::MapCanvas;
use crate::filter::FilterController;
use crate::popup::{EventPopup, country_popup};
use crate::renderer::{MapEvent, Visibility};
use crate::style::{
    CATEGORIES, COUNTRIES_LAYER_ID, COUNTRIES_SOURCE_ID, Category, countries_layer,
    countries_source,
};

/// One vector-tile layer per [`Category`], exactly one of them visible.
///
/// Layers can only be added once the style has loaded. A selection made before
/// that is stored and applied right after registration.
///
/// With [`VectorTileOverlay::with_countries`] a country fill is drawn under the
/// event layers. It is not part of the filter.
#[derive(Debug)]
pub struct VectorTileOverlay {
    tile_base_url: String,
    countries: bool,
    filter: FilterController,
    registered: bool,
    ready: watch::Sender<bool>,
}

impl VectorTileOverlay {
    #[must_use]
    pub fn new(tile_base_url: impl Into<String>) -> Self {
        Self {
            tile_base_url: tile_base_url.into(),
            countries: false,
            filter: FilterController::default(),
            registered: false,
            ready: watch::Sender::new(false),
        }
    }

    /// Also show the country base layer, with a name popup on click.
    #[must_use]
    pub fn with_countries(mut self) -> Self {
        self.countries = true;
        self
    }

    #[must_use]
    pub fn selected(&self) -> Category {
        self.filter.selected()
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Resolves once every category layer has been registered.
    ///
    /// Resolves to `false` if the overlay is dropped first.
    pub fn ready(&self) -> impl Future<Output = bool> + 'static {
        let mut rx = self.ready.subscribe();
        async move { rx.wait_for(|registered| *registered).await.is_ok() }
    }

    /// Register all sources and layers hidden, then show the selected one.
    ///
    /// Calling this again, e.g. after a style reload, keeps existing layers.
    pub fn on_style_load(&mut self, canvas: &MapCanvas) -> MapResult<()> {
        if self.countries {
            canvas.add_source(COUNTRIES_SOURCE_ID, countries_source(&self.tile_base_url))?;
            canvas.add_layer(countries_layer())?;
        }
        for descriptor in &CATEGORIES {
            let category = descriptor.category;
            canvas.add_source(&category.source_id(), descriptor.source(&self.tile_base_url))?;
            canvas.add_layer(descriptor.layer())?;
        }
        if !self.registered {
            info!(
                "Registered {} event layers from {}",
                CATEGORIES.len(),
                self.tile_base_url
            );
        }
        self.registered = true;
        self.apply_selection(canvas)?;
        self.ready.send_replace(true);
        Ok(())
    }

    /// Make `category` the only visible layer. Returns `true` if the selection changed.
    ///
    /// Before registration the selection is only stored.
    pub fn select(&mut self, canvas: &MapCanvas, category: Category) -> MapResult<bool> {
        let changed = self.filter.select(category);
        if self.registered {
            self.apply_selection(canvas)?;
        } else {
            debug!("Layers are not registered yet, deferring selection of {category}");
        }
        Ok(changed)
    }

    fn apply_selection(&self, canvas: &MapCanvas) -> MapResult<()> {
        let selected = self.filter.selected();
        for category in Category::ALL.into_iter().filter(|c| *c != selected) {
            canvas.set_visibility(&category.layer_id(), Visibility::Hidden)?;
        }
        canvas.set_visibility(&selected.layer_id(), Visibility::Visible)
    }

    /// React to a renderer event. Events for layers that are not ours are ignored.
    pub fn handle_event(&mut self, canvas: &MapCanvas, event: &MapEvent) -> MapResult<()> {
        match event {
            MapEvent::StyleLoad => self.on_style_load(canvas),
            MapEvent::Click {
                layer,
                lng_lat,
                properties,
            } if self.countries && layer == COUNTRIES_LAYER_ID => {
                canvas.show_popup(*lng_lat, &country_popup(properties))
            }
            MapEvent::Click {
                layer,
                lng_lat,
                properties,
            } => match Category::from_layer_id(layer) {
                Some(category) => {
                    let popup = EventPopup::from_properties(category, properties);
                    canvas.show_popup(*lng_lat, &popup.to_html())
                }
                None => Ok(()),
            },
            MapEvent::MouseEnter { layer } if Category::from_layer_id(layer).is_some() => {
                canvas.set_cursor("pointer")
            }
            MapEvent::MouseLeave { layer } if Category::from_layer_id(layer).is_some() => {
                canvas.set_cursor("")
            }
            MapEvent::MouseEnter { .. } | MapEvent::MouseLeave { .. } => Ok(()),
            MapEvent::Error { message } => {
                warn!("Map error: {message}");
                Ok(())
            }
        }
    }

    /// Remove every layer and source this overlay registered.
    pub fn unmount(&mut self, canvas: &MapCanvas) -> MapResult<()> {
        for category in Category::ALL {
            canvas.remove_layer(&category.layer_id())?;
            canvas.remove_source(&category.source_id())?;
        }
        if self.countries {
            canvas.remove_layer(COUNTRIES_LAYER_ID)?;
            canvas.remove_source(COUNTRIES_SOURCE_ID)?;
        }
        self.registered = false;
        self.ready.send_replace(false);
        Ok(())
    }
}

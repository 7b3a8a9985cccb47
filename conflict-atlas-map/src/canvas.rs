use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::rc::{Rc, Weak};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tilejson::Bounds;

use crate::renderer::{LayerSpec, LngLat, MapRenderer, SourceSpec, Viewport, Visibility};
use crate::{MapError, MapResult};

/// Initial state of a new map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub center: LngLat,
    pub zoom: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        let Viewport { center, zoom } = Viewport::default();
        Self { center, zoom }
    }
}

struct CanvasInner {
    container_id: String,
    renderer: Box<dyn MapRenderer>,
    sources: Vec<String>,
    layers: Vec<String>,
}

/// The owned handle to one map. Clones share the same renderer.
///
/// After [`teardown`](Self::teardown) every operation through any clone returns
/// [`MapError::TornDown`] without touching the renderer.
#[derive(Clone)]
pub struct MapCanvas {
    inner: Rc<RefCell<Option<CanvasInner>>>,
}

/// Non-owning handle for completions that may outlive the map.
#[derive(Clone, Debug)]
pub struct WeakCanvas {
    inner: Weak<RefCell<Option<CanvasInner>>>,
}

impl WeakCanvas {
    /// Returns `None` once the canvas was torn down or dropped.
    #[must_use]
    pub fn upgrade(&self) -> Option<MapCanvas> {
        let inner = self.inner.upgrade()?;
        if inner.borrow().is_none() {
            return None;
        }
        Some(MapCanvas { inner })
    }
}

impl Debug for MapCanvas {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &*self.inner.borrow() {
            Some(inner) => f
                .debug_struct("MapCanvas")
                .field("container_id", &inner.container_id)
                .field("sources", &inner.sources)
                .field("layers", &inner.layers)
                .finish(),
            None => f.write_str("MapCanvas(torn down)"),
        }
    }
}

impl MapCanvas {
    /// Bind `renderer` to the element `container_id` at the initial viewport.
    pub fn create(
        container_id: &str,
        options: &MapOptions,
        mut renderer: Box<dyn MapRenderer>,
    ) -> MapResult<Self> {
        if container_id.trim().is_empty() {
            return Err(MapError::MissingContainer);
        }
        renderer.attach(
            container_id,
            Viewport {
                center: options.center,
                zoom: options.zoom,
            },
        );
        info!("Created map in #{container_id}");
        Ok(Self {
            inner: Rc::new(RefCell::new(Some(CanvasInner {
                container_id: container_id.to_string(),
                renderer,
                sources: Vec::new(),
                layers: Vec::new(),
            }))),
        })
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakCanvas {
        WeakCanvas {
            inner: Rc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.inner.borrow().is_none()
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut CanvasInner) -> T) -> MapResult<T> {
        let mut inner = self.inner.borrow_mut();
        let inner = inner.as_mut().ok_or(MapError::TornDown)?;
        Ok(f(inner))
    }

    pub fn container_id(&self) -> MapResult<String> {
        self.with_inner(|inner| inner.container_id.clone())
    }

    pub fn viewport(&self) -> MapResult<Viewport> {
        self.with_inner(|inner| inner.renderer.viewport())
    }

    pub fn jump_to(&self, viewport: Viewport) -> MapResult<()> {
        self.with_inner(|inner| inner.renderer.jump_to(viewport))
    }

    pub fn fly_to(&self, viewport: Viewport) -> MapResult<()> {
        self.with_inner(|inner| inner.renderer.fly_to(viewport))
    }

    pub fn fit_bounds(&self, bounds: Bounds, padding: u32) -> MapResult<()> {
        self.with_inner(|inner| inner.renderer.fit_bounds(bounds, padding))
    }

    /// Add a source unless one with the same id already exists.
    pub fn add_source(&self, id: &str, source: SourceSpec) -> MapResult<()> {
        self.with_inner(|inner| {
            if inner.renderer.has_source(id) {
                debug!("Source {id} already exists, keeping it");
                return;
            }
            inner.renderer.add_source(id, source);
            inner.sources.push(id.to_string());
        })
    }

    pub fn remove_source(&self, id: &str) -> MapResult<()> {
        self.with_inner(|inner| {
            inner.renderer.remove_source(id);
            inner.sources.retain(|s| s != id);
        })
    }

    pub fn has_layer(&self, id: &str) -> MapResult<bool> {
        self.with_inner(|inner| inner.renderer.has_layer(id))
    }

    /// Add a layer unless one with the same id already exists.
    pub fn add_layer(&self, layer: LayerSpec) -> MapResult<()> {
        self.with_inner(|inner| {
            if inner.renderer.has_layer(&layer.id) {
                debug!("Layer {} already exists, keeping it", layer.id);
                return;
            }
            inner.layers.push(layer.id.clone());
            inner.renderer.add_layer(layer);
        })
    }

    pub fn remove_layer(&self, id: &str) -> MapResult<()> {
        self.with_inner(|inner| {
            inner.renderer.remove_layer(id);
            inner.layers.retain(|l| l != id);
        })
    }

    /// Change the visibility of a layer. Unknown layers are ignored.
    pub fn set_visibility(&self, layer: &str, visibility: Visibility) -> MapResult<()> {
        self.with_inner(|inner| {
            if inner.renderer.has_layer(layer) {
                inner.renderer.set_visibility(layer, visibility);
            } else {
                debug!("Layer {layer} does not exist yet, not setting visibility={visibility}");
            }
        })
    }

    pub fn show_popup(&self, at: LngLat, html: &str) -> MapResult<()> {
        self.with_inner(|inner| inner.renderer.show_popup(at, html))
    }

    pub fn set_cursor(&self, cursor: &str) -> MapResult<()> {
        self.with_inner(|inner| inner.renderer.set_cursor(cursor))
    }

    pub fn set_placeholder(&self, text: Option<&str>) -> MapResult<()> {
        self.with_inner(|inner| inner.renderer.set_placeholder(text))
    }

    /// Remove every layer and source this canvas added and release the renderer.
    ///
    /// Calling it again does nothing.
    pub fn teardown(&self) {
        let Some(mut inner) = self.inner.borrow_mut().take() else {
            return;
        };
        for layer in inner.layers.iter().rev() {
            inner.renderer.remove_layer(layer);
        }
        for source in inner.sources.iter().rev() {
            inner.renderer.remove_source(source);
        }
        inner.renderer.remove();
        info!("Removed map from #{}", inner.container_id);
    }
}

use std::fmt::Debug;

use async_trait::async_trait;
use conflict_atlas_core::polygons::collection_bounds;
use geojson::FeatureCollection;
use log::{debug, error, info};
use reqwest::Client;
use serde_json::json;
use url::Url;

use crate::canvas::MapCanvas;
use crate::popup::name_popup;
use crate::renderer::{LayerKind, LayerSpec, MapEvent, SourceSpec, Visibility};
use crate::{MapError, MapResult};

pub const SOURCE_ID: &str = "world-polygons";
pub const LAYER_ID: &str = "world-polygons-layer";
pub const LOADING_TEXT: &str = "Loading polygons...";
/// Padding in pixels around the data when fitting the viewport.
pub const FIT_PADDING: u32 = 20;

/// Path of the polygon endpoint below the API base URL.
pub const POLYGONS_PATH: &str = "api/world-polygons";

/// Where the world polygons come from.
#[async_trait]
pub trait PolygonFetcher: Send + Sync + Debug {
    async fn fetch(&self) -> MapResult<FeatureCollection>;
}

/// Fetches `{api_base}/api/world-polygons` over HTTP.
#[derive(Clone, Debug)]
pub struct HttpPolygonFetcher {
    client: Client,
    url: Url,
}

impl HttpPolygonFetcher {
    pub fn new(client: Client, api_base: &str) -> MapResult<Self> {
        let url = format!("{}/{POLYGONS_PATH}", api_base.trim_end_matches('/'));
        let url = Url::parse(&url).map_err(|e| MapError::InvalidApiUrl(e, api_base.to_string()))?;
        Ok(Self { client, url })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl PolygonFetcher for HttpPolygonFetcher {
    async fn fetch(&self) -> MapResult<FeatureCollection> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| MapError::FetchError(e, self.url.clone()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(MapError::BadStatus(status, self.url.clone()));
        }
        response
            .json()
            .await
            .map_err(|e| MapError::FetchError(e, self.url.clone()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverlayState {
    /// Not mounted yet
    #[default]
    Idle,
    Loading,
    Loaded,
    /// The fetch failed, the placeholder stays visible
    Failed,
    Removed,
}

/// Fill layer for the world polygons.
///
/// Fill outlines are always drawn one pixel wide.
#[must_use]
pub fn polygon_layer() -> LayerSpec {
    LayerSpec {
        id: LAYER_ID.to_string(),
        kind: LayerKind::Fill,
        source: SOURCE_ID.to_string(),
        source_layer: None,
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

/// World polygons drawn from a single fetch of the API.
#[derive(Debug, Default)]
pub struct GeoJsonOverlay {
    state: OverlayState,
}

impl GeoJsonOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> OverlayState {
        self.state
    }

    /// Show the loading text, fetch once, and draw the result.
    ///
    /// If the canvas is torn down while the fetch is pending, the result is dropped
    /// and nothing is drawn.
    pub async fn mount(
        &mut self,
        canvas: &MapCanvas,
        fetcher: &dyn PolygonFetcher,
    ) -> MapResult<OverlayState> {
        canvas.set_placeholder(Some(LOADING_TEXT))?;
        self.state = OverlayState::Loading;
        let weak = canvas.downgrade();

        let result = fetcher.fetch().await;

        let Some(canvas) = weak.upgrade() else {
            debug!("Map was removed while polygons were loading, discarding them");
            self.state = OverlayState::Removed;
            return Ok(self.state);
        };
        match result {
            Ok(collection) => {
                self.show(&canvas, collection)?;
                self.state = OverlayState::Loaded;
            }
            Err(e) => {
                error!("Error fetching GeoJSON: {e}");
                self.state = OverlayState::Failed;
            }
        }
        Ok(self.state)
    }

    fn show(&self, canvas: &MapCanvas, collection: FeatureCollection) -> MapResult<()> {
        let count = collection.features.len();
        let bounds = collection_bounds(&collection);
        canvas.add_source(SOURCE_ID, SourceSpec::Geojson { data: collection })?;
        canvas.add_layer(polygon_layer())?;
        canvas.set_placeholder(None)?;
        if count > 0
            && let Some(bounds) = bounds
        {
            canvas.fit_bounds(bounds, FIT_PADDING)?;
        }
        info!("Showing {count} world polygons");
        Ok(())
    }

    /// Open a popup with the polygon name when a named polygon is clicked.
    pub fn handle_event(&self, canvas: &MapCanvas, event: &MapEvent) -> MapResult<()> {
        if self.state != OverlayState::Loaded {
            return Ok(());
        }
        if let MapEvent::Click {
            layer,
            lng_lat,
            properties,
        } = event
            && layer == LAYER_ID
            && let Some(html) = name_popup(properties)
        {
            canvas.show_popup(*lng_lat, &html)?;
        }
        Ok(())
    }

    /// Remove the layer and source. A torn down canvas has nothing left to remove.
    pub fn unmount(&mut self, canvas: &MapCanvas) -> MapResult<()> {
        if !canvas.is_torn_down() {
            canvas.remove_layer(LAYER_ID)?;
            canvas.remove_source(SOURCE_ID)?;
        }
        self.state = OverlayState::Removed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use geojson::{Feature, Geometry, JsonObject, Value};
    use reqwest::StatusCode;
    use serde_json::json;
    use tilejson::Bounds;
    use tokio::sync::Notify;

    use super::*;
    use crate::canvas::MapOptions;
    use crate::renderer::LngLat;
    use crate::renderer::tests::RecordingRenderer;

    fn country(name: Option<&str>, ring: Vec<Vec<f64>>) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("id".to_string(), json!(1));
        properties.insert("name".to_string(), json!(name));
        Feature {
            geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
            properties: Some(properties),
            ..Feature::default()
        }
    }

    fn world() -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: vec![
                country(
                    Some("Testland"),
                    vec![vec![0.0, 0.0], vec![10.0, 0.0], vec![10.0, 5.0], vec![0.0, 0.0]],
                ),
                country(
                    None,
                    vec![vec![-20.0, -8.0], vec![-15.0, -8.0], vec![-15.0, -2.0], vec![-20.0, -8.0]],
                ),
            ],
            foreign_members: None,
        }
    }

    #[derive(Debug)]
    struct StaticFetcher(Option<FeatureCollection>);

    #[async_trait]
    impl PolygonFetcher for StaticFetcher {
        async fn fetch(&self) -> MapResult<FeatureCollection> {
            self.0.clone().ok_or_else(|| {
                MapError::BadStatus(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Url::parse("http://localhost:4000/api/world-polygons").unwrap(),
                )
            })
        }
    }

    /// Returns its data only after `release` is notified.
    #[derive(Debug, Default)]
    struct GatedFetcher {
        release: Notify,
    }

    #[async_trait]
    impl PolygonFetcher for GatedFetcher {
        async fn fetch(&self) -> MapResult<FeatureCollection> {
            self.release.notified().await;
            Ok(world())
        }
    }

    #[tokio::test]
    async fn loads_styles_and_fits() {
        let (renderer, state) = RecordingRenderer::shared();
        let canvas = MapCanvas::create("map", &MapOptions::default(), renderer).unwrap();
        let mut overlay = GeoJsonOverlay::new();

        let result = overlay
            .mount(&canvas, &StaticFetcher(Some(world())))
            .await
            .unwrap();
        assert_eq!(result, OverlayState::Loaded);

        let state = state.borrow();
        assert_eq!(state.placeholder, None);
        assert!(matches!(
            state.sources.get(SOURCE_ID),
            Some(SourceSpec::Geojson { data }) if data.features.len() == 2
        ));
        assert_eq!(state.layers, vec![polygon_layer()]);
        assert_eq!(
            state.fitted,
            vec![(Bounds::new(-20.0, -8.0, 10.0, 5.0), FIT_PADDING)]
        );
    }

    #[tokio::test]
    async fn empty_collection_does_not_move_viewport() {
        let (renderer, state) = RecordingRenderer::shared();
        let canvas = MapCanvas::create("map", &MapOptions::default(), renderer).unwrap();
        let empty = FeatureCollection {
            bbox: None,
            features: vec![],
            foreign_members: None,
        };
        let mut overlay = GeoJsonOverlay::new();
        overlay.mount(&canvas, &StaticFetcher(Some(empty))).await.unwrap();
        assert_eq!(overlay.state(), OverlayState::Loaded);
        assert!(state.borrow().fitted.is_empty());
    }

    #[tokio::test]
    async fn failure_keeps_placeholder() {
        let (renderer, state) = RecordingRenderer::shared();
        let canvas = MapCanvas::create("map", &MapOptions::default(), renderer).unwrap();
        let mut overlay = GeoJsonOverlay::new();
        let result = overlay.mount(&canvas, &StaticFetcher(None)).await.unwrap();
        assert_eq!(result, OverlayState::Failed);

        let state = state.borrow();
        assert_eq!(state.placeholder.as_deref(), Some(LOADING_TEXT));
        assert!(state.layers.is_empty());
        assert!(state.sources.is_empty());
    }

    #[tokio::test]
    async fn teardown_while_loading_draws_nothing() {
        let (renderer, state) = RecordingRenderer::shared();
        let canvas = MapCanvas::create("map", &MapOptions::default(), renderer).unwrap();
        let fetcher = GatedFetcher::default();
        let mut overlay = GeoJsonOverlay::new();

        let (result, ()) = tokio::join!(overlay.mount(&canvas, &fetcher), async {
            canvas.teardown();
            fetcher.release.notify_one();
        });
        assert_eq!(result.unwrap(), OverlayState::Removed);

        let state = state.borrow();
        assert!(state.removed);
        assert_eq!(state.layer_additions, 0);
        assert!(state.sources.is_empty());
        assert!(state.fitted.is_empty());
    }

    #[tokio::test]
    async fn popups_show_names() {
        let (renderer, state) = RecordingRenderer::shared();
        let canvas = MapCanvas::create("map", &MapOptions::default(), renderer).unwrap();
        let mut overlay = GeoJsonOverlay::new();
        overlay
            .mount(&canvas, &StaticFetcher(Some(world())))
            .await
            .unwrap();

        let click = |feature: &Feature| MapEvent::Click {
            layer: LAYER_ID.to_string(),
            lng_lat: LngLat::new(1.0, 1.0),
            properties: feature.properties.clone().unwrap(),
        };
        let data = world();
        overlay.handle_event(&canvas, &click(&data.features[0])).unwrap();
        overlay.handle_event(&canvas, &click(&data.features[1])).unwrap();
        assert_eq!(
            state.borrow().popups,
            vec![(LngLat::new(1.0, 1.0), "<b>Testland</b>".to_string())]
        );

        overlay.unmount(&canvas).unwrap();
        assert_eq!(overlay.state(), OverlayState::Removed);
        assert!(state.borrow().layers.is_empty());
        assert!(state.borrow().sources.is_empty());
    }

    #[test]
    fn fetcher_url() {
        let fetcher = HttpPolygonFetcher::new(Client::new(), "http://localhost:4000/").unwrap();
        assert_eq!(
            fetcher.url().as_str(),
            "http://localhost:4000/api/world-polygons"
        );
        let fetcher = HttpPolygonFetcher::new(Client::new(), "https://atlas.example.org/v1").unwrap();
        assert_eq!(
            fetcher.url().as_str(),
            "https://atlas.example.org/v1/api/world-polygons"
        );
        assert!(matches!(
            HttpPolygonFetcher::new(Client::new(), "not a url"),
            Err(MapError::InvalidApiUrl(..))
        ));
    }
}

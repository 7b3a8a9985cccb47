use actix_web::dev::ServerHandle;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use conflict_atlas::srv::router;
use conflict_atlas_core::polygons::collection_bounds;
use conflict_atlas_map::MapError;
use conflict_atlas_map::geojson_overlay::{HttpPolygonFetcher, PolygonFetcher as _};
use reqwest::StatusCode;

pub mod utils;
pub use utils::*;

/// Serve `polygons` on a random local port, returning the base URL and a handle to stop it.
fn serve(polygons: MockPolygons) -> (String, ServerHandle) {
    let state = mock_state(&mock_cfg(""), polygons);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(Data::from(state.polygons.clone()))
            .app_data(Data::new(state.map.clone()))
            .configure(router)
    })
    .workers(1)
    .bind("127.0.0.1:0")
    .unwrap();
    let base = format!("http://{}", server.addrs()[0]);
    let server = server.run();
    let handle = server.handle();
    actix_rt::spawn(server);
    (base, handle)
}

#[actix_rt::test]
async fn map_client_fetches_polygons() {
    let (base, handle) = serve(MockPolygons::countries());

    let fetcher = HttpPolygonFetcher::new(reqwest::Client::new(), &format!("{base}/")).unwrap();
    assert_eq!(fetcher.url().as_str(), format!("{base}/api/world-polygons"));

    let collection = fetcher.fetch().await.unwrap();
    assert_eq!(collection.features.len(), 2);
    let bounds = collection_bounds(&collection).unwrap();
    assert_eq!(bounds.to_string(), "0,0,11,1");

    handle.stop(false).await;
}

#[actix_rt::test]
async fn map_client_reports_server_errors() {
    let (base, handle) = serve(MockPolygons::failing("connection refused"));

    let fetcher = HttpPolygonFetcher::new(reqwest::Client::new(), &base).unwrap();
    let err = fetcher.fetch().await.unwrap_err();
    match err {
        MapError::BadStatus(status, url) => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(url.path(), "/api/world-polygons");
        }
        other => panic!("unexpected error {other:?}"),
    }

    handle.stop(false).await;
}

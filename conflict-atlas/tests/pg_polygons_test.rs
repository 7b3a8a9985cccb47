#![cfg(feature = "test-pg")]

use std::ffi::OsString;
use std::path::Path;

use actix_web::test::{TestRequest, call_service, init_service, read_body_json};
use actix_web::App;
use actix_web::web::Data;
use conflict_atlas::config::file::parse_config;
use conflict_atlas::srv::router;
use conflict_atlas_core::env::FauxEnv;
use conflict_atlas_core::postgres::{PgSslCerts, PostgresPool};
use indoc::{formatdoc, indoc};
use serde_json::{Value, json};
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::ImageExt as _;
use testcontainers_modules::testcontainers::runners::AsyncRunner as _;

pub mod utils;
pub use utils::*;

const SCHEMA: &str = indoc! {"
    CREATE SCHEMA atlas;
    CREATE TABLE atlas.countries (
        fid serial PRIMARY KEY,
        admin text,
        wkb_geometry geometry(MultiPolygon, 4326)
    );
    INSERT INTO atlas.countries (fid, admin, wkb_geometry) VALUES
        (4, 'Westland', ST_Multi(ST_GeomFromText('POLYGON((-30 5, -25 5, -25 10, -30 5))', 4326))),
        (3, 'Eastland', ST_Multi(ST_GeomFromText('POLYGON((30 -5, 35 -5, 35 0, 30 -5))', 4326)));
"};

#[actix_rt::test]
#[tracing_test::traced_test]
async fn serves_polygons_from_postgis() {
    let node = Postgres::default()
        .with_name("postgis/postgis")
        .with_tag("15-3.4")
        .start()
        .await
        .expect("container launched");
    let host = node.get_host().await.unwrap();
    let port = node.get_host_port_ipv4(5432).await.unwrap();

    let url = format!("postgres://postgres:postgres@{host}:{port}/postgres?sslmode=disable");
    let pool = PostgresPool::new(&url, &PgSslCerts::default(), 1).await.unwrap();
    pool.get().await.unwrap().batch_execute(SCHEMA).await.unwrap();
    drop(pool);

    let env = FauxEnv([("DATABASE_URL", OsString::from(url))].into_iter().collect());
    let yaml = formatdoc! {"
        postgres:
          connection_string: ${{DATABASE_URL}}
          pool_size: 2
          polygons:
            schema: atlas
            table: countries
            id_column: fid
            name_column: admin
            geometry_column: wkb_geometry
    "};
    let mut cfg = parse_config(&yaml, &env, Path::new("<test>")).unwrap();
    assert!(cfg.finalize().unwrap().is_empty());

    let state = cfg.resolve().await.unwrap();

    let app = init_service(
        App::new()
            .app_data(Data::from(state.polygons))
            .app_data(Data::new(state.map))
            .configure(router),
    )
    .await;

    let req = TestRequest::get().uri("/api/world-polygons").to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let body: Value = read_body_json(response).await;
    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0]["properties"], json!({"id": 3, "name": "Eastland"}));
    assert_eq!(features[1]["properties"], json!({"id": 4, "name": "Westland"}));
    assert_eq!(features[0]["geometry"]["type"], "MultiPolygon");
}

use async_trait::async_trait;
use geojson::{FeatureCollection, JsonValue};
use tracing::debug;

use crate::CoreResult;
use crate::polygons::{GeometryProvider, PolygonQuery, PolygonRow, features_from_rows};
use crate::postgres::PostgresError::{InvalidIdentifier, PostgresError};
use crate::postgres::{PostgresPool, PostgresResult};

/// Quote an identifier for use in SQL, rejecting anything that could not be a column or table name.
fn escape_identifier(ident: &str) -> PostgresResult<String> {
    if ident.is_empty() || ident.contains('\0') {
        return Err(InvalidIdentifier(ident.to_string()));
    }
    Ok(format!(r#""{}""#, ident.replace('"', r#""""#)))
}

impl PolygonQuery {
    /// Render the projection as SQL with all identifiers quoted, ordered by the id column.
    pub fn to_sql(&self) -> PostgresResult<String> {
        Ok(format!(
            r"SELECT {id}::int8 AS id, {name}::text AS name, ST_AsGeoJSON({geom})::json AS geometry FROM {schema}.{table} ORDER BY {id}",
            id = escape_identifier(&self.id_column)?,
            name = escape_identifier(&self.name_column)?,
            geom = escape_identifier(&self.geometry_column)?,
            schema = escape_identifier(&self.schema)?,
            table = escape_identifier(&self.table)?,
        ))
    }
}

/// World polygons read from a `PostGIS` table.
#[derive(Clone, Debug)]
pub struct PostgisPolygons {
    id: String,
    pool: PostgresPool,
    sql: String,
}

impl PostgisPolygons {
    /// Bind a query to a pool. Fails if the configured identifiers cannot be quoted.
    pub fn new(pool: PostgresPool, query: &PolygonQuery) -> PostgresResult<Self> {
        let sql = query.to_sql()?;
        let id = format!("{}.{}.{}", pool.get_id(), query.schema, query.table);
        Ok(Self { id, pool, sql })
    }
}

#[async_trait]
impl GeometryProvider for PostgisPolygons {
    fn get_id(&self) -> &str {
        &self.id
    }

    async fn get_polygons(&self) -> CoreResult<FeatureCollection> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query(&self.sql, &[])
            .await
            .map_err(|e| PostgresError(e, "querying world polygons"))?;
        debug!("Loaded {} polygons from {}", rows.len(), self.id);

        let rows = rows.into_iter().map(|row| PolygonRow {
            id: row.get("id"),
            name: row.get("name"),
            geometry: row.get::<_, Option<JsonValue>>("geometry"),
        });
        features_from_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_sql() {
        assert_eq!(
            PolygonQuery::default().to_sql().unwrap(),
            r#"SELECT "gid"::int8 AS id, "name"::text AS name, ST_AsGeoJSON("geom")::json AS geometry FROM "public"."ne_10m_admin_0_countries" ORDER BY "gid""#
        );
    }

    #[test]
    fn identifiers_are_quoted() {
        let query = PolygonQuery {
            table: r#"odd"table"#.to_string(),
            ..PolygonQuery::default()
        };
        assert!(query.to_sql().unwrap().contains(r#"FROM "public"."odd""table" ORDER BY"#));

        let query = PolygonQuery {
            name_column: String::new(),
            ..PolygonQuery::default()
        };
        assert!(matches!(query.to_sql(), Err(InvalidIdentifier(_))));
    }
}

#[cfg(all(test, feature = "test-pg"))]
mod pg_tests {
    use serde_json::json;
    use testcontainers_modules::postgres::Postgres;
    use testcontainers_modules::testcontainers::ImageExt as _;
    use testcontainers_modules::testcontainers::runners::AsyncRunner as _;

    use super::*;
    use crate::postgres::PgSslCerts;

    #[tokio::test]
    async fn polygons_from_postgis() {
        let node = Postgres::default()
            .with_name("postgis/postgis")
            .with_tag("15-3.4")
            .start()
            .await
            .expect("container launched");
        let conn_str = format!(
            "postgres://postgres:postgres@{}:{}/postgres?sslmode=disable",
            node.get_host().await.unwrap(),
            node.get_host_port_ipv4(5432).await.unwrap()
        );
        let pool = PostgresPool::new(&conn_str, &PgSslCerts::default(), 2)
            .await
            .unwrap();
        pool.get()
            .await
            .unwrap()
            .batch_execute(
                "CREATE TABLE ne_10m_admin_0_countries (gid serial PRIMARY KEY, name text, geom geometry(Polygon, 4326));
                 INSERT INTO ne_10m_admin_0_countries (gid, name, geom) VALUES
                   (8, NULL, NULL),
                   (7, 'Testland', ST_GeomFromText('POLYGON((0 0, 1 0, 1 1, 0 0))', 4326));",
            )
            .await
            .unwrap();

        let provider = PostgisPolygons::new(pool, &PolygonQuery::default()).unwrap();
        let fc = provider.get_polygons().await.unwrap();
        assert_eq!(fc.features.len(), 2);
        assert_eq!(
            serde_json::to_value(&fc.features[0]).unwrap(),
            json!({
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]},
                "properties": {"id": 7, "name": "Testland"}
            })
        );
        assert_eq!(
            fc.features[1].properties.as_ref().unwrap()["name"],
            JsonValue::Null
        );
    }
}

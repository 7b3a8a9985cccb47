use geojson::{FeatureCollection, Value};
use tilejson::Bounds;

fn update_bounds(bounds: &mut Bounds, position: &[f64]) {
    if let [x, y, ..] = position {
        bounds.left = f64::min(bounds.left, *x);
        bounds.right = f64::max(bounds.right, *x);
        bounds.bottom = f64::min(bounds.bottom, *y);
        bounds.top = f64::max(bounds.top, *y);
    }
}

fn extend_bounds(bounds: &mut Bounds, value: &Value) {
    match value {
        Value::Point(point) => update_bounds(bounds, point),
        Value::MultiPoint(points) | Value::LineString(points) => {
            for point in points {
                update_bounds(bounds, point);
            }
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            for point in lines.iter().flatten() {
                update_bounds(bounds, point);
            }
        }
        Value::MultiPolygon(polygons) => {
            for point in polygons.iter().flatten().flatten() {
                update_bounds(bounds, point);
            }
        }
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                extend_bounds(bounds, &geometry.value);
            }
        }
    }
}

fn empty_bounds() -> Bounds {
    Bounds::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN)
}

fn non_empty(bounds: Bounds) -> Option<Bounds> {
    (bounds.left <= bounds.right && bounds.bottom <= bounds.top).then_some(bounds)
}

/// Bounding box of a single geometry, `None` if it has no positions.
#[must_use]
pub fn geometry_bounds(value: &Value) -> Option<Bounds> {
    let mut bounds = empty_bounds();
    extend_bounds(&mut bounds, value);
    non_empty(bounds)
}

/// Bounding box of every geometry in the collection, `None` if there is nothing to frame.
#[must_use]
pub fn collection_bounds(collection: &FeatureCollection) -> Option<Bounds> {
    let mut bounds = empty_bounds();
    for geometry in collection.features.iter().filter_map(|f| f.geometry.as_ref()) {
        extend_bounds(&mut bounds, &geometry.value);
    }
    non_empty(bounds)
}

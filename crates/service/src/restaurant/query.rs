//! Translation of caller-supplied search filters into store filters.

use configs::CatalogConfig;
use serde_json::{json, Map, Value};

use models::DocumentId;

use crate::errors::RestaurantError;
use crate::validation::Validator;

/// Build the store filter for a free-form restaurant search.
///
/// - `_id` is resolved to a document id (`UnknownRestaurantId` if malformed)
/// - `location` is revalidated as a point and becomes a `$nearSphere` clause
///   bounded by `maxDistance` (metres) or the configured default
/// - `maxDistance` never reaches the store
/// - everything else passes through untouched
pub fn build_filter(raw: &str, catalog: &CatalogConfig) -> Result<Value, RestaurantError> {
    let parsed: Value = serde_json::from_str(raw).map_err(|_| RestaurantError::UnparsableJson)?;
    let Value::Object(mut filter) = parsed else {
        return Err(RestaurantError::wrong_type("filter"));
    };

    if let Some(raw_id) = filter.get("_id") {
        let id = raw_id
            .as_str()
            .and_then(DocumentId::parse)
            .ok_or(RestaurantError::UnknownRestaurantId)?;
        filter.insert("_id".into(), id.into());
    }

    let max_distance = filter.remove("maxDistance");
    if filter.contains_key("location") {
        let point = Validator::new(catalog).location(&filter)?;
        let max = resolve_max_distance(max_distance.as_ref(), catalog.default_max_distance)?;
        filter.insert("location".into(), near_sphere(&point, max));
    }

    Ok(Value::Object(filter))
}

fn resolve_max_distance(raw: Option<&Value>, default: f64) -> Result<f64, RestaurantError> {
    match raw {
        None | Some(Value::Null) => Ok(default),
        Some(v) => match v.as_f64() {
            Some(d) if d == 0.0 => Ok(default),
            Some(d) if d > 0.0 => Ok(d),
            _ => Err(RestaurantError::wrong_type("maxDistance")),
        },
    }
}

fn near_sphere(point: &models::restaurant::Location, max_distance: f64) -> Value {
    json!({
        "$nearSphere": {
            "$geometry": point,
            "$minDistance": 0,
            "$maxDistance": max_distance,
        }
    })
}

/// Filter selecting a single document by id.
pub fn by_id(id: DocumentId) -> Value {
    let mut m = Map::new();
    m.insert("_id".into(), id.into());
    Value::Object(m)
}

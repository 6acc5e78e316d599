//! Evaluation of document-store filters against JSON documents.
//!
//! Supported: dotted field paths, literal equality (arrays match when they
//! contain the value), `$eq $ne $gt $gte $lt $lte $in $nin $exists`,
//! top-level `$and`/`$or`, and `$nearSphere` over GeoJSON points with
//! distances in metres.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::StoreError;

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Resolve a dotted path (`location.coordinates`) inside a document.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |cur, segment| match cur {
        Value::Object(m) => m.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn as_object<'a>(filter: &'a Value) -> Result<&'a Map<String, Value>, StoreError> {
    filter
        .as_object()
        .ok_or_else(|| StoreError::InvalidFilter("filter must be a JSON object".into()))
}

/// Whether `doc` satisfies every clause of `filter`.
pub fn matches(doc: &Value, filter: &Value) -> Result<bool, StoreError> {
    for (key, cond) in as_object(filter)? {
        let ok = match key.as_str() {
            "$and" => all_of(doc, cond)?,
            "$or" => any_of(doc, cond)?,
            k if k.starts_with('$') => {
                return Err(StoreError::InvalidFilter(format!("unsupported top-level operator {k}")))
            }
            path => field_matches(lookup(doc, path), cond)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses(cond: &Value) -> Result<&Vec<Value>, StoreError> {
    cond.as_array()
        .ok_or_else(|| StoreError::InvalidFilter("$and/$or expect an array of filters".into()))
}

fn all_of(doc: &Value, cond: &Value) -> Result<bool, StoreError> {
    for f in clauses(cond)? {
        if !matches(doc, f)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_of(doc: &Value, cond: &Value) -> Result<bool, StoreError> {
    for f in clauses(cond)? {
        if matches(doc, f)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn is_operator_object(cond: &Value) -> bool {
    match cond {
        Value::Object(m) => !m.is_empty() && m.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn field_matches(field: Option<&Value>, cond: &Value) -> Result<bool, StoreError> {
    if !is_operator_object(cond) {
        return Ok(equals_or_contains(field, cond));
    }
    let ops = as_object(cond)?;
    for (op, arg) in ops {
        let ok = match op.as_str() {
            "$eq" => equals_or_contains(field, arg),
            "$ne" => !equals_or_contains(field, arg),
            "$gt" => compare(field, arg).map_or(false, |o| o == Ordering::Greater),
            "$gte" => compare(field, arg).map_or(false, |o| o != Ordering::Less),
            "$lt" => compare(field, arg).map_or(false, |o| o == Ordering::Less),
            "$lte" => compare(field, arg).map_or(false, |o| o != Ordering::Greater),
            "$in" => in_list(field, arg)?,
            "$nin" => !in_list(field, arg)?,
            "$exists" => field.is_some() == arg.as_bool().unwrap_or(true),
            "$nearSphere" => {
                let near = NearSphere::parse(arg)?;
                field.and_then(point_of).map_or(false, |p| near.contains(p))
            }
            other => return Err(StoreError::InvalidFilter(format!("unsupported operator {other}"))),
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn in_list(field: Option<&Value>, arg: &Value) -> Result<bool, StoreError> {
    let list = arg
        .as_array()
        .ok_or_else(|| StoreError::InvalidFilter("$in/$nin expect an array".into()))?;
    Ok(list.iter().any(|v| equals_or_contains(field, v)))
}

/// JSON equality where numbers compare by value (`1 == 1.0`) and a missing field equals `null`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len() && xs.iter().all(|(k, x)| ys.get(k).map_or(false, |y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn equals_or_contains(field: Option<&Value>, cond: &Value) -> bool {
    match field {
        None => cond.is_null(),
        Some(v) if values_equal(v, cond) => true,
        Some(Value::Array(items)) if !cond.is_array() => items.iter().any(|i| values_equal(i, cond)),
        Some(_) => false,
    }
}

fn compare(field: Option<&Value>, arg: &Value) -> Option<Ordering> {
    match (field?, arg) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// `[longitude, latitude]` of a GeoJSON point value.
pub fn point_of(value: &Value) -> Option<[f64; 2]> {
    let coords = value.get("coordinates")?.as_array()?;
    match coords.as_slice() {
        [lon, lat] => Some([lon.as_f64()?, lat.as_f64()?]),
        _ => None,
    }
}

/// Great-circle distance in metres between two `[longitude, latitude]` points.
pub fn haversine_m(a: [f64; 2], b: [f64; 2]) -> f64 {
    let (lat1, lat2) = (a[1].to_radians(), b[1].to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b[0] - a[0]).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// A parsed `$nearSphere` clause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearSphere {
    pub center: [f64; 2],
    pub min_distance: f64,
    pub max_distance: f64,
}

impl NearSphere {
    pub fn parse(arg: &Value) -> Result<Self, StoreError> {
        let geometry = arg
            .get("$geometry")
            .ok_or_else(|| StoreError::InvalidFilter("$nearSphere requires $geometry".into()))?;
        let center = point_of(geometry)
            .ok_or_else(|| StoreError::InvalidFilter("$geometry must be a point".into()))?;
        let bound = |key: &str, default: f64| -> Result<f64, StoreError> {
            match arg.get(key) {
                None | Some(Value::Null) => Ok(default),
                Some(v) => v
                    .as_f64()
                    .filter(|d| *d >= 0.0)
                    .ok_or_else(|| StoreError::InvalidFilter(format!("{key} must be a non-negative number"))),
            }
        };
        Ok(Self { center, min_distance: bound("$minDistance", 0.0)?, max_distance: bound("$maxDistance", f64::INFINITY)? })
    }

    pub fn contains(&self, point: [f64; 2]) -> bool {
        let d = haversine_m(self.center, point);
        d >= self.min_distance && d <= self.max_distance
    }
}

/// The top-level `(field, $nearSphere)` clause of a filter, used to order results by distance.
pub fn near_clause(filter: &Value) -> Result<Option<(String, NearSphere)>, StoreError> {
    for (key, cond) in as_object(filter)? {
        if let Some(arg) = cond.as_object().and_then(|m| m.get("$nearSphere")) {
            return Ok(Some((key.clone(), NearSphere::parse(arg)?)));
        }
    }
    Ok(None)
}

/// Literal-equality fields of a filter; these seed the document an upsert inserts.
pub fn equality_fields(filter: &Value) -> Result<Map<String, Value>, StoreError> {
    Ok(as_object(filter)?
        .iter()
        .filter(|(k, v)| !k.starts_with('$') && !k.contains('.') && !is_operator_object(v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect())
}

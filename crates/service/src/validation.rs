//! Validation of untrusted restaurant payloads.
//!
//! Checks run in a fixed order (name, type, price, location, schedule,
//! contacts) and stop at the first violation; later fields are never looked at.

use configs::CatalogConfig;
use serde::Serialize;
use serde_json::{Map, Value};

use models::restaurant::{Contact, DailySchedule, Location, RestaurantProfile, Schedule, TimeOfDay};

use crate::errors::RestaurantError;

/// Fields `update` may overwrite, in validation order.
pub const EDITABLE_FIELDS: [&str; 6] = ["name", "type", "price", "location", "schedule", "contacts"];

/// Turns parsed JSON into typed restaurant fields using the configured catalog.
#[derive(Clone, Copy)]
pub struct Validator<'a> {
    catalog: &'a CatalogConfig,
}

fn field<'v>(obj: &'v Map<String, Value>, key: &str, path: &str) -> Result<&'v Value, RestaurantError> {
    obj.get(key).ok_or_else(|| RestaurantError::missing(path))
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Result<String, RestaurantError> {
    field(obj, key, key)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| RestaurantError::wrong_type(key))
}

/// JSON integer, accepting integral floats such as `9.0`.
///
/// Integers beyond the `i64` range saturate, so they still fail the range
/// checks rather than the type check.
fn as_integer(v: &Value) -> Option<i64> {
    if let Some(i) = v.as_i64() {
        return Some(i);
    }
    if v.as_u64().is_some() {
        return Some(i64::MAX);
    }
    // float-to-int `as` casts saturate at the i64 bounds
    v.as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0)
        .map(|f| f as i64)
}

fn to_value<T: Serialize>(v: &T) -> Result<Value, RestaurantError> {
    serde_json::to_value(v).map_err(|e| RestaurantError::DbError(e.to_string()))
}

impl<'a> Validator<'a> {
    pub fn new(catalog: &'a CatalogConfig) -> Self { Self { catalog } }

    /// Validate a complete restaurant payload.
    ///
    /// A payload that is not a JSON object has none of the required fields.
    pub fn restaurant(&self, payload: &Value) -> Result<RestaurantProfile, RestaurantError> {
        let empty = Map::new();
        let obj = payload.as_object().unwrap_or(&empty);
        Ok(RestaurantProfile {
            name: self.name(obj)?,
            kind: self.kind(obj)?,
            price: self.price(obj)?,
            location: self.location(obj)?,
            schedule: self.schedule(obj)?,
            contacts: self.contacts(obj)?,
        })
    }

    /// Validate the editable fields present in a partial payload and return them as a `$set` map.
    ///
    /// Keys outside [`EDITABLE_FIELDS`] are ignored; a payload without any editable key is incomplete.
    pub fn profile_update(&self, payload: &Value) -> Result<Map<String, Value>, RestaurantError> {
        let obj = payload.as_object().ok_or_else(|| RestaurantError::wrong_type("payload"))?;
        let mut fields = Map::new();
        for key in EDITABLE_FIELDS {
            if !obj.contains_key(key) {
                continue;
            }
            let value = match key {
                "name" => Value::String(self.name(obj)?),
                "type" => Value::String(self.kind(obj)?),
                "price" => Value::String(self.price(obj)?),
                "location" => to_value(&self.location(obj)?)?,
                "schedule" => to_value(&self.schedule(obj)?)?,
                _ => to_value(&self.contacts(obj)?)?,
            };
            fields.insert(key.to_string(), value);
        }
        if fields.is_empty() {
            return Err(RestaurantError::missing(EDITABLE_FIELDS.join("|")));
        }
        Ok(fields)
    }

    pub fn name(&self, obj: &Map<String, Value>) -> Result<String, RestaurantError> {
        string_field(obj, "name")
    }

    pub fn kind(&self, obj: &Map<String, Value>) -> Result<String, RestaurantError> {
        string_field(obj, "type")
    }

    pub fn price(&self, obj: &Map<String, Value>) -> Result<String, RestaurantError> {
        let price = string_field(obj, "price")?;
        if !self.catalog.is_known_price(&price) {
            return Err(RestaurantError::UnknownPrice);
        }
        Ok(price)
    }

    /// Validate `obj.location` as a point, keeping only `type` and the coordinate pair.
    pub fn location(&self, obj: &Map<String, Value>) -> Result<Location, RestaurantError> {
        let location = field(obj, "location", "location")?
            .as_object()
            .ok_or_else(|| RestaurantError::wrong_type("location"))?;
        let kind = field(location, "type", "location.type")?;
        let coordinates = field(location, "coordinates", "location.coordinates")?;

        if kind.as_str() != Some(self.catalog.point_type.as_str()) {
            return Err(RestaurantError::LocationTypeNotPoint);
        }
        let pair = coordinates
            .as_array()
            .ok_or_else(|| RestaurantError::wrong_type("location.coordinates"))?;
        if pair.len() != 2 {
            return Err(RestaurantError::CoordinatesOutOfBounds);
        }
        match (pair[0].as_f64(), pair[1].as_f64()) {
            (Some(lon), Some(lat)) => Ok(Location { kind: self.catalog.point_type.clone(), coordinates: [lon, lat] }),
            _ => Err(RestaurantError::wrong_type("location.coordinates")),
        }
    }

    /// Validate the configured weekdays present in `obj.schedule`; other keys are dropped.
    pub fn schedule(&self, obj: &Map<String, Value>) -> Result<Schedule, RestaurantError> {
        let schedule = field(obj, "schedule", "schedule")?
            .as_object()
            .ok_or_else(|| RestaurantError::wrong_type("schedule"))?;
        let mut out = Schedule::new();
        for day in &self.catalog.days {
            if let Some(daily) = schedule.get(day) {
                out.insert(day.clone(), self.daily_schedule(daily, day)?);
            }
        }
        Ok(out)
    }

    /// Validate one day's `{start: {hour, minute}, end: {hour, minute}}`.
    ///
    /// Presence of all four values is checked first, then their types, then
    /// ranges. `end` before `start` is accepted (overnight opening).
    pub fn daily_schedule(&self, daily: &Value, day: &str) -> Result<DailySchedule, RestaurantError> {
        let mut raw = [&Value::Null; 4];
        let slots = [("start", "hour"), ("start", "minute"), ("end", "hour"), ("end", "minute")];
        for (i, (bound, unit)) in slots.iter().enumerate() {
            raw[i] = daily
                .get(bound)
                .and_then(|b| b.as_object())
                .and_then(|b| b.get(*unit))
                .ok_or_else(|| RestaurantError::missing(format!("schedule.{day}.{bound}.{unit}")))?;
        }

        let mut ints = [0i64; 4];
        for (i, (bound, unit)) in slots.iter().enumerate() {
            ints[i] = as_integer(raw[i])
                .ok_or_else(|| RestaurantError::wrong_type(format!("schedule.{day}.{bound}.{unit}")))?;
        }

        let [start_hour, start_minute, end_hour, end_minute] = ints;
        let hour_ok = |h: i64| (0..=23).contains(&h);
        let minute_ok = |m: i64| (0..=59).contains(&m);
        if !(hour_ok(start_hour) && minute_ok(start_minute) && hour_ok(end_hour) && minute_ok(end_minute)) {
            return Err(RestaurantError::ScheduleOutOfBounds);
        }

        // ranges checked above, so the narrowing casts are lossless
        Ok(DailySchedule {
            start: TimeOfDay { hour: start_hour as u8, minute: start_minute as u8 },
            end: TimeOfDay { hour: end_hour as u8, minute: end_minute as u8 },
        })
    }

    pub fn contacts(&self, obj: &Map<String, Value>) -> Result<Vec<Contact>, RestaurantError> {
        let contacts = field(obj, "contacts", "contacts")?
            .as_array()
            .ok_or_else(|| RestaurantError::wrong_type("contacts"))?;
        contacts
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let name = c.get("name").ok_or_else(|| RestaurantError::missing(format!("contacts[{i}].name")))?;
                let value = c.get("value").ok_or_else(|| RestaurantError::missing(format!("contacts[{i}].value")))?;
                Ok(Contact { name: name.clone(), value: value.clone() })
            })
            .collect()
    }
}

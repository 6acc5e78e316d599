use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ModelError;
use crate::id::DocumentId;

/// GeoJSON-style point: a type tag plus `[longitude, latitude]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

impl Location {
    pub fn longitude(&self) -> f64 { self.coordinates[0] }
    pub fn latitude(&self) -> f64 { self.coordinates[1] }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

/// Opening interval for one weekday. `end` may be earlier than `start` for overnight hours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySchedule {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// Weekday name -> opening interval. Days without an entry are closed.
pub type Schedule = BTreeMap<String, DailySchedule>;

/// A named contact entry. Neither side is type-checked; callers store phone
/// numbers, URLs or nested objects alike.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: Value,
    pub value: Value,
}

/// The caller-editable part of a restaurant, as produced by validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestaurantProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub price: String,
    pub location: Location,
    pub schedule: Schedule,
    pub contacts: Vec<Contact>,
}

/// A restaurant document before the store assigns its id.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewRestaurant {
    #[serde(flatten)]
    pub profile: RestaurantProfile,
    pub score: f64,
    pub images: Vec<String>,
    pub added_by: String,
    pub added: DateTime<Utc>,
    pub deleted: bool,
}

impl NewRestaurant {
    pub fn new(profile: RestaurantProfile, added_by: &str, added: DateTime<Utc>) -> Self {
        Self { profile, score: 0.0, images: Vec::new(), added_by: added_by.to_string(), added, deleted: false }
    }

    pub fn to_document(&self) -> Result<Value, ModelError> {
        serde_json::to_value(self).map_err(|e| ModelError::Encode(e.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub profile: RestaurantProfile,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub images: Vec<String>,
    pub added_by: String,
    pub added: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
}

impl Restaurant {
    pub fn from_document(doc: Value) -> Result<Self, ModelError> {
        serde_json::from_value(doc).map_err(|e| ModelError::Decode(e.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestaurantList {
    pub restaurants: Vec<Restaurant>,
}

#![cfg(test)]
use std::sync::Arc;

use configs::{CatalogConfig, CollectionNames};
use serde_json::{json, Value};

use crate::image::mock::MockImageHost;
use crate::restaurant::RestaurantService;
use crate::store::mock::FailingStore;
use crate::store::JsonDocumentStore;

pub const ALICE: &str = "alice@example.com";
pub const BOB: &str = "bob@example.com";

pub struct Fixture {
    pub service: RestaurantService<FailingStore<JsonDocumentStore>>,
    pub store: Arc<FailingStore<JsonDocumentStore>>,
    pub images: Arc<MockImageHost>,
}

/// Service over an in-memory store and a recording image host.
pub fn fixture() -> Fixture {
    let store = Arc::new(FailingStore::new(JsonDocumentStore::in_memory()));
    let images = Arc::new(MockImageHost::default());
    let service = RestaurantService::new(
        store.clone(),
        images.clone(),
        Arc::new(CatalogConfig::default()),
        CollectionNames::default(),
    );
    Fixture { service, store, images }
}

pub fn restaurant_json() -> Value {
    json!({
        "name": "Noodle Bar",
        "type": "ramen",
        "price": "$$",
        "location": { "type": "Point", "coordinates": [-73.99, 40.73] },
        "schedule": {
            "monday": { "start": { "hour": 11, "minute": 0 }, "end": { "hour": 22, "minute": 30 } }
        },
        "contacts": [ { "name": "phone", "value": "555-0100" } ]
    })
}

pub fn restaurant_at(name: &str, lon: f64, lat: f64) -> String {
    let mut doc = restaurant_json();
    doc["name"] = json!(name);
    doc["location"]["coordinates"] = json!([lon, lat]);
    doc.to_string()
}

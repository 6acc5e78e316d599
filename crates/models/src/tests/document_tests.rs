use chrono::Utc;
use serde_json::json;

use crate::feedback::{NewComment, Score};
use crate::restaurant::{NewRestaurant, Restaurant, RestaurantProfile, Location, DailySchedule, TimeOfDay, Contact};
use crate::DocumentId;

fn profile() -> RestaurantProfile {
    let mut schedule = crate::restaurant::Schedule::new();
    schedule.insert(
        "monday".into(),
        DailySchedule { start: TimeOfDay { hour: 9, minute: 0 }, end: TimeOfDay { hour: 17, minute: 30 } },
    );
    RestaurantProfile {
        name: "Chez Nous".into(),
        kind: "bistro".into(),
        price: "$$".into(),
        location: Location { kind: "Point".into(), coordinates: [2.35, 48.85] },
        schedule,
        contacts: vec![Contact { name: "phone".into(), value: json!("+33 1 23 45 67 89") }],
    }
}

#[test]
fn new_restaurant_document_has_defaults_and_flat_fields() {
    let doc = NewRestaurant::new(profile(), "alice@example.com", Utc::now()).to_document().unwrap();
    assert_eq!(doc["type"], "bistro");
    assert_eq!(doc["score"], 0.0);
    assert_eq!(doc["images"], json!([]));
    assert_eq!(doc["deleted"], false);
    assert_eq!(doc["location"]["coordinates"], json!([2.35, 48.85]));
    assert!(doc.get("_id").is_none());
    assert!(doc.get("profile").is_none());
}

#[test]
fn stored_document_decodes_with_integer_coordinates() {
    let id = DocumentId::new();
    let doc = json!({
        "_id": id.to_string(),
        "name": "Taqueria",
        "type": "mexican",
        "price": "$",
        "score": 4,
        "location": {"type": "Point", "coordinates": [1, 2]},
        "schedule": {},
        "contacts": [],
        "images": ["https://img.example/a.png"],
        "added_by": "bob@example.com",
        "added": "2024-03-01T12:00:00Z",
        "deleted": true
    });
    let r = Restaurant::from_document(doc).unwrap();
    assert_eq!(r.id, id);
    assert_eq!(r.score, 4.0);
    assert_eq!(r.profile.location.longitude(), 1.0);
    assert_eq!(r.profile.location.latitude(), 2.0);
    assert!(r.deleted);
}

#[test]
fn malformed_document_is_a_decode_error() {
    let err = Restaurant::from_document(json!({"name": 3})).unwrap_err();
    assert!(matches!(err, crate::errors::ModelError::Decode(_)));
}

#[test]
fn comment_and_score_documents() {
    let rid = DocumentId::new();
    let c = NewComment { restaurant_id: rid, text: String::new(), added_by: "x".into(), added: Utc::now() };
    let doc = c.to_document().unwrap();
    assert_eq!(doc["restaurant_id"], json!(rid.to_string()));
    assert_eq!(doc["text"], "");

    let sid = DocumentId::new();
    let s = Score::from_document(json!({
        "_id": sid.to_string(),
        "restaurant_id": rid.to_string(),
        "score": 3.5,
        "added_by": "x",
        "added": "2024-03-01T12:00:00Z"
    }))
    .unwrap();
    assert_eq!(s.score, 3.5);
    assert_eq!(s.restaurant_id, rid);
}

use serde_json::json;

use crate::errors::RestaurantError;
use crate::test_support::{fixture, restaurant_at, restaurant_json, ALICE};

#[tokio::test]
async fn add_then_get_echoes_submitted_fields() -> Result<(), anyhow::Error> {
    let fx = fixture();
    let mut payload = restaurant_json();
    payload["location"]["extra"] = json!("dropped");
    payload["unrelated"] = json!(true);

    let id = fx.service.add(&payload.to_string(), ALICE).await?;
    let stored = fx.service.get(&id.to_string()).await?;

    assert_eq!(stored.id, id);
    assert_eq!(stored.score, 0.0);
    assert!(stored.images.is_empty());
    assert!(!stored.deleted);
    assert_eq!(stored.added_by, ALICE);

    let mut expected = restaurant_json();
    expected["location"] = json!({"type": "Point", "coordinates": [-73.99, 40.73]});
    assert_eq!(serde_json::to_value(&stored.profile)?, expected);
    Ok(())
}

#[tokio::test]
async fn missing_fields_are_incomplete_and_nothing_is_stored() -> Result<(), anyhow::Error> {
    let fx = fixture();
    for key in ["name", "type", "price", "location", "schedule", "contacts"] {
        let mut payload = restaurant_json();
        payload.as_object_mut().unwrap().remove(key);
        let err = fx.service.add(&payload.to_string(), ALICE).await.unwrap_err();
        assert_eq!(err, RestaurantError::missing(key), "{key}");
    }
    assert!(fx.store.inner().is_empty().await);
    Ok(())
}

#[tokio::test]
async fn validation_failures_surface_from_add() -> Result<(), anyhow::Error> {
    let fx = fixture();
    assert_eq!(fx.service.add("{oops", ALICE).await.unwrap_err(), RestaurantError::UnparsableJson);

    for coords in [json!([1.0]), json!([1.0, 2.0, 3.0])] {
        let mut payload = restaurant_json();
        payload["location"]["coordinates"] = coords;
        let err = fx.service.add(&payload.to_string(), ALICE).await.unwrap_err();
        assert_eq!(err, RestaurantError::CoordinatesOutOfBounds);
    }

    let mut payload = restaurant_json();
    payload["schedule"]["monday"]["end"]["hour"] = json!(24);
    assert_eq!(fx.service.add(&payload.to_string(), ALICE).await.unwrap_err(), RestaurantError::ScheduleOutOfBounds);

    let mut payload = restaurant_json();
    payload["schedule"]["monday"]["start"]["minute"] = json!(60);
    assert_eq!(fx.service.add(&payload.to_string(), ALICE).await.unwrap_err(), RestaurantError::ScheduleOutOfBounds);

    assert!(fx.store.inner().is_empty().await);
    Ok(())
}

#[tokio::test]
async fn soft_delete_keeps_the_record() -> Result<(), anyhow::Error> {
    let fx = fixture();
    let id = fx.service.add(&restaurant_json().to_string(), ALICE).await?.to_string();

    fx.service.delete(&id).await?;
    let stored = fx.service.get(&id).await?;
    assert!(stored.deleted);
    assert_eq!(fx.service.get_all().await?.restaurants.len(), 1);
    Ok(())
}

#[tokio::test]
async fn unknown_ids_are_rejected() -> Result<(), anyhow::Error> {
    let fx = fixture();
    let absent = models::DocumentId::new().to_string();
    for id in ["not-an-id", absent.as_str()] {
        assert_eq!(fx.service.get(id).await.unwrap_err(), RestaurantError::UnknownRestaurantId);
        assert_eq!(fx.service.delete(id).await.unwrap_err(), RestaurantError::UnknownRestaurantId);
        assert_eq!(
            fx.service.update(id, r#"{"name":"x"}"#).await.unwrap_err(),
            RestaurantError::UnknownRestaurantId
        );
    }
    Ok(())
}

#[tokio::test]
async fn update_overwrites_only_given_fields() -> Result<(), anyhow::Error> {
    let fx = fixture();
    let id = fx.service.add(&restaurant_json().to_string(), ALICE).await?.to_string();

    fx.service.update(&id, r#"{"name":"Noodle Bar II","price":"$$$","score":5,"deleted":true}"#).await?;
    let stored = fx.service.get(&id).await?;
    assert_eq!(stored.profile.name, "Noodle Bar II");
    assert_eq!(stored.profile.price, "$$$");
    assert_eq!(stored.profile.kind, "ramen");
    assert_eq!(stored.score, 0.0);
    assert!(!stored.deleted);

    assert_eq!(fx.service.update(&id, r#"{"price":"cheap"}"#).await.unwrap_err(), RestaurantError::UnknownPrice);
    assert!(matches!(
        fx.service.update(&id, r#"{"score":1}"#).await.unwrap_err(),
        RestaurantError::IncompleteJson(_)
    ));
    assert_eq!(fx.service.update(&id, "nope").await.unwrap_err(), RestaurantError::UnparsableJson);
    Ok(())
}

#[tokio::test]
async fn query_orders_by_distance_within_range() -> Result<(), anyhow::Error> {
    let fx = fixture();
    // roughly 1.1 km and 5.5 km east of the origin, then one far away
    fx.service.add(&restaurant_at("far", 0.05, 0.0), ALICE).await?;
    fx.service.add(&restaurant_at("near", 0.01, 0.0), ALICE).await?;
    fx.service.add(&restaurant_at("elsewhere", 10.0, 10.0), ALICE).await?;

    let found = fx
        .service
        .query(r#"{"location":{"type":"Point","coordinates":[0,0]},"maxDistance":8000}"#)
        .await?;
    let names: Vec<_> = found.restaurants.iter().map(|r| r.profile.name.as_str()).collect();
    assert_eq!(names, ["near", "far"]);

    let within_default = fx.service.query(r#"{"location":{"type":"Point","coordinates":[0,0]}}"#).await?;
    assert_eq!(within_default.restaurants.len(), 2);

    let by_name = fx.service.query(r#"{"name":"elsewhere"}"#).await?;
    assert_eq!(by_name.restaurants.len(), 1);
    Ok(())
}

#[tokio::test]
async fn query_by_id_resolves_the_key() -> Result<(), anyhow::Error> {
    let fx = fixture();
    let id = fx.service.add(&restaurant_json().to_string(), ALICE).await?;
    fx.service.add(&restaurant_at("other", 1.0, 1.0), ALICE).await?;

    let found = fx.service.query(&format!(r#"{{"_id":"{id}"}}"#)).await?;
    assert_eq!(found.restaurants.len(), 1);
    assert_eq!(found.restaurants[0].id, id);
    Ok(())
}

#[tokio::test]
async fn store_failures_become_db_errors() -> Result<(), anyhow::Error> {
    let fx = fixture();
    let id = fx.service.add(&restaurant_json().to_string(), ALICE).await?.to_string();

    fx.store.fail_on("update");
    assert!(matches!(fx.service.delete(&id).await.unwrap_err(), RestaurantError::DbError(_)));

    fx.store.fail_on("add");
    let err = fx.service.add(&restaurant_json().to_string(), ALICE).await.unwrap_err();
    assert!(matches!(err, RestaurantError::DbError(_)));

    // validation still wins over storage
    assert_eq!(fx.service.add("{", ALICE).await.unwrap_err(), RestaurantError::UnparsableJson);

    fx.store.fail_on("query");
    assert!(matches!(fx.service.get_all().await.unwrap_err(), RestaurantError::DbError(_)));
    Ok(())
}

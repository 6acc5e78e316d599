use std::sync::Arc;

use serde_json::json;

use crate::errors::RestaurantError;
use crate::test_support::{fixture, restaurant_json, ALICE, BOB};

#[tokio::test]
async fn resubmission_replaces_the_authors_score() -> Result<(), anyhow::Error> {
    let fx = fixture();
    let id = fx.service.add(&restaurant_json().to_string(), ALICE).await?.to_string();

    assert_eq!(fx.service.add_score(&id, &json!(3), ALICE).await?, 3.0);
    assert_eq!(fx.service.add_score(&id, &json!(5), ALICE).await?, 5.0);

    assert_eq!(fx.service.get(&id).await?.score, 5.0);
    let scores = fx.service.get_scores(&id).await?.scores;
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].score, 5.0);
    assert_eq!(scores[0].added_by, ALICE);

    assert_eq!(fx.service.add_score(&id, &json!("4"), BOB).await?, 4.5);
    assert_eq!(fx.service.get(&id).await?.score, 4.5);
    assert_eq!(fx.service.get_scores(&id).await?.scores.len(), 2);
    Ok(())
}

#[tokio::test]
async fn rejected_scores_leave_state_untouched() -> Result<(), anyhow::Error> {
    let fx = fixture();
    let id = fx.service.add(&restaurant_json().to_string(), ALICE).await?.to_string();
    fx.service.add_score(&id, &json!(2), ALICE).await?;

    assert_eq!(fx.service.add_score(&id, &json!(6), "x").await.unwrap_err(), RestaurantError::ScoreOutOfBounds);
    assert_eq!(
        fx.service.add_score(&id, &json!("abc"), "x").await.unwrap_err(),
        RestaurantError::wrong_type("score")
    );
    // bad values are reported before the id is looked at
    assert_eq!(
        fx.service.add_score("bogus", &json!(-1), "x").await.unwrap_err(),
        RestaurantError::ScoreOutOfBounds
    );
    assert_eq!(
        fx.service.add_score("bogus", &json!(1), "x").await.unwrap_err(),
        RestaurantError::UnknownRestaurantId
    );

    assert_eq!(fx.service.get(&id).await?.score, 2.0);
    assert_eq!(fx.service.get_scores(&id).await?.scores.len(), 1);
    Ok(())
}

#[tokio::test]
async fn score_lookup_by_author() -> Result<(), anyhow::Error> {
    let fx = fixture();
    let id = fx.service.add(&restaurant_json().to_string(), ALICE).await?.to_string();
    assert!(fx.service.get_score(&id, ALICE).await?.score.is_none());

    fx.service.add_score(&id, &json!(4.5), ALICE).await?;
    let mine = fx.service.get_score(&id, ALICE).await?.score.expect("alice scored");
    assert_eq!(mine.score, 4.5);
    assert_eq!(mine.restaurant_id.to_string(), id);
    assert!(fx.service.get_score(&id, BOB).await?.score.is_none());

    assert_eq!(fx.service.get_score("?", ALICE).await.unwrap_err(), RestaurantError::UnknownRestaurantId);
    assert_eq!(fx.service.get_scores("?").await.unwrap_err(), RestaurantError::UnknownRestaurantId);
    Ok(())
}

#[tokio::test]
async fn score_for_missing_restaurant_writes_nothing() -> Result<(), anyhow::Error> {
    let fx = fixture();
    let absent = models::DocumentId::new().to_string();
    assert_eq!(
        fx.service.add_score(&absent, &json!(3), ALICE).await.unwrap_err(),
        RestaurantError::UnknownRestaurantId
    );
    assert!(fx.store.inner().is_empty().await);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_authors_keep_an_exact_mean() -> Result<(), anyhow::Error> {
    let fx = fixture();
    let id = fx.service.add(&restaurant_json().to_string(), ALICE).await?.to_string();
    let service = Arc::new(fx.service);

    let mut handles = Vec::new();
    for i in 0..20u32 {
        let service = service.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            service.add_score(&id, &json!(i % 6), &format!("user{i}@example.com")).await
        }));
    }
    for h in handles {
        h.await??;
    }

    let expected = (0..20u32).map(|i| (i % 6) as f64).sum::<f64>() / 20.0;
    let stored = service.get(&id).await?.score;
    assert!((stored - expected).abs() < 1e-9, "{stored} != {expected}");
    assert_eq!(service.get_scores(&id).await?.scores.len(), 20);
    Ok(())
}

#[tokio::test]
async fn failed_score_count_is_a_db_error() -> Result<(), anyhow::Error> {
    let fx = fixture();
    let id = fx.service.add(&restaurant_json().to_string(), ALICE).await?.to_string();
    fx.store.fail_on("count");
    assert!(matches!(
        fx.service.add_score(&id, &json!(1), ALICE).await.unwrap_err(),
        RestaurantError::DbError(_)
    ));
    assert_eq!(fx.service.get(&id).await?.score, 0.0);
    Ok(())
}

#[tokio::test]
async fn failed_average_write_records_no_score() -> Result<(), anyhow::Error> {
    let fx = fixture();
    let id = fx.service.add(&restaurant_json().to_string(), ALICE).await?.to_string();
    fx.store.fail_on("update");
    assert!(matches!(
        fx.service.add_score(&id, &json!(4), ALICE).await.unwrap_err(),
        RestaurantError::DbError(_)
    ));
    assert_eq!(fx.service.get(&id).await?.score, 0.0);
    assert!(fx.service.get_scores(&id).await?.scores.is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_score_record_keeps_the_written_average() -> Result<(), anyhow::Error> {
    let fx = fixture();
    let id = fx.service.add(&restaurant_json().to_string(), ALICE).await?.to_string();
    fx.store.fail_on("add_or_update");
    assert!(matches!(
        fx.service.add_score(&id, &json!(3), ALICE).await.unwrap_err(),
        RestaurantError::DbError(_)
    ));
    // the two writes are not atomic: the average lands, the per-author record does not
    assert_eq!(fx.service.get(&id).await?.score, 3.0);
    assert!(fx.service.get_scores(&id).await?.scores.is_empty());
    Ok(())
}

#[tokio::test]
async fn score_locks_are_released_after_each_submission() -> Result<(), anyhow::Error> {
    let fx = fixture();
    let id = fx.service.add(&restaurant_json().to_string(), ALICE).await?.to_string();
    fx.service.add_score(&id, &json!(2), ALICE).await?;
    assert_eq!(fx.service.held_score_locks(), 0);

    for _ in 0..100 {
        let absent = models::DocumentId::new().to_string();
        assert_eq!(
            fx.service.add_score(&absent, &json!(3), BOB).await.unwrap_err(),
            RestaurantError::UnknownRestaurantId
        );
    }
    assert_eq!(fx.service.held_score_locks(), 0);
    Ok(())
}

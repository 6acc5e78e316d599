//! Running-average maintenance for restaurant scores.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};

use models::DocumentId;

use crate::errors::RestaurantError;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 5.0;

/// Coerce a raw submitted score into a number.
///
/// Numbers pass through; strings are parsed after trimming. Everything
/// else, empty strings and NaN are `IncorrectValueType`.
pub fn coerce(raw: &Value) -> Result<f64, RestaurantError> {
    let n = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| !n.is_nan()).ok_or_else(|| RestaurantError::wrong_type("score"))
}

pub fn check_bounds(score: f64) -> Result<f64, RestaurantError> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(score)
    } else {
        Err(RestaurantError::ScoreOutOfBounds)
    }
}

/// New mean after one author submits `score`.
///
/// `existing` is the number of stored scores (one per author) before this
/// submission. A first-time author adds a sample; a returning author's
/// `previous` sample is replaced in place, so the sample count is unchanged.
pub fn running_average(current: f64, score: f64, existing: u64, previous: Option<f64>) -> f64 {
    match previous {
        Some(prev) if existing > 0 => current + (score - prev) / existing as f64,
        _ => current + (score - current) / (existing + 1) as f64,
    }
}

/// Per-restaurant async locks serializing the count/average/write/upsert sequence.
///
/// An entry lives only while some submission holds or waits on it.
#[derive(Default)]
pub struct ScoreLocks {
    locks: DashMap<DocumentId, Arc<Mutex<()>>>,
}

/// Held for the duration of one score submission.
pub struct ScoreGuard<'a> {
    locks: &'a ScoreLocks,
    restaurant: DocumentId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ScoreLocks {
    pub async fn acquire(&self, restaurant: DocumentId) -> ScoreGuard<'_> {
        // clone the Arc out so the shard guard is released before awaiting
        let lock = self.locks.entry(restaurant).or_default().clone();
        let guard = lock.lock_owned().await;
        ScoreGuard { locks: self, restaurant, guard: Some(guard) }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for ScoreGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // waiters hold their own clone, so a count of one means nobody else wants it
        self.locks.locks.remove_if(&self.restaurant, |_, lock| Arc::strong_count(lock) == 1);
    }
}

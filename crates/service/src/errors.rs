use thiserror::Error;

use crate::image::ImageHostError;
use crate::store::StoreError;

/// Every way a restaurant operation can fail.
///
/// The variant is the outward error kind; string payloads are diagnostics
/// (offending field path, collaborator message) and never change the kind.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RestaurantError {
    #[error("payload is not valid JSON")]
    UnparsableJson,
    #[error("missing required field: {0}")]
    IncompleteJson(String),
    #[error("field has the wrong type: {0}")]
    IncorrectValueType(String),
    #[error("price is not one of the configured tiers")]
    UnknownPrice,
    #[error("location type must be a Point")]
    LocationTypeNotPoint,
    #[error("coordinates must be a [longitude, latitude] pair")]
    CoordinatesOutOfBounds,
    #[error("schedule hour must be 0-23 and minute 0-59")]
    ScheduleOutOfBounds,
    #[error("score must be between 0 and 5")]
    ScoreOutOfBounds,
    #[error("unknown restaurant id")]
    UnknownRestaurantId,
    #[error("image upload failed: {0}")]
    ImageError(String),
    #[error("database error: {0}")]
    DbError(String),
}

impl RestaurantError {
    pub fn missing(field: impl Into<String>) -> Self { Self::IncompleteJson(field.into()) }

    pub fn wrong_type(field: impl Into<String>) -> Self { Self::IncorrectValueType(field.into()) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            RestaurantError::UnparsableJson => 1001,
            RestaurantError::IncompleteJson(_) => 1002,
            RestaurantError::IncorrectValueType(_) => 1003,
            RestaurantError::UnknownPrice => 1004,
            RestaurantError::LocationTypeNotPoint => 1005,
            RestaurantError::CoordinatesOutOfBounds => 1006,
            RestaurantError::ScheduleOutOfBounds => 1007,
            RestaurantError::ScoreOutOfBounds => 1008,
            RestaurantError::UnknownRestaurantId => 1101,
            RestaurantError::ImageError(_) => 1201,
            RestaurantError::DbError(_) => 1300,
        }
    }

    /// Stable symbolic name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            RestaurantError::UnparsableJson => "UNPARSABLE_JSON",
            RestaurantError::IncompleteJson(_) => "INCOMPLETE_JSON",
            RestaurantError::IncorrectValueType(_) => "INCORRECT_VALUE_TYPE",
            RestaurantError::UnknownPrice => "UNKNOWN_PRICE",
            RestaurantError::LocationTypeNotPoint => "LOCATION_TYPE_NOT_POINT",
            RestaurantError::CoordinatesOutOfBounds => "COORDINATES_OUT_OF_BOUNDS",
            RestaurantError::ScheduleOutOfBounds => "SCHEDULE_OUT_OF_BOUNDS",
            RestaurantError::ScoreOutOfBounds => "SCORE_OUT_OF_BOUNDS",
            RestaurantError::UnknownRestaurantId => "UNKNOWN_RESTAURANT_ID",
            RestaurantError::ImageError(_) => "IMAGE_ERROR",
            RestaurantError::DbError(_) => "DB_ERROR",
        }
    }

    /// Whether the caller sent something invalid (as opposed to a collaborator failing).
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            RestaurantError::UnknownRestaurantId | RestaurantError::ImageError(_) | RestaurantError::DbError(_)
        )
    }
}

impl From<StoreError> for RestaurantError {
    fn from(e: StoreError) -> Self { RestaurantError::DbError(e.to_string()) }
}

impl From<ImageHostError> for RestaurantError {
    fn from(e: ImageHostError) -> Self { RestaurantError::ImageError(e.to_string()) }
}

impl From<models::errors::ModelError> for RestaurantError {
    fn from(e: models::errors::ModelError) -> Self { RestaurantError::DbError(e.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_kinds_are_distinct() {
        let all = [
            RestaurantError::UnparsableJson,
            RestaurantError::missing("name"),
            RestaurantError::wrong_type("name"),
            RestaurantError::UnknownPrice,
            RestaurantError::LocationTypeNotPoint,
            RestaurantError::CoordinatesOutOfBounds,
            RestaurantError::ScheduleOutOfBounds,
            RestaurantError::ScoreOutOfBounds,
            RestaurantError::UnknownRestaurantId,
            RestaurantError::ImageError("x".into()),
            RestaurantError::DbError("x".into()),
        ];
        let mut codes: Vec<u16> = all.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
        let mut kinds: Vec<&str> = all.iter().map(|e| e.kind()).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), all.len());
    }

    #[test]
    fn collaborator_failures_keep_their_cause() {
        let e: RestaurantError = StoreError::Io("disk full".into()).into();
        assert_eq!(e.kind(), "DB_ERROR");
        assert!(e.to_string().contains("disk full"));
        assert!(!e.is_validation());

        let e: RestaurantError = ImageHostError::Rejected("413".into()).into();
        assert_eq!(e.kind(), "IMAGE_ERROR");
        assert!(RestaurantError::UnknownPrice.is_validation());
    }
}

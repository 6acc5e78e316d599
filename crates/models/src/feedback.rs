//! Per-author scores and free-text comments attached to a restaurant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ModelError;
use crate::id::DocumentId;

/// One author's score for one restaurant; unique per `(restaurant_id, added_by)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Score {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub restaurant_id: DocumentId,
    pub score: f64,
    pub added_by: String,
    pub added: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub restaurant_id: DocumentId,
    pub text: String,
    pub added_by: String,
    pub added: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewComment {
    pub restaurant_id: DocumentId,
    pub text: String,
    pub added_by: String,
    pub added: DateTime<Utc>,
}

impl NewComment {
    pub fn to_document(&self) -> Result<Value, ModelError> {
        serde_json::to_value(self).map_err(|e| ModelError::Encode(e.to_string()))
    }
}

impl Score {
    pub fn from_document(doc: Value) -> Result<Self, ModelError> {
        serde_json::from_value(doc).map_err(|e| ModelError::Decode(e.to_string()))
    }
}

impl Comment {
    pub fn from_document(doc: Value) -> Result<Self, ModelError> {
        serde_json::from_value(doc).map_err(|e| ModelError::Decode(e.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreList {
    pub scores: Vec<Score>,
}

/// A single author's score lookup; `score` is `None` when they never rated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreLookup {
    pub score: Option<Score>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommentList {
    pub comments: Vec<Comment>,
}

use std::sync::Arc;

use chrono::Utc;
use configs::{CatalogConfig, CollectionNames};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

use models::feedback::{Comment, CommentList, NewComment, Score, ScoreList, ScoreLookup};
use models::restaurant::{NewRestaurant, Restaurant, RestaurantList};
use models::DocumentId;

use crate::errors::RestaurantError;
use crate::image::ImageHost;
use crate::restaurant::query::{self, by_id};
use crate::restaurant::scoring::{self, ScoreLocks};
use crate::store::{DocumentStore, UpdateOp};
use crate::validation::Validator;

/// Restaurant directory operations over a document store and an image host.
///
/// Every operation is request-scoped; the only in-process state is the set
/// of per-restaurant score locks.
pub struct RestaurantService<S: DocumentStore> {
    store: Arc<S>,
    images: Arc<dyn ImageHost>,
    catalog: Arc<CatalogConfig>,
    collections: CollectionNames,
    score_locks: ScoreLocks,
}

fn resolve(id: &str) -> Result<DocumentId, RestaurantError> {
    DocumentId::parse(id).ok_or(RestaurantError::UnknownRestaurantId)
}

fn parse_json(raw: &str) -> Result<Value, RestaurantError> {
    serde_json::from_str(raw).map_err(|_| RestaurantError::UnparsableJson)
}

fn by_restaurant(id: DocumentId) -> Value {
    json!({ "restaurant_id": id.to_string() })
}

impl<S: DocumentStore> RestaurantService<S> {
    pub fn new(store: Arc<S>, images: Arc<dyn ImageHost>, catalog: Arc<CatalogConfig>, collections: CollectionNames) -> Self {
        Self { store, images, catalog, collections, score_locks: ScoreLocks::default() }
    }

    #[cfg(test)]
    pub(crate) fn held_score_locks(&self) -> usize {
        self.score_locks.len()
    }

    fn validator(&self) -> Validator<'_> { Validator::new(&self.catalog) }

    async fn find_restaurant(&self, id: DocumentId) -> Result<Restaurant, RestaurantError> {
        let doc = self
            .store
            .get(&self.collections.restaurants, &by_id(id))
            .await?
            .ok_or(RestaurantError::UnknownRestaurantId)?;
        Ok(Restaurant::from_document(doc)?)
    }

    /// Validate a raw JSON payload and store it as a new restaurant.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::image::mock::MockImageHost;
    /// use service::restaurant::RestaurantService;
    /// use service::store::JsonDocumentStore;
    /// let svc = RestaurantService::new(
    ///     Arc::new(JsonDocumentStore::in_memory()),
    ///     Arc::new(MockImageHost::default()),
    ///     Arc::new(configs::CatalogConfig::default()),
    ///     configs::CollectionNames::default(),
    /// );
    /// let payload = r#"{"name":"Bao","type":"taiwanese","price":"$","schedule":{},"contacts":[],
    ///                   "location":{"type":"Point","coordinates":[-73.99,40.73]}}"#;
    /// let id = tokio_test::block_on(svc.add(payload, "cook@example.com")).unwrap();
    /// let stored = tokio_test::block_on(svc.get(&id.to_string())).unwrap();
    /// assert_eq!(stored.score, 0.0);
    /// assert!(!stored.deleted);
    /// ```
    #[instrument(skip(self, payload), fields(author = %author))]
    pub async fn add(&self, payload: &str, author: &str) -> Result<DocumentId, RestaurantError> {
        let parsed = parse_json(payload)?;
        let profile = self.validator().restaurant(&parsed)?;
        let doc = NewRestaurant::new(profile, author, Utc::now()).to_document()?;
        let id = self.store.add(&self.collections.restaurants, doc).await?;
        info!(restaurant_id = %id, "restaurant_added");
        Ok(id)
    }

    /// Fetch one restaurant, soft-deleted or not.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Restaurant, RestaurantError> {
        let id = resolve(id)?;
        self.find_restaurant(id).await
    }

    /// Every stored restaurant, including soft-deleted ones.
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<RestaurantList, RestaurantError> {
        self.list(&json!({})).await
    }

    /// Search with a free-form JSON filter; see [`query::build_filter`].
    #[instrument(skip(self, filter))]
    pub async fn query(&self, filter: &str) -> Result<RestaurantList, RestaurantError> {
        let filter = query::build_filter(filter, &self.catalog)?;
        debug!(%filter, "restaurant query");
        self.list(&filter).await
    }

    async fn list(&self, filter: &Value) -> Result<RestaurantList, RestaurantError> {
        let restaurants = self
            .store
            .query(&self.collections.restaurants, filter)
            .await?
            .into_iter()
            .map(Restaurant::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RestaurantList { restaurants })
    }

    /// Overwrite the editable fields present in `data`.
    #[instrument(skip(self, data))]
    pub async fn update(&self, id: &str, data: &str) -> Result<(), RestaurantError> {
        let parsed = parse_json(data)?;
        let id = resolve(id)?;
        let fields = self.validator().profile_update(&parsed)?;
        let changed: Vec<String> = fields.keys().cloned().collect();
        let result = self
            .store
            .update(&self.collections.restaurants, &by_id(id), &UpdateOp::Set(fields))
            .await?;
        if result.matched_count == 0 {
            return Err(RestaurantError::UnknownRestaurantId);
        }
        info!(restaurant_id = %id, fields = ?changed, "restaurant_updated");
        Ok(())
    }

    /// Soft delete: flag the restaurant, keep the document.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), RestaurantError> {
        let id = resolve(id)?;
        let result = self
            .store
            .update(&self.collections.restaurants, &by_id(id), &UpdateOp::set_field("deleted", Value::Bool(true)))
            .await?;
        if result.matched_count == 0 {
            return Err(RestaurantError::UnknownRestaurantId);
        }
        info!(restaurant_id = %id, "restaurant_deleted");
        Ok(())
    }

    /// Record `author`'s score and fold it into the restaurant's running average.
    ///
    /// Returns the new average. Submissions for the same restaurant are
    /// serialized; a repeat submission by the same author replaces their
    /// earlier score instead of adding another sample.
    #[instrument(skip(self, raw_score), fields(author = %author))]
    pub async fn add_score(&self, id: &str, raw_score: &Value, author: &str) -> Result<f64, RestaurantError> {
        let score = scoring::check_bounds(scoring::coerce(raw_score)?)?;
        let id = resolve(id)?;

        self.find_restaurant(id).await?;
        let _guard = self.score_locks.acquire(id).await;
        // re-read under the lock for the current average
        let restaurant = self.find_restaurant(id).await?;
        let existing = self.store.count(&self.collections.scores, &by_restaurant(id)).await?;
        let key = json!({ "restaurant_id": id.to_string(), "added_by": author });
        let previous = match self.store.get(&self.collections.scores, &key).await? {
            Some(doc) => Some(Score::from_document(doc)?.score),
            None => None,
        };

        let average = scoring::running_average(restaurant.score, score, existing, previous);
        debug!(existing, ?previous, old = restaurant.score, new = average, "score average computed");

        let result = self
            .store
            .update(&self.collections.restaurants, &by_id(id), &UpdateOp::set_field("score", json!(average)))
            .await?;
        if result.matched_count == 0 {
            return Err(RestaurantError::UnknownRestaurantId);
        }

        let mut record = Map::new();
        record.insert("restaurant_id".into(), id.into());
        record.insert("score".into(), json!(score));
        record.insert("added_by".into(), Value::String(author.to_string()));
        record.insert("added".into(), json!(Utc::now()));
        self.store
            .add_or_update(&self.collections.scores, &key, &UpdateOp::Set(record))
            .await?;

        info!(restaurant_id = %id, score, average, "score_recorded");
        Ok(average)
    }

    /// `author`'s score for a restaurant, if they submitted one.
    #[instrument(skip(self))]
    pub async fn get_score(&self, id: &str, author: &str) -> Result<ScoreLookup, RestaurantError> {
        let id = resolve(id)?;
        let key = json!({ "restaurant_id": id.to_string(), "added_by": author });
        let score = match self.store.get(&self.collections.scores, &key).await? {
            Some(doc) => Some(Score::from_document(doc)?),
            None => None,
        };
        Ok(ScoreLookup { score })
    }

    #[instrument(skip(self))]
    pub async fn get_scores(&self, id: &str) -> Result<ScoreList, RestaurantError> {
        let id = resolve(id)?;
        let scores = self
            .store
            .query(&self.collections.scores, &by_restaurant(id))
            .await?
            .into_iter()
            .map(Score::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ScoreList { scores })
    }

    /// Append a comment. The text is stored as given, empty or not.
    #[instrument(skip(self, text), fields(author = %author, len = text.len()))]
    pub async fn add_comment(&self, id: &str, text: &str, author: &str) -> Result<DocumentId, RestaurantError> {
        let id = resolve(id)?;
        self.find_restaurant(id).await?;
        let comment = NewComment {
            restaurant_id: id,
            text: text.to_string(),
            added_by: author.to_string(),
            added: Utc::now(),
        };
        let comment_id = self.store.add(&self.collections.comments, comment.to_document()?).await?;
        info!(restaurant_id = %id, %comment_id, "comment_added");
        Ok(comment_id)
    }

    #[instrument(skip(self))]
    pub async fn get_comments(&self, id: &str) -> Result<CommentList, RestaurantError> {
        let id = resolve(id)?;
        let comments = self
            .store
            .query(&self.collections.comments, &by_restaurant(id))
            .await?
            .into_iter()
            .map(Comment::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CommentList { comments })
    }

    /// Upload an image and append its URL to the restaurant; returns the URL.
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub async fn add_image(&self, id: &str, image: Vec<u8>) -> Result<String, RestaurantError> {
        let id = resolve(id)?;
        self.find_restaurant(id).await?;
        let url = self.images.upload(image).await?;
        let result = self
            .store
            .update(
                &self.collections.restaurants,
                &by_id(id),
                &UpdateOp::Push { field: "images".into(), value: Value::String(url.clone()) },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(RestaurantError::UnknownRestaurantId);
        }
        info!(restaurant_id = %id, %url, "image_added");
        Ok(url)
    }
}

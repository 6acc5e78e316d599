//! Document-store abstraction the restaurant service persists through.
//!
//! Filters are JSON objects in the usual document-store dialect (field
//! equality, comparison operators, `$nearSphere`); see [`filter`].

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use models::DocumentId;

pub mod filter;
pub mod json_document_store;

pub use json_document_store::JsonDocumentStore;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Targeted single-document mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Overwrite the given top-level fields.
    Set(Map<String, Value>),
    /// Append `value` to the array at `field`, creating it if absent.
    Push { field: String, value: Value },
}

impl UpdateOp {
    pub fn set_field(field: &str, value: Value) -> Self {
        let mut m = Map::new();
        m.insert(field.to_string(), value);
        UpdateOp::Set(m)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub upserted_id: Option<DocumentId>,
}

/// Generic persistence operations over named collections of JSON documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document; the store assigns and returns its `_id`.
    async fn add(&self, collection: &str, doc: Value) -> Result<DocumentId, StoreError>;
    /// First document matching `filter`, if any.
    async fn get(&self, collection: &str, filter: &Value) -> Result<Option<Value>, StoreError>;
    async fn query(&self, collection: &str, filter: &Value) -> Result<Vec<Value>, StoreError>;
    /// Apply `op` to the first matching document.
    async fn update(&self, collection: &str, filter: &Value, op: &UpdateOp) -> Result<UpdateResult, StoreError>;
    /// Like `update`, but inserts `filter`'s equality fields plus `op` when nothing matches.
    async fn add_or_update(&self, collection: &str, filter: &Value, op: &UpdateOp) -> Result<UpdateResult, StoreError>;
    async fn count(&self, collection: &str, filter: &Value) -> Result<u64, StoreError>;
}

/// Store doubles for exercising error paths in tests.
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Delegates to an inner store but fails every operation whose name is listed.
    pub struct FailingStore<S> {
        inner: S,
        failing: Mutex<Vec<&'static str>>,
    }

    impl<S: DocumentStore> FailingStore<S> {
        pub fn new(inner: S) -> Self { Self { inner, failing: Mutex::new(Vec::new()) } }

        /// Make `operation` (`add`, `get`, `query`, `update`, `add_or_update`, `count`) fail from now on.
        pub fn fail_on(&self, operation: &'static str) {
            self.failing.lock().unwrap_or_else(|e| e.into_inner()).push(operation);
        }

        pub fn inner(&self) -> &S { &self.inner }

        fn check(&self, operation: &str) -> Result<(), StoreError> {
            if self.failing.lock().unwrap_or_else(|e| e.into_inner()).iter().any(|o| *o == operation) {
                return Err(StoreError::Io(format!("injected {operation} failure")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl<S: DocumentStore> DocumentStore for FailingStore<S> {
        async fn add(&self, collection: &str, doc: Value) -> Result<DocumentId, StoreError> {
            self.check("add")?;
            self.inner.add(collection, doc).await
        }

        async fn get(&self, collection: &str, filter: &Value) -> Result<Option<Value>, StoreError> {
            self.check("get")?;
            self.inner.get(collection, filter).await
        }

        async fn query(&self, collection: &str, filter: &Value) -> Result<Vec<Value>, StoreError> {
            self.check("query")?;
            self.inner.query(collection, filter).await
        }

        async fn update(&self, collection: &str, filter: &Value, op: &UpdateOp) -> Result<UpdateResult, StoreError> {
            self.check("update")?;
            self.inner.update(collection, filter, op).await
        }

        async fn add_or_update(&self, collection: &str, filter: &Value, op: &UpdateOp) -> Result<UpdateResult, StoreError> {
            self.check("add_or_update")?;
            self.inner.add_or_update(collection, filter, op).await
        }

        async fn count(&self, collection: &str, filter: &Value) -> Result<u64, StoreError> {
            self.check("count")?;
            self.inner.count(collection, filter).await
        }
    }
}

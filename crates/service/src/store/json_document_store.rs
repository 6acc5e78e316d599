use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::{fs, sync::RwLock};

use models::DocumentId;

use super::filter::{self, haversine_m, point_of};
use super::{DocumentStore, StoreError, UpdateOp, UpdateResult};

type Collections = HashMap<String, Vec<Value>>;

/// JSON document store held in memory and optionally persisted to a file.
///
/// Each collection is an insertion-ordered list of JSON objects. With a file
/// path, the whole map is rewritten after every mutation, which suits the
/// small directories this service manages without an external database.
#[derive(Clone)]
pub struct JsonDocumentStore {
    inner: Arc<RwLock<Collections>>,
    file_path: Option<PathBuf>,
}

impl JsonDocumentStore {
    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())), file_path: None }
    }

    /// Open a file-backed store. Creates the file with no collections if missing.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StoreError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let collections: Collections = match fs::read(&file_path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))?,
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(StoreError::Io(e.to_string())),
            Err(_) => {
                let empty: Collections = HashMap::new();
                fs::write(&file_path, serde_json::to_vec(&empty).map_err(|e| StoreError::Serialization(e.to_string()))?)
                    .await
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                empty
            }
        };

        Ok(Self { inner: Arc::new(RwLock::new(collections)), file_path: Some(file_path) })
    }

    async fn save(&self, collections: &Collections) -> Result<(), StoreError> {
        let Some(path) = &self.file_path else { return Ok(()) };
        let data = serde_json::to_vec(collections).map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(path, data).await.map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }

    /// Number of documents across all collections.
    pub async fn len(&self) -> usize {
        self.inner.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn with_new_id(doc: Value) -> Result<(DocumentId, Value), StoreError> {
    let Value::Object(mut map) = doc else {
        return Err(StoreError::InvalidDocument("documents must be JSON objects".into()));
    };
    let id = DocumentId::new();
    map.insert("_id".into(), id.into());
    Ok((id, Value::Object(map)))
}

fn apply(doc: &mut Value, op: &UpdateOp) -> Result<(), StoreError> {
    let map = doc
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidDocument("documents must be JSON objects".into()))?;
    match op {
        UpdateOp::Set(fields) => {
            if fields.contains_key("_id") {
                return Err(StoreError::InvalidDocument("_id is immutable".into()));
            }
            for (k, v) in fields {
                map.insert(k.clone(), v.clone());
            }
        }
        UpdateOp::Push { field, value } => match map.entry(field.clone()).or_insert_with(|| Value::Array(Vec::new())) {
            Value::Array(items) => items.push(value.clone()),
            _ => return Err(StoreError::InvalidDocument(format!("{field} is not an array"))),
        },
    }
    Ok(())
}

fn first_match(docs: &[Value], filter: &Value) -> Result<Option<usize>, StoreError> {
    for (i, doc) in docs.iter().enumerate() {
        if filter::matches(doc, filter)? {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

/// How to take back an in-memory mutation whose save failed.
enum Undo {
    Pop,
    Restore(usize, Value),
}

impl JsonDocumentStore {
    /// Persist the mutated map; on failure revert `undo` so memory matches disk.
    async fn commit(&self, map: &mut Collections, collection: &str, undo: Undo) -> Result<(), StoreError> {
        let Err(e) = self.save(map).await else { return Ok(()) };
        if let Some(docs) = map.get_mut(collection) {
            match undo {
                Undo::Pop => {
                    docs.pop();
                }
                Undo::Restore(i, before) => docs[i] = before,
            }
        }
        Err(e)
    }
}

#[async_trait]
impl DocumentStore for JsonDocumentStore {
    async fn add(&self, collection: &str, doc: Value) -> Result<DocumentId, StoreError> {
        let (id, doc) = with_new_id(doc)?;
        let mut map = self.inner.write().await;
        map.entry(collection.to_string()).or_default().push(doc);
        self.commit(&mut map, collection, Undo::Pop).await?;
        Ok(id)
    }

    async fn get(&self, collection: &str, filter: &Value) -> Result<Option<Value>, StoreError> {
        let map = self.inner.read().await;
        let Some(docs) = map.get(collection) else {
            // still reject malformed filters on empty collections
            filter::matches(&Value::Object(Map::new()), filter)?;
            return Ok(None);
        };
        Ok(first_match(docs, filter)?.map(|i| docs[i].clone()))
    }

    async fn query(&self, collection: &str, filter: &Value) -> Result<Vec<Value>, StoreError> {
        let near = filter::near_clause(filter)?;
        let map = self.inner.read().await;
        let mut found = Vec::new();
        for doc in map.get(collection).map(Vec::as_slice).unwrap_or_default() {
            if filter::matches(doc, filter)? {
                found.push(doc.clone());
            }
        }
        if let Some((path, near)) = near {
            let distance = |d: &Value| {
                filter::lookup(d, &path).and_then(point_of).map_or(f64::INFINITY, |p| haversine_m(near.center, p))
            };
            found.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
        }
        Ok(found)
    }

    async fn update(&self, collection: &str, filter: &Value, op: &UpdateOp) -> Result<UpdateResult, StoreError> {
        let mut map = self.inner.write().await;
        let Some(docs) = map.get_mut(collection) else {
            return Ok(UpdateResult::default());
        };
        let Some(i) = first_match(docs, filter)? else {
            return Ok(UpdateResult::default());
        };
        let before = docs[i].clone();
        apply(&mut docs[i], op)?;
        self.commit(&mut map, collection, Undo::Restore(i, before)).await?;
        Ok(UpdateResult { matched_count: 1, upserted_id: None })
    }

    async fn add_or_update(&self, collection: &str, filter: &Value, op: &UpdateOp) -> Result<UpdateResult, StoreError> {
        let mut map = self.inner.write().await;
        let docs = map.entry(collection.to_string()).or_default();
        let (result, undo) = match first_match(docs, filter)? {
            Some(i) => {
                let before = docs[i].clone();
                apply(&mut docs[i], op)?;
                (UpdateResult { matched_count: 1, upserted_id: None }, Undo::Restore(i, before))
            }
            None => {
                let mut doc = Value::Object(filter::equality_fields(filter)?);
                apply(&mut doc, op)?;
                let (id, doc) = with_new_id(doc)?;
                docs.push(doc);
                (UpdateResult { matched_count: 0, upserted_id: Some(id) }, Undo::Pop)
            }
        };
        self.commit(&mut map, collection, undo).await?;
        Ok(result)
    }

    async fn count(&self, collection: &str, filter: &Value) -> Result<u64, StoreError> {
        let map = self.inner.read().await;
        let mut n = 0u64;
        for doc in map.get(collection).map(Vec::as_slice).unwrap_or_default() {
            if filter::matches(doc, filter)? {
                n += 1;
            }
        }
        Ok(n)
    }
}

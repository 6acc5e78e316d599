use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque store-assigned document identity.
///
/// Serialized as its canonical hyphenated string so documents stay plain JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self { Self(Uuid::new_v4()) }

    /// Resolve a caller-supplied id; `None` when it is not a well-formed id.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl Default for DocumentId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl From<Uuid> for DocumentId {
    fn from(value: Uuid) -> Self { Self(value) }
}

impl From<DocumentId> for serde_json::Value {
    fn from(value: DocumentId) -> Self { serde_json::Value::String(value.to_string()) }
}

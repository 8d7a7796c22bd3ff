use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Field map of a single stored document.
pub type Fields = serde_json::Map<String, Value>;

/// Path-addressed document storage with collection/subcollection semantics.
///
/// Paths are slash-separated: an even number of segments addresses a
/// document (`users/u1`), an odd number a collection (`diaries/d1/entries`).
/// Single-document writes are atomic; `commit` applies a whole batch
/// atomically; `array_union`/`array_remove` are atomic set mutations on one
/// field, safe under concurrent writers.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    async fn get(&self, path: &str) -> Result<Option<Fields>, StoreError>;

    /// Full overwrite; creates the document when missing.
    async fn set(&self, path: &str, fields: Fields) -> Result<(), StoreError>;

    /// Merge-upsert: listed fields replace their counterparts, other fields
    /// keep their stored values.
    async fn merge(&self, path: &str, fields: Fields) -> Result<(), StoreError>;

    /// Idempotent; deleting a document does not touch its subcollections.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Creates a document under `collection` with a fresh auto-id.
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Immediate children of `collection` matching `query`. When an
    /// `order_by` field is requested, documents lacking that field are
    /// excluded from the result.
    async fn query(&self, collection: &str, query: Query)
    -> Result<Vec<(String, Fields)>, StoreError>;

    /// Adds `value` to the array field unless already present. The document
    /// must exist; a missing field becomes a one-element array.
    async fn array_union(&self, path: &str, field: &str, value: Value) -> Result<(), StoreError>;

    /// Removes every element equal to `value`. The document must exist; a
    /// missing field is a no-op.
    async fn array_remove(&self, path: &str, field: &str, value: Value) -> Result<(), StoreError>;

    /// Applies every write in the batch atomically: either all writes take
    /// effect or none do.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    FieldEquals(String, Value),
    ArrayContains(String, Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Option<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            filter: Some(Filter::FieldEquals(field.into(), value.into())),
            ..Self::default()
        }
    }

    pub fn array_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            filter: Some(Filter::ArrayContains(field.into(), value.into())),
            ..Self::default()
        }
    }

    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some((field.into(), Direction::Descending));
        self
    }

    pub fn order_by_asc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some((field.into(), Direction::Ascending));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone)]
pub enum Write {
    Set {
        path: String,
        fields: Fields,
    },
    Merge {
        path: String,
        fields: Fields,
    },
    Delete {
        path: String,
    },
    ArrayUnion {
        path: String,
        field: String,
        value: Value,
    },
    ArrayRemove {
        path: String,
        field: String,
        value: Value,
    },
}

/// Ordered set of writes applied as one atomic unit.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: impl Into<String>, fields: Fields) -> Self {
        self.writes.push(Write::Set {
            path: path.into(),
            fields,
        });
        self
    }

    pub fn merge(mut self, path: impl Into<String>, fields: Fields) -> Self {
        self.writes.push(Write::Merge {
            path: path.into(),
            fields,
        });
        self
    }

    pub fn delete(mut self, path: impl Into<String>) -> Self {
        self.writes.push(Write::Delete { path: path.into() });
        self
    }

    pub fn array_union(
        mut self,
        path: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.writes.push(Write::ArrayUnion {
            path: path.into(),
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn array_remove(
        mut self,
        path: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.writes.push(Write::ArrayRemove {
            path: path.into(),
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid document path '{0}'")]
    BadPath(String),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("document codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Client-side auto-id in the hosted store's format: 20 alphanumeric chars.
pub fn auto_id() -> String {
    use rand::Rng;

    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..20)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

pub fn encode<T: Serialize>(record: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Backend(format!(
            "record did not encode to an object: {other}"
        ))),
    }
}

pub fn decode<T: DeserializeOwned>(fields: Fields) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(fields))?)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn auto_id__should_produce_twenty_alphanumeric_chars() {
        // When
        let id = auto_id();

        // Then
        assert_eq!(id.len(), 20);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn query_builder__should_compose_filter_order_and_limit() {
        // When
        let query = Query::array_contains("subscriptions", "d1")
            .order_by_desc("date")
            .limit(1);

        // Then
        assert_eq!(
            query.filter,
            Some(Filter::ArrayContains(
                "subscriptions".to_string(),
                Value::String("d1".to_string())
            ))
        );
        assert_eq!(
            query.order_by,
            Some(("date".to_string(), Direction::Descending))
        );
        assert_eq!(query.limit, Some(1));
    }

    #[test]
    fn encode__should_reject_non_object_values() {
        // When
        let result = encode(&42);

        // Then
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }
}

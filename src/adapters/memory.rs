use crate::ports::store::{
    DocumentStore, Fields, Filter, Query, StoreError, Write, WriteBatch, auto_id,
};

use async_trait::async_trait;
use serde_json::Value;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// In-process document store. One mutex linearizes every operation, so
/// single-document writes, array mutations, and whole batches are atomic;
/// hosted-store adapters implement the same port against the remote API.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<String, Fields>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Fields>, StoreError> {
        require_document_path(path)?;
        let docs = self.docs.lock().expect("store lock");
        Ok(docs.get(path).cloned())
    }

    async fn set(&self, path: &str, fields: Fields) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().expect("store lock");
        apply_write(
            &mut docs,
            Write::Set {
                path: path.to_string(),
                fields,
            },
        )
    }

    async fn merge(&self, path: &str, fields: Fields) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().expect("store lock");
        apply_write(
            &mut docs,
            Write::Merge {
                path: path.to_string(),
                fields,
            },
        )
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().expect("store lock");
        apply_write(
            &mut docs,
            Write::Delete {
                path: path.to_string(),
            },
        )
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        require_collection_path(collection)?;
        let mut docs = self.docs.lock().expect("store lock");
        let mut id = auto_id();
        while docs.contains_key(&format!("{collection}/{id}")) {
            id = auto_id();
        }
        docs.insert(format!("{collection}/{id}"), fields);
        Ok(id)
    }

    async fn query(
        &self,
        collection: &str,
        query: Query,
    ) -> Result<Vec<(String, Fields)>, StoreError> {
        require_collection_path(collection)?;
        let docs = self.docs.lock().expect("store lock");
        let prefix = format!("{collection}/");

        let mut matches: Vec<(String, Fields)> = docs
            .iter()
            .filter_map(|(path, fields)| {
                let id = path.strip_prefix(&prefix)?;
                if id.contains('/') {
                    return None;
                }
                if !matches_filter(fields, query.filter.as_ref()) {
                    return None;
                }
                Some((id.to_string(), fields.clone()))
            })
            .collect();

        if let Some((field, direction)) = &query.order_by {
            // Documents lacking the ordering field are excluded, per the
            // store contract.
            matches.retain(|(_, fields)| fields.contains_key(field));
            match direction {
                crate::ports::store::Direction::Ascending => {
                    matches.sort_by(|(_, a), (_, b)| compare_values(&a[field], &b[field]));
                }
                crate::ports::store::Direction::Descending => {
                    matches.sort_by(|(_, a), (_, b)| compare_values(&b[field], &a[field]));
                }
            }
        }

        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }

        Ok(matches)
    }

    async fn array_union(&self, path: &str, field: &str, value: Value) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().expect("store lock");
        apply_write(
            &mut docs,
            Write::ArrayUnion {
                path: path.to_string(),
                field: field.to_string(),
                value,
            },
        )
    }

    async fn array_remove(&self, path: &str, field: &str, value: Value) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().expect("store lock");
        apply_write(
            &mut docs,
            Write::ArrayRemove {
                path: path.to_string(),
                field: field.to_string(),
                value,
            },
        )
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().expect("store lock");
        // Stage against a copy so a failing write leaves nothing applied.
        let mut staged = docs.clone();
        for write in batch.writes {
            apply_write(&mut staged, write)?;
        }
        *docs = staged;
        Ok(())
    }
}

fn apply_write(docs: &mut BTreeMap<String, Fields>, write: Write) -> Result<(), StoreError> {
    match write {
        Write::Set { path, fields } => {
            require_document_path(&path)?;
            docs.insert(path, fields);
            Ok(())
        }
        Write::Merge { path, fields } => {
            require_document_path(&path)?;
            let doc = docs.entry(path).or_default();
            for (key, value) in fields {
                doc.insert(key, value);
            }
            Ok(())
        }
        Write::Delete { path } => {
            require_document_path(&path)?;
            docs.remove(&path);
            Ok(())
        }
        Write::ArrayUnion { path, field, value } => {
            require_document_path(&path)?;
            let doc = docs
                .get_mut(&path)
                .ok_or_else(|| StoreError::NotFound(path.clone()))?;
            match doc.get_mut(&field) {
                None => {
                    doc.insert(field, Value::Array(vec![value]));
                    Ok(())
                }
                Some(Value::Array(items)) => {
                    if !items.contains(&value) {
                        items.push(value);
                    }
                    Ok(())
                }
                Some(_) => Err(StoreError::Backend(format!(
                    "field '{field}' of '{path}' is not an array"
                ))),
            }
        }
        Write::ArrayRemove { path, field, value } => {
            require_document_path(&path)?;
            let doc = docs
                .get_mut(&path)
                .ok_or_else(|| StoreError::NotFound(path.clone()))?;
            match doc.get_mut(&field) {
                None => Ok(()),
                Some(Value::Array(items)) => {
                    items.retain(|item| item != &value);
                    Ok(())
                }
                Some(_) => Err(StoreError::Backend(format!(
                    "field '{field}' of '{path}' is not an array"
                ))),
            }
        }
    }
}

fn matches_filter(fields: &Fields, filter: Option<&Filter>) -> bool {
    match filter {
        None => true,
        Some(Filter::FieldEquals(field, value)) => fields.get(field) == Some(value),
        Some(Filter::ArrayContains(field, value)) => match fields.get(field) {
            Some(Value::Array(items)) => items.contains(value),
            _ => false,
        },
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn require_document_path(path: &str) -> Result<(), StoreError> {
    let segments = validate_segments(path)?;
    if segments % 2 != 0 {
        return Err(StoreError::BadPath(path.to_string()));
    }
    Ok(())
}

fn require_collection_path(path: &str) -> Result<(), StoreError> {
    let segments = validate_segments(path)?;
    if segments % 2 != 1 {
        return Err(StoreError::BadPath(path.to_string()));
    }
    Ok(())
}

fn validate_segments(path: &str) -> Result<usize, StoreError> {
    if path.is_empty() {
        return Err(StoreError::BadPath(path.to_string()));
    }
    let mut count = 0;
    for segment in path.split('/') {
        if segment.is_empty() {
            return Err(StoreError::BadPath(path.to_string()));
        }
        count += 1;
    }
    Ok(count)
}

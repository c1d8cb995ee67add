use crate::library::communication::event::{EntryFields, IndexDefinition, MaterializationSink};
use crate::library::EmptyResult;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
enum MockSinkError {
    #[error("simulated write failure for {0}")]
    WriteFailed(String),
    #[error("Index already exists")]
    IndexExists,
}

/// In-memory record store with hash-like upsert semantics
#[derive(Default)]
pub struct MockSink {
    records: Mutex<BTreeMap<String, EntryFields>>,
    failing_keys: Mutex<HashSet<String>>,
    indices: Mutex<Vec<IndexDefinition>>,
}

impl MockSink {
    /// Makes every subsequent write to the given key fail
    pub fn fail_writes_to(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_owned());
    }

    pub fn record(&self, key: &str) -> Option<EntryFields> {
        self.records.lock().unwrap().get(key).cloned()
    }

    pub fn written_keys(&self) -> Vec<String> {
        self.records.lock().unwrap().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn indices(&self) -> Vec<IndexDefinition> {
        self.indices.lock().unwrap().clone()
    }
}

#[async_trait]
impl MaterializationSink for MockSink {
    async fn upsert_fields(&self, key: &str, fields: &EntryFields) -> EmptyResult {
        if self.failing_keys.lock().unwrap().contains(key) {
            return Err(MockSinkError::WriteFailed(key.to_owned()).into());
        }

        let mut records = self.records.lock().unwrap();
        let record = records.entry(key.to_owned()).or_default();

        for (field, value) in fields.iter() {
            record.insert(field.clone(), value.clone());
        }

        Ok(())
    }

    async fn create_index(&self, definition: &IndexDefinition) -> EmptyResult {
        let mut indices = self.indices.lock().unwrap();

        if indices.iter().any(|index| index.name == definition.name) {
            return Err(MockSinkError::IndexExists.into());
        }

        indices.push(definition.clone());
        Ok(())
    }
}

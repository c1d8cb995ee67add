use super::EntryFields;
use crate::library::EmptyResult;
use async_trait::async_trait;

/// Type of a searchable field within an [`IndexDefinition`]
#[derive(Debug, Clone, PartialEq)]
pub enum IndexFieldKind {
    /// Full-text field with a relevance weight
    Text {
        /// Relevance multiplier for matches in this field
        weight: f64,
    },
    /// Exact-match field holding comma separated tags
    Tag,
}

/// Single searchable field of an index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexField {
    /// Name of the record field
    pub name: String,
    /// How the field is indexed
    pub kind: IndexFieldKind,
}

impl IndexField {
    /// Full-text field with a weight of `1.0`
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: IndexFieldKind::Text { weight: 1.0 },
        }
    }

    /// Tag field
    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: IndexFieldKind::Tag,
        }
    }
}

/// Search index over all records whose key starts with a given prefix
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    /// Name of the index
    pub name: String,
    /// Key prefix of indexed records
    pub prefix: String,
    /// Searchable fields
    pub fields: Vec<IndexField>,
}

/// Keyed store receiving one record per successfully processed entry
#[async_trait]
pub trait MaterializationSink {
    /// Writes all fields to the record at `key`, overwriting previous values of the same fields.
    ///
    /// Repeating the call with identical arguments must yield the same record.
    async fn upsert_fields(&self, key: &str, fields: &EntryFields) -> EmptyResult;

    /// Creates a search index over the records. Fails if the index already exists.
    async fn create_index(&self, definition: &IndexDefinition) -> EmptyResult;
}

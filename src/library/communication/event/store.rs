use super::{
    ClaimOptions, ConsumerGroupDescriptor, EntryFields, EntryId, QueueDescriptor, StreamEntry,
};
use crate::library::BoxedError;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by an [`EntryStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    /// Consumer group creation hit an existing group of the same name
    #[error("consumer group already exists")]
    GroupAlreadyExists,

    /// Store replied with data that does not follow the stream protocol
    #[error("malformed reply from store: {0}")]
    MalformedReply(String),

    /// Any other failure of the underlying store
    #[error("store operation failed")]
    Backend(#[source] BoxedError),
}

impl StoreError {
    /// Wraps an arbitrary error as a [`StoreError::Backend`]
    pub fn backend<E>(error: E) -> Self
    where
        E: Into<BoxedError>,
    {
        Self::Backend(error.into())
    }
}

/// Aggregate view of a group's pending entries list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingSummary {
    /// Total number of delivered but unacknowledged entries
    pub count: usize,
    /// Smallest pending entry id
    pub lowest: Option<EntryId>,
    /// Largest pending entry id
    pub highest: Option<EntryId>,
}

/// Entry that has been delivered to a consumer but not yet acknowledged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    /// Identifier of the pending entry
    pub id: EntryId,
    /// Consumer which currently owns the entry
    pub consumer: String,
    /// Time since the entry was last delivered
    pub idle: Duration,
    /// Number of times the entry has been delivered
    pub deliveries: u64,
}

/// Append-only log with consumer group tracking
///
/// Implementations guarantee that a never-before-delivered entry is handed out to exactly
/// one consumer of a group by [`claim_new`](EntryStore::claim_new). Entries stay in the
/// group's pending entries list until they are [acknowledged](EntryStore::acknowledge) or
/// moved to another consumer using [`claim`](EntryStore::claim).
#[async_trait]
pub trait EntryStore {
    /// Creates a consumer group on the stream, creating the stream if it does not exist.
    ///
    /// Returns [`StoreError::GroupAlreadyExists`] if a group with the same name is present.
    async fn create_group(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
    ) -> Result<(), StoreError>;

    /// Blocks for at most `options.block` waiting for entries never delivered to any consumer of the group.
    ///
    /// An empty batch signals that the timeout elapsed on an idle stream.
    async fn claim_new(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        options: &ClaimOptions,
    ) -> Result<Vec<StreamEntry>, StoreError>;

    /// Removes an entry from the group's pending entries list
    async fn acknowledge(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        id: EntryId,
    ) -> Result<(), StoreError>;

    /// Summarizes the pending entries list of a group
    async fn pending_summary(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
    ) -> Result<PendingSummary, StoreError>;

    /// Lists up to `count` pending entries in ascending id order
    async fn pending_range(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        count: usize,
    ) -> Result<Vec<PendingEntry>, StoreError>;

    /// Transfers ownership of pending entries idle for at least `min_idle` to `consumer`
    /// and returns those that were actually claimed.
    async fn claim(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        min_idle: Duration,
        ids: &[EntryId],
    ) -> Result<Vec<StreamEntry>, StoreError>;

    /// Appends a new entry with a store-assigned identifier
    async fn append(
        &self,
        queue: &QueueDescriptor,
        fields: &EntryFields,
    ) -> Result<EntryId, StoreError>;
}

use crate::library::communication::event::{
    ClaimOptions, ConsumerGroupDescriptor, EntryFields, EntryId, EntryStore, PendingEntry,
    PendingSummary, QueueDescriptor, QueueLocation, StoreError, StreamEntry,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};

#[derive(Debug, Error)]
enum MockStoreError {
    #[error("ERR invalid stream name")]
    InvalidStream,
    #[error("NOGROUP no such key or consumer group")]
    NoGroup,
    #[error("simulated connection loss")]
    ConnectionLost,
    #[error("simulated acknowledgement failure")]
    AcknowledgementFailed,
}

struct MockPending {
    consumer: String,
    delivered_at: Instant,
    deliveries: u64,
}

#[derive(Default)]
struct MockGroup {
    last_delivered: EntryId,
    pending: BTreeMap<EntryId, MockPending>,
}

#[derive(Default)]
struct MockStream {
    entries: Vec<StreamEntry>,
    groups: HashMap<String, MockGroup>,
}

impl MockStream {
    fn last_id(&self) -> EntryId {
        self.entries
            .last()
            .map(StreamEntry::id)
            .unwrap_or_default()
    }
}

/// In-memory entry store following the semantics of redis streams
///
/// Claims on an idle stream wait for the full block duration which, in combination with
/// a paused tokio clock, allows testing timeouts without actually waiting.
#[derive(Default)]
pub struct MockEntryStore {
    streams: Mutex<HashMap<String, MockStream>>,
    failing_acknowledgements: Mutex<HashSet<EntryId>>,
    failing_claims: Mutex<bool>,
}

impl MockEntryStore {
    /// Makes every subsequent acknowledgement of the given entry fail
    pub fn fail_acknowledgement(&self, id: EntryId) {
        self.failing_acknowledgements.lock().unwrap().insert(id);
    }

    /// Makes every subsequent claim of new entries fail as if the connection was lost
    pub fn fail_claims(&self) {
        *self.failing_claims.lock().unwrap() = true;
    }

    pub fn has_group(&self, queue: &QueueDescriptor, group: &ConsumerGroupDescriptor) -> bool {
        self.streams
            .lock()
            .unwrap()
            .get(queue.key())
            .map(|stream| stream.groups.contains_key(group.identifier()))
            .unwrap_or(false)
    }

    pub fn entries(&self, queue: &QueueDescriptor) -> Vec<StreamEntry> {
        self.streams
            .lock()
            .unwrap()
            .get(queue.key())
            .map(|stream| stream.entries.clone())
            .unwrap_or_default()
    }

    pub fn entry(&self, queue: &QueueDescriptor, id: EntryId) -> Option<StreamEntry> {
        self.entries(queue).into_iter().find(|entry| entry.id() == id)
    }

    pub fn pending_ids(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
    ) -> Vec<EntryId> {
        self.with_group(queue, group, |_, group| {
            group.pending.keys().copied().collect()
        })
        .unwrap_or_default()
    }

    pub fn pending_owner(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        id: EntryId,
    ) -> Option<String> {
        self.with_group(queue, group, |_, group| {
            group.pending.get(&id).map(|p| p.consumer.clone())
        })
        .ok()
        .flatten()
    }

    fn with_group<T>(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        f: impl FnOnce(&[StreamEntry], &mut MockGroup) -> T,
    ) -> Result<T, StoreError> {
        let mut streams = self.streams.lock().unwrap();
        let stream = streams
            .get_mut(queue.key())
            .ok_or_else(|| StoreError::backend(MockStoreError::NoGroup))?;
        let group = stream
            .groups
            .get_mut(group.identifier())
            .ok_or_else(|| StoreError::backend(MockStoreError::NoGroup))?;

        Ok(f(&stream.entries, group))
    }

    fn deliver(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        batch_size: usize,
    ) -> Result<Vec<StreamEntry>, StoreError> {
        self.with_group(queue, group, |entries, group| {
            let batch: Vec<StreamEntry> = entries
                .iter()
                .filter(|entry| entry.id() > group.last_delivered)
                .take(batch_size)
                .cloned()
                .collect();

            for entry in batch.iter() {
                group.last_delivered = entry.id();
                group.pending.insert(
                    entry.id(),
                    MockPending {
                        consumer: consumer.to_owned(),
                        delivered_at: Instant::now(),
                        deliveries: 1,
                    },
                );
            }

            batch
        })
    }
}

#[async_trait]
impl EntryStore for MockEntryStore {
    async fn create_group(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
    ) -> Result<(), StoreError> {
        if queue.key().is_empty() {
            return Err(StoreError::backend(MockStoreError::InvalidStream));
        }

        let mut streams = self.streams.lock().unwrap();
        let stream = streams.entry(queue.key().to_owned()).or_default();

        if stream.groups.contains_key(group.identifier()) {
            return Err(StoreError::GroupAlreadyExists);
        }

        let last_delivered = match group.start() {
            QueueLocation::Head => EntryId::default(),
            QueueLocation::Tail => stream.last_id(),
        };

        stream.groups.insert(
            group.identifier().to_owned(),
            MockGroup {
                last_delivered,
                pending: BTreeMap::new(),
            },
        );

        Ok(())
    }

    async fn claim_new(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        options: &ClaimOptions,
    ) -> Result<Vec<StreamEntry>, StoreError> {
        if *self.failing_claims.lock().unwrap() {
            return Err(StoreError::backend(MockStoreError::ConnectionLost));
        }

        let batch = self.deliver(queue, group, consumer, options.batch_size)?;

        if !batch.is_empty() {
            return Ok(batch);
        }

        sleep(options.block).await;
        self.deliver(queue, group, consumer, options.batch_size)
    }

    async fn acknowledge(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        id: EntryId,
    ) -> Result<(), StoreError> {
        if self.failing_acknowledgements.lock().unwrap().contains(&id) {
            return Err(StoreError::backend(MockStoreError::AcknowledgementFailed));
        }

        self.with_group(queue, group, |_, group| {
            group.pending.remove(&id);
        })
    }

    async fn pending_summary(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
    ) -> Result<PendingSummary, StoreError> {
        self.with_group(queue, group, |_, group| PendingSummary {
            count: group.pending.len(),
            lowest: group.pending.keys().next().copied(),
            highest: group.pending.keys().next_back().copied(),
        })
    }

    async fn pending_range(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        count: usize,
    ) -> Result<Vec<PendingEntry>, StoreError> {
        self.with_group(queue, group, |_, group| {
            group
                .pending
                .iter()
                .take(count)
                .map(|(id, pending)| PendingEntry {
                    id: *id,
                    consumer: pending.consumer.clone(),
                    idle: pending.delivered_at.elapsed(),
                    deliveries: pending.deliveries,
                })
                .collect()
        })
    }

    async fn claim(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        min_idle: Duration,
        ids: &[EntryId],
    ) -> Result<Vec<StreamEntry>, StoreError> {
        self.with_group(queue, group, |entries, group| {
            let mut claimed = Vec::new();

            for id in ids {
                let pending = match group.pending.get_mut(id) {
                    Some(pending) if pending.delivered_at.elapsed() >= min_idle => pending,
                    _ => continue,
                };

                if let Some(entry) = entries.iter().find(|entry| entry.id() == *id) {
                    pending.consumer = consumer.to_owned();
                    pending.delivered_at = Instant::now();
                    pending.deliveries += 1;
                    claimed.push(entry.clone());
                }
            }

            claimed
        })
    }

    async fn append(
        &self,
        queue: &QueueDescriptor,
        fields: &EntryFields,
    ) -> Result<EntryId, StoreError> {
        let mut streams = self.streams.lock().unwrap();
        let stream = streams.entry(queue.key().to_owned()).or_default();

        let id = EntryId::new(stream.last_id().millis() + 1, 0);
        stream.entries.push(StreamEntry::new(id, fields.clone()));

        Ok(id)
    }
}

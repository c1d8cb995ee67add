//! Materializes stream entries into indexed records
//!
//! On startup the full-text index is created (if it does not exist yet) and the consumer
//! group is registered. Afterwards, a [`ConsumerJob`](job::ConsumerJob) claims and processes
//! entries under a process-unique consumer name until the process is terminated or the store
//! becomes unavailable.

use crate::domain::tweet_index;
use crate::harness::{DummyResourceHandleProvider, Heart, Module};
use crate::library::communication::event::{
    ensure_group, generate_consumer_identifier, ConsumerGroupDescriptor, ConsumerIdentifier,
    EntryStore, GroupRegistration, IndexDefinition, MaterializationSink, QueueDescriptor,
    StoreError,
};
use crate::library::communication::implementation::redis::{RedisEntryStore, RedisSink};
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use jatsl::JobScheduler;
use redis::RedisError;
use thiserror::Error;
use tracing::{info, instrument, warn};

mod job;
mod options;

use job::ConsumerJob;
pub use options::Options;

/// Errors which stop a consumer
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Redis server could not be reached
    #[error("failed to connect to redis")]
    Connection(#[from] RedisError),
    /// Consumer group could neither be created nor found
    #[error("failed to register consumer group")]
    GroupRegistration(#[source] StoreError),
    /// Claiming new entries failed
    #[error("failed to claim new entries")]
    Consumption(#[source] StoreError),
}

/// Prepares the store and sink for consumption
///
/// Index creation is best-effort as the index usually exists already, while a missing consumer
/// group makes consumption impossible and is thus returned as an error.
#[instrument(skip(store, sink, index), fields(stream = queue.key(), group = group.identifier()))]
pub async fn initialize<S, M>(
    store: &S,
    sink: &M,
    index: &IndexDefinition,
    queue: &QueueDescriptor,
    group: &ConsumerGroupDescriptor,
) -> Result<GroupRegistration, ConsumerError>
where
    S: EntryStore + Send + Sync,
    M: MaterializationSink + Send + Sync,
{
    match sink.create_index(index).await {
        Ok(()) => info!(index = %index.name, "Created index"),
        Err(error) => warn!(index = %index.name, %error, "Unable to create index"),
    }

    ensure_group(store, queue, group)
        .await
        .map_err(ConsumerError::GroupRegistration)
}

/// Module implementation
pub struct Consumer {
    options: Options,
    consumer: ConsumerIdentifier,
}

impl Consumer {
    /// Creates a new instance with a freshly generated consumer name
    pub fn new(options: Options) -> Self {
        Self {
            options,
            consumer: generate_consumer_identifier(),
        }
    }
}

#[async_trait]
impl Module for Consumer {
    async fn pre_startup(&mut self) -> EmptyResult {
        let connector = self.options.redis.connector(DummyResourceHandleProvider::new());
        let store = RedisEntryStore::new(connector.owned().await.map_err(ConsumerError::from)?);
        let sink = RedisSink::new(connector.shared().await.map_err(ConsumerError::from)?);

        let index = tweet_index(
            &self.options.materialization.index_name,
            &self.options.materialization.key_prefix,
        );

        initialize(
            &store,
            &sink,
            &index,
            &self.options.stream.queue(),
            &self.options.group.group(),
        )
        .await?;

        Ok(())
    }

    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let (heart, stone) = Heart::new();

        info!(consumer = %self.consumer, "Starting consumer");
        let job = ConsumerJob::new(self.options.clone(), self.consumer.clone(), stone);
        scheduler.spawn_job(job).await;

        Ok(Some(heart))
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::domain::{TWEET_INDEX_NAME, TWEET_KEY_PREFIX};
    use crate::library::communication::implementation::mock::{MockEntryStore, MockSink};

    struct Fixture {
        store: MockEntryStore,
        sink: MockSink,
        index: IndexDefinition,
        queue: QueueDescriptor,
        group: ConsumerGroupDescriptor,
    }

    impl Fixture {
        fn new(stream: &str) -> Self {
            Self {
                store: MockEntryStore::default(),
                sink: MockSink::default(),
                index: tweet_index(TWEET_INDEX_NAME, TWEET_KEY_PREFIX),
                queue: QueueDescriptor::new(stream),
                group: ConsumerGroupDescriptor::at_tail("grp1"),
            }
        }

        async fn initialize(&self) -> Result<GroupRegistration, ConsumerError> {
            initialize(&self.store, &self.sink, &self.index, &self.queue, &self.group).await
        }
    }

    #[tokio::test]
    async fn create_index_and_group() {
        let fixture = Fixture::new("tweets");

        let registration = fixture.initialize().await.unwrap();

        assert_eq!(registration, GroupRegistration::Created);
        assert_eq!(fixture.sink.indices(), vec![fixture.index.clone()]);
        assert!(fixture.store.has_group(&fixture.queue, &fixture.group));
    }

    #[tokio::test]
    async fn tolerate_existing_index_and_group() {
        let fixture = Fixture::new("tweets");
        fixture.initialize().await.unwrap();

        let registration = fixture.initialize().await.unwrap();

        assert_eq!(registration, GroupRegistration::AlreadyExisted);
        assert_eq!(fixture.sink.indices().len(), 1);
    }

    #[tokio::test]
    async fn fail_when_group_can_not_be_registered() {
        let fixture = Fixture::new("");

        let result = fixture.initialize().await;

        assert!(matches!(result, Err(ConsumerError::GroupRegistration(_))));
    }
}

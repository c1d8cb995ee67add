//! Recovers entries which consumers claimed but never acknowledged

use crate::harness::{DummyResourceHandleProvider, Heart, Module};
use crate::library::communication::event::ensure_group;
use crate::library::communication::implementation::redis::RedisEntryStore;
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use jatsl::JobScheduler;
use tracing::info;

mod job;
mod options;

use job::ReclaimJob;
pub use options::Options;

/// Module implementation
pub struct Reclaim {
    options: Options,
}

impl Reclaim {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Module for Reclaim {
    async fn pre_startup(&mut self) -> EmptyResult {
        let connector = self.options.redis.connector(DummyResourceHandleProvider::new());
        let store = RedisEntryStore::new(connector.owned().await?);

        ensure_group(
            &store,
            &self.options.stream.queue(),
            &self.options.group.group(),
        )
        .await?;

        Ok(())
    }

    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let (heart, _) = Heart::new();

        info!(
            consumer = %self.options.monitoring_consumer_name,
            interval_secs = self.options.interval.as_secs(),
            "Starting reclaimer"
        );
        scheduler.spawn_job(ReclaimJob::new(self.options.clone())).await;

        Ok(Some(heart))
    }
}

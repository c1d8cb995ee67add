use super::{ConsumerError, Options};
use crate::harness::HeartStone;
use crate::library::communication::event::{
    cancellation, ConsumerIdentifier, ConsumptionLoop, EntryProcessor, RandomRejection,
};
use crate::library::communication::implementation::redis::{RedisEntryStore, RedisSink};
use crate::library::communication::ErrorChain;
use crate::library::EmptyResult;
use async_trait::async_trait;
use jatsl::{Job, JobManager};
use std::sync::Arc;
use tracing::{error, info};

/// Runs a [`ConsumptionLoop`] until the job is terminated or the store fails
///
/// Claims are issued over a dedicated connection as they block for up to the configured duration.
/// Records are written over the shared connection. A failing store kills the module's heart.
pub struct ConsumerJob {
    options: Options,
    consumer: ConsumerIdentifier,
    heart_stone: HeartStone,
}

impl ConsumerJob {
    /// Creates a new instance claiming entries as `consumer`
    pub fn new(options: Options, consumer: ConsumerIdentifier, heart_stone: HeartStone) -> Self {
        Self {
            options,
            consumer,
            heart_stone,
        }
    }
}

#[async_trait]
impl Job for ConsumerJob {
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let connector = self.options.redis.connector(Arc::new(manager.clone()));
        let store = Arc::new(RedisEntryStore::new(
            connector.owned().await.map_err(ConsumerError::from)?,
        ));
        let sink = Arc::new(RedisSink::new(
            connector.shared().await.map_err(ConsumerError::from)?,
        ));

        let mut processor = EntryProcessor::new(
            store.clone(),
            sink,
            self.options.stream.queue(),
            self.options.group.group(),
            self.options.materialization.key_prefix.clone(),
        );

        if self.options.skip_rate > 0.0 {
            info!(rate = self.options.skip_rate, "Randomly skipping entries");
            processor = processor.with_admission(RandomRejection::new(self.options.skip_rate));
        }

        let consumption = ConsumptionLoop::new(
            store,
            processor,
            self.consumer.clone(),
            self.options.claim_options(),
        );

        let (cancellation_handle, signal) = cancellation();
        let termination = manager.termination_signal();
        let watchdog = tokio::spawn(async move {
            termination.await;
            cancellation_handle.cancel();
        });

        manager.ready().await;

        let result = consumption.run(&signal).await;
        watchdog.abort();

        match result {
            Ok(report) => {
                info!(?report, "Consumer stopped");
                Ok(())
            }
            Err(error) => {
                let error = ConsumerError::Consumption(error);
                error!(error = %ErrorChain::of(&error), "Consumer failed");

                self.heart_stone
                    .clone()
                    .kill(format!("consumer {} failed", self.consumer))
                    .await;

                Err(error.into())
            }
        }
    }
}

use super::Options;
use crate::library::communication::event::{EntryProcessor, Reclaimer};
use crate::library::communication::implementation::redis::{RedisEntryStore, RedisSink};
use crate::library::communication::ErrorChain;
use crate::library::EmptyResult;
use async_trait::async_trait;
use jatsl::{Job, JobManager};
use std::sync::Arc;
use tokio::time::interval;
use tracing::{error, info, warn};

/// Periodically runs reclaim cycles until the job is terminated
///
/// A failed cycle is logged and retried on the next tick. Connection failures are reported to
/// the job manager which restarts the job with fresh connections.
pub struct ReclaimJob {
    options: Options,
}

impl ReclaimJob {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Job for ReclaimJob {
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let connector = self.options.redis.connector(Arc::new(manager.clone()));
        let store = Arc::new(RedisEntryStore::new(connector.shared().await?));
        let sink = Arc::new(RedisSink::new(connector.shared().await?));

        let processor = EntryProcessor::new(
            store.clone(),
            sink,
            self.options.stream.queue(),
            self.options.group.group(),
            self.options.materialization.key_prefix.clone(),
        );

        let reclaimer = Reclaimer::new(
            store,
            processor,
            self.options.monitoring_consumer_name.clone(),
            self.options.policy(),
        );

        manager.ready().await;

        let termination = manager.termination_signal();
        tokio::pin!(termination);

        let mut ticker = interval(self.options.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {},
                _ = &mut termination => break,
            }

            match reclaimer.reclaim().await {
                Ok(report) => match serde_json::to_string(&report) {
                    Ok(json) => info!(report = %json, "Reclaim cycle finished"),
                    Err(error) => warn!(?error, ?report, "Unable to serialize reclaim report"),
                },
                Err(error) => error!(error = %ErrorChain::of(&error), "Reclaim cycle failed"),
            }
        }

        Ok(())
    }
}

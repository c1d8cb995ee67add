use super::{
    ConsumerIdentifier, EntryId, EntryProcessor, EntryStore, MaterializationSink,
    ProcessingOutcome, StoreError,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Extension of the stream key under which entries exceeding the delivery limit are parked
pub const DEAD_LETTER_EXTENSION: &str = "dead-letter";

/// Rules deciding which pending entries are reclaimed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReclaimPolicy {
    /// Minimum time since the last delivery before an entry is considered abandoned
    pub min_idle: Duration,
    /// Maximum number of pending entries inspected per cycle
    pub batch_size: usize,
    /// Entries already delivered this many times are moved to the dead letter stream instead
    pub max_deliveries: Option<u64>,
}

impl Default for ReclaimPolicy {
    fn default() -> Self {
        Self {
            min_idle: Duration::from_secs(60),
            batch_size: 100,
            max_deliveries: None,
        }
    }
}

/// Counters describing a single reclaim cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReclaimReport {
    /// Pending entries of the group when the cycle started
    pub pending: usize,
    /// Entries transferred to the recovery consumer
    pub claimed: usize,
    /// Claimed entries that were processed and acknowledged
    pub processed: usize,
    /// Claimed entries moved to the dead letter stream
    pub dead_lettered: usize,
    /// Wall time spent processing claimed entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_taken_secs: Option<f64>,
}

/// Recovers entries which have been delivered to a consumer but never acknowledged
///
/// Consumers that crash or fail to process an entry leave it in the group's pending entries
/// list. Each [`reclaim`](Reclaimer::reclaim) cycle transfers entries idle for longer than
/// [`ReclaimPolicy::min_idle`] to a dedicated recovery consumer and reprocesses them.
pub struct Reclaimer<S, M> {
    store: Arc<S>,
    processor: EntryProcessor<S, M>,
    consumer: ConsumerIdentifier,
    policy: ReclaimPolicy,
}

impl<S, M> Reclaimer<S, M>
where
    S: EntryStore + Send + Sync,
    M: MaterializationSink + Send + Sync,
{
    /// Creates a new instance claiming entries as `consumer`
    pub fn new(
        store: Arc<S>,
        processor: EntryProcessor<S, M>,
        consumer: ConsumerIdentifier,
        policy: ReclaimPolicy,
    ) -> Self {
        Self {
            store,
            processor,
            consumer,
            policy,
        }
    }

    /// Runs one reclaim cycle
    #[instrument(skip(self), fields(
        stream = self.processor.queue().key(),
        group = self.processor.group().identifier(),
        consumer = %self.consumer,
    ))]
    pub async fn reclaim(&self) -> Result<ReclaimReport, StoreError> {
        let queue = self.processor.queue();
        let group = self.processor.group();

        let summary = self.store.pending_summary(queue, group).await?;
        info!(pending = summary.count, "Inspected pending entries");

        let mut report = ReclaimReport {
            pending: summary.count,
            ..Default::default()
        };

        if summary.count == 0 {
            return Ok(report);
        }

        let pending = self
            .store
            .pending_range(queue, group, self.policy.batch_size)
            .await?;

        let deliveries: HashMap<EntryId, u64> = pending
            .iter()
            .filter(|entry| entry.idle >= self.policy.min_idle)
            .map(|entry| (entry.id, entry.deliveries))
            .collect();

        let candidates: Vec<EntryId> = pending
            .iter()
            .map(|entry| entry.id)
            .filter(|id| deliveries.contains_key(id))
            .collect();

        if candidates.is_empty() {
            info!(
                min_idle_secs = self.policy.min_idle.as_secs(),
                "No entries pending for longer than the idle threshold"
            );
            return Ok(report);
        }

        let claimed = self
            .store
            .claim(queue, group, &self.consumer, self.policy.min_idle, &candidates)
            .await?;

        report.claimed = claimed.len();
        info!(claimed = report.claimed, "Claimed abandoned entries");

        let start = Instant::now();

        for entry in claimed.iter() {
            let delivered = deliveries.get(&entry.id()).copied().unwrap_or_default();

            match self.policy.max_deliveries {
                Some(limit) if delivered >= limit => {
                    if self.dead_letter(entry.id(), entry.fields()).await {
                        report.dead_lettered += 1;
                    }
                }
                _ => {
                    if self.processor.process(entry).await == ProcessingOutcome::Acknowledged {
                        report.processed += 1;
                    }
                }
            }
        }

        report.time_taken_secs = Some(start.elapsed().as_secs_f64());
        debug!(?report, "Finished reclaim cycle");

        Ok(report)
    }

    /// Appends the entry to the dead letter stream and acknowledges it
    ///
    /// Appending and acknowledging are not atomic. When the acknowledgement fails the entry
    /// stays pending and a later cycle appends it to the dead letter stream a second time.
    async fn dead_letter(&self, id: EntryId, fields: &super::EntryFields) -> bool {
        let queue = self.processor.queue();
        let dead_letter_queue = queue.with_extension(DEAD_LETTER_EXTENSION);

        if let Err(error) = self.store.append(&dead_letter_queue, fields).await {
            error!(entry_id = %id, ?error, "Failed to move entry to dead letter stream");
            return false;
        }

        match self
            .store
            .acknowledge(queue, self.processor.group(), id)
            .await
        {
            Ok(()) => {
                warn!(entry_id = %id, stream = dead_letter_queue.key(), "Moved entry to dead letter stream");
                true
            }
            Err(error) => {
                error!(
                    entry_id = %id,
                    ?error,
                    "Failed to acknowledge dead lettered entry, it may be dead lettered again"
                );
                false
            }
        }
    }
}

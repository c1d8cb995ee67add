use super::{
    ClaimOptions, ConsumerIdentifier, EntryProcessor, EntryStore, MaterializationSink,
    ProcessingOutcome, StoreError,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, trace};

/// Creates a linked pair of cancellation handle and signal
pub fn cancellation() -> (CancellationHandle, CancellationSignal) {
    let (tx, rx) = watch::channel(false);
    (CancellationHandle(Arc::new(tx)), CancellationSignal(rx))
}

/// Requests termination of every loop observing the linked [`CancellationSignal`]
#[derive(Clone)]
pub struct CancellationHandle(Arc<watch::Sender<bool>>);

impl CancellationHandle {
    /// Flags the signal as cancelled
    pub fn cancel(&self) {
        // Fails only when all signals have been dropped in which case nobody is listening anymore
        self.0.send(true).ok();
    }
}

/// Cancellation flag observed by a [`ConsumptionLoop`] at every claim boundary
#[derive(Clone)]
pub struct CancellationSignal(watch::Receiver<bool>);

impl CancellationSignal {
    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }
}

/// Outcome counters of one or more claimed batches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumptionReport {
    /// Number of claims issued
    pub claims: usize,
    /// Claims that returned no entries before the block timeout elapsed
    pub idle_claims: usize,
    /// Entries processed and acknowledged
    pub acknowledged: usize,
    /// Entries that were not admitted
    pub skipped: usize,
    /// Entries whose processing failed
    pub failed: usize,
}

impl ConsumptionReport {
    fn record(&mut self, outcome: ProcessingOutcome) {
        match outcome {
            ProcessingOutcome::Acknowledged => self.acknowledged += 1,
            ProcessingOutcome::Skipped => self.skipped += 1,
            ProcessingOutcome::Failed => self.failed += 1,
        }
    }

    fn merge(&mut self, other: ConsumptionReport) {
        self.claims += other.claims;
        self.idle_claims += other.idle_claims;
        self.acknowledged += other.acknowledged;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Claims new entries of a stream on behalf of one consumer and hands them to an [`EntryProcessor`]
///
/// The loop alternates between claiming a batch and processing it, entry by entry in delivery
/// order. Per-entry failures never interrupt a batch; only store failures while claiming end the loop.
pub struct ConsumptionLoop<S, M> {
    store: Arc<S>,
    processor: EntryProcessor<S, M>,
    consumer: ConsumerIdentifier,
    options: ClaimOptions,
}

impl<S, M> ConsumptionLoop<S, M>
where
    S: EntryStore + Send + Sync,
    M: MaterializationSink + Send + Sync,
{
    /// Creates a new loop claiming entries from the processor's stream and group as `consumer`
    pub fn new(
        store: Arc<S>,
        processor: EntryProcessor<S, M>,
        consumer: ConsumerIdentifier,
        options: ClaimOptions,
    ) -> Self {
        Self {
            store,
            processor,
            consumer,
            options,
        }
    }

    /// Name under which entries are claimed
    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    /// Claims and processes batches until the signal is cancelled or the store fails
    #[instrument(skip(self, signal), fields(
        stream = self.processor.queue().key(),
        group = self.processor.group().identifier(),
        consumer = %self.consumer,
    ))]
    pub async fn run(&self, signal: &CancellationSignal) -> Result<ConsumptionReport, StoreError> {
        info!(
            batch_size = self.options.batch_size,
            block_ms = self.options.block.as_millis() as u64,
            "Starting consumption"
        );

        let mut report = ConsumptionReport::default();

        while !signal.is_cancelled() {
            report.merge(self.iterate().await?);
        }

        info!(?report, "Consumption cancelled");
        Ok(report)
    }

    /// Performs a single claim and processes the returned batch
    pub async fn iterate(&self) -> Result<ConsumptionReport, StoreError> {
        let mut report = ConsumptionReport {
            claims: 1,
            ..Default::default()
        };

        trace!("Claiming new entries");
        let entries = self
            .store
            .claim_new(
                self.processor.queue(),
                self.processor.group(),
                &self.consumer,
                &self.options,
            )
            .await?;

        if entries.is_empty() {
            trace!("No new entries within block duration");
            report.idle_claims = 1;
            return Ok(report);
        }

        debug!(count = entries.len(), "Processing claimed batch");

        for entry in entries.iter() {
            report.record(self.processor.process(entry).await);
        }

        info!(
            acknowledged = report.acknowledged,
            skipped = report.skipped,
            failed = report.failed,
            "Finished processing batch"
        );

        Ok(report)
    }
}

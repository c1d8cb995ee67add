use super::{
    Admission, AlwaysAdmit, ConsumerGroupDescriptor, EntryStore, MaterializationSink,
    QueueDescriptor, StoreError, StreamEntry,
};
use crate::library::BoxedError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Entry field from which the record key is derived
pub const KEY_FIELD: &str = "id";

/// Result of processing a single entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// Record was written and the entry acknowledged
    Acknowledged,
    /// Entry was not admitted and remains pending
    Skipped,
    /// Writing or acknowledging failed, the entry remains pending
    Failed,
}

#[derive(Debug, Error)]
enum ProcessingError {
    #[error("entry has no `{}` field to derive the record key from", KEY_FIELD)]
    MissingKeyField,

    #[error("failed to write record")]
    Materialization(#[source] BoxedError),

    #[error("failed to acknowledge entry")]
    Acknowledgement(#[source] StoreError),
}

/// Materializes stream entries into a [`MaterializationSink`] and acknowledges them
///
/// Every call to [`process`](EntryProcessor::process) is an isolated failure boundary:
/// faults are logged and reported as [`ProcessingOutcome::Failed`], the entry stays in the
/// pending entries list and no error ever leaves the processor.
pub struct EntryProcessor<S, M> {
    store: Arc<S>,
    sink: Arc<M>,
    queue: QueueDescriptor,
    group: ConsumerGroupDescriptor,
    key_prefix: String,
    admission: Box<dyn Admission>,
}

impl<S, M> EntryProcessor<S, M>
where
    S: EntryStore + Send + Sync,
    M: MaterializationSink + Send + Sync,
{
    /// Creates a new processor which admits every entry
    pub fn new(
        store: Arc<S>,
        sink: Arc<M>,
        queue: QueueDescriptor,
        group: ConsumerGroupDescriptor,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            sink,
            queue,
            group,
            key_prefix: key_prefix.into(),
            admission: Box::new(AlwaysAdmit),
        }
    }

    /// Replaces the admission strategy
    pub fn with_admission<A: Admission + 'static>(mut self, admission: A) -> Self {
        self.admission = Box::new(admission);
        self
    }

    /// Stream whose entries are processed
    pub fn queue(&self) -> &QueueDescriptor {
        &self.queue
    }

    /// Group against which entries are acknowledged
    pub fn group(&self) -> &ConsumerGroupDescriptor {
        &self.group
    }

    /// Key of the record materialized from the given entry
    pub fn record_key(&self, entry: &StreamEntry) -> Option<String> {
        entry
            .field(KEY_FIELD)
            .map(|id| format!("{}{}", self.key_prefix, id))
    }

    /// Writes the entry to the sink and acknowledges it
    #[instrument(skip(self, entry), fields(entry_id = %entry.id()))]
    pub async fn process(&self, entry: &StreamEntry) -> ProcessingOutcome {
        let key = match self.record_key(entry) {
            Some(key) => key,
            None => {
                let error = ProcessingError::MissingKeyField;
                warn!(%error, outcome = ?ProcessingOutcome::Failed, "Failed to process entry");
                return ProcessingOutcome::Failed;
            }
        };

        if !self.admission.admit(entry) {
            info!(%key, outcome = ?ProcessingOutcome::Skipped, "Entry not admitted, leaving it pending");
            return ProcessingOutcome::Skipped;
        }

        match self.materialize(entry, &key).await {
            Ok(()) => {
                debug!(%key, outcome = ?ProcessingOutcome::Acknowledged, "Entry acknowledged");
                ProcessingOutcome::Acknowledged
            }
            Err(error) => {
                warn!(%key, ?error, outcome = ?ProcessingOutcome::Failed, "Failed to process entry");
                ProcessingOutcome::Failed
            }
        }
    }

    async fn materialize(&self, entry: &StreamEntry, key: &str) -> Result<(), ProcessingError> {
        self.sink
            .upsert_fields(key, entry.fields())
            .await
            .map_err(ProcessingError::Materialization)?;

        info!(key, "Saved entry to record");

        self.store
            .acknowledge(&self.queue, &self.group, entry.id())
            .await
            .map_err(ProcessingError::Acknowledgement)
    }
}

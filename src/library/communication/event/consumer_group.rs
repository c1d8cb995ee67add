use super::{EntryStore, QueueDescriptor, QueueLocation, StoreError};
use tracing::{info, instrument};
use uuid::Uuid;

/// Unique identifier of a consumer within a [`ConsumerGroup`](ConsumerGroupDescriptor)
pub type ConsumerIdentifier = String;

/// Generates an ephemeral, process-unique consumer name of the form `consumer-<uuid>`
///
/// Entries claimed under this name stay in its pending list after the process exits
/// and have to be reclaimed by another consumer.
pub fn generate_consumer_identifier() -> ConsumerIdentifier {
    format!("consumer-{}", Uuid::new_v4())
}

/// Definition of a consumer group
///
/// In a stream, a group of consumers collaborates to consume entries.
/// Each new entry is only delivered to one consumer within the same group.
/// When it is created, the group starts delivering entries from the provided [`QueueLocation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerGroupDescriptor {
    identifier: String,
    start: QueueLocation,
}

impl ConsumerGroupDescriptor {
    /// Creates a new instance from raw parts
    pub fn new(identifier: impl Into<String>, start: QueueLocation) -> Self {
        Self {
            identifier: identifier.into(),
            start,
        }
    }

    /// Creates a group which only receives entries appended after its creation
    pub fn at_tail(identifier: impl Into<String>) -> Self {
        Self::new(identifier, QueueLocation::Tail)
    }

    /// Unique identifier of the group
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Location from where a consumer group begins to consume entries
    ///
    /// Note that it is not guaranteed that this will be honored (e.g. when the group already exists)!
    pub fn start(&self) -> &QueueLocation {
        &self.start
    }
}

/// Result of a successful [`ensure_group`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRegistration {
    /// Group did not exist and has been created
    Created,
    /// Group was already present and left untouched
    AlreadyExisted,
}

/// Idempotently creates a consumer group on a stream, creating the stream if necessary.
///
/// An existing group is reported as [`GroupRegistration::AlreadyExisted`] and left unchanged,
/// so this may be called on every startup. Any other store failure is returned to the caller.
#[instrument(skip(store, queue, group), fields(stream = queue.key(), group = group.identifier()))]
pub async fn ensure_group<S>(
    store: &S,
    queue: &QueueDescriptor,
    group: &ConsumerGroupDescriptor,
) -> Result<GroupRegistration, StoreError>
where
    S: EntryStore + Send + Sync + ?Sized,
{
    match store.create_group(queue, group).await {
        Ok(()) => {
            info!("Created consumer group");
            Ok(GroupRegistration::Created)
        }
        Err(StoreError::GroupAlreadyExists) => {
            info!("Consumer group already exists");
            Ok(GroupRegistration::AlreadyExisted)
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::library::communication::event::{ClaimOptions, EntryFields};
    use crate::library::communication::implementation::mock::MockEntryStore;

    #[test]
    fn generate_unique_consumer_names() {
        let first = generate_consumer_identifier();
        let second = generate_consumer_identifier();

        assert!(first.starts_with("consumer-"));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn create_missing_group() {
        let store = MockEntryStore::default();
        let queue = QueueDescriptor::new("tweets");
        let group = ConsumerGroupDescriptor::at_tail("grp1");

        let registration = ensure_group(&store, &queue, &group).await.unwrap();

        assert_eq!(registration, GroupRegistration::Created);
        assert!(store.has_group(&queue, &group));
    }

    #[tokio::test]
    async fn treat_existing_group_as_success() {
        let store = MockEntryStore::default();
        let queue = QueueDescriptor::new("tweets");
        let group = ConsumerGroupDescriptor::at_tail("grp1");

        ensure_group(&store, &queue, &group).await.unwrap();
        let registration = ensure_group(&store, &queue, &group).await.unwrap();

        assert_eq!(registration, GroupRegistration::AlreadyExisted);
    }

    #[tokio::test]
    async fn leave_existing_group_unchanged() {
        let store = MockEntryStore::default();
        let queue = QueueDescriptor::new("tweets");
        let group = ConsumerGroupDescriptor::at_tail("grp1");
        let mut fields = EntryFields::new();
        fields.insert("id".into(), "42".into());

        ensure_group(&store, &queue, &group).await.unwrap();
        store.append(&queue, &fields).await.unwrap();
        ensure_group(&store, &queue, &group).await.unwrap();

        // The second registration must not move the cursor past the appended entry
        let claimed = store
            .claim_new(&queue, &group, "consumer-1", &ClaimOptions::default())
            .await
            .unwrap();
        assert_eq!(claimed.len(), 1);
    }

    #[tokio::test]
    async fn propagate_other_failures() {
        let store = MockEntryStore::default();
        let queue = QueueDescriptor::new("");
        let group = ConsumerGroupDescriptor::at_tail("grp1");

        let result = ensure_group(&store, &queue, &group).await;

        assert!(matches!(result, Err(StoreError::Backend(_))));
    }
}

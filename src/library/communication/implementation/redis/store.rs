use super::{
    convert_read_reply, convert_stream_ids, parse_entry_id, BUSY_GROUP_CODE, STREAM_ID_ADDITIONS,
    STREAM_ID_HEAD, STREAM_ID_NEW, STREAM_ID_TAIL,
};
use crate::library::communication::event::{
    ClaimOptions, ConsumerGroupDescriptor, EntryFields, EntryId, EntryStore, PendingEntry,
    PendingSummary, QueueDescriptor, QueueLocation, StoreError, StreamEntry,
};
use async_trait::async_trait;
use futures::lock::Mutex;
use redis::aio::ConnectionLike;
use redis::streams::{
    StreamClaimReply, StreamPendingCountReply, StreamPendingReply, StreamReadOptions,
    StreamReadReply,
};
use redis::{AsyncCommands, RedisError};
use std::time::Duration;
use tracing::trace;

/// Entry store implementation using [Redis Streams](https://redis.io/topics/streams-intro)
///
/// All commands are sent sequentially over a single connection. As claims block the
/// connection for up to [`ClaimOptions::block`], the connection should not be shared
/// with latency sensitive users.
pub struct RedisEntryStore<C> {
    con: Mutex<C>,
}

impl<C> RedisEntryStore<C>
where
    C: ConnectionLike + Send,
{
    /// Creates a new instance taking ownership of a connection
    pub fn new(con: C) -> Self {
        Self {
            con: Mutex::new(con),
        }
    }
}

fn is_busy_group(error: &RedisError) -> bool {
    error.code() == Some(BUSY_GROUP_CODE)
}

fn as_millis(duration: Duration) -> usize {
    duration.as_millis().try_into().unwrap_or(usize::MAX)
}

#[async_trait]
impl<C> EntryStore for RedisEntryStore<C>
where
    C: ConnectionLike + Send,
{
    async fn create_group(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
    ) -> Result<(), StoreError> {
        let start_id = match group.start() {
            QueueLocation::Head => STREAM_ID_HEAD,
            QueueLocation::Tail => STREAM_ID_TAIL,
        };

        let mut con = self.con.lock().await;
        let result = con
            .xgroup_create_mkstream::<_, _, _, ()>(queue.key(), group.identifier(), start_id)
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if is_busy_group(&e) => Err(StoreError::GroupAlreadyExists),
            Err(e) => Err(StoreError::backend(e)),
        }
    }

    async fn claim_new(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        options: &ClaimOptions,
    ) -> Result<Vec<StreamEntry>, StoreError> {
        let read_options = StreamReadOptions::default()
            .group(group.identifier(), consumer)
            .count(options.batch_size)
            .block(as_millis(options.block));

        let mut con = self.con.lock().await;
        let reply = con
            .xread_options::<_, _, Option<StreamReadReply>>(
                &[queue.key()],
                &[STREAM_ID_ADDITIONS],
                &read_options,
            )
            .await
            .map_err(StoreError::backend)?;

        // A timed out blocking read replies with nil
        let reply = match reply {
            Some(reply) => reply,
            None => return Ok(Vec::new()),
        };

        let entries = convert_read_reply(&reply, queue.key());

        trace!(count = entries.len(), "Received entries from stream");

        Ok(entries)
    }

    async fn acknowledge(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        id: EntryId,
    ) -> Result<(), StoreError> {
        let mut con = self.con.lock().await;

        con.xack::<_, _, _, usize>(queue.key(), group.identifier(), &[id.to_string()])
            .await
            .map_err(StoreError::backend)?;

        Ok(())
    }

    async fn pending_summary(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
    ) -> Result<PendingSummary, StoreError> {
        let mut con = self.con.lock().await;
        let reply = con
            .xpending::<_, _, StreamPendingReply>(queue.key(), group.identifier())
            .await
            .map_err(StoreError::backend)?;

        match reply {
            StreamPendingReply::Empty => Ok(PendingSummary::default()),
            StreamPendingReply::Data(data) => Ok(PendingSummary {
                count: data.count,
                lowest: Some(parse_entry_id(&data.start_id)?),
                highest: Some(parse_entry_id(&data.end_id)?),
            }),
        }
    }

    async fn pending_range(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        count: usize,
    ) -> Result<Vec<PendingEntry>, StoreError> {
        let mut con = self.con.lock().await;
        let reply = con
            .xpending_count::<_, _, _, _, _, StreamPendingCountReply>(
                queue.key(),
                group.identifier(),
                "-",
                "+",
                count,
            )
            .await
            .map_err(StoreError::backend)?;

        reply
            .ids
            .iter()
            .map(|pending| {
                Ok(PendingEntry {
                    id: parse_entry_id(&pending.id)?,
                    consumer: pending.consumer.clone(),
                    idle: Duration::from_millis(pending.last_delivered_ms as u64),
                    deliveries: pending.times_delivered as u64,
                })
            })
            .collect()
    }

    async fn claim(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        min_idle: Duration,
        ids: &[EntryId],
    ) -> Result<Vec<StreamEntry>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = ids.iter().map(EntryId::to_string).collect();

        let mut con = self.con.lock().await;
        let reply = con
            .xclaim::<_, _, _, _, _, StreamClaimReply>(
                queue.key(),
                group.identifier(),
                consumer,
                as_millis(min_idle),
                &ids,
            )
            .await
            .map_err(StoreError::backend)?;

        Ok(convert_stream_ids(reply.ids.iter()))
    }

    async fn append(
        &self,
        queue: &QueueDescriptor,
        fields: &EntryFields,
    ) -> Result<EntryId, StoreError> {
        let mut con = self.con.lock().await;
        let id = con
            .xadd_map::<_, _, _, String>(queue.key(), STREAM_ID_NEW, fields)
            .await
            .map_err(StoreError::backend)?;

        parse_entry_id(&id)
    }
}

//! Appends tweets read from stdin to the stream
//!
//! Input is expected to be one JSON document per line, as delivered by the tweet firehose.
//! Only [qualifying](crate::domain::Tweet::qualifies) tweets are published, everything else
//! is counted and dropped. The module exits once the input is exhausted.

use crate::domain::StreamMessage;
use crate::harness::{DummyResourceHandleProvider, Heart, Module};
use crate::library::communication::event::{EntryStore, QueueDescriptor, StoreError};
use crate::library::communication::implementation::redis::RedisEntryStore;
use crate::library::BoxedError;
use async_trait::async_trait;
use jatsl::JobScheduler;
use redis::RedisError;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, instrument, trace, warn};

mod options;

pub use options::Options;

/// Errors which stop the publisher
#[derive(Debug, Error)]
pub enum PublishError {
    /// Redis server could not be reached
    #[error("failed to connect to redis")]
    Connection(#[from] RedisError),
    /// Input could not be read
    #[error("failed to read input")]
    Input(#[from] io::Error),
    /// Entry could not be appended to the stream
    #[error("failed to append entry to stream")]
    Append(#[source] StoreError),
}

/// Counters describing a publishing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// Tweets appended to the stream
    pub published: usize,
    /// Tweets which did not qualify
    pub filtered: usize,
    /// Documents which are not tweets
    pub ignored: usize,
    /// Lines which are not valid JSON
    pub malformed: usize,
}

/// Reads JSON documents line by line and appends qualifying tweets to the stream
#[instrument(skip(store, input), fields(stream = queue.key()))]
pub async fn publish<S, R>(
    store: &S,
    queue: &QueueDescriptor,
    input: R,
) -> Result<PublishReport, PublishError>
where
    S: EntryStore + Send + Sync,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut report = PublishReport::default();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<StreamMessage>(line) {
            Ok(StreamMessage::Tweet(tweet)) if tweet.qualifies() => {
                let id = store
                    .append(queue, &tweet.to_fields())
                    .await
                    .map_err(PublishError::Append)?;

                debug!(entry_id = %id, tweet_id = tweet.id, "Published tweet");
                report.published += 1;
            }
            Ok(StreamMessage::Tweet(tweet)) => {
                trace!(tweet_id = tweet.id, "Tweet does not qualify");
                report.filtered += 1;
            }
            Ok(StreamMessage::Other(_)) => report.ignored += 1,
            Err(error) => {
                warn!(%error, "Unable to parse input line");
                report.malformed += 1;
            }
        }
    }

    Ok(report)
}

/// Module implementation
pub struct Publisher {
    options: Options,
}

impl Publisher {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Module for Publisher {
    async fn run(&mut self, _scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let connector = self.options.redis.connector(DummyResourceHandleProvider::new());
        let store = RedisEntryStore::new(connector.owned().await.map_err(PublishError::from)?);

        let input = BufReader::new(io::stdin());
        let report = publish(&store, &self.options.stream.queue(), input).await?;

        info!(?report, "Input exhausted");

        Ok(None)
    }
}

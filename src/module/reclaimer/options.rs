use crate::library::communication::event::ReclaimPolicy;
use crate::library::helpers::parse_seconds;
use crate::module::options::{GroupOptions, MaterializationOptions, RedisOptions, StreamOptions};
use std::time::Duration;
use structopt::StructOpt;

/// Options for the reclaimer module
#[derive(Debug, Clone, StructOpt)]
pub struct Options {
    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub redis: RedisOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub stream: StreamOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub group: GroupOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub materialization: MaterializationOptions,

    /// Name of the consumer to which abandoned entries are transferred
    #[structopt(long, env, default_value = "monitoring-consumer")]
    pub monitoring_consumer_name: String,

    /// Time (in seconds) an entry has to be pending before it is considered abandoned
    #[structopt(long = "min-idle-time-sec", env = "MIN_IDLE_TIME_SEC", default_value = "60", parse(try_from_str = parse_seconds))]
    pub min_idle: Duration,

    /// Time (in seconds) between two reclaim cycles
    #[structopt(long = "reclaim-interval-sec", env = "RECLAIM_INTERVAL_SEC", default_value = "60", parse(try_from_str = parse_seconds))]
    pub interval: Duration,

    /// Maximum number of pending entries inspected per cycle
    #[structopt(long = "reclaim-batch-size", env = "RECLAIM_BATCH_SIZE", default_value = "100")]
    pub batch_size: usize,

    /// Entries delivered this many times are moved to the dead letter stream instead of
    /// being processed again. Unlimited if omitted.
    #[structopt(long, env)]
    pub max_deliveries: Option<u64>,
}

impl Options {
    /// Reclaim policy derived from the options
    pub fn policy(&self) -> ReclaimPolicy {
        ReclaimPolicy {
            min_idle: self.min_idle,
            batch_size: self.batch_size,
            max_deliveries: self.max_deliveries,
        }
    }
}

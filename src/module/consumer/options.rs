use crate::library::communication::event::ClaimOptions;
use crate::library::helpers::parse_millis;
use crate::module::options::{GroupOptions, MaterializationOptions, RedisOptions, StreamOptions};
use std::time::Duration;
use structopt::StructOpt;

/// Options for the consumer module
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

    /// Maximum number of entries claimed at once
    #[structopt(long, env, default_value = "500")]
    pub batch_size: usize,

    /// Duration (in milliseconds) a claim waits for new entries before returning empty-handed.
    /// Zero waits indefinitely.
    #[structopt(long = "block-ms", env = "BLOCK_MS", default_value = "15000", parse(try_from_str = parse_millis))]
    pub block: Duration,

    /// Probability with which an entry is deliberately left unprocessed and pending.
    /// Used to exercise the recovery path of the reclaimer.
    #[structopt(long, env, default_value = "0.0")]
    pub skip_rate: f64,
}

impl Options {
    /// Claim parameters derived from the options
    pub fn claim_options(&self) -> ClaimOptions {
        ClaimOptions {
            batch_size: self.batch_size,
            block: self.block,
        }
    }
}

use crate::module::options::{RedisOptions, StreamOptions};
use structopt::StructOpt;

/// Options for the publisher module
#[derive(Debug, Clone, StructOpt)]
pub struct Options {
    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub redis: RedisOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub stream: StreamOptions,
}

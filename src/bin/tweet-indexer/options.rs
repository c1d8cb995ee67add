use std::str::FromStr;
use structopt::StructOpt;
use thiserror::Error;

#[derive(Debug, StructOpt)]
#[structopt(about = "Indexes a stream of tweets with at-least-once delivery guarantees.")]
pub struct MainOptions {
    /// Log level, scopable to different modules
    ///
    /// Levels: trace, debug, info, warn, error
    #[structopt(
        short,
        long,
        global = true,
        default_value = "info",
        env = "RUST_LOG",
        value_name = "level"
    )]
    pub log: String,

    /// Format of log lines
    #[structopt(
        long,
        global = true,
        env,
        default_value = "text",
        possible_values = &["text", "compact", "json"]
    )]
    pub log_format: LogFormat,

    /// Enable status reporting server which can be used as a readiness probe
    #[structopt(long, global = true, env, value_name = "port")]
    pub status_server: Option<u16>,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Claims new entries from the stream and materializes them into the index
    Consume(tweet_indexer::module::consumer::Options),
    /// Periodically recovers entries which have been claimed but never acknowledged
    Reclaim(tweet_indexer::module::reclaimer::Options),
    /// Appends tweets read from stdin to the stream
    Publish(tweet_indexer::module::publisher::Options),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Compact,
    Json,
}

#[derive(Debug, Error)]
#[error("unknown log format {0}")]
pub struct UnknownLogFormat(String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(UnknownLogFormat(other.to_owned())),
        }
    }
}

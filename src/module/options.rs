//! Various options usable by modules
//!
//! The structs in this module allow other modules to flatten them into
//! their own options struct. This allows for a unified yet non-cluttered
//! option set.

use crate::harness::{BoxedResourceHandleProvider, RedisConnector};
use crate::library::communication::event::{
    ConsumerGroupDescriptor, QueueDescriptor, QueueLocation,
};
use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use structopt::StructOpt;

/// Options for connecting to the Redis server
#[derive(Debug, Clone, StructOpt)]
pub struct RedisOptions {
    /// Hostname of the redis server
    #[structopt(long = "redis-host", env = "REDIS_HOST", value_name = "host")]
    pub host: String,

    /// Port of the redis server
    #[structopt(long = "redis-port", env = "REDIS_PORT", value_name = "port")]
    pub port: u16,

    /// Password used to authenticate with the redis server
    #[structopt(
        long = "redis-password",
        env = "REDIS_PASSWORD",
        hide_env_values = true,
        value_name = "password"
    )]
    pub password: String,

    /// Connect using TLS
    #[structopt(
        long = "ssl",
        env = "SSL",
        parse(try_from_str),
        default_value = "false",
        value_name = "bool"
    )]
    pub ssl: bool,

    /// Trace every command sent to the server (requires the `trace` log level)
    #[structopt(
        long = "redis-trace",
        env = "REDIS_TRACE",
        parse(try_from_str),
        default_value = "false",
        value_name = "bool"
    )]
    pub trace: bool,
}

impl RedisOptions {
    /// Connection details derived from the options
    pub fn connection_info(&self) -> ConnectionInfo {
        let addr = if self.ssl {
            ConnectionAddr::TcpTls {
                host: self.host.clone(),
                port: self.port,
                insecure: false,
            }
        } else {
            ConnectionAddr::Tcp(self.host.clone(), self.port)
        };

        let password = if self.password.is_empty() {
            None
        } else {
            Some(self.password.clone())
        };

        ConnectionInfo {
            addr,
            redis: RedisConnectionInfo {
                db: 0,
                username: None,
                password,
            },
        }
    }

    /// Creates a connector which reports connection failures to handles from the given provider
    pub fn connector(&self, handle_provider: BoxedResourceHandleProvider) -> RedisConnector {
        RedisConnector::new(self.connection_info(), handle_provider).with_logging(self.trace)
    }
}

/// Options selecting the stream to operate on
#[derive(Debug, Clone, StructOpt)]
pub struct StreamOptions {
    /// Name of the stream entries are read from or appended to
    #[structopt(long = "stream", env = "STREAM_NAME", value_name = "name")]
    pub stream_name: String,
}

impl StreamOptions {
    /// Descriptor of the selected stream
    pub fn queue(&self) -> QueueDescriptor {
        QueueDescriptor::new(self.stream_name.clone())
    }
}

/// Options selecting the consumer group to join
#[derive(Debug, Clone, StructOpt)]
pub struct GroupOptions {
    /// Name of the consumer group shared by all consumers
    #[structopt(long = "group", env = "STREAM_CONSUMER_GROUP_NAME", value_name = "name")]
    pub group_name: String,
}

impl GroupOptions {
    /// Descriptor of the selected group, positioned at the tail of the stream when it gets created
    pub fn group(&self) -> ConsumerGroupDescriptor {
        ConsumerGroupDescriptor::new(self.group_name.clone(), QueueLocation::Tail)
    }
}

/// Options regarding the records entries are materialized into
#[derive(Debug, Clone, StructOpt)]
pub struct MaterializationOptions {
    /// Prefix prepended to the `id` field of an entry to form the key of its record
    #[structopt(long, env, default_value = "tweet:")]
    pub key_prefix: String,

    /// Name of the full-text index covering all records
    #[structopt(long, env, default_value = "tweets-index")]
    pub index_name: String,
}

use super::{super::handle::HandleRegistration, connect_with_retry, RedisResource};
use jatsl::TaskResourceHandle;
use redis::aio::Connection;
use redis::{Client, ConnectionInfo, RedisResult};
use tracing::{debug, instrument};

impl RedisResource<Connection> {
    /// Creates a new standalone redis connection
    #[instrument(skip(handle, info))]
    pub async fn new(handle: TaskResourceHandle, info: ConnectionInfo) -> RedisResult<Self> {
        debug!("Instantiating new standalone redis client");

        let client = Client::open(info)?;
        let con = connect_with_retry(|| client.get_async_connection()).await;

        Ok(Self {
            con,
            handle: HandleRegistration::owned(handle),
            logging_enabled: false,
        })
    }
}

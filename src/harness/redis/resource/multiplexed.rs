use super::{super::handle::HandleRegistration, connect_with_retry, RedisResource};
use futures::future::{BoxFuture, Shared};
use futures::lock::{Mutex, MutexGuard};
use futures::FutureExt;
use jatsl::TaskResourceHandle;
use lazy_static::lazy_static;
use redis::aio::MultiplexedConnection;
use redis::{Client, ConnectionInfo, RedisResult};
use std::sync::Arc;
use tracing::{debug, instrument, trace};

type SharedMultiplexedConnectionFuture = Shared<BoxFuture<'static, MultiplexedConnection>>;

lazy_static! {
    pub(super) static ref SHARED_CONNECTION: Mutex<Option<Arc<SharedMultiplexedConnectionFuture>>> =
        Mutex::new(None);
}

impl RedisResource<MultiplexedConnection> {
    /// Retrieves a shared redis instance or instantiates it if it doesn't exist
    #[instrument(skip(handle, info))]
    pub async fn shared(handle: TaskResourceHandle, info: ConnectionInfo) -> RedisResult<Self> {
        debug!("Instantiating shared redis client handle");

        let client = Client::open(info)?;
        let shared_con_lock = SHARED_CONNECTION.lock().await;

        let future = match &(*shared_con_lock) {
            Some(container_future) => {
                trace!("Reusing existing shared connection");
                container_future.clone()
            }
            None => {
                trace!("Creating new shared instance");
                RedisResource::load_new_shared_handle(client, shared_con_lock)
            }
        };

        let con = (*future).clone().await;

        Ok(Self {
            con,
            handle: HandleRegistration::shared(handle).await,
            logging_enabled: false,
        })
    }

    fn load_new_shared_handle(
        client: Client,
        mut shared_con_lock: MutexGuard<Option<Arc<SharedMultiplexedConnectionFuture>>>,
    ) -> Arc<SharedMultiplexedConnectionFuture> {
        let future = async move {
            connect_with_retry(|| client.get_multiplexed_tokio_connection()).await
        }
        .boxed()
        .shared();

        let arc_future = Arc::new(future);
        *shared_con_lock = Some(arc_future.clone());

        arc_future
    }
}

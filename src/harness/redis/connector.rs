use super::resource::RedisResource;
use jatsl::{TaskManager, TaskResourceHandle};
use redis::aio::{Connection, MultiplexedConnection};
use redis::{ConnectionInfo, RedisResult};
use std::sync::Arc;

/// Factory to provide [`TaskResourceHandle`] instances
pub trait ResourceHandleProvider {
    /// Instantiates a new [`TaskResourceHandle`]
    fn create_handle(&self) -> TaskResourceHandle;
}

/// Stub resource handle provider
///
/// Creates new instances using [`TaskResourceHandle::stub()`] for situations where you do not need redundancy or task management
pub struct DummyResourceHandleProvider {}

impl DummyResourceHandleProvider {
    /// Creates a new instance wrapped in an [`Arc`]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {})
    }
}

impl ResourceHandleProvider for DummyResourceHandleProvider {
    fn create_handle(&self) -> TaskResourceHandle {
        TaskResourceHandle::stub()
    }
}

impl<C> ResourceHandleProvider for TaskManager<C> {
    fn create_handle(&self) -> TaskResourceHandle {
        self.create_resource_handle()
    }
}

/// Dynamic dispatch version of [`ResourceHandleProvider`]
pub type BoxedResourceHandleProvider = Arc<dyn ResourceHandleProvider + Send + Sync>;

/// Opens monitored connections to a redis server
///
/// Every connection reports failures to a fresh handle obtained from the provider. When the
/// provider is a job's manager, a dropped connection causes the job to be restarted.
#[derive(Clone)]
pub struct RedisConnector {
    info: ConnectionInfo,
    handle_provider: BoxedResourceHandleProvider,
    logging: bool,
}

impl RedisConnector {
    /// Creates a new instance which connects to the given server and reports status using the given handle provider
    pub fn new(info: ConnectionInfo, handle_provider: BoxedResourceHandleProvider) -> Self {
        Self {
            info,
            handle_provider,
            logging: false,
        }
    }

    /// Enables tracing of every command sent over connections opened from now on
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    /// Opens a dedicated connection
    ///
    /// Required for blocking commands which would otherwise stall every other user of a shared connection.
    pub async fn owned(&self) -> RedisResult<RedisResource<Connection>> {
        let handle = self.handle_provider.create_handle();
        let mut resource = RedisResource::new(handle, self.info.clone()).await?;
        resource.set_logging(self.logging);
        Ok(resource)
    }

    /// Joins the process-wide multiplexed connection, opening it if necessary
    pub async fn shared(&self) -> RedisResult<RedisResource<MultiplexedConnection>> {
        let handle = self.handle_provider.create_handle();
        let mut resource = RedisResource::shared(handle, self.info.clone()).await?;
        resource.set_logging(self.logging);
        Ok(resource)
    }
}

mod connector;
mod handle;
mod resource;

pub use connector::{
    BoxedResourceHandleProvider, DummyResourceHandleProvider, RedisConnector,
    ResourceHandleProvider,
};
pub use resource::RedisResource;

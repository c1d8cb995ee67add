use super::RedisResource;
use futures::FutureExt;
use redis::aio::ConnectionLike;
use redis::{Cmd, Pipeline, RedisError, RedisFuture, Value};
use tracing::trace;

/// Whether an error indicates that the underlying connection is no longer usable
fn is_disconnect(error: &RedisError) -> bool {
    error.is_connection_dropped()
        || error.is_io_error()
        || error.is_connection_refusal()
        || error.is_timeout()
}

impl<C: ConnectionLike + Send> ConnectionLike for RedisResource<C> {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        (async move {
            if self.logging_enabled {
                self.log_cmd(cmd);
            }

            let result = self.con.req_packed_command(cmd).await;

            match result {
                Ok(ref value) if self.logging_enabled => trace!(?value, "Redis RX"),
                Err(ref error) if is_disconnect(error) => self.notify(error).await,
                _ => {}
            }

            result
        })
        .boxed()
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        (async move {
            if self.logging_enabled {
                self.log_pipeline(cmd);
            }

            let result = self.con.req_packed_commands(cmd, offset, count).await;

            match result {
                Ok(ref values) if self.logging_enabled => trace!(?values, "Redis RX"),
                Err(ref error) if is_disconnect(error) => self.notify(error).await,
                _ => {}
            }

            result
        })
        .boxed()
    }

    fn get_db(&self) -> i64 {
        self.con.get_db()
    }
}

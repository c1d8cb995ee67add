use super::handle::{HandleRegistration, SHARED_TASK_RESOURCE_HANDLES};
use futures::Future;
use multiplexed::SHARED_CONNECTION;
use redis::aio::ConnectionLike;
use redis::{Cmd, Pipeline, RedisError, RedisResult};
use std::time::Duration;
use tokio::task::yield_now;
use tokio::time::{sleep, timeout};
use tracing::{error, trace, warn};

mod conlike;
mod multiplexed;
mod owned;

const RETRY_INTERVAL: Duration = Duration::from_secs(2);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

#[allow(clippy::enum_variant_names)]
#[derive(Eq, PartialEq)]
enum CommandParseMode {
    ArgumentCount,
    ArgumentSize,
    Argument,
}

/// Redis connection that monitors for connection errors
///
/// Dropped connections, I/O errors and timeouts are reported to the [`TaskResourceHandle`](jatsl::TaskResourceHandle)
/// the resource was created with. Everything else is passed on to the caller untouched.
pub struct RedisResource<C: ConnectionLike> {
    con: C,
    handle: HandleRegistration,
    logging_enabled: bool,
}

impl<C: ConnectionLike> RedisResource<C> {
    /// Enables request logging
    pub fn set_logging(&mut self, enabled: bool) {
        self.logging_enabled = enabled;
    }

    async fn notify(&mut self, error: &RedisError) {
        error!(?error, "Redis connection encountered error");

        self.handle.resource_died().await;

        if self.handle.is_shared {
            trace!("Invalidating shared connection");
            *(SHARED_CONNECTION.lock().await) = None;

            trace!("Notifying sibling task handles");
            let handles = SHARED_TASK_RESOURCE_HANDLES.lock().await;
            for handle in handles.iter() {
                handle.clone().resource_died().await;
            }
        }

        yield_now().await;
    }

    fn log_cmd(&self, cmd: &Cmd) {
        let command = format_packed_command(&cmd.get_packed_command());
        trace!(%command, "Redis TX");
    }

    fn log_pipeline(&self, pipeline: &Pipeline) {
        let command = format_packed_command(&pipeline.get_packed_pipeline());
        trace!(%command, "Redis TX");
    }
}

/// Repeatedly attempts to establish a connection until one succeeds
async fn connect_with_retry<F, Fut, C>(mut connect: F) -> C
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RedisResult<C>>,
{
    let mut attempt: usize = 0;

    loop {
        trace!(attempt, "Connecting to redis");

        match timeout(CONNECT_TIMEOUT, connect()).await {
            Ok(Ok(connection)) => return connection,
            Ok(Err(error)) => warn!(?error, attempt, "Failed to connect to redis"),
            Err(_) => warn!(attempt, "Timeout connecting to redis"),
        }

        sleep(RETRY_INTERVAL).await;
        attempt += 1;
    }
}

/// Renders a command in the redis wire protocol as space separated arguments
fn format_packed_command(cmd: &[u8]) -> String {
    let input = String::from_utf8_lossy(cmd);

    let mut chars = input.chars().peekable();
    let mut mode = CommandParseMode::ArgumentCount;
    let mut output = String::new();

    while let Some(char) = chars.next() {
        // Advance to the next line
        if char == '\r' && chars.peek() == Some(&'\n') {
            chars.next();
            mode = match mode {
                CommandParseMode::ArgumentCount => CommandParseMode::ArgumentSize,
                CommandParseMode::ArgumentSize => CommandParseMode::Argument,
                CommandParseMode::Argument => {
                    output.push(' ');
                    CommandParseMode::ArgumentSize
                }
            };
            continue;
        }

        if mode == CommandParseMode::Argument {
            output.push(char);
        }
    }

    output.trim_end().to_owned()
}

#[cfg(test)]
mod does {
    use super::*;

    #[test]
    fn format_commands() {
        let cmd = redis::cmd("XACK").arg("tweets").arg("grp1").arg("1-0").clone();

        assert_eq!(
            format_packed_command(&cmd.get_packed_command()),
            "XACK tweets grp1 1-0"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retry_until_connected() {
        let mut attempts = 0;

        let connection = connect_with_retry(|| {
            attempts += 1;
            let attempt = attempts;

            async move {
                if attempt < 3 {
                    Err(RedisError::from((redis::ErrorKind::IoError, "refused")))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(connection, 3);
    }
}

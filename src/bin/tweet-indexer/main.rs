use anyhow::Result;
use options::{Command, LogFormat};
use structopt::StructOpt;
use tracing::{error, info};
use tweet_indexer::harness::ModuleRunner;
use tweet_indexer::module::consumer::Consumer;
use tweet_indexer::module::publisher::Publisher;
use tweet_indexer::module::reclaimer::Reclaim;

mod options;

#[tokio::main]
async fn main() -> Result<()> {
    let (command, runner) = init();

    let termination_reason = match command {
        Command::Consume(options) => runner.run(Consumer::new(options)).await,
        Command::Reclaim(options) => runner.run(Reclaim::new(options)).await,
        Command::Publish(options) => runner.run(Publisher::new(options)).await,
    };

    if termination_reason.is_failure() {
        error!(%termination_reason, "Terminating with failure");
        return Err(termination_reason.into());
    }

    Ok(())
}

fn init() -> (Command, ModuleRunner) {
    let options = options::MainOptions::from_args();

    let formatter = tracing_subscriber::fmt().with_env_filter(options.log);

    match options.log_format {
        LogFormat::Text => formatter.init(),
        LogFormat::Compact => formatter.compact().init(),
        LogFormat::Json => formatter.json().init(),
    };

    let runner = match options.status_server {
        Some(port) => ModuleRunner::new_with_status_server(port),
        None => ModuleRunner::default(),
    };

    info!("tweet-indexer {}", env!("CARGO_PKG_VERSION"));

    (options.command, runner)
}

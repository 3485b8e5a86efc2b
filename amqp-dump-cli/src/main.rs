use std::io::Write;

use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use queue_dump::{
    config::Config,
    emitter::Emitter,
    error::DumpError,
    fetch::{dump, FetchOptions},
    queue::{amqp::AMQPConnector, Connector},
};
use tracing::{error, warn};

mod init;

/// Dump the messages of an AMQP queue as a JSON array.
#[derive(Parser, Debug)]
#[command(name = "amqp-dump", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub options: Config,
}

/// Validate `config`, dump the queue through `connector` and write the JSON
/// array to `writer`.
///
/// After a failed get, the messages fetched so far are written only when
/// `emit_partial` is set; the error is returned either way.
async fn run<C, W>(config: &Config, connector: &C, writer: W) -> Result<()>
where
    C: Connector + Sync,
    W: Write,
{
    config.validate()?;

    let emitter = Emitter::from(config);
    let messages = match dump(connector, FetchOptions::from(config)).await {
        Ok(messages) => messages,
        Err(err @ DumpError::QueueGet { .. }) if config.emit_partial => {
            error!("{err}");
            warn!("emitting {} message(s) fetched before the error", err.received().len());
            emitter.to_writer(writer, err.received())?;
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    emitter.to_writer(writer, &messages)?;

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv().ok();
    init::tracing();

    let config = Cli::parse().options;

    run(&config, &AMQPConnector::from(&config), std::io::stdout().lock()).await
}

//! Bounded, sequential retrieval of messages from a single queue.
//!
//! [`dump`] is the whole life of a run against the broker: dial, open one
//! channel, issue up to `max_messages` get requests one after the other, and
//! close the connection. The connection is closed exactly once on every path
//! that follows a successful dial, whether the loop ran to the limit, stopped
//! on an empty queue, or failed.
use tracing::{debug, info, instrument, warn};

use crate::{
    config::Config,
    error::{DumpError, Result},
    queue::{Channel, Connection, Connector, Message},
};

/// What to fetch, and how.
#[derive(Clone, Copy, Debug)]
pub struct FetchOptions<'a> {
    /// Name of the queue to read from.
    pub queue: &'a str,
    /// Auto-acknowledge every fetched message.
    pub auto_ack: bool,
    /// Upper bound on the number of get requests.
    pub max_messages: u32,
}

impl<'a> From<&'a Config> for FetchOptions<'a> {
    fn from(config: &'a Config) -> Self {
        Self {
            queue: &config.queue,
            auto_ack: config.ack,
            max_messages: config.max_messages,
        }
    }
}

/// Dial the broker through `connector` and fetch messages from the queue.
///
/// Messages are returned in the order the broker delivered them; there are
/// never more than `max_messages` of them.
///
/// ```
/// use queue_dump::{
///     fetch::{dump, FetchOptions},
///     queue::in_memory::InMemoryBroker,
/// };
/// # use anyhow::Result;
/// # #[tokio::main]
/// # async fn main() -> Result<()> {
/// let broker = InMemoryBroker::new();
/// broker.publish("jobs", "first").await;
///
/// let messages = dump(&broker, FetchOptions {
///     queue: "jobs",
///     auto_ack: true,
///     max_messages: 10,
/// })
/// .await?;
/// assert_eq!(messages.len(), 1);
/// # Ok(())
/// # }
/// ```
#[instrument(skip(connector), level = "debug")]
pub async fn dump<C: Connector + Sync>(
    connector: &C,
    options: FetchOptions<'_>,
) -> Result<Vec<Message>> {
    let connection = connector.dial().await.map_err(DumpError::Dial)?;

    let result = fetch(&connection, options).await;

    if let Err(err) = connection.close().await {
        warn!("Error closing connection, error: {err}");
    }

    result
}

/// Fetch up to `max_messages` messages over an established connection.
///
/// The connection is left open; closing it is the caller's responsibility.
pub async fn fetch<C: Connection>(
    connection: &C,
    options: FetchOptions<'_>,
) -> Result<Vec<Message>> {
    let channel = connection.channel().await.map_err(DumpError::Channel)?;

    let mut received = Vec::new();
    for _ in 0..options.max_messages {
        match channel.get(options.queue, options.auto_ack).await {
            Ok(Some(message)) => received.push(message),
            Ok(None) => {
                debug!("queue {} is empty", options.queue);
                break;
            }
            Err(cause) => return Err(DumpError::QueueGet { cause, received }),
        }
    }

    info!(
        "fetched {} message(s) from queue {}",
        received.len(),
        options.queue
    );

    Ok(received)
}

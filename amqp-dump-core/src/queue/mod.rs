//! Simplified interface for reading from queues.
//!
//! Broker clients expose far more than a dump needs, and we do not attempt to
//! wrap all of it. Rather, we provide the bare minimum that is sufficient to
//! satisfy the semantics of this tool: dialing a broker, opening a channel,
//! fetching a single message, and closing the connection.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

/// The payload of a single queue entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Message {
    body: Bytes,
}

impl Message {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self { body: body.into() }
    }

    /// The raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl From<Vec<u8>> for Message {
    fn from(body: Vec<u8>) -> Self {
        Self::new(body)
    }
}

impl From<&'static str> for Message {
    fn from(body: &'static str) -> Self {
        Self::new(Bytes::from_static(body.as_bytes()))
    }
}

/// Establishes connections to a broker.
#[async_trait]
pub trait Connector {
    type Connection: Connection;

    /// Dial the broker.
    async fn dial(&self) -> Result<Self::Connection>;
}

/// A live session with a broker.
#[async_trait]
pub trait Connection: Send + Sync {
    type Channel: Channel;

    /// Open a logical channel on the connection.
    async fn channel(&self) -> Result<Self::Channel>;

    /// Close the connection.
    async fn close(&self) -> Result<()>;
}

/// A channel scoped to a [`Connection`].
#[async_trait]
pub trait Channel: Send + Sync {
    /// Fetch the next message from `queue`, or `None` if the queue is empty.
    ///
    /// With `auto_ack` set the broker considers the message consumed as soon
    /// as it is delivered. Otherwise it stays unacknowledged.
    async fn get(&self, queue: &str, auto_ack: bool) -> Result<Option<Message>>;
}

pub mod amqp;
pub mod in_memory;

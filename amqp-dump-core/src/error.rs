//! Dump error types.
//!
//! Every failure a dump run can hit is tagged with the operation that failed,
//! so callers can discriminate on the variant rather than on message text.
//! Broker adapters report failures as [`anyhow::Error`]; the fetcher wraps
//! them into the variant matching the failed step. The underlying cause is
//! folded into the message and not exposed as a `source`, so reporters that
//! walk the chain print it once.
use thiserror::Error;

use crate::queue::Message;

/// An error produced by a dump run.
#[derive(Error, Debug)]
pub enum DumpError {
    /// No queue name was supplied.
    #[error("Must supply queue name")]
    MissingQueue,
    /// The connection to the broker could not be established.
    #[error("Dial: {0}")]
    Dial(anyhow::Error),
    /// The channel could not be opened on an established connection.
    #[error("Channel: {0}")]
    Channel(anyhow::Error),
    /// A single get request failed.
    ///
    /// `received` holds the messages fetched before the failure, in fetch
    /// order.
    #[error("Queue get: {cause}")]
    QueueGet {
        cause: anyhow::Error,
        received: Vec<Message>,
    },
    /// The result could not be serialized or written.
    #[error("Emit: {0}")]
    Emit(serde_json::Error),
}

impl DumpError {
    /// Messages gathered before the error occurred, if any.
    pub fn received(&self) -> &[Message] {
        match self {
            Self::QueueGet { received, .. } => received,
            _ => &[],
        }
    }
}

impl From<serde_json::Error> for DumpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Emit(err)
    }
}

impl From<std::io::Error> for DumpError {
    fn from(err: std::io::Error) -> Self {
        Self::Emit(serde_json::Error::io(err))
    }
}

pub type Result<T> = std::result::Result<T, DumpError>;

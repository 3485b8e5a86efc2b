//! An in-memory implementation of [`Connector`] and its associated types.
//!
//! This implementation is useful for testing and debugging purposes, as it
//! emulates the parts of a real broker that a dump touches: named queues,
//! `basic.get` with or without auto-acknowledgement, and redelivery of
//! unacknowledged messages once the connection closes. It additionally
//! records every get and close call and can be told to fail a given step, so
//! callers can assert on exactly what was asked of the broker.
//!
//! [`InMemoryBroker`] is cloneable; every clone and every connection dialed
//! from it share the same underlying state.
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Channel, Connection, Connector, Message};

/// A get request observed by the broker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetCall {
    pub queue: String,
    pub auto_ack: bool,
}

#[derive(Default)]
struct State {
    queues: HashMap<String, VecDeque<Message>>,
    /// Delivered but unacknowledged messages, per queue, in delivery order.
    unacked: HashMap<String, Vec<Message>>,
    fail_dial: Option<String>,
    fail_channel: Option<String>,
    /// Fail the get request made after this many have succeeded.
    fail_get_after: Option<(usize, String)>,
    dial_calls: usize,
    get_calls: Vec<GetCall>,
    close_calls: usize,
}

/// An in-memory broker.
///
/// ```
/// use queue_dump::queue::{in_memory::InMemoryBroker, Channel, Connection, Connector};
/// use anyhow::Result;
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let broker = InMemoryBroker::new();
///     broker.publish("my_queue", "hello").await;
///
///     let conn = broker.dial().await?;
///     let channel = conn.channel().await?;
///     let message = channel.get("my_queue", true).await?;
///     assert_eq!(message.unwrap().body(), b"hello");
///
///     conn.close().await?;
///     Ok(())
/// }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<State>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an empty queue. Idempotent.
    pub async fn declare_queue(&self, queue: &str) {
        self.state
            .lock()
            .await
            .queues
            .entry(queue.to_string())
            .or_default();
    }

    /// Append a message to `queue`, declaring it if needed.
    pub async fn publish(&self, queue: &str, message: impl Into<Message>) {
        self.state
            .lock()
            .await
            .queues
            .entry(queue.to_string())
            .or_default()
            .push_back(message.into());
    }

    /// Make every subsequent dial fail with `reason`.
    pub async fn fail_dial(&self, reason: &str) {
        self.state.lock().await.fail_dial = Some(reason.to_string());
    }

    /// Make every subsequent channel open fail with `reason`.
    pub async fn fail_channel(&self, reason: &str) {
        self.state.lock().await.fail_channel = Some(reason.to_string());
    }

    /// Let `successes` get requests through, then fail every following one
    /// with `reason`.
    pub async fn fail_get_after(&self, successes: usize, reason: &str) {
        self.state.lock().await.fail_get_after = Some((successes, reason.to_string()));
    }

    /// Number of messages ready for delivery on `queue`.
    pub async fn ready(&self, queue: &str) -> usize {
        self.state
            .lock()
            .await
            .queues
            .get(queue)
            .map_or(0, VecDeque::len)
    }

    /// Number of delivered but unacknowledged messages on `queue`.
    pub async fn unacked(&self, queue: &str) -> usize {
        self.state
            .lock()
            .await
            .unacked
            .get(queue)
            .map_or(0, Vec::len)
    }

    pub async fn dial_calls(&self) -> usize {
        self.state.lock().await.dial_calls
    }

    /// Every get request observed so far, in order.
    pub async fn get_calls(&self) -> Vec<GetCall> {
        self.state.lock().await.get_calls.clone()
    }

    pub async fn close_calls(&self) -> usize {
        self.state.lock().await.close_calls
    }
}

#[async_trait]
impl Connector for InMemoryBroker {
    type Connection = InMemoryConnection;

    async fn dial(&self) -> Result<Self::Connection> {
        let mut state = self.state.lock().await;
        state.dial_calls += 1;
        if let Some(reason) = &state.fail_dial {
            bail!("{reason}");
        }

        Ok(InMemoryConnection {
            state: self.state.clone(),
        })
    }
}

/// An in-memory implementation of [`Connection`].
pub struct InMemoryConnection {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl Connection for InMemoryConnection {
    type Channel = InMemoryChannel;

    async fn channel(&self) -> Result<Self::Channel> {
        if let Some(reason) = &self.state.lock().await.fail_channel {
            bail!("{reason}");
        }

        Ok(InMemoryChannel {
            state: self.state.clone(),
        })
    }

    /// Close the connection.
    ///
    /// Unacknowledged messages are returned to the front of their queues in
    /// their original order, as a broker does when a consumer goes away.
    async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.close_calls += 1;

        let unacked = std::mem::take(&mut state.unacked);
        for (queue, messages) in unacked {
            let ready = state.queues.entry(queue).or_default();
            for message in messages.into_iter().rev() {
                ready.push_front(message);
            }
        }

        Ok(())
    }
}

/// An in-memory implementation of [`Channel`].
pub struct InMemoryChannel {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl Channel for InMemoryChannel {
    async fn get(&self, queue: &str, auto_ack: bool) -> Result<Option<Message>> {
        let mut state = self.state.lock().await;
        let succeeded = state.get_calls.len();
        state.get_calls.push(GetCall {
            queue: queue.to_string(),
            auto_ack,
        });

        if let Some((successes, reason)) = &state.fail_get_after {
            if succeeded >= *successes {
                bail!("{reason}");
            }
        }

        let Some(ready) = state.queues.get_mut(queue) else {
            bail!("NOT_FOUND - no queue '{queue}'");
        };
        let Some(message) = ready.pop_front() else {
            return Ok(None);
        };

        if !auto_ack {
            state
                .unacked
                .entry(queue.to_string())
                .or_default()
                .push(message.clone());
        }

        Ok(Some(message))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn get_is_fifo() {
        let broker = InMemoryBroker::new();
        broker.publish("q", "a").await;
        broker.publish("q", "b").await;

        let conn = broker.dial().await.unwrap();
        let channel = conn.channel().await.unwrap();

        assert_eq!(channel.get("q", true).await.unwrap(), Some(Message::from("a")));
        assert_eq!(channel.get("q", true).await.unwrap(), Some(Message::from("b")));
        assert_eq!(channel.get("q", true).await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_on_undeclared_queue_fails() {
        let broker = InMemoryBroker::new();
        let conn = broker.dial().await.unwrap();
        let channel = conn.channel().await.unwrap();

        let err = channel.get("missing", true).await.unwrap_err();
        assert_eq!(err.to_string(), "NOT_FOUND - no queue 'missing'");
    }

    #[tokio::test]
    async fn unacked_messages_are_requeued_in_order_on_close() {
        let broker = InMemoryBroker::new();
        for body in ["a", "b", "c"] {
            broker.publish("q", body).await;
        }

        let conn = broker.dial().await.unwrap();
        let channel = conn.channel().await.unwrap();
        channel.get("q", false).await.unwrap();
        channel.get("q", false).await.unwrap();
        assert_eq!(broker.ready("q").await, 1);
        assert_eq!(broker.unacked("q").await, 2);

        conn.close().await.unwrap();
        assert_eq!(broker.ready("q").await, 3);
        assert_eq!(broker.unacked("q").await, 0);

        let conn = broker.dial().await.unwrap();
        let channel = conn.channel().await.unwrap();
        assert_eq!(channel.get("q", true).await.unwrap(), Some(Message::from("a")));
    }

    #[tokio::test]
    async fn auto_acked_messages_are_consumed() {
        let broker = InMemoryBroker::new();
        broker.publish("q", "a").await;

        let conn = broker.dial().await.unwrap();
        let channel = conn.channel().await.unwrap();
        channel.get("q", true).await.unwrap();
        conn.close().await.unwrap();

        assert_eq!(broker.ready("q").await, 0);
    }

    #[tokio::test]
    async fn injected_failures() {
        let broker = InMemoryBroker::new();
        broker.declare_queue("q").await;
        broker.fail_get_after(1, "boom").await;

        let conn = broker.dial().await.unwrap();
        let channel = conn.channel().await.unwrap();
        assert_eq!(channel.get("q", true).await.unwrap(), None);
        assert!(channel.get("q", true).await.is_err());

        broker.fail_channel("no channel").await;
        assert!(conn.channel().await.is_err());

        broker.fail_dial("refused").await;
        assert!(broker.dial().await.is_err());
        assert_eq!(broker.dial_calls().await, 2);
    }
}

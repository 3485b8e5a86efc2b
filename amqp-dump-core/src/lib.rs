//! Peek at the contents of an AMQP queue.
//!
//! `queue_dump` connects to a broker, pulls up to a bounded number of messages
//! from one queue with individual `basic.get` requests, and renders their
//! bodies as a JSON array. It is meant for inspecting a queue without writing a
//! consumer.
//!
//! The pieces, in the order a run uses them:
//! - [`config`]: the command line surface, flattened into a binary's parser.
//! - [`queue`]: the minimal broker interface, with an AMQP binding
//!   ([`queue::amqp`]) and an in-memory broker ([`queue::in_memory`]) for
//!   tests.
//! - [`fetch`]: the bounded fetch loop and connection lifetime.
//! - [`emitter`]: JSON output.
//! - [`error`]: the error taxonomy shared by all of the above.
//!
//! # Example
//!
//! ```no_run
//! use queue_dump::{
//!     config::Config,
//!     emitter::Emitter,
//!     fetch::{dump, FetchOptions},
//!     queue::amqp::{AMQPConnector, AMQPConnectorOptions},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config {
//!         queue: "jobs".to_string(),
//!         ..Default::default()
//!     };
//!     config.validate()?;
//!
//!     let connector = AMQPConnector::new(AMQPConnectorOptions {
//!         uri: &config.uri,
//!         insecure_tls: config.insecure_tls,
//!     });
//!     let messages = dump(&connector, FetchOptions::from(&config)).await?;
//!
//!     Emitter::from(&config).to_writer(std::io::stdout().lock(), &messages)?;
//!     Ok(())
//! }
//! ```
pub mod config;
pub mod emitter;
pub mod error;
pub mod fetch;
pub mod queue;


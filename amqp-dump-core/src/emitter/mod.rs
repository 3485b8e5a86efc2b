//! Serialization of fetched messages to JSON.
//!
//! The output is always a single JSON array holding one entry per message, in
//! fetch order, followed by a newline. How each entry looks is selected by
//! [`BodyFormat`]:
//! - [`BodyFormat::Text`]: a JSON string. Bodies that are not valid UTF-8 have
//!   the offending sequences replaced with U+FFFD.
//! - [`BodyFormat::Bytes`]: an array of byte values. Lossless.
//! - [`BodyFormat::Base64`]: a JSON string with the standard, padded base64
//!   encoding of the body. Lossless.
//!
//! # Examples
//!
//! ```rust
//! use queue_dump::{config::BodyFormat, emitter::Emitter, queue::Message};
//!
//! let messages = [Message::from("hi")];
//!
//! let text = Emitter::new(BodyFormat::Text).to_string(&messages).unwrap();
//! assert_eq!(text, "[\"hi\"]\n");
//!
//! let bytes = Emitter::new(BodyFormat::Bytes).to_string(&messages).unwrap();
//! assert_eq!(bytes, "[[104,105]]\n");
//! ```
use std::{borrow::Cow, io::Write};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use tracing::instrument;

use crate::{
    config::{BodyFormat, Config},
    error::Result,
    queue::Message,
};

/// Writes message bodies as a JSON array.
#[derive(Clone, Copy, Debug, Default)]
pub struct Emitter {
    format: BodyFormat,
    pretty: bool,
}

impl Emitter {
    pub fn new(format: BodyFormat) -> Self {
        Self {
            format,
            pretty: false,
        }
    }

    /// Use indented, multi-line JSON.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Serializes `messages` to `writer`, followed by a newline.
    #[instrument(skip(writer, messages), fields(count = messages.len()), level = "trace")]
    pub fn to_writer<W: Write>(&self, writer: W, messages: &[Message]) -> Result<()> {
        match self.format {
            BodyFormat::Text => {
                let bodies: Vec<Cow<'_, str>> = messages
                    .iter()
                    .map(|message| String::from_utf8_lossy(message.body()))
                    .collect();
                self.write_value(writer, &bodies)
            }
            BodyFormat::Bytes => self.write_value(writer, messages),
            BodyFormat::Base64 => {
                let bodies: Vec<String> = messages
                    .iter()
                    .map(|message| STANDARD.encode(message.body()))
                    .collect();
                self.write_value(writer, &bodies)
            }
        }
    }

    /// Serializes `messages` into a string, followed by a newline.
    pub fn to_string(&self, messages: &[Message]) -> Result<String> {
        let mut buf = Vec::new();
        self.to_writer(&mut buf, messages)?;

        // serde_json only produces valid UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn write_value<W: Write, T: Serialize + ?Sized>(&self, mut writer: W, value: &T) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, value)?;
        } else {
            serde_json::to_writer(&mut writer, value)?;
        }
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(())
    }
}

impl From<&Config> for Emitter {
    fn from(config: &Config) -> Self {
        Self::new(config.body_format).pretty(config.pretty)
    }
}

#[cfg(test)]
mod test {
    use std::io;

    use super::*;
    use crate::error::DumpError;

    fn messages(bodies: &[&'static str]) -> Vec<Message> {
        bodies.iter().copied().map(Message::from).collect()
    }

    #[test]
    fn empty_result_is_an_empty_array() {
        for format in [BodyFormat::Text, BodyFormat::Bytes, BodyFormat::Base64] {
            assert_eq!(Emitter::new(format).to_string(&[]).unwrap(), "[]\n");
        }
    }

    #[test]
    fn text_preserves_order() {
        let out = Emitter::new(BodyFormat::Text)
            .to_string(&messages(&["c", "a", "b"]))
            .unwrap();

        assert_eq!(out, "[\"c\",\"a\",\"b\"]\n");
    }

    #[test]
    fn text_escapes_json() {
        let out = Emitter::new(BodyFormat::Text)
            .to_string(&messages(&["{\"id\":1}\n"]))
            .unwrap();

        assert_eq!(out, "[\"{\\\"id\\\":1}\\n\"]\n");
    }

    #[test]
    fn text_replaces_invalid_utf8() {
        let out = Emitter::new(BodyFormat::Text)
            .to_string(&[Message::from(vec![b'o', b'k', 0xff])])
            .unwrap();

        assert_eq!(out, "[\"ok\u{fffd}\"]\n");
    }

    #[test]
    fn bytes_are_lossless() {
        let out = Emitter::new(BodyFormat::Bytes)
            .to_string(&[Message::from(vec![0, 255]), Message::from("A")])
            .unwrap();

        assert_eq!(out, "[[0,255],[65]]\n");
    }

    #[test]
    fn base64_is_padded_and_lossless() {
        let out = Emitter::new(BodyFormat::Base64)
            .to_string(&[
                Message::from("hi"),
                Message::from(vec![0, 255]),
                Message::from(""),
            ])
            .unwrap();

        assert_eq!(out, "[\"aGk=\",\"AP8=\",\"\"]\n");
    }

    #[test]
    fn pretty_output_parses_back() {
        let out = Emitter::new(BodyFormat::Text)
            .pretty(true)
            .to_string(&messages(&["a", "b"]))
            .unwrap();

        assert!(out.contains('\n'));
        let parsed: Vec<String> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, ["a", "b"]);
    }

    #[test]
    fn emitter_from_config() {
        let config = Config {
            body_format: BodyFormat::Bytes,
            pretty: true,
            ..Default::default()
        };
        let emitter = Emitter::from(&config);

        assert_eq!(emitter.format, BodyFormat::Bytes);
        assert!(emitter.pretty);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_an_emit_error() {
        let err = Emitter::default()
            .to_writer(BrokenPipe, &messages(&["a"]))
            .unwrap_err();

        assert!(matches!(err, DumpError::Emit(_)));
    }
}

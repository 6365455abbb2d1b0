//! Byte-stream binding: framed messages over any `Read`/`Write` pair.
//!
//! Each message is framed as:
//!
//! ```text
//! ┌────────────┬───────────────┬───────────┬──────────┬────────┐
//! │ Magic (2B) │ Envelope      │ Body      │ Envelope │ Body   │
//! │ 0x45 0x57  │ length (4B LE)│ len (4B LE)│ (JSON)  │ (bytes)│
//! │ "EW"       │               │           │          │        │
//! └────────────┴───────────────┴───────────┴──────────┴────────┘
//! ```
//!
//! The envelope records the encoding shape and metadata; the body is the
//! message payload verbatim. Closure classification is structural: EOF on
//! a frame boundary is end of stream, EOF inside a frame is a fault.

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use eventwire_codec::{Headers, Message};
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::error::{Result, TransportError};
use crate::traits::{Received, Receiver, Sender};

/// Frame header: magic (2) + envelope length (4) + body length (4).
const HEADER_SIZE: usize = 10;

/// Magic bytes: "EW" (0x45 0x57).
const MAGIC: [u8; 2] = [0x45, 0x57];

/// Default maximum body size: 16 MiB.
pub const DEFAULT_MAX_BODY: usize = 16 * 1024 * 1024;

/// Maximum serialized envelope size: 64 KiB.
const MAX_ENVELOPE: usize = 64 * 1024;

const READ_CHUNK_SIZE: usize = 8 * 1024;
const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Configuration for the stream binding.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Maximum body size in bytes. Default: 16 MiB.
    pub max_body_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireMode {
    Binary,
    Structured,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEnvelope {
    mode: WireMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    headers: Vec<(String, Vec<String>)>,
}

impl WireEnvelope {
    fn from_message(message: &Message) -> Self {
        match message {
            Message::Binary { headers, .. } => Self {
                mode: WireMode::Binary,
                content_type: None,
                headers: headers
                    .iter()
                    .map(|(name, values)| (name.to_string(), values.to_vec()))
                    .collect(),
            },
            Message::Structured { content_type, .. } => Self {
                mode: WireMode::Structured,
                content_type: Some(content_type.clone()),
                headers: Vec::new(),
            },
        }
    }

    fn into_message(self, body: Bytes) -> Result<Message> {
        match self.mode {
            WireMode::Binary => {
                let headers: Headers = self
                    .headers
                    .into_iter()
                    .flat_map(|(name, values)| {
                        values.into_iter().map(move |value| (name.clone(), value))
                    })
                    .collect();
                Ok(Message::Binary { headers, body })
            }
            WireMode::Structured => {
                let content_type = self.content_type.ok_or_else(|| {
                    TransportError::InvalidFrame(
                        "structured envelope without content type".to_string(),
                    )
                })?;
                Ok(Message::Structured { content_type, body })
            }
        }
    }
}

/// Writes framed messages to any `Write` stream.
pub struct StreamSender<W> {
    inner: W,
    buf: BytesMut,
    config: StreamConfig,
}

impl<W: Write> StreamSender<W> {
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, StreamConfig::default())
    }

    pub fn with_config(inner: W, config: StreamConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Consume the sender and return the inner stream.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_all(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<W: Write> Sender for StreamSender<W> {
    fn send(&mut self, cancel: &CancelToken, message: Message) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(TransportError::Rejected("cancelled by caller".to_string()));
        }

        let envelope = serde_json::to_vec(&WireEnvelope::from_message(&message))
            .map_err(|err| TransportError::InvalidFrame(err.to_string()))?;
        if envelope.len() > MAX_ENVELOPE {
            return Err(TransportError::FrameTooLarge {
                size: envelope.len(),
                max: MAX_ENVELOPE,
            });
        }
        let body = message.body();
        if body.len() > self.config.max_body_size {
            return Err(TransportError::FrameTooLarge {
                size: body.len(),
                max: self.config.max_body_size,
            });
        }

        self.buf.clear();
        self.buf.reserve(HEADER_SIZE + envelope.len() + body.len());
        self.buf.put_slice(&MAGIC);
        self.buf.put_u32_le(envelope.len() as u32);
        self.buf.put_u32_le(body.len() as u32);
        self.buf.put_slice(&envelope);
        self.buf.put_slice(body);
        self.write_all()
    }
}

/// Reads framed messages from any `Read` stream.
///
/// Handles partial reads internally. Returns `EndOfStream` on clean EOF
/// (a frame boundary) or observed cancellation; EOF inside a frame is
/// `TransportError::Closed`.
pub struct StreamReceiver<R> {
    inner: R,
    buf: BytesMut,
    config: StreamConfig,
}

impl<R: Read> StreamReceiver<R> {
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, StreamConfig::default())
    }

    pub fn with_config(inner: R, config: StreamConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Consume the receiver and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn decode_buffered(&mut self) -> Result<Option<Message>> {
        if self.buf.len() < HEADER_SIZE {
            return Ok(None);
        }
        if self.buf[0..2] != MAGIC {
            return Err(TransportError::InvalidFrame(
                "bad frame magic (expected 0x4557 \"EW\")".to_string(),
            ));
        }

        let envelope_len = u32::from_le_bytes(
            self.buf[2..6]
                .try_into()
                .map_err(|_| TransportError::Closed)?,
        ) as usize;
        let body_len = u32::from_le_bytes(
            self.buf[6..10]
                .try_into()
                .map_err(|_| TransportError::Closed)?,
        ) as usize;

        if envelope_len > MAX_ENVELOPE {
            return Err(TransportError::FrameTooLarge {
                size: envelope_len,
                max: MAX_ENVELOPE,
            });
        }
        if body_len > self.config.max_body_size {
            return Err(TransportError::FrameTooLarge {
                size: body_len,
                max: self.config.max_body_size,
            });
        }

        let total = HEADER_SIZE + envelope_len + body_len;
        if self.buf.len() < total {
            return Ok(None);
        }

        self.buf.advance(HEADER_SIZE);
        let envelope_bytes = self.buf.split_to(envelope_len);
        let body = self.buf.split_to(body_len).freeze();

        let envelope: WireEnvelope = serde_json::from_slice(&envelope_bytes)
            .map_err(|err| TransportError::InvalidFrame(err.to_string()))?;
        envelope.into_message(body).map(Some)
    }
}

impl<R: Read> Receiver for StreamReceiver<R> {
    fn receive(&mut self, cancel: &CancelToken) -> Result<Received> {
        loop {
            if cancel.is_cancelled() {
                return Ok(Received::EndOfStream);
            }
            if let Some(message) = self.decode_buffered()? {
                return Ok(Received::Message(message));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                // A read timeout is the cancellation observation point for
                // streams that support one.
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock
                        || err.kind() == ErrorKind::TimedOut =>
                {
                    if cancel.is_cancelled() {
                        return Ok(Received::EndOfStream);
                    }
                    continue;
                }
                Err(err) => return Err(TransportError::Io(err)),
            };

            if read == 0 {
                return if self.buf.is_empty() {
                    tracing::debug!("stream closed on frame boundary, ending stream");
                    Ok(Received::EndOfStream)
                } else {
                    tracing::debug!(buffered = self.buf.len(), "stream closed mid-frame");
                    Err(TransportError::Closed)
                };
            }
            self.buf.extend_from_slice(&chunk[..read]);
        }
    }
}

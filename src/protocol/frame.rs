//! Length-prefixed JSON framing
//!
//! Each frame is a 4-byte big-endian length followed by that many bytes of a
//! UTF-8 JSON object: `[u32 length][payload bytes]`. One frame travels in each
//! direction per job.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the length header in bytes
pub const HEADER_LEN: usize = 4;

/// Default ceiling on a single frame's payload (32 MiB)
pub const DEFAULT_MAX_FRAME_BYTES: usize = 32 * 1024 * 1024;

/// Errors raised while encoding or decoding frames
///
/// Every variant except `Encode` is connection-fatal: the reader must not
/// attempt further reads on the same stream.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Connection closed after {received} of {expected} bytes")]
    ConnectionClosed { expected: usize, received: usize },

    #[error("Frame of {declared} bytes exceeds limit of {max} bytes")]
    TooLarge { declared: usize, max: usize },

    #[error("Malformed payload: {0}")]
    Protocol(String),

    #[error("Payload is not a JSON object")]
    NotAnObject,

    #[error("Failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("IO error on frame stream: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Returns true if the peer went away mid-frame
    pub fn is_connection_closed(&self) -> bool {
        matches!(self, Self::ConnectionClosed { .. })
    }
}

/// Encoder/decoder for the length-prefixed frame format
///
/// The codec is stateless apart from its payload ceiling and works over any
/// `AsyncRead`/`AsyncWrite`, so both the dispatcher and the front-end share it.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_bytes: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl FrameCodec {
    /// Creates a codec that rejects payloads larger than `max_frame_bytes`
    ///
    /// The ceiling is clamped to `u32::MAX`, the largest length the header
    /// can express.
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            max_frame_bytes: max_frame_bytes.min(u32::MAX as usize),
        }
    }

    /// Returns the payload ceiling in bytes
    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    /// Serializes a message into a complete frame (header + payload)
    ///
    /// The message must serialize to a JSON object. Encoding is deterministic:
    /// the same message always yields the same bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use scrape_dispatch::protocol::{FrameCodec, Job};
    ///
    /// let codec = FrameCodec::default();
    /// let job = Job::new("http://example.test", vec![]);
    /// let frame = codec.encode(&job).unwrap();
    /// let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
    /// assert_eq!(len, frame.len() - 4);
    /// ```
    pub fn encode<T: Serialize>(&self, message: &T) -> Result<Vec<u8>, FrameError> {
        let value = serde_json::to_value(message).map_err(FrameError::Encode)?;
        if !value.is_object() {
            return Err(FrameError::NotAnObject);
        }

        let payload = serde_json::to_vec(&value).map_err(FrameError::Encode)?;
        if payload.len() > self.max_frame_bytes {
            return Err(FrameError::TooLarge {
                declared: payload.len(),
                max: self.max_frame_bytes,
            });
        }

        let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Reads one frame from the stream and deserializes its payload
    ///
    /// # Errors
    ///
    /// * `ConnectionClosed` - the stream ended before the header or payload was complete
    /// * `TooLarge` - the header declares more bytes than the codec allows
    /// * `Protocol` / `NotAnObject` - the payload is not a well-formed JSON object
    ///   of the expected shape
    pub async fn decode<T, R>(&self, reader: &mut R) -> Result<T, FrameError>
    where
        T: DeserializeOwned,
        R: AsyncRead + Unpin,
    {
        let header = read_exact(reader, HEADER_LEN).await?;
        let declared = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;

        if declared > self.max_frame_bytes {
            return Err(FrameError::TooLarge {
                declared,
                max: self.max_frame_bytes,
            });
        }

        let payload = read_exact(reader, declared).await?;
        tracing::debug!("Decoded frame of {} bytes", declared);

        let value: serde_json::Value =
            serde_json::from_slice(&payload).map_err(|e| FrameError::Protocol(e.to_string()))?;
        if !value.is_object() {
            return Err(FrameError::NotAnObject);
        }

        serde_json::from_value(value).map_err(|e| FrameError::Protocol(e.to_string()))
    }

    /// Encodes a message and writes the whole frame to the stream
    pub async fn write<T, W>(&self, writer: &mut W, message: &T) -> Result<(), FrameError>
    where
        T: Serialize,
        W: AsyncWrite + Unpin,
    {
        let frame = self.encode(message)?;
        writer.write_all(&frame).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Reads exactly `n` bytes from the stream
///
/// Returns `ConnectionClosed` if the stream reaches end-of-file first, so a
/// truncated frame fails promptly instead of waiting forever.
pub async fn read_exact<R>(reader: &mut R, n: usize) -> Result<Vec<u8>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; n];
    let mut filled = 0;

    while filled < n {
        let read = reader.read(&mut buf[filled..]).await?;
        if read == 0 {
            return Err(FrameError::ConnectionClosed {
                expected: n,
                received: filled,
            });
        }
        filled += read;
    }

    Ok(buf)
}

//! Binary framing for the stdout channel.
//!
//! Every message is one frame:
//!
//! ```text
//! +----------------------+--------+-------------------------+
//! | payload length (u32) |  kind  |  payload (UTF-8 JSON)   |
//! |    little-endian     | 1 byte |  exactly `length` bytes |
//! +----------------------+--------+-------------------------+
//! ```
//!
//! No message spans frames, so a reader only ever needs the 5-byte header to
//! know how much to read next.

use std::io::{self, Read, Write};

use headlint_types::{ErrorPayload, Finding, MessageKind};
use serde::Serialize;

/// Length prefix plus kind byte.
pub const HEADER_LEN: usize = 5;

/// Largest payload a [`FrameReader`] accepts unless told otherwise.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("stream ended inside a frame ({needed} more byte(s) expected)")]
    Truncated { needed: usize },

    #[error("unknown frame kind {0}")]
    UnknownKind(u8),

    #[error("payload of {len} bytes exceeds limit of {max}")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Build the header for a payload of `len` bytes.
pub fn encode_header(kind: MessageKind, len: usize) -> Result<[u8; HEADER_LEN], FrameError> {
    let len32 = u32::try_from(len).map_err(|_| FrameError::PayloadTooLarge {
        len,
        max: u32::MAX as usize,
    })?;
    let mut header = [0u8; HEADER_LEN];
    header[..4].copy_from_slice(&len32.to_le_bytes());
    header[4] = kind.as_byte();
    Ok(header)
}

/// Header and payload as one contiguous buffer.
pub fn encode_frame(kind: MessageKind, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let header = encode_header(kind, payload.len())?;
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(payload);
    Ok(out)
}

pub fn write_frame(w: &mut impl Write, kind: MessageKind, payload: &[u8]) -> Result<(), FrameError> {
    let header = encode_header(kind, payload.len())?;
    w.write_all(&header)?;
    w.write_all(payload)?;
    Ok(())
}

/// Serialize `value` as JSON and write it as one frame.
pub fn write_message<T: Serialize>(
    w: &mut impl Write,
    kind: MessageKind,
    value: &T,
) -> Result<(), FrameError> {
    let payload = serde_json::to_vec(value)?;
    write_frame(w, kind, &payload)
}

/// A decoded frame with its payload still raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: MessageKind,
    pub payload: Vec<u8>,
}

/// A decoded frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Error(ErrorPayload),
    Finding(Finding),
}

impl Frame {
    pub fn message(&self) -> Result<Message, FrameError> {
        Ok(match self.kind {
            MessageKind::Error => Message::Error(serde_json::from_slice(&self.payload)?),
            MessageKind::Finding => Message::Finding(serde_json::from_slice(&self.payload)?),
        })
    }
}

/// Sequential frame decoder.
///
/// A clean end of stream between frames ends iteration; any other early end
/// is [`FrameError::Truncated`].
pub struct FrameReader<R> {
    inner: R,
    max_payload: usize,
    failed: bool,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            max_payload: DEFAULT_MAX_PAYLOAD,
            failed: false,
        }
    }

    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// `Ok(None)` at a clean end of stream.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        let mut header = [0u8; HEADER_LEN];
        let got = read_full(&mut self.inner, &mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_LEN {
            return Err(FrameError::Truncated {
                needed: HEADER_LEN - got,
            });
        }

        let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let kind = MessageKind::from_byte(header[4]).ok_or(FrameError::UnknownKind(header[4]))?;
        if len > self.max_payload {
            return Err(FrameError::PayloadTooLarge {
                len,
                max: self.max_payload,
            });
        }

        let mut payload = vec![0u8; len];
        let got = read_full(&mut self.inner, &mut payload)?;
        if got < len {
            return Err(FrameError::Truncated { needed: len - got });
        }

        Ok(Some(Frame { kind, payload }))
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<Frame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_frame() {
            Ok(frame) => frame.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Decode every frame in `bytes`.
pub fn decode_all(bytes: &[u8]) -> Result<Vec<Frame>, FrameError> {
    FrameReader::new(bytes).collect()
}

/// Fill `buf` as far as the stream allows, returning the byte count.
fn read_full(r: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

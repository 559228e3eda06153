//! Frame buffering.
//!
//! A single read may carry no frame, part of one, or several. The decoder
//! accumulates bytes and yields each complete `\n`-terminated frame.

use bytes::{Buf, BytesMut};

use crate::protocol::{DecodeError, TERMINATOR, WireMessage};

/// Longest accepted frame, terminator excluded.
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024;

/// Incremental decoder for `\n`-terminated frames.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    max_len: usize,
    /// Dropping the tail of an overlong frame until the next terminator.
    discarding: bool,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

impl FrameDecoder {
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(max_len.min(DEFAULT_MAX_FRAME_LEN)),
            max_len,
            discarding: false,
        }
    }

    /// Appends freshly read bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes held for an incomplete frame.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Next complete frame, decoded.
    ///
    /// Returns `None` once no complete frame is buffered. Blank lines are
    /// skipped and a trailing `\r` is tolerated. An overlong frame is
    /// reported once and its bytes are dropped up to the next terminator.
    pub fn next_message(&mut self) -> Option<Result<WireMessage, DecodeError>> {
        loop {
            let Some(end) = self.buf.iter().position(|&b| b == TERMINATOR) else {
                // a trailing `\r` belongs to the terminator still to come
                let limit = if self.buf.last() == Some(&b'\r') {
                    self.max_len + 1
                } else {
                    self.max_len
                };
                if self.discarding {
                    self.buf.clear();
                } else if self.buf.len() > limit {
                    self.buf.clear();
                    self.discarding = true;
                    return Some(Err(DecodeError::FrameTooLong { max: self.max_len }));
                }
                return None;
            };

            let mut line = self.buf.split_to(end);
            self.buf.advance(1);
            if self.discarding {
                self.discarding = false;
                continue;
            }
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            if line.is_empty() {
                continue;
            }
            if line.len() > self.max_len {
                return Some(Err(DecodeError::FrameTooLong { max: self.max_len }));
            }

            let decoded = std::str::from_utf8(&line)
                .map_err(|_| DecodeError::InvalidUtf8)
                .and_then(WireMessage::decode);
            tracing::trace!(len = line.len(), ok = decoded.is_ok(), "frame received");
            return Some(decoded);
        }
    }
}

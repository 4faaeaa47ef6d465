//! Length-delimited record framing over a logically contiguous byte
//! stream.
//!
//! Frame boundaries never align with chunk boundaries by design: a frame
//! may span several chunks and several frames may share one chunk. The
//! framer owns that accounting. Each record on the wire is a 4-byte
//! big-endian length prefix followed by the payload; the reverse direction
//! ([`Framer::encode_record`]) produces the same layout for the send side.
//!
//! # Examples
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use swiftlet_core::framer::Framer;
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let mut framer = Framer::new(move |payload| sink.lock().unwrap().push(payload));
//!
//! let record = Framer::encode_record(b"hello").unwrap();
//! framer.push(&record[..3]).unwrap(); // partial: nothing completes
//! framer.push(&record[3..]).unwrap();
//! assert_eq!(seen.lock().unwrap().as_slice(), &[b"hello".to_vec()]);
//! ```

use std::fmt;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::error::{CoreError, Result};

/// Size of the record length prefix in bytes.
pub const RECORD_PREFIX_LEN: usize = 4;

/// Maximum accepted record payload length (16 MiB). A prefix above this is
/// treated as stream corruption rather than a legitimate frame.
pub const MAX_RECORD_LEN: usize = 16 * 1024 * 1024;

/// Reassembles length-delimited records from an in-order byte stream.
///
/// Completed payloads are handed to the frame-ready callback exactly once
/// each, in completion order. Partial records stay buffered across calls.
pub struct Framer {
    buf: Vec<u8>,
    on_frame: Box<dyn FnMut(Vec<u8>) + Send>,
}

impl Framer {
    /// Create a framer delivering completed payloads to `on_frame`.
    pub fn new<F>(on_frame: F) -> Self
    where
        F: FnMut(Vec<u8>) + Send + 'static,
    {
        Self {
            buf: Vec::new(),
            on_frame: Box::new(on_frame),
        }
    }

    /// Append stream bytes and deliver every record that completes.
    ///
    /// On error the buffer is left untouched so the session owner can
    /// inspect it, then [`Framer::reset`] or tear the session down.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RecordTooLarge`] when a length prefix exceeds
    /// [`MAX_RECORD_LEN`] and [`CoreError::ZeroLengthRecord`] when a prefix
    /// declares an empty record. Both indicate a corrupt stream.
    pub fn push(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(bytes);
        loop {
            if self.buf.len() < RECORD_PREFIX_LEN {
                return Ok(());
            }
            let len = BigEndian::read_u32(&self.buf[..RECORD_PREFIX_LEN]) as usize;
            if len == 0 {
                return Err(CoreError::ZeroLengthRecord);
            }
            if len > MAX_RECORD_LEN {
                return Err(CoreError::RecordTooLarge {
                    len,
                    max: MAX_RECORD_LEN,
                });
            }
            if self.buf.len() < RECORD_PREFIX_LEN + len {
                return Ok(());
            }
            let payload = self.buf[RECORD_PREFIX_LEN..RECORD_PREFIX_LEN + len].to_vec();
            self.buf.drain(..RECORD_PREFIX_LEN + len);
            (self.on_frame)(payload);
        }
    }

    /// Discard buffered partial state after a stream discontinuity.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Bytes currently buffered awaiting record completion.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Length-prefix a payload for the send side.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ZeroLengthRecord`] for an empty payload and
    /// [`CoreError::RecordTooLarge`] above [`MAX_RECORD_LEN`], mirroring
    /// what the receive side would reject.
    pub fn encode_record(payload: &[u8]) -> Result<Vec<u8>> {
        if payload.is_empty() {
            return Err(CoreError::ZeroLengthRecord);
        }
        if payload.len() > MAX_RECORD_LEN {
            return Err(CoreError::RecordTooLarge {
                len: payload.len(),
                max: MAX_RECORD_LEN,
            });
        }
        let mut out = Vec::with_capacity(RECORD_PREFIX_LEN + payload.len());
        out.write_u32::<BigEndian>(payload.len() as u32)
            .expect("write to Vec cannot fail");
        out.extend_from_slice(payload);
        Ok(out)
    }
}

impl fmt::Debug for Framer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Framer")
            .field("buffered", &self.buf.len())
            .finish_non_exhaustive()
    }
}

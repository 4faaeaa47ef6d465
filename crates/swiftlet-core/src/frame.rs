//! Application frame model and its wire codec.
//!
//! A frame is one playable audio+video bundle. The engine treats encoded
//! frames as opaque length-delimited blobs; the codec seam lets a host
//! swap the payload layout without touching chunking or reconstruction.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::error::{CoreError, Result};

/// Fixed header of an encoded frame: u64 sequence, u32 video length,
/// u32 audio length, all big-endian.
pub const FRAME_HEADER_LEN: usize = 16;

/// One application-level playable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvFrame {
    /// Presentation sequence number, strictly increasing per stream.
    pub seq: u64,
    /// Video payload bytes (opaque to the engine).
    pub video: Vec<u8>,
    /// Audio payload bytes (opaque to the engine).
    pub audio: Vec<u8>,
}

/// Encode/decode seam between [`AvFrame`] and its opaque wire form.
pub trait FrameCodec: Send + Sync {
    /// Serialize a frame to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error when the frame does not fit the wire layout, such
    /// as a payload too long for its length field.
    fn encode(&self, frame: &AvFrame) -> Result<Vec<u8>>;

    /// Deserialize bytes produced by [`FrameCodec::encode`].
    fn decode(&self, bytes: &[u8]) -> Result<AvFrame>;
}

/// Default codec: explicit big-endian lengths, no padding, stable across
/// platforms. `[seq:u64][video_len:u32][audio_len:u32][video][audio]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvFrameCodec;

impl FrameCodec for AvFrameCodec {
    fn encode(&self, frame: &AvFrame) -> Result<Vec<u8>> {
        let video_len = u32::try_from(frame.video.len()).map_err(|_| {
            CoreError::FramePayloadTooLarge {
                len: frame.video.len(),
            }
        })?;
        let audio_len = u32::try_from(frame.audio.len()).map_err(|_| {
            CoreError::FramePayloadTooLarge {
                len: frame.audio.len(),
            }
        })?;
        let mut out =
            Vec::with_capacity(FRAME_HEADER_LEN + frame.video.len() + frame.audio.len());
        out.write_u64::<BigEndian>(frame.seq)
            .expect("write to Vec cannot fail");
        out.write_u32::<BigEndian>(video_len)
            .expect("write to Vec cannot fail");
        out.write_u32::<BigEndian>(audio_len)
            .expect("write to Vec cannot fail");
        out.extend_from_slice(&frame.video);
        out.extend_from_slice(&frame.audio);
        Ok(out)
    }

    fn decode(&self, bytes: &[u8]) -> Result<AvFrame> {
        if bytes.len() < FRAME_HEADER_LEN {
            return Err(CoreError::FrameLengthMismatch {
                expected: FRAME_HEADER_LEN,
                got: bytes.len(),
            });
        }
        let seq = BigEndian::read_u64(&bytes[0..8]);
        let video_len = BigEndian::read_u32(&bytes[8..12]) as usize;
        let audio_len = BigEndian::read_u32(&bytes[12..16]) as usize;

        let expected = FRAME_HEADER_LEN + video_len + audio_len;
        if bytes.len() != expected {
            return Err(CoreError::FrameLengthMismatch {
                expected,
                got: bytes.len(),
            });
        }

        let video = bytes[FRAME_HEADER_LEN..FRAME_HEADER_LEN + video_len].to_vec();
        let audio = bytes[FRAME_HEADER_LEN + video_len..].to_vec();
        Ok(AvFrame { seq, video, audio })
    }
}

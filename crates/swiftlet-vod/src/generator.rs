//! Synthetic audio/video frame source.
//!
//! Stands in for a capture device when building test artifacts or demo
//! streams. Payload bytes are drawn from a fixed repeating bank, so two
//! generators with the same parameters emit identical frame sequences.

use swiftlet_core::AvFrame;

/// Default synthetic video payload size per frame.
pub const DEFAULT_VIDEO_LEN: usize = 640;
/// Default synthetic audio payload size per frame.
pub const DEFAULT_AUDIO_LEN: usize = 160;

const VIDEO_BANK: [u8; 7] = [0x56, 0x49, 0x44, 0x45, 0x4f, 0x2d, 0x7e];
const AUDIO_BANK: [u8; 5] = [0x41, 0x55, 0x44, 0x2d, 0x7e];

/// Deterministic producer of sequenced [`AvFrame`]s, starting at seq 1.
#[derive(Debug, Clone)]
pub struct ContentGenerator {
    video_len: usize,
    audio_len: usize,
    next_seq: u64,
    cursor: usize,
}

impl ContentGenerator {
    /// Generator with the default payload sizes.
    pub fn new() -> Self {
        Self::with_payload_sizes(DEFAULT_VIDEO_LEN, DEFAULT_AUDIO_LEN)
    }

    /// Generator emitting `video_len` video bytes and `audio_len` audio
    /// bytes per frame.
    pub fn with_payload_sizes(video_len: usize, audio_len: usize) -> Self {
        Self {
            video_len,
            audio_len,
            next_seq: 1,
            cursor: 0,
        }
    }

    /// Sequence number the next frame will carry.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Produce the next frame in the sequence.
    pub fn next_frame(&mut self) -> AvFrame {
        let video = self.fill(&VIDEO_BANK, self.video_len);
        let audio = self.fill(&AUDIO_BANK, self.audio_len);
        let seq = self.next_seq;
        self.next_seq += 1;
        AvFrame { seq, video, audio }
    }

    /// Take `len` bytes from `bank`, cycling, advancing the shared cursor.
    fn fill(&mut self, bank: &[u8], len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(bank[self.cursor % bank.len()]);
            self.cursor = self.cursor.wrapping_add(1);
        }
        out
    }
}

impl Default for ContentGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for ContentGenerator {
    type Item = AvFrame;

    fn next(&mut self) -> Option<AvFrame> {
        Some(self.next_frame())
    }
}

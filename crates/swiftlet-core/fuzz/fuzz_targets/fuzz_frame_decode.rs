//! Fuzz target for the AV frame codec.
//!
//! Feeds arbitrary bytes to `AvFrameCodec::decode`; any input that decodes
//! successfully must re-encode to the identical bytes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use swiftlet_core::{AvFrameCodec, FrameCodec};

fuzz_target!(|data: &[u8]| {
    let codec = AvFrameCodec;
    if let Ok(frame) = codec.decode(data) {
        // Payload lengths came from u32 fields, so re-encoding cannot fail.
        assert_eq!(codec.encode(&frame).unwrap(), data);
    }
});

//! Fuzz target for the record framer.
//!
//! Feeds arbitrary bytes to `Framer::push` in varying slice sizes to find
//! panics or hangs in the reassembly loop.

#![no_main]

use libfuzzer_sys::fuzz_target;
use swiftlet_core::{Framer, MAX_RECORD_LEN, RECORD_PREFIX_LEN};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // The first byte picks the slice size so inputs exercise pushes that
    // split prefixes and payloads at every offset.
    let slice_len = (data[0] as usize % 64) + 1;
    let stream = &data[1..];

    let mut framer = Framer::new(|payload| {
        // Zero-length records are rejected before delivery.
        assert!(!payload.is_empty());
        assert!(payload.len() <= MAX_RECORD_LEN);
    });

    for piece in stream.chunks(slice_len) {
        if framer.push(piece).is_err() {
            // Corrupt prefix: the buffer stays for inspection and a reset
            // recovers the framer.
            framer.reset();
            assert_eq!(framer.buffered(), 0);
            return;
        }
    }

    // Anything still buffered is smaller than one complete record.
    assert!(framer.buffered() < RECORD_PREFIX_LEN + MAX_RECORD_LEN);
});

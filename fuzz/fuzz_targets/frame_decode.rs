//! Fuzz target for Frame::decode and Payload::from_frame
//!
//! Arbitrary bytes must never panic the parser. Anything that decodes as a
//! frame is also pushed through payload decoding, which must fail cleanly on
//! malformed CBOR.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lockstep_proto::{Frame, Payload};

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = Frame::decode(data) {
        let _ = Payload::from_frame(&frame);
    }
});

//! Fuzz target for frame header boundary conditions
//!
//! # Invariants
//!
//! - `payload_size > MAX_PAYLOAD_SIZE` MUST return `PayloadTooLarge`
//! - Wrong magic MUST return `InvalidMagic`
//! - Wrong version MUST return `UnsupportedVersion`
//! - A header claiming more payload than present MUST return `FrameTruncated`
//! - A valid frame re-encodes to exactly the bytes it was decoded from

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lockstep_proto::{Frame, FrameHeader, ProtocolError};

#[derive(Debug, Clone, Arbitrary)]
enum Magic {
    Valid,
    OffByOne(bool),
    Random(u16),
}

#[derive(Debug, Clone, Arbitrary)]
enum Version {
    Valid,
    Zero,
    Random(u8),
}

#[derive(Debug, Clone, Arbitrary)]
enum PayloadSize {
    Exact,
    AtMax,
    JustOverMax,
    MaxU32,
    Random(u32),
}

#[derive(Debug, Clone, Arbitrary)]
struct BoundaryFrame {
    magic: Magic,
    version: Version,
    opcode: u8,
    payload_size: PayloadSize,
    payload: Vec<u8>,
}

fuzz_target!(|input: BoundaryFrame| {
    let magic = match input.magic {
        Magic::Valid => FrameHeader::MAGIC,
        Magic::OffByOne(up) => {
            if up { FrameHeader::MAGIC.wrapping_add(1) } else { FrameHeader::MAGIC.wrapping_sub(1) }
        },
        Magic::Random(m) => m,
    };
    let version = match input.version {
        Version::Valid => FrameHeader::VERSION,
        Version::Zero => 0,
        Version::Random(v) => v,
    };
    let actual = u32::try_from(input.payload.len()).unwrap_or(u32::MAX);
    let claimed = match input.payload_size {
        PayloadSize::Exact => actual,
        PayloadSize::AtMax => FrameHeader::MAX_PAYLOAD_SIZE,
        PayloadSize::JustOverMax => FrameHeader::MAX_PAYLOAD_SIZE + 1,
        PayloadSize::MaxU32 => u32::MAX,
        PayloadSize::Random(n) => n,
    };

    let mut bytes = Vec::with_capacity(FrameHeader::SIZE + input.payload.len());
    bytes.extend_from_slice(&magic.to_be_bytes());
    bytes.push(version);
    bytes.push(input.opcode);
    bytes.extend_from_slice(&claimed.to_be_bytes());
    bytes.extend_from_slice(&input.payload);

    match Frame::decode(&bytes) {
        Ok(frame) => {
            assert_eq!(magic, FrameHeader::MAGIC);
            assert_eq!(version, FrameHeader::VERSION);
            assert!(claimed <= FrameHeader::MAX_PAYLOAD_SIZE);
            assert!(claimed <= actual);

            let reencoded = frame.to_vec().expect("decoded frame must re-encode");
            assert_eq!(reencoded, bytes[..FrameHeader::SIZE + claimed as usize]);
        },
        Err(ProtocolError::InvalidMagic) => assert_ne!(magic, FrameHeader::MAGIC),
        Err(ProtocolError::UnsupportedVersion(v)) => {
            assert_eq!(v, version);
            assert_ne!(version, FrameHeader::VERSION);
        },
        Err(ProtocolError::PayloadTooLarge { .. }) => {
            assert!(claimed > FrameHeader::MAX_PAYLOAD_SIZE);
        },
        Err(ProtocolError::FrameTruncated { .. }) => assert!(claimed > actual),
        Err(e) => panic!("unexpected error for well-formed header bytes: {e}"),
    }
});

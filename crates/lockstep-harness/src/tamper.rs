//! Record tampering for integrity tests.
//!
//! A [`Tamper`] sits on a link and counts the Record frames that pass
//! through it. When the configured record comes by, one bit of its
//! ciphertext is flipped and the record is re-encoded, so the frame still
//! parses and the corruption reaches the receiver's MAC check.

use lockstep_proto::{Frame, Opcode, Payload};

use crate::error::HarnessError;

/// Which record to corrupt, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TamperPlan {
    /// Zero-based index among Record frames on this link
    pub record_index: u64,
    /// Ciphertext byte to corrupt (wrapped to the ciphertext length)
    pub byte: usize,
    /// Bit within that byte
    pub bit: u8,
}

impl TamperPlan {
    /// Flip the lowest bit of the first ciphertext byte of the first record.
    pub fn first_record() -> Self {
        Self { record_index: 0, byte: 0, bit: 0 }
    }
}

/// Per-link tamper state.
#[derive(Debug, Clone, Default)]
pub struct Tamper {
    plan: Option<TamperPlan>,
    records_seen: u64,
    applied: bool,
}

impl Tamper {
    /// A link that forwards everything unchanged.
    pub fn none() -> Self {
        Self::default()
    }

    /// A link that corrupts one record according to `plan`.
    pub fn with_plan(plan: TamperPlan) -> Self {
        Self { plan: Some(plan), records_seen: 0, applied: false }
    }

    /// Whether the planned corruption has happened.
    pub fn applied(&self) -> bool {
        self.applied
    }

    /// Pass a frame through the link, corrupting it if it is the target.
    ///
    /// # Errors
    ///
    /// - `Protocol` if the target record cannot be decoded or re-encoded
    pub fn apply(&mut self, frame: Frame) -> Result<Frame, HarnessError> {
        if frame.header.opcode_enum() != Some(Opcode::Record) {
            return Ok(frame);
        }

        let index = self.records_seen;
        self.records_seen += 1;

        let Some(plan) = self.plan.filter(|p| p.record_index == index) else {
            return Ok(frame);
        };

        let Payload::Record(mut record) = Payload::from_frame(&frame)? else {
            return Ok(frame);
        };
        if record.ciphertext.is_empty() {
            return Ok(frame);
        }

        let at = plan.byte % record.ciphertext.len();
        record.ciphertext[at] ^= 1 << (plan.bit % 8);
        self.applied = true;

        tracing::debug!(record = index, byte = at, bit = plan.bit % 8, "tampered with record");

        Ok(Payload::Record(record).into_frame()?)
    }
}

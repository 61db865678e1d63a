//! Frame operation codes

/// Identifies the payload carried by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Handshake offer: domain parameters, public value, nonce
    Hello = 0x01,
    /// Protected application record
    Record = 0x02,
    /// Orderly shutdown
    Close = 0x03,
}

impl Opcode {
    /// Wire value.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse a wire value. `None` if unrecognized.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Hello),
            0x02 => Some(Self::Record),
            0x03 => Some(Self::Close),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_round_trip() {
        for op in [Opcode::Hello, Opcode::Record, Opcode::Close] {
            assert_eq!(Opcode::from_u8(op.to_u8()), Some(op));
        }
        assert_eq!(Opcode::from_u8(0x00), None);
        assert_eq!(Opcode::from_u8(0xff), None);
    }
}

use crate::opcode::Opcode;
use thiserror::Error;

/// Outcome of a decode attempt that did not produce an instruction.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DecodeError {
    /// Fewer bytes left than the shortest instruction of the table.
    #[error("truncated instruction at offset {offset:#X}: only {remaining} byte(s) left")]
    Truncated { offset: usize, remaining: usize },

    /// No table entry matches the bytes at `offset`.
    #[error("no opcode matches at offset {offset:#X}")]
    NoMatch { offset: usize },

    /// An entry matched but one of its operands is out of its valid range.
    #[error(
        "opcode {opcode} at offset {offset:#X}: operand {field} has value {value}, limit is {limit}"
    )]
    InvalidOperand {
        offset: usize,
        opcode: Opcode,
        length: usize,
        field: usize,
        value: u64,
        limit: u64,
    },
}

impl DecodeError {
    /// Buffer offset the error refers to.
    pub const fn offset(&self) -> usize {
        match self {
            Self::Truncated { offset, .. }
            | Self::NoMatch { offset }
            | Self::InvalidOperand { offset, .. } => *offset,
        }
    }
}

/// Problems with an opcode table, detected once while building a
/// [`Registry`](crate::registry::Registry).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TableError {
    #[error("opcode table has no entries")]
    Empty,

    #[error("duplicate table entry for opcode {0}")]
    DuplicateTableEntry(Opcode),

    #[error("duplicate mnemonic `{0}`")]
    DuplicateMnemonic(String),

    #[error("`{0}` uses opcode id 0, which is reserved for unknown instructions")]
    ReservedOpcode(String),

    #[error("`{mnemonic}`: length {length} is outside 1..=8 bytes")]
    InvalidLength { mnemonic: String, length: u8 },

    #[error("`{mnemonic}`: value {value:#X} has bits outside mask {mask:#X}")]
    ValueOutsideMask {
        mnemonic: String,
        mask: u64,
        value: u64,
    },

    #[error("`{mnemonic}`: mask {mask:#X} does not fit in {length} byte(s)")]
    MaskTooWide {
        mnemonic: String,
        mask: u64,
        length: u8,
    },

    #[error("`{mnemonic}`: operand field {field}: {reason}")]
    InvalidField {
        mnemonic: String,
        field: usize,
        reason: String,
    },

    #[error("`{mnemonic}` has the same pattern as `{other}` and could never match")]
    AmbiguousPattern { mnemonic: String, other: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn offsets() {
        assert_eq!(DecodeError::NoMatch { offset: 3 }.offset(), 3);
        assert_eq!(
            DecodeError::Truncated {
                offset: 9,
                remaining: 1
            }
            .offset(),
            9
        );
    }

    #[test]
    fn messages() {
        assert_eq!(
            DecodeError::NoMatch { offset: 0x10 }.to_string(),
            "no opcode matches at offset 0x10"
        );
        assert_eq!(
            TableError::DuplicateTableEntry(Opcode::new(76)).to_string(),
            "duplicate table entry for opcode #76"
        );
    }
}

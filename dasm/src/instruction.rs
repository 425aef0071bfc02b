use crate::opcode::Opcode;
use crate::operand::Operand;
use serde::{Deserialize, Serialize};

/// One decoded instruction.
///
/// Holds no reference to the registry or to the decoded buffer: the
/// mnemonic is looked up again from [`opcode`](Self::opcode) when rendering.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct DecodedInstruction {
    opcode: Opcode,
    offset: usize,
    address: u64,
    length: usize,
    /// Bytes of the instruction inside the decoded window.
    available: usize,
    raw: u64,
    operands: Vec<Operand>,
}

impl DecodedInstruction {
    pub(crate) const fn new(
        opcode: Opcode,
        offset: usize,
        address: u64,
        length: usize,
        available: usize,
        raw: u64,
        operands: Vec<Operand>,
    ) -> Self {
        Self {
            opcode,
            offset,
            address,
            length,
            available,
            raw,
            operands,
        }
    }

    pub const fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Offset of the first byte inside the decoded buffer.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Address the instruction executes at.
    pub const fn address(&self) -> u64 {
        self.address
    }

    /// Length in bytes.
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Bytes of the instruction that were inside the window. Less than
    /// [`length`](Self::length) when the instruction runs past the end.
    pub const fn available(&self) -> usize {
        self.available
    }

    pub const fn is_cut_short(&self) -> bool {
        self.available < self.length
    }

    /// The significant bytes that were matched, as a little-endian word.
    pub const fn raw(&self) -> u64 {
        self.raw
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Offset of the byte right after the instruction.
    pub const fn end(&self) -> usize {
        self.offset + self.length
    }
}

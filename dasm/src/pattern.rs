use crate::bitwise::bytes_spanned;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Fixed bits of an instruction encoding.
///
/// A word matches when `word & mask == value`. Bits outside `mask` are
/// don't-care bits, usually operand fields.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
pub struct BitPattern {
    pub mask: u64,
    pub value: u64,
}

impl BitPattern {
    pub const fn new(mask: u64, value: u64) -> Self {
        Self { mask, value }
    }

    pub const fn matches(&self, word: u64) -> bool {
        word & self.mask == self.value
    }

    /// Number of fixed bits. More fixed bits means a more specific pattern.
    pub const fn specificity(&self) -> u32 {
        self.mask.count_ones()
    }

    /// Bytes needed to see every fixed bit.
    pub const fn bytes_spanned(&self) -> usize {
        bytes_spanned(self.mask)
    }

    /// Parses a pattern written most significant bit first.
    ///
    /// `0` and `1` are fixed bits, `_` and whitespace are ignored, anything
    /// else is a don't-care bit. Returns the pattern and its width in bytes.
    ///
    /// ```text
    /// "0001_xxxx"  ->  mask 0xF0, value 0x10, 1 byte
    /// ```
    pub fn parse(pattern: &str) -> Result<(Self, u8), String> {
        let bits: Vec<char> = pattern
            .chars()
            .filter(|c| *c != '_' && !c.is_whitespace())
            .collect();

        if bits.is_empty() || bits.len() % 8 != 0 || bits.len() > 64 {
            return Err(format!(
                "pattern `{pattern}` has {} bits, expected a multiple of 8 up to 64",
                bits.len()
            ));
        }

        let mut mask = 0;
        let mut value = 0;
        for (i, bit) in bits.iter().enumerate() {
            let bit_pos = bits.len() - 1 - i;
            match bit {
                '0' => mask |= 1 << bit_pos,
                '1' => {
                    mask |= 1 << bit_pos;
                    value |= 1 << bit_pos;
                }
                _ => {}
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        let width = (bits.len() / 8) as u8;
        Ok((Self { mask, value }, width))
    }
}

impl Display for BitPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "mask={:#X} value={:#X}", self.mask, self.value)
    }
}

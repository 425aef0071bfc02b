//! # Instruction matching
//!
//! Finds the table entry that decodes the bytes at a given position.
//!
//! The word tested against a pattern is assembled little-endian from the
//! bytes at the position, and only as many bytes as the entry needs are
//! read (its [significant length](OpcodeTableEntry::significant_length)):
//!
//! ```text
//! bytes:   [0x15, 0x??]        MOV  mask=0xF0 value=0x10 length=2
//! word:     0x15               0x15 & 0xF0 == 0x10  →  MOV
//! ```
//!
//! Candidates are tried most specific first (see
//! [`Registry::by_specificity`]); the first match wins. An entry whose
//! significant bytes run past the end of the input is not a candidate.

use crate::bitwise::read_word;
use crate::error::DecodeError;
use crate::registry::{OpcodeTableEntry, Registry};

/// A table entry matched at some position, with the word it matched.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Match<'r> {
    pub entry: &'r OpcodeTableEntry,
    /// The significant bytes of the instruction, little-endian.
    pub word: u64,
}

impl Match<'_> {
    /// Bytes the instruction occupies.
    pub fn length(&self) -> usize {
        self.entry.length_in_bytes()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Matcher<'r> {
    registry: &'r Registry,
}

impl<'r> Matcher<'r> {
    pub const fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Matches the instruction starting at `bytes[0]`.
    ///
    /// `offset` is only used to label the result. Returns
    /// [`DecodeError::Truncated`] without scanning when `bytes` is shorter
    /// than the shortest instruction of the table, and
    /// [`DecodeError::NoMatch`] when no candidate matches.
    pub fn find(&self, bytes: &[u8], offset: usize) -> Result<Match<'r>, DecodeError> {
        let remaining = bytes.len();
        if remaining < self.registry.shortest_length() {
            return Err(DecodeError::Truncated { offset, remaining });
        }

        let available = &bytes[..remaining.min(8)];

        for entry in self.registry.by_specificity() {
            let needed = entry.significant_length();
            if needed > available.len() {
                continue;
            }

            let word = read_word(&available[..needed]);
            if entry.pattern.matches(word) {
                tracing::trace!("{} matched at {offset:#X} (word {word:#X})", entry.mnemonic);
                return Ok(Match { entry, word });
            }
        }

        Err(DecodeError::NoMatch { offset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Opcode;
    use crate::operand::OperandField;
    use crate::pattern::BitPattern;
    use pretty_assertions::assert_eq;
    use rand::Rng;

    fn entry(id: u16, mnemonic: &str, mask: u64, value: u64, length: u8) -> OpcodeTableEntry {
        OpcodeTableEntry::new(
            Opcode::new(id),
            mnemonic,
            BitPattern::new(mask, value),
            length,
            vec![],
        )
    }

    fn mov_nop() -> Registry {
        Registry::new(vec![
            OpcodeTableEntry::new(
                Opcode::new(76),
                "MOV",
                BitPattern::new(0xF0, 0x10),
                2,
                vec![OperandField::register(0, 4, 16)],
            ),
            entry(99, "NOP", 0xFF, 0x00, 1),
        ])
        .unwrap()
    }

    #[test]
    fn finds_entry() {
        let registry = mov_nop();
        let matcher = Matcher::new(&registry);

        let found = matcher.find(&[0x00, 0x15], 0).unwrap();
        assert_eq!(found.entry.mnemonic, "NOP");
        assert_eq!(found.length(), 1);

        let found = matcher.find(&[0x15], 1).unwrap();
        assert_eq!(found.entry.mnemonic, "MOV");
        assert_eq!(found.word, 0x15);
        assert_eq!(found.length(), 2);
    }

    #[test]
    fn no_match() {
        let registry = mov_nop();
        let matcher = Matcher::new(&registry);

        assert_eq!(
            matcher.find(&[0x42, 0x00], 7),
            Err(DecodeError::NoMatch { offset: 7 })
        );
    }

    #[test]
    fn truncated_before_scanning() {
        let registry = Registry::new(vec![entry(82, "MOVL", 0xFFFF, 0x1234, 2)]).unwrap();
        let matcher = Matcher::new(&registry);

        assert_eq!(
            matcher.find(&[0x99], 4),
            Err(DecodeError::Truncated {
                offset: 4,
                remaining: 1
            })
        );
        assert_eq!(
            matcher.find(&[], 0),
            Err(DecodeError::Truncated {
                offset: 0,
                remaining: 0
            })
        );
    }

    #[test]
    fn longer_entry_past_the_end_is_no_candidate() {
        let registry = Registry::new(vec![
            entry(99, "NOP", 0xFF, 0x00, 1),
            entry(54, "LB", 0xFF_FF, 0x80_01, 2),
            // Every fixed bit sits in the second byte.
            entry(82, "MOVL", 0xFF_00, 0x12_00, 2),
        ])
        .unwrap();
        let matcher = Matcher::new(&registry);

        assert_eq!(matcher.find(&[0x01], 3), Err(DecodeError::NoMatch { offset: 3 }));
        assert_eq!(matcher.find(&[0x02], 3), Err(DecodeError::NoMatch { offset: 3 }));
        assert_eq!(matcher.find(&[0x01, 0x80], 3).unwrap().entry.mnemonic, "LB");
        assert_eq!(matcher.find(&[0x07, 0x12], 3).unwrap().entry.mnemonic, "MOVL");
    }

    #[test]
    fn most_specific_entry_wins() {
        // Declared generic first on purpose.
        let registry = Registry::new(vec![
            entry(4, "ADD", 0xF0, 0x10, 1),
            entry(6, "ADDCL", 0xFF, 0x1F, 1),
        ])
        .unwrap();
        let matcher = Matcher::new(&registry);

        assert_eq!(matcher.find(&[0x1F], 0).unwrap().entry.mnemonic, "ADDCL");
        assert_eq!(matcher.find(&[0x1E], 0).unwrap().entry.mnemonic, "ADD");
    }

    #[test]
    fn declaration_order_breaks_ties() {
        let registry = Registry::new(vec![
            entry(12, "AND", 0x0F, 0x01, 1),
            entry(103, "OR", 0xF0, 0x10, 1),
        ])
        .unwrap();
        let matcher = Matcher::new(&registry);

        assert_eq!(matcher.find(&[0x11], 0).unwrap().entry.mnemonic, "AND");
    }

    #[test]
    fn every_entry_round_trips() {
        let registry = Registry::new(vec![
            entry(99, "NOP", 0xFFFF, 0x0000, 2),
            entry(76, "MOV", 0xF000, 0x1000, 2),
            entry(130, "SUB", 0xFF00, 0x2300, 2),
            entry(141, "TBIT", 0xF0F0, 0x4080, 2),
            entry(148, "XBANZ", 0xFF00_FFFF, 0x0000_5601, 4),
        ])
        .unwrap();
        let matcher = Matcher::new(&registry);
        let mut rng = rand::thread_rng();

        for expected in registry.all() {
            for _ in 0..64 {
                let noise: u64 = rng.gen_range(0..=u64::MAX);
                let word = expected.pattern.value | (noise & !expected.pattern.mask);
                let bytes = word.to_le_bytes();

                let found = matcher.find(&bytes[..expected.length_in_bytes()], 0).unwrap();
                assert_eq!(found.entry.opcode, expected.opcode, "word {word:#X}");
            }
        }
    }
}

//! # Opcode registry
//!
//! The registry owns the opcode table of one instruction set: for each
//! opcode, its mnemonic, the bit pattern that identifies it, its length and
//! its operand fields.
//!
//! It is built explicitly with [`Registry::new`], which checks the whole
//! table once and refuses tables the matcher could not decode
//! deterministically. After that it never changes, so a single registry can
//! be shared by reference between any number of threads.
//!
//! ## Matching order
//!
//! Encodings of one instruction set often overlap: a generic form leaves
//! bits free that a specialized form fixes.
//!
//! ```text
//! ADD   0001_xxxx      4 fixed bits
//! ADDC  0001_1111      8 fixed bits   ← must be tried first
//! ```
//!
//! The registry keeps its entries sorted by descending number of fixed
//! bits, ties broken by declaration order, and the matcher walks them in
//! that order.

use crate::bitwise::bytes_spanned;
use crate::error::TableError;
use crate::opcode::{Opcode, UNKNOWN_MNEMONIC};
use crate::operand::OperandField;
use crate::pattern::BitPattern;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Widest instruction the registry accepts, in bytes.
pub const MAX_INSTRUCTION_LENGTH: u8 = 8;

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct OpcodeTableEntry {
    pub opcode: Opcode,
    pub mnemonic: String,
    pub pattern: BitPattern,
    /// Length of the whole instruction in bytes.
    pub length: u8,
    pub fields: Vec<OperandField>,
}

impl OpcodeTableEntry {
    pub fn new(
        opcode: Opcode,
        mnemonic: impl Into<String>,
        pattern: BitPattern,
        length: u8,
        fields: Vec<OperandField>,
    ) -> Self {
        Self {
            opcode,
            mnemonic: mnemonic.into(),
            pattern,
            length,
            fields,
        }
    }

    pub fn length_in_bytes(&self) -> usize {
        usize::from(self.length)
    }

    /// Bytes that must be present to match the pattern and read every
    /// operand. Never more than the instruction length.
    pub fn significant_length(&self) -> usize {
        let fields_top = self
            .fields
            .iter()
            .map(|field| field.top_bit() as usize / 8 + 1)
            .max()
            .unwrap_or(0);

        self.pattern.bytes_spanned().max(fields_top).max(1)
    }

    fn validate(&self) -> Result<(), TableError> {
        let mnemonic = || self.mnemonic.clone();

        if self.opcode.is_unknown() {
            return Err(TableError::ReservedOpcode(mnemonic()));
        }

        if self.length == 0 || self.length > MAX_INSTRUCTION_LENGTH {
            return Err(TableError::InvalidLength {
                mnemonic: mnemonic(),
                length: self.length,
            });
        }

        let BitPattern { mask, value } = self.pattern;
        if value & !mask != 0 {
            return Err(TableError::ValueOutsideMask {
                mnemonic: mnemonic(),
                mask,
                value,
            });
        }

        if bytes_spanned(mask) > self.length_in_bytes() {
            return Err(TableError::MaskTooWide {
                mnemonic: mnemonic(),
                mask,
                length: self.length,
            });
        }

        for (field, descriptor) in self.fields.iter().enumerate() {
            descriptor
                .validate(self.length)
                .map_err(|reason| TableError::InvalidField {
                    mnemonic: mnemonic(),
                    field,
                    reason,
                })?;
        }

        Ok(())
    }
}

/// Read-only opcode table with lookups by id and by mnemonic.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<OpcodeTableEntry>,
    by_opcode: HashMap<Opcode, usize>,
    by_mnemonic: HashMap<String, usize>,
    /// Indexes into `entries`, most specific pattern first.
    match_order: Vec<usize>,
    shortest_length: usize,
}

impl Registry {
    /// Checks `entries` and builds the registry.
    ///
    /// Fails on an empty table, a duplicate opcode or mnemonic, a malformed
    /// entry, or two entries sharing the same pattern.
    pub fn new(entries: Vec<OpcodeTableEntry>) -> Result<Self, TableError> {
        if entries.is_empty() {
            return Err(TableError::Empty);
        }

        let mut by_opcode = HashMap::with_capacity(entries.len());
        let mut by_mnemonic = HashMap::with_capacity(entries.len());
        let mut by_pattern: HashMap<BitPattern, usize> = HashMap::new();

        for (index, entry) in entries.iter().enumerate() {
            entry.validate()?;

            if by_opcode.insert(entry.opcode, index).is_some() {
                return Err(TableError::DuplicateTableEntry(entry.opcode));
            }

            if by_mnemonic.insert(entry.mnemonic.clone(), index).is_some() {
                return Err(TableError::DuplicateMnemonic(entry.mnemonic.clone()));
            }

            if let Some(other) = by_pattern.insert(entry.pattern, index) {
                return Err(TableError::AmbiguousPattern {
                    mnemonic: entry.mnemonic.clone(),
                    other: entries[other].mnemonic.clone(),
                });
            }
        }

        let mut match_order: Vec<usize> = (0..entries.len()).collect();
        // Stable sort: equal specificity keeps declaration order.
        match_order.sort_by_key(|index| std::cmp::Reverse(entries[*index].pattern.specificity()));

        let shortest_length = entries
            .iter()
            .map(OpcodeTableEntry::length_in_bytes)
            .min()
            .unwrap_or(1);

        tracing::debug!(
            "built opcode registry: {} entries, shortest instruction {shortest_length} byte(s)",
            entries.len()
        );

        Ok(Self {
            entries,
            by_opcode,
            by_mnemonic,
            match_order,
            shortest_length,
        })
    }

    pub fn lookup(&self, opcode: Opcode) -> Option<&OpcodeTableEntry> {
        self.by_opcode.get(&opcode).map(|index| &self.entries[*index])
    }

    /// Case-sensitive exact match.
    pub fn lookup_by_mnemonic(&self, mnemonic: &str) -> Option<&OpcodeTableEntry> {
        self.by_mnemonic
            .get(mnemonic)
            .map(|index| &self.entries[*index])
    }

    /// Every entry, in declaration order.
    pub fn all(&self) -> std::slice::Iter<'_, OpcodeTableEntry> {
        self.entries.iter()
    }

    /// Every entry, in the order the matcher tries them.
    pub fn by_specificity(&self) -> impl Iterator<Item = &OpcodeTableEntry> + Clone {
        self.match_order.iter().map(|index| &self.entries[*index])
    }

    /// Mnemonic of `opcode`, or [`UNKNOWN_MNEMONIC`] if the table lacks it.
    pub fn mnemonic(&self, opcode: Opcode) -> &str {
        self.lookup(opcode)
            .map_or(UNKNOWN_MNEMONIC, |entry| entry.mnemonic.as_str())
    }

    /// Length of the shortest instruction in the table, in bytes.
    pub const fn shortest_length(&self) -> usize {
        self.shortest_length
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

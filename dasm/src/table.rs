//! # Opcode table files
//!
//! Encodings are not built into the crate: they are read from a versioned
//! JSON table supplied by the user.
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": [
//!     { "mnemonic": "NOP", "pattern": "0000_0000" },
//!     { "mnemonic": "MOV", "mask": 240, "value": 16, "length": 2,
//!       "fields": [ { "offset": 0, "width": 4,
//!                     "role": { "kind": "register", "count": 16 } } ] }
//!   ]
//! }
//! ```
//!
//! An entry gives its fixed bits either as a `pattern` string (see
//! [`BitPattern::parse`]) or as `mask` and `value`. `length` defaults to the
//! width of the pattern string. `opcode` defaults to the id the mnemonic has
//! in the [C28x catalog](crate::opcode::C28X_MNEMONICS).

use crate::error::TableError;
use crate::opcode::{self, Opcode};
use crate::operand::OperandField;
use crate::pattern::BitPattern;
use crate::registry::{OpcodeTableEntry, Registry};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Table format version this crate reads.
pub const TABLE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read table: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid table json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported table version {0}, expected {expected}", expected = TABLE_VERSION)]
    UnsupportedVersion(u32),

    #[error("`{0}` is not in the mnemonic catalog and has no explicit opcode")]
    UnknownMnemonic(String),

    #[error("`{mnemonic}`: {reason}")]
    BadPattern { mnemonic: String, reason: String },

    #[error("`{0}` has no length and no pattern string to take it from")]
    MissingLength(String),

    #[error(transparent)]
    Table(#[from] TableError),
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternSpec {
    Bits { pattern: String },
    MaskValue { mask: u64, value: u64 },
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct EntrySpec {
    pub mnemonic: String,
    #[serde(default)]
    pub opcode: Option<u16>,
    #[serde(flatten)]
    pub pattern: PatternSpec,
    #[serde(default)]
    pub length: Option<u8>,
    #[serde(default)]
    pub fields: Vec<OperandField>,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct TableFile {
    pub version: u32,
    pub entries: Vec<EntrySpec>,
}

impl EntrySpec {
    fn into_entry(self) -> Result<OpcodeTableEntry, LoadError> {
        let opcode = match self.opcode {
            Some(id) => Opcode::new(id),
            None => opcode::opcode_of(&self.mnemonic)
                .ok_or_else(|| LoadError::UnknownMnemonic(self.mnemonic.clone()))?,
        };

        let (pattern, pattern_width) = match &self.pattern {
            PatternSpec::Bits { pattern } => {
                let (parsed, width) =
                    BitPattern::parse(pattern).map_err(|reason| LoadError::BadPattern {
                        mnemonic: self.mnemonic.clone(),
                        reason,
                    })?;
                (parsed, Some(width))
            }
            PatternSpec::MaskValue { mask, value } => (BitPattern::new(*mask, *value), None),
        };

        let length = self
            .length
            .or(pattern_width)
            .ok_or_else(|| LoadError::MissingLength(self.mnemonic.clone()))?;

        Ok(OpcodeTableEntry::new(
            opcode,
            self.mnemonic,
            pattern,
            length,
            self.fields,
        ))
    }
}

impl TableFile {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let table: Self = serde_json::from_str(json)?;
        if table.version != TABLE_VERSION {
            return Err(LoadError::UnsupportedVersion(table.version));
        }

        Ok(table)
    }

    pub fn into_entries(self) -> Result<Vec<OpcodeTableEntry>, LoadError> {
        self.entries.into_iter().map(EntrySpec::into_entry).collect()
    }

    pub fn into_registry(self) -> Result<Registry, LoadError> {
        Ok(Registry::new(self.into_entries()?)?)
    }
}

/// Parses a JSON table and builds its registry.
pub fn registry_from_json(json: &str) -> Result<Registry, LoadError> {
    TableFile::from_json(json)?.into_registry()
}

/// Reads a JSON table from disk and builds its registry.
pub fn load_registry(path: impl AsRef<Path>) -> Result<Registry, LoadError> {
    let json = std::fs::read_to_string(path.as_ref())?;
    tracing::debug!("loading opcode table from {}", path.as_ref().display());
    registry_from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::FieldRole;
    use pretty_assertions::assert_eq;

    const TABLE: &str = r#"{
        "version": 1,
        "entries": [
            { "mnemonic": "NOP", "pattern": "0000_0000" },
            { "mnemonic": "MOV", "mask": 240, "value": 16, "length": 2,
              "fields": [ { "offset": 0, "width": 4,
                            "role": { "kind": "register", "count": 16 } } ] },
            { "mnemonic": "CUSTOM", "opcode": 500, "pattern": "1111_xxxx 0000_0001",
              "fields": [ { "offset": 8, "width": 4, "role": { "kind": "condition" } } ] }
        ]
    }"#;

    #[test]
    fn loads_entries() {
        let registry = registry_from_json(TABLE).unwrap();

        let nop = registry.lookup_by_mnemonic("NOP").unwrap();
        assert_eq!(nop.opcode, opcode::opcode_of("NOP").unwrap());
        assert_eq!(nop.pattern, BitPattern::new(0xFF, 0x00));
        assert_eq!(nop.length, 1);

        let mov = registry.lookup_by_mnemonic("MOV").unwrap();
        assert_eq!(mov.pattern, BitPattern::new(0xF0, 0x10));
        assert_eq!(mov.length, 2);
        assert_eq!(mov.fields, vec![OperandField::register(0, 4, 16)]);

        let custom = registry.lookup(Opcode::new(500)).unwrap();
        assert_eq!(custom.pattern, BitPattern::new(0xF0FF, 0xF001));
        assert_eq!(custom.length, 2);
        assert_eq!(custom.fields[0].role, FieldRole::Condition);
    }

    #[test]
    fn rejects_other_versions() {
        let json = r#"{ "version": 2, "entries": [] }"#;
        assert!(matches!(
            TableFile::from_json(json),
            Err(LoadError::UnsupportedVersion(2))
        ));
        assert_eq!(
            LoadError::UnsupportedVersion(2).to_string(),
            "unsupported table version 2, expected 1"
        );
    }

    #[test]
    fn rejects_unknown_mnemonic() {
        let json = r#"{ "version": 1, "entries": [
            { "mnemonic": "FROB", "pattern": "00000001" }
        ] }"#;
        assert!(matches!(
            registry_from_json(json),
            Err(LoadError::UnknownMnemonic(name)) if name == "FROB"
        ));
    }

    #[test]
    fn rejects_missing_length() {
        let json = r#"{ "version": 1, "entries": [
            { "mnemonic": "NOP", "mask": 255, "value": 0 }
        ] }"#;
        assert!(matches!(
            registry_from_json(json),
            Err(LoadError::MissingLength(_))
        ));
    }

    #[test]
    fn rejects_bad_pattern() {
        let json = r#"{ "version": 1, "entries": [ { "mnemonic": "NOP", "pattern": "0000" } ] }"#;
        assert!(matches!(
            registry_from_json(json),
            Err(LoadError::BadPattern { .. })
        ));
    }

    #[test]
    fn table_errors_pass_through() {
        let json = r#"{ "version": 1, "entries": [
            { "mnemonic": "NOP", "pattern": "00000000" },
            { "mnemonic": "IDLE", "pattern": "00000000" }
        ] }"#;
        assert!(matches!(
            registry_from_json(json),
            Err(LoadError::Table(TableError::AmbiguousPattern { .. }))
        ));

        let json = r#"{ "version": 1, "entries": [] }"#;
        assert!(matches!(
            registry_from_json(json),
            Err(LoadError::Table(TableError::Empty))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            registry_from_json("{ not json"),
            Err(LoadError::Json(_))
        ));
    }
}

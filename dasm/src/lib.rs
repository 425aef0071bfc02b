//! Table-driven disassembler core.
//!
//! Bytes flow one way through the crate:
//!
//! ```text
//!  bytes ──► Matcher ──► decode_operands ──► Walk ──► DecodedInstruction | DecodeError
//!               │
//!               └── Registry (read-only, built once from an opcode table)
//! ```
//!
//! ```
//! use dasm::{
//!     BitPattern, DecodeError, Disassembler, DisassemblerConfig, FailurePolicy, Opcode,
//!     OpcodeTableEntry, Operand, OperandField, Registry,
//! };
//!
//! let registry = Registry::new(vec![
//!     OpcodeTableEntry::new(
//!         Opcode::new(76),
//!         "MOV",
//!         BitPattern::new(0xF0, 0x10),
//!         2,
//!         vec![OperandField::register(0, 4, 16)],
//!     ),
//!     OpcodeTableEntry::new(Opcode::new(99), "NOP", BitPattern::new(0xFF, 0x00), 1, vec![]),
//! ])?;
//!
//! let disassembler = Disassembler::new(&registry, DisassemblerConfig::new(FailurePolicy::Strict));
//! let records = disassembler
//!     .walk(&[0x00, 0x15], 0, None)
//!     .collect::<Result<Vec<_>, DecodeError>>()?;
//!
//! assert_eq!(registry.mnemonic(records[1].opcode()), "MOV");
//! assert_eq!(records[1].operands(), &[Operand::Register(5)]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
mod bitwise;

pub mod driver;
pub mod error;
pub mod instruction;
pub mod matcher;
pub mod opcode;
pub mod operand;
pub mod pattern;
pub mod registry;
pub mod table;

pub use driver::{Disassembler, DisassemblerConfig, FailurePolicy, Walk};
pub use error::{DecodeError, TableError};
pub use instruction::DecodedInstruction;
pub use matcher::{Match, Matcher};
pub use opcode::Opcode;
pub use operand::{FieldRole, Operand, OperandField};
pub use pattern::BitPattern;
pub use registry::{OpcodeTableEntry, Registry};
pub use table::{LoadError, TableFile, load_registry, registry_from_json};

//! # Operand decoding
//!
//! Every table entry lists the operand fields of its encoding in order. A
//! field is a run of bits inside the instruction word plus a role telling
//! how the raw bits are read:
//!
//! ```text
//!  word:  |1_1_1_1|0_0_1_0|_imm8 (signed)__|rrrr|cccc|
//!                          ↑                ↑    ↑
//!                          │                │    └─ condition, bits 0-3
//!                          │                └────── register, bits 4-7
//!                          └─────────────────────── immediate, bits 8-15
//! ```
//!
//! Decoding is a pure function of the entry, the word and the address of
//! the instruction. Symbolic names are left to whoever renders the result.

use crate::bitwise::Bits;
use crate::error::DecodeError;
use crate::registry::OpcodeTableEntry;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// How the raw bits of an operand field are interpreted.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldRole {
    /// Index into a register file of `count` registers.
    Register { count: u16 },

    /// Constant operand, sign-extended when `signed`.
    Immediate {
        #[serde(default)]
        signed: bool,
    },

    /// Memory or branch target. Relative addresses are sign-extended and
    /// added to the address of the instruction itself. The raw value is
    /// multiplied by `scale` first.
    Address {
        #[serde(default)]
        relative: bool,
        #[serde(default = "default_scale")]
        scale: u32,
    },

    /// Condition code, kept raw.
    Condition,
}

const fn default_scale() -> u32 {
    1
}

/// Position and role of one operand inside an instruction word.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub struct OperandField {
    pub offset: u8,
    pub width: u8,
    pub role: FieldRole,
}

/// A decoded operand value.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum Operand {
    Register(u16),
    Immediate(i64),
    Address(u64),
    Condition(u8),
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register(index) => write!(f, "R{index}"),
            Self::Immediate(value) => write!(f, "#{value}"),
            Self::Address(address) => write!(f, "0x{address:08X}"),
            Self::Condition(code) => write!(f, "cc{code}"),
        }
    }
}

/// A raw field value that is not valid for its role.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct OutOfRange {
    pub value: u64,
    pub limit: u64,
}

impl OperandField {
    pub const fn new(offset: u8, width: u8, role: FieldRole) -> Self {
        Self {
            offset,
            width,
            role,
        }
    }

    pub const fn register(offset: u8, width: u8, count: u16) -> Self {
        Self::new(offset, width, FieldRole::Register { count })
    }

    pub const fn immediate(offset: u8, width: u8, signed: bool) -> Self {
        Self::new(offset, width, FieldRole::Immediate { signed })
    }

    /// Index of the highest bit covered by the field.
    pub const fn top_bit(&self) -> u32 {
        self.offset as u32 + self.width as u32 - 1
    }

    /// Largest width allowed for the role of this field.
    const fn max_width(&self) -> u8 {
        match self.role {
            FieldRole::Register { .. } => 16,
            FieldRole::Immediate { signed: false } => 63,
            FieldRole::Immediate { signed: true } | FieldRole::Address { .. } => 64,
            FieldRole::Condition => 8,
        }
    }

    /// Checks the field against an instruction of `length` bytes.
    pub(crate) fn validate(&self, length: u8) -> Result<(), String> {
        if self.width == 0 {
            return Err("width is zero".to_string());
        }

        if self.width > self.max_width() {
            return Err(format!(
                "width {} exceeds {} bits allowed for {:?}",
                self.width,
                self.max_width(),
                self.role
            ));
        }

        if self.top_bit() >= u32::from(length) * 8 {
            return Err(format!(
                "bits {}..={} do not fit in {length} byte(s)",
                self.offset,
                self.top_bit()
            ));
        }

        match self.role {
            FieldRole::Register { count: 0 } => Err("register file is empty".to_string()),
            FieldRole::Address { scale: 0, .. } => Err("address scale is zero".to_string()),
            _ => Ok(()),
        }
    }

    /// Raw bits of the field, shifted down to bit 0.
    #[allow(clippy::cast_possible_truncation)]
    pub fn raw(&self, word: u64) -> u64 {
        word.get_bits(self.offset..=self.top_bit() as u8)
    }

    /// Interprets the field inside `word` for an instruction at `address`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn extract(&self, word: u64, address: u64) -> Result<Operand, OutOfRange> {
        let raw = self.raw(word);

        match self.role {
            FieldRole::Register { count } => {
                if raw < u64::from(count) {
                    Ok(Operand::Register(raw as u16))
                } else {
                    Err(OutOfRange {
                        value: raw,
                        limit: u64::from(count),
                    })
                }
            }
            FieldRole::Immediate { signed: true } => {
                Ok(Operand::Immediate(raw.sign_extended(self.width) as i64))
            }
            FieldRole::Immediate { signed: false } => Ok(Operand::Immediate(raw as i64)),
            FieldRole::Address {
                relative: true,
                scale,
            } => {
                let displacement = (raw.sign_extended(self.width) as i64)
                    .wrapping_mul(i64::from(scale));
                Ok(Operand::Address(address.wrapping_add_signed(displacement)))
            }
            FieldRole::Address {
                relative: false,
                scale,
            } => Ok(Operand::Address(raw.wrapping_mul(u64::from(scale)))),
            FieldRole::Condition => Ok(Operand::Condition(raw as u8)),
        }
    }
}

/// Extracts every operand of `entry` from `word`.
///
/// `offset` is the buffer offset of the instruction and `address` the
/// address it executes at. The first out-of-range field is reported as
/// [`DecodeError::InvalidOperand`].
pub fn decode_operands(
    entry: &OpcodeTableEntry,
    word: u64,
    address: u64,
    offset: usize,
) -> Result<Vec<Operand>, DecodeError> {
    entry
        .fields
        .iter()
        .enumerate()
        .map(|(field, descriptor)| {
            descriptor
                .extract(word, address)
                .map_err(|OutOfRange { value, limit }| DecodeError::InvalidOperand {
                    offset,
                    opcode: entry.opcode,
                    length: entry.length_in_bytes(),
                    field,
                    value,
                    limit,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Opcode;
    use crate::pattern::BitPattern;
    use pretty_assertions::assert_eq;

    #[test]
    fn register_in_range() {
        let field = OperandField::register(0, 4, 16);
        assert_eq!(field.extract(0x15, 0), Ok(Operand::Register(5)));
        assert_eq!(field.extract(0x1F, 0), Ok(Operand::Register(15)));
    }

    #[test]
    fn register_out_of_range() {
        let field = OperandField::register(0, 4, 8);
        assert_eq!(
            field.extract(0x0A, 0),
            Err(OutOfRange {
                value: 10,
                limit: 8
            })
        );
    }

    #[test]
    fn immediates() {
        let unsigned = OperandField::immediate(8, 8, false);
        let signed = OperandField::immediate(8, 8, true);

        assert_eq!(unsigned.extract(0xFE00, 0), Ok(Operand::Immediate(254)));
        assert_eq!(signed.extract(0xFE00, 0), Ok(Operand::Immediate(-2)));
        assert_eq!(signed.extract(0x7F00, 0), Ok(Operand::Immediate(127)));
    }

    #[test]
    fn relative_address_uses_instruction_address() {
        let field = OperandField::new(
            0,
            8,
            FieldRole::Address {
                relative: true,
                scale: 1,
            },
        );

        assert_eq!(field.extract(0x10, 0x100), Ok(Operand::Address(0x110)));
        assert_eq!(field.extract(0xF0, 0x100), Ok(Operand::Address(0xF0)));
    }

    #[test]
    fn scaled_addresses() {
        let relative = OperandField::new(
            0,
            8,
            FieldRole::Address {
                relative: true,
                scale: 2,
            },
        );
        let absolute = OperandField::new(
            0,
            16,
            FieldRole::Address {
                relative: false,
                scale: 2,
            },
        );

        assert_eq!(relative.extract(0xFF, 0x100), Ok(Operand::Address(0xFE)));
        assert_eq!(absolute.extract(0x8000, 0x100), Ok(Operand::Address(0x1_0000)));
    }

    #[test]
    fn condition_is_raw() {
        let field = OperandField::new(4, 4, FieldRole::Condition);
        assert_eq!(field.extract(0xA0, 0), Ok(Operand::Condition(0xA)));
    }

    #[test]
    fn validate_fields() {
        assert!(OperandField::register(0, 4, 16).validate(1).is_ok());
        assert!(OperandField::register(4, 8, 16).validate(1).is_err());
        assert!(OperandField::register(0, 0, 16).validate(1).is_err());
        assert!(OperandField::register(0, 4, 0).validate(1).is_err());
        assert!(OperandField::new(0, 9, FieldRole::Condition).validate(2).is_err());
        assert!(OperandField::immediate(0, 64, true).validate(8).is_ok());
        assert!(OperandField::immediate(0, 64, false).validate(8).is_err());
    }

    #[test]
    fn decode_reports_field_index() {
        let entry = OpcodeTableEntry::new(
            Opcode::new(76),
            "MOV",
            BitPattern::new(0xFF00, 0x1200),
            2,
            vec![
                OperandField::register(0, 4, 16),
                OperandField::register(4, 4, 8),
            ],
        );

        assert_eq!(
            decode_operands(&entry, 0x1235, 0, 0),
            Ok(vec![Operand::Register(5), Operand::Register(3)])
        );
        assert_eq!(
            decode_operands(&entry, 0x12F5, 0, 6),
            Err(DecodeError::InvalidOperand {
                offset: 6,
                opcode: Opcode::new(76),
                length: 2,
                field: 1,
                value: 15,
                limit: 8,
            })
        );
    }

    #[test]
    fn field_role_json() {
        let field: OperandField =
            serde_json::from_str(r#"{"offset":0,"width":4,"role":{"kind":"register","count":16}}"#)
                .unwrap();
        assert_eq!(field, OperandField::register(0, 4, 16));

        let role: FieldRole =
            serde_json::from_str(r#"{"kind":"address","relative":true}"#).unwrap();
        assert_eq!(
            role,
            FieldRole::Address {
                relative: true,
                scale: 1
            }
        );

        let role: FieldRole = serde_json::from_str(r#"{"kind":"condition"}"#).unwrap();
        assert_eq!(role, FieldRole::Condition);
    }
}

//! Text rendering of decoded records and opcode tables.

use dasm::{
    DecodeError, DecodedInstruction, DisassemblerConfig, FieldRole, OpcodeTableEntry, Registry,
};
use std::fmt::Write;

/// Rendered walk over one image.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Listing {
    pub lines: Vec<String>,
    pub instructions: usize,
    pub errors: usize,
}

/// Walks `image` and renders one line per record.
pub fn render(
    registry: &Registry,
    config: DisassemblerConfig,
    image: &[u8],
    start: usize,
    length: Option<usize>,
) -> Listing {
    let disassembler = dasm::Disassembler::new(registry, config);
    let mut listing = Listing::default();

    // Byte columns never show bytes past the end of the window.
    let end = length.map_or(image.len(), |length| start.saturating_add(length).min(image.len()));
    let window = &image[..end];

    for record in disassembler.walk(window, start, None) {
        let line = match &record {
            Ok(instruction) => {
                listing.instructions += 1;
                instruction_line(registry, window, instruction)
            }
            Err(error) => {
                listing.errors += 1;
                error_line(config.base_address, window, error)
            }
        };
        listing.lines.push(line);
    }

    listing
}

fn hex_bytes(image: &[u8], offset: usize, length: usize) -> String {
    let end = offset.saturating_add(length).min(image.len());
    image
        .get(offset..end)
        .unwrap_or_default()
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn instruction_line(
    registry: &Registry,
    image: &[u8],
    instruction: &DecodedInstruction,
) -> String {
    let bytes = hex_bytes(image, instruction.offset(), instruction.length());
    let mnemonic = registry.mnemonic(instruction.opcode());
    let operands = instruction
        .operands()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    let mut line = format!("{:08X}:  {bytes:<24} {mnemonic} {operands}", instruction.address())
        .trim_end()
        .to_string();
    if instruction.is_cut_short() {
        let _ = write!(line, " ; {} of {} byte(s)", instruction.available(), instruction.length());
    }

    line
}

pub fn error_line(base_address: u64, image: &[u8], error: &DecodeError) -> String {
    let offset = error.offset();
    let length = match error {
        DecodeError::Truncated { remaining, .. } => *remaining,
        DecodeError::NoMatch { .. } => 1,
        DecodeError::InvalidOperand { length, .. } => *length,
    };
    let bytes = hex_bytes(image, offset, length);
    let address = base_address.wrapping_add(offset as u64);

    format!("{address:08X}:  {bytes:<24} ; {error}")
}

fn role(role: &FieldRole) -> String {
    match role {
        FieldRole::Register { count } => format!("reg/{count}"),
        FieldRole::Immediate { signed: true } => "simm".to_string(),
        FieldRole::Immediate { signed: false } => "imm".to_string(),
        FieldRole::Address {
            relative: true,
            scale,
        } => format!("rel*{scale}"),
        FieldRole::Address {
            relative: false,
            scale,
        } => format!("addr*{scale}"),
        FieldRole::Condition => "cond".to_string(),
    }
}

pub fn entry_line(entry: &OpcodeTableEntry) -> String {
    let mut line = format!(
        "{:>5}  {:<8} len={} {}",
        entry.opcode.id(),
        entry.mnemonic,
        entry.length,
        entry.pattern
    );

    for field in &entry.fields {
        let _ = write!(
            line,
            " [{}..={} {}]",
            field.offset,
            field.top_bit(),
            role(&field.role)
        );
    }

    line
}

//! # Disassembly driver
//!
//! Walks a window of a buffer one instruction at a time.
//!
//! ```text
//!   position ──► match ──► operands ──► yield record ──► position += length
//!      ▲                                                        │
//!      └────────────────────────────────────────────────────────┘
//!                      stop when position >= end
//! ```
//!
//! What happens when the bytes at `position` do not decode is chosen by the
//! caller through [`FailurePolicy`]. There is deliberately no default:
//! scanning an unknown image and validating a trusted one want opposite
//! behaviours.
//!
//! | Error            | `Resynchronize`              | `Strict` |
//! |------------------|------------------------------|----------|
//! | `NoMatch`        | yield, skip one byte         | yield, stop |
//! | `InvalidOperand` | yield, skip the instruction  | yield, stop |
//! | `Truncated`      | yield, stop                  | yield, stop |

use crate::error::DecodeError;
use crate::instruction::DecodedInstruction;
use crate::matcher::Matcher;
use crate::operand::decode_operands;
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Report the error and keep going, for exploring unknown binaries.
    Resynchronize,

    /// Report the first error and stop, for validating trusted binaries.
    Strict,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub struct DisassemblerConfig {
    pub policy: FailurePolicy,

    /// Address of the first byte of the buffer. Instruction addresses and
    /// relative operands are computed from it.
    pub base_address: u64,
}

impl DisassemblerConfig {
    pub const fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            base_address: 0,
        }
    }

    #[must_use]
    pub const fn with_base_address(mut self, base_address: u64) -> Self {
        self.base_address = base_address;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Disassembler<'r> {
    matcher: Matcher<'r>,
    config: DisassemblerConfig,
}

impl<'r> Disassembler<'r> {
    pub const fn new(registry: &'r Registry, config: DisassemblerConfig) -> Self {
        Self {
            matcher: Matcher::new(registry),
            config,
        }
    }

    pub const fn config(&self) -> DisassemblerConfig {
        self.config
    }

    /// Decodes the single instruction at `offset`, reading no byte past
    /// `buffer.len()`.
    pub fn decode_at(
        &self,
        buffer: &[u8],
        offset: usize,
    ) -> Result<DecodedInstruction, DecodeError> {
        let bytes = buffer.get(offset..).unwrap_or_default();
        let found = self.matcher.find(bytes, offset)?;
        let address = self.config.base_address.wrapping_add(offset as u64);
        let operands = decode_operands(found.entry, found.word, address, offset)?;
        let length = found.length();

        Ok(DecodedInstruction::new(
            found.entry.opcode,
            offset,
            address,
            length,
            length.min(bytes.len()),
            found.word,
            operands,
        ))
    }

    /// Lazily disassembles `buffer[start..start + length]`.
    ///
    /// Without `length` the walk runs to the end of the buffer. Offsets in
    /// the results are offsets into `buffer`. Calling `walk` again, or
    /// cloning the returned iterator, starts over independently.
    pub fn walk<'b>(&self, buffer: &'b [u8], start: usize, length: Option<usize>) -> Walk<'r, 'b> {
        let start = start.min(buffer.len());
        let end = length.map_or(buffer.len(), |length| {
            start.saturating_add(length).min(buffer.len())
        });

        Walk {
            disassembler: *self,
            window: &buffer[..end],
            start,
            position: start,
            finished: false,
        }
    }
}

/// Iterator over the records of one walk, in ascending offset order.
#[derive(Debug, Clone)]
pub struct Walk<'r, 'b> {
    disassembler: Disassembler<'r>,
    /// Buffer cut at the end of the window, so decoding never reads past it.
    window: &'b [u8],
    start: usize,
    position: usize,
    finished: bool,
}

impl Walk<'_, '_> {
    /// Offset the next record will start at.
    pub const fn position(&self) -> usize {
        self.position
    }

    fn stop(&mut self) {
        self.finished = true;
    }
}

impl Iterator for Walk<'_, '_> {
    type Item = Result<DecodedInstruction, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        // An empty window still reports that it holds no instruction.
        if self.position >= self.window.len() && self.position > self.start {
            self.stop();
            return None;
        }

        let result = self.disassembler.decode_at(self.window, self.position);
        let policy = self.disassembler.config.policy;

        match &result {
            Ok(instruction) => self.position = instruction.end(),
            Err(DecodeError::Truncated { .. }) => self.stop(),
            Err(_) if policy == FailurePolicy::Strict => self.stop(),
            Err(DecodeError::NoMatch { offset }) => {
                tracing::debug!("no match at {offset:#X}, skipping one byte");
                self.position += 1;
            }
            Err(DecodeError::InvalidOperand { offset, length, .. }) => {
                tracing::debug!("invalid operand at {offset:#X}, skipping {length} byte(s)");
                self.position += length;
            }
        }

        Some(result)
    }
}

impl FusedIterator for Walk<'_, '_> {}

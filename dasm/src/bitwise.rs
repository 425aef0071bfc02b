use std::fmt::Debug;
use std::mem::size_of;
use std::ops::RangeInclusive;

/// Bit helpers for instruction words.
/// Indexes go from lsb to msb (right to left), so bit 0 is the lowest bit
/// of the first byte of an instruction.
pub trait Bits
where
    Self: Copy + Sized + Into<u128> + TryFrom<u128>,
    <Self as TryFrom<u128>>::Error: Debug,
{
    const BITS_WIDTH: u32 = (size_of::<Self>() * 8) as u32;

    fn get_bits(&self, bits_range: RangeInclusive<u8>) -> Self {
        let start = *bits_range.start();
        let length = bits_range.len() as u32;
        debug_assert!(u32::from(start) + length <= Self::BITS_WIDTH);

        let mask = (1_u128 << length) - 1;
        let value: u128 = (*self).into();

        <Self as TryFrom<u128>>::try_from((value >> start) & mask).unwrap()
    }

    /// Reads `number_of_bits` low bits as a two's complement number and
    /// widens it to the full width of `Self`.
    fn sign_extended(&self, number_of_bits: u8) -> Self {
        debug_assert!(number_of_bits > 0 && u32::from(number_of_bits) <= Self::BITS_WIDTH);
        let value: u128 = (*self).into();

        // Flipping the sign bit and subtracting it back borrows through
        // every upper bit when the sign bit was set.
        let sign = 1_i128 << (number_of_bits - 1);
        let value = ((value as i128 ^ sign) - sign) as u128;

        let width_mask = (1_u128 << Self::BITS_WIDTH) - 1;
        <Self as TryFrom<u128>>::try_from(value & width_mask).unwrap()
    }
}

impl Bits for u64 {}
impl Bits for u32 {}
impl Bits for u16 {}
impl Bits for u8 {}

/// Bytes needed to hold every set bit of `bits`.
pub const fn bytes_spanned(bits: u64) -> usize {
    let used = 64 - bits.leading_zeros() as usize;
    used.div_ceil(8)
}

/// Assembles `bytes` into a little-endian word, first byte lowest.
pub fn read_word(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    bytes
        .iter()
        .rev()
        .fold(0, |word, byte| (word << 8) | u64::from(*byte))
}

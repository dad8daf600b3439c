use bitvec::prelude::*;

use crate::code_table::{Bits, Code};
use crate::error::{HuffmanError, Result};

/// Bits stored eight to a byte, most significant first, with the real bit count kept
/// alongside so the zero padding of the last byte is never mistaken for data.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct PackedBits {
    bits: Vec<u8>,
    bit_count: u64,
}

impl PackedBits {
    pub fn new() -> Self {
        PackedBits {
            bits: Vec::new(),
            bit_count: 0,
        }
    }

    pub fn with_capacity(bytes: usize) -> Self {
        PackedBits {
            bits: Vec::with_capacity(bytes),
            bit_count: 0,
        }
    }

    pub fn from_bits(bits: &BitSlice<u8, Msb0>) -> Self {
        let mut owned = Bits::with_capacity(bits.len());
        owned.extend_from_bitslice(bits);
        owned.set_uninitialized(false);
        PackedBits {
            bit_count: owned.len() as u64,
            bits: owned.into_vec(),
        }
    }

    /// Accept a byte buffer plus bit count, as read back from storage.
    pub fn from_parts(bits: Vec<u8>, bit_count: u64) -> Result<Self> {
        let needed = bit_count.div_ceil(8);
        if bits.len() as u64 != needed {
            return Err(HuffmanError::invalid_encoding(
                0,
                format!(
                    "{bit_count} bits need {needed} bytes, buffer holds {}",
                    bits.len()
                ),
            ));
        }
        Ok(PackedBits { bits, bit_count })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn bit_count(&self) -> u64 {
        self.bit_count
    }

    pub fn is_empty(&self) -> bool {
        self.bit_count == 0
    }

    /// The meaningful bits, padding excluded.
    pub fn as_bitslice(&self) -> &BitSlice<u8, Msb0> {
        &self.bits.view_bits::<Msb0>()[..self.bit_count as usize]
    }

    pub fn to_bits(&self) -> Bits {
        self.as_bitslice().to_bitvec()
    }

    pub fn into_parts(self) -> (Vec<u8>, u64) {
        (self.bits, self.bit_count)
    }

    fn push_bit(&mut self, bit: bool) {
        let byte_index = (self.bit_count / 8) as usize; // which byte is target?
        let bit_offset = self.bit_count % 8; // which bit position is target?

        // make a new byte if needed
        if byte_index >= self.bits.len() {
            self.bits.push(0);
        }

        if bit {
            self.bits[byte_index] |= 1 << (7 - bit_offset);
        }

        self.bit_count += 1;
    }

    pub fn push_code(&mut self, code: &Code) {
        for bit in code.bits().iter().by_vals() {
            self.push_bit(bit);
        }
    }
}

//! Symbol streams to bits and back.
//!
//! Decoding is greedy: bits accumulate until they spell a code in the table, the symbol is
//! emitted and accumulation restarts. Because the codes are prefix-free the first match is the
//! only possible one. A stream that ends mid-code is an error, never a silent truncation.

use bitvec::prelude::*;
use tracing::trace;

use crate::bit_vec::PackedBits;
use crate::code_table::{Bits, CodeTable};
use crate::error::{HuffmanError, Result};
use crate::symbol::Symbol;

/// Encode symbols into a bit sequence.
///
/// Fails with [`HuffmanError::UnmappedSymbol`] on the first symbol the table has no code for.
pub fn encode<I>(symbols: I, table: &CodeTable) -> Result<Bits>
where
    I: IntoIterator<Item = Symbol>,
{
    let mut bits = Bits::new();
    for (position, symbol) in symbols.into_iter().enumerate() {
        let code = table
            .code(symbol)
            .ok_or(HuffmanError::UnmappedSymbol { symbol, position })?;
        bits.extend_from_bitslice(code.bits());
    }
    trace!(bits = bits.len(), "encoded bitstream");
    Ok(bits)
}

/// Encode straight into packed bytes.
pub fn encode_packed<I>(symbols: I, table: &CodeTable) -> Result<PackedBits>
where
    I: IntoIterator<Item = Symbol>,
{
    let symbols = symbols.into_iter();
    let mut packed = PackedBits::with_capacity(symbols.size_hint().0 / 8 + 16);
    for (position, symbol) in symbols.enumerate() {
        let code = table
            .code(symbol)
            .ok_or(HuffmanError::UnmappedSymbol { symbol, position })?;
        packed.push_code(code);
    }
    trace!(bits = packed.bit_count(), "encoded packed bitstream");
    Ok(packed)
}

/// Decode a bit sequence back into symbols.
pub fn decode_bits(bits: &BitSlice<u8, Msb0>, table: &CodeTable) -> Result<Vec<Symbol>> {
    let longest = table.longest_code();
    let mut symbols = Vec::new();
    let mut start = 0;

    for end in 1..=bits.len() {
        if let Some(symbol) = table.symbol(&bits[start..end]) {
            symbols.push(symbol);
            start = end;
        } else if end - start >= longest {
            return Err(HuffmanError::invalid_encoding(
                symbols.len(),
                format!("bits {start}..{end} match no code"),
            ));
        }
    }

    if start != bits.len() {
        return Err(HuffmanError::invalid_encoding(
            symbols.len(),
            format!("{} trailing bits match no code", bits.len() - start),
        ));
    }
    trace!(bits = bits.len(), symbols = symbols.len(), "decoded bitstream");
    Ok(symbols)
}

/// Decode the first `bit_count` bits of a packed buffer, most significant bit first.
///
/// A count past the end of `bytes` or one that stops mid-code fails. A count that runs a few
/// bits into the zero padding can still spell valid codes and decode extra symbols; only the
/// recorded symbol count (see [`EncodedPayload::decode_symbols`]) catches that case.
///
/// [`EncodedPayload::decode_symbols`]: crate::compressed_data::EncodedPayload::decode_symbols
pub fn decode_packed(bytes: &[u8], bit_count: u64, table: &CodeTable) -> Result<Vec<Symbol>> {
    let available = bytes.len() as u64 * 8;
    if bit_count > available {
        return Err(HuffmanError::invalid_encoding(
            0,
            format!("bit count {bit_count} exceeds the {available} bits supplied"),
        ));
    }
    decode_bits(&bytes.view_bits::<Msb0>()[..bit_count as usize], table)
}

/// Render bits as printable '0'/'1' characters.
pub fn bits_to_text(bits: &BitSlice<u8, Msb0>) -> String {
    bits.iter()
        .by_vals()
        .map(|bit| if bit { '1' } else { '0' })
        .collect()
}

/// Parse printable '0'/'1' characters back into bits.
pub fn bits_from_text(text: &str) -> Result<Bits> {
    let mut bits = Bits::with_capacity(text.len());
    for (index, c) in text.chars().enumerate() {
        match c {
            '0' => bits.push(false),
            '1' => bits.push(true),
            other => {
                return Err(HuffmanError::invalid_encoding(
                    0,
                    format!("character {other:?} at {index} is not a bit"),
                ));
            }
        }
    }
    Ok(bits)
}

/// Collect decoded text-mode symbols into a string.
pub fn symbols_to_string(symbols: &[Symbol]) -> Result<String> {
    symbols
        .iter()
        .enumerate()
        .map(|(index, symbol)| match symbol {
            Symbol::Char(c) => Ok(*c),
            Symbol::Byte(_) => Err(HuffmanError::invalid_encoding(
                index,
                "byte symbol in a text stream",
            )),
        })
        .collect()
}

/// Collect decoded image-mode symbols into bytes.
pub fn symbols_to_bytes(symbols: &[Symbol]) -> Result<Vec<u8>> {
    symbols
        .iter()
        .enumerate()
        .map(|(index, symbol)| match symbol {
            Symbol::Byte(b) => Ok(*b),
            Symbol::Char(_) => Err(HuffmanError::invalid_encoding(
                index,
                "character symbol in a byte stream",
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hufftree::HuffmanTree;

    fn text_table(text: &str) -> CodeTable {
        CodeTable::generate(&HuffmanTree::from_text(text).unwrap())
    }

    fn byte_table(bytes: &[u8]) -> CodeTable {
        CodeTable::generate(&HuffmanTree::from_bytes(bytes).unwrap())
    }

    #[test]
    fn test_abracadabra_roundtrip() {
        let text = "abracadabra";
        let table = text_table(text);
        let bits = encode(text.chars().map(Symbol::Char), &table).unwrap();
        assert_eq!(bits.len(), 23);
        assert_eq!(bits_to_text(&bits), "01101110100010101101110");

        let decoded = decode_bits(&bits, &table).unwrap();
        assert_eq!(symbols_to_string(&decoded).unwrap(), text);
    }

    #[test]
    fn test_single_symbol_roundtrip() {
        let table = text_table("aaaa");
        let bits = encode("aaaa".chars().map(Symbol::Char), &table).unwrap();
        assert_eq!(bits_to_text(&bits), "0000");
        let decoded = decode_bits(&bits, &table).unwrap();
        assert_eq!(symbols_to_string(&decoded).unwrap(), "aaaa");
    }

    #[test]
    fn test_unmapped_symbol() {
        let table = text_table("abc");
        let err = encode("abz".chars().map(Symbol::Char), &table).unwrap_err();
        assert!(matches!(
            err,
            HuffmanError::UnmappedSymbol {
                symbol: Symbol::Char('z'),
                position: 2
            }
        ));
    }

    #[test]
    fn test_unmapped_is_not_empty_input() {
        let table = text_table("abc");
        // empty input is fine and encodes to nothing
        assert!(encode(std::iter::empty(), &table).unwrap().is_empty());
        assert!(encode_packed(std::iter::once(Symbol::Byte(1)), &table).is_err());
    }

    #[test]
    fn test_trailing_bits_rejected() {
        let table = text_table("abracadabra");
        let mut bits = encode("abra".chars().map(Symbol::Char), &table).unwrap();
        bits.push(true);
        let err = decode_bits(&bits, &table).unwrap_err();
        assert!(matches!(err, HuffmanError::InvalidEncoding { decoded: 4, .. }));
    }

    #[test]
    fn test_packed_roundtrip_with_exact_bit_count() {
        let data = [0x00, 0xFF, 0x42];
        let table = byte_table(&data);
        let packed = encode_packed(data.iter().copied().map(Symbol::Byte), &table).unwrap();
        assert_eq!(packed.bit_count(), 5);
        assert_eq!(packed.as_bytes().len(), 1);

        let decoded = decode_packed(packed.as_bytes(), packed.bit_count(), &table).unwrap();
        assert_eq!(symbols_to_bytes(&decoded).unwrap(), data);
    }

    #[test]
    fn test_packed_wrong_bit_count() {
        let data = [0x00, 0xFF, 0x42];
        let table = byte_table(&data);
        let packed = encode_packed(data.iter().copied().map(Symbol::Byte), &table).unwrap();

        let short = decode_packed(packed.as_bytes(), packed.bit_count() - 1, &table);
        assert!(matches!(short, Err(HuffmanError::InvalidEncoding { .. })));

        let past_end = decode_packed(packed.as_bytes(), 9, &table);
        assert!(matches!(past_end, Err(HuffmanError::InvalidEncoding { .. })));

        // the padding bit is a zero, which is the code for 0xFF
        let long = decode_packed(packed.as_bytes(), packed.bit_count() + 1, &table).unwrap();
        assert_eq!(
            long,
            vec![
                Symbol::Byte(0x00),
                Symbol::Byte(0xFF),
                Symbol::Byte(0x42),
                Symbol::Byte(0xFF)
            ]
        );
    }

    #[test]
    fn test_packed_matches_bits() {
        let data = b"mississippi";
        let table = byte_table(data);
        let bits = encode(data.iter().copied().map(Symbol::Byte), &table).unwrap();
        let packed = encode_packed(data.iter().copied().map(Symbol::Byte), &table).unwrap();
        assert_eq!(packed.as_bitslice(), bits.as_bitslice());
    }

    #[test]
    fn test_bits_text_parsing() {
        let bits = bits_from_text("1011").unwrap();
        assert_eq!(bits, bitvec![u8, Msb0; 1, 0, 1, 1]);
        assert!(matches!(
            bits_from_text("10x1"),
            Err(HuffmanError::InvalidEncoding { .. })
        ));
    }

    #[test]
    fn test_mode_mismatch_on_collect() {
        assert!(symbols_to_string(&[Symbol::Byte(1)]).is_err());
        assert!(symbols_to_bytes(&[Symbol::Char('a')]).is_err());
    }
}

use std::io::{BufRead, Cursor, Read, Write};

use bitvec::prelude::*;
use tracing::debug;

use crate::bit_vec::PackedBits;
use crate::bitstream;
use crate::code_table::{Bits, CodeTable};
use crate::config::BitstreamFormat;
use crate::error::{HuffmanError, Result};
use crate::metadata::{self, DataHeader, ImageMeta};
use crate::symbol::{Mode, Symbol};
use crate::table_serializer;

/// An encoded bitstream in one of its two storage forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bitstream {
    Readable(Bits),
    Packed(PackedBits),
}

impl Bitstream {
    pub fn format(&self) -> BitstreamFormat {
        match self {
            Bitstream::Readable(_) => BitstreamFormat::Readable,
            Bitstream::Packed(_) => BitstreamFormat::Packed,
        }
    }

    pub fn bit_count(&self) -> u64 {
        match self {
            Bitstream::Readable(bits) => bits.len() as u64,
            Bitstream::Packed(packed) => packed.bit_count(),
        }
    }

    pub fn as_bitslice(&self) -> &BitSlice<u8, Msb0> {
        match self {
            Bitstream::Readable(bits) => bits.as_bitslice(),
            Bitstream::Packed(packed) => packed.as_bitslice(),
        }
    }

    /// Same bits, other storage.
    pub fn convert(&self, format: BitstreamFormat) -> Bitstream {
        match (self, format) {
            (Bitstream::Readable(bits), BitstreamFormat::Packed) => {
                Bitstream::Packed(PackedBits::from_bits(bits))
            }
            (Bitstream::Packed(packed), BitstreamFormat::Readable) => {
                Bitstream::Readable(packed.to_bits())
            }
            (same, _) => same.clone(),
        }
    }
}

/// Everything needed to decode: the table, the bits, and how many symbols they hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    pub table: CodeTable,
    pub stream: Bitstream,
    pub symbol_count: u64,
    pub image: Option<ImageMeta>,
}

impl EncodedPayload {
    pub fn new(table: CodeTable, stream: Bitstream, symbol_count: u64) -> Self {
        EncodedPayload {
            table,
            stream,
            symbol_count,
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageMeta) -> Self {
        self.image = Some(image);
        self
    }

    pub fn mode(&self) -> Mode {
        self.table.mode()
    }

    pub fn bit_count(&self) -> u64 {
        self.stream.bit_count()
    }

    /// Decode the stream and check it holds exactly the recorded number of symbols.
    pub fn decode_symbols(&self) -> Result<Vec<Symbol>> {
        let symbols = match &self.stream {
            Bitstream::Readable(bits) => bitstream::decode_bits(bits, &self.table)?,
            Bitstream::Packed(packed) => {
                bitstream::decode_packed(packed.as_bytes(), packed.bit_count(), &self.table)?
            }
        };
        if symbols.len() as u64 != self.symbol_count {
            return Err(HuffmanError::invalid_encoding(
                symbols.len(),
                format!("expected {} symbols", self.symbol_count),
            ));
        }
        Ok(symbols)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let table = table_serializer::serialize(&self.table);
        metadata::write_table_section(writer, &table)?;
        metadata::write_data_header(
            writer,
            &DataHeader {
                format: self.stream.format(),
                symbol_count: self.symbol_count,
                bit_count: self.bit_count(),
                image: self.image,
            },
        )?;

        match &self.stream {
            Bitstream::Readable(bits) => {
                writer.write_all(bitstream::bits_to_text(bits).as_bytes())?;
                writer.write_all(b"\n")?;
            }
            Bitstream::Packed(packed) => writer.write_all(packed.as_bytes())?,
        }
        Ok(())
    }

    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<Self> {
        let table = table_serializer::deserialize(&metadata::read_table_section(reader)?)?;
        let header = metadata::read_data_header(reader)?;
        if header.image.is_some() && table.mode() != Mode::Image {
            return Err(HuffmanError::malformed_container(
                "image geometry attached to a text table",
            ));
        }

        let expected = header.payload_len();
        let mut payload = Vec::new();
        reader.by_ref().take(expected).read_to_end(&mut payload)?;
        if payload.len() as u64 != expected {
            return Err(HuffmanError::malformed_container(format!(
                "payload declared {expected} bytes, only {} present",
                payload.len()
            )));
        }

        let stream = match header.format {
            BitstreamFormat::Readable => {
                let text = std::str::from_utf8(&payload)
                    .map_err(|_| HuffmanError::malformed_container("bit text is not ASCII"))?;
                skip_line_break(reader)?;
                Bitstream::Readable(bitstream::bits_from_text(text)?)
            }
            BitstreamFormat::Packed => {
                Bitstream::Packed(PackedBits::from_parts(payload, header.bit_count)?)
            }
        };

        let mut rest = [0u8; 1];
        if reader.read(&mut rest)? != 0 {
            return Err(HuffmanError::malformed_container("trailing data after payload"));
        }

        debug!(
            mode = %table.mode(),
            format = %header.format,
            symbols = header.symbol_count,
            bits = header.bit_count,
            "read encoded payload"
        );
        Ok(EncodedPayload {
            table,
            stream,
            symbol_count: header.symbol_count,
            image: header.image,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from(&mut Cursor::new(data))
    }
}

/// The readable form ends with a line break; tolerate it being absent or CRLF.
fn skip_line_break<R: BufRead>(reader: &mut R) -> Result<()> {
    let buf = reader.fill_buf()?;
    let skip = match buf {
        [b'\r', b'\n', ..] => 2,
        [b'\n', ..] => 1,
        _ => 0,
    };
    reader.consume(skip);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hufftree::HuffmanTree;

    fn text_payload(text: &str) -> EncodedPayload {
        let table = CodeTable::generate(&HuffmanTree::from_text(text).unwrap());
        let bits = bitstream::encode(text.chars().map(Symbol::Char), &table).unwrap();
        EncodedPayload::new(table, Bitstream::Readable(bits), text.chars().count() as u64)
    }

    #[test]
    fn test_readable_layout() {
        let bytes = text_payload("aab").to_bytes().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "CODE_TABLE_START 15\nTEXT|97|1|98|0|\nCODE_DATA_START BITS 3 3\n110\n"
        );
    }

    #[test]
    fn test_roundtrip_readable() {
        let payload = text_payload("abracadabra");
        let restored = EncodedPayload::from_bytes(&payload.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, payload);
        let text = bitstream::symbols_to_string(&restored.decode_symbols().unwrap()).unwrap();
        assert_eq!(text, "abracadabra");
    }

    #[test]
    fn test_roundtrip_packed_with_image() {
        let pixels = [0x00, 0xFF, 0x42, 0x42];
        let table = CodeTable::generate(&HuffmanTree::from_bytes(&pixels).unwrap());
        let packed =
            bitstream::encode_packed(pixels.iter().copied().map(Symbol::Byte), &table).unwrap();
        let payload = EncodedPayload::new(table, Bitstream::Packed(packed), 4).with_image(
            ImageMeta {
                width: 2,
                height: 2,
                bits_per_pixel: 8,
            },
        );

        let restored = EncodedPayload::from_bytes(&payload.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, payload);
        let bytes = bitstream::symbols_to_bytes(&restored.decode_symbols().unwrap()).unwrap();
        assert_eq!(bytes, pixels);
    }

    #[test]
    fn test_symbol_count_catches_long_bit_count() {
        // 0x00 -> 10, 0xFF -> 0, 0x42 -> 11; one extra padding bit decodes as another 0xFF
        let data = [0x00, 0xFF, 0x42];
        let table = CodeTable::generate(&HuffmanTree::from_bytes(&data).unwrap());
        let packed =
            bitstream::encode_packed(data.iter().copied().map(Symbol::Byte), &table).unwrap();
        let (bytes, bit_count) = packed.into_parts();
        let padded = PackedBits::from_parts(bytes, bit_count + 1).unwrap();

        let payload = EncodedPayload::new(table, Bitstream::Packed(padded), 3);
        assert!(matches!(
            payload.decode_symbols(),
            Err(HuffmanError::InvalidEncoding { decoded: 4, .. })
        ));
    }

    #[test]
    fn test_convert_preserves_bits() {
        let payload = text_payload("hello world");
        let packed = payload.stream.convert(BitstreamFormat::Packed);
        assert_eq!(packed.format(), BitstreamFormat::Packed);
        assert_eq!(packed.as_bitslice(), payload.stream.as_bitslice());
        assert_eq!(packed.convert(BitstreamFormat::Readable), payload.stream);
    }

    #[test]
    fn test_damaged_containers() {
        let good = text_payload("abracadabra").to_bytes().unwrap();

        let truncated = &good[..good.len() - 4];
        assert!(matches!(
            EncodedPayload::from_bytes(truncated),
            Err(HuffmanError::MalformedContainer(_))
        ));

        let mut trailing = good.clone();
        trailing.extend_from_slice(b"junk");
        assert!(matches!(
            EncodedPayload::from_bytes(&trailing),
            Err(HuffmanError::MalformedContainer(_))
        ));

        let text = String::from_utf8(good).unwrap();
        let bad_table = text.replace("TEXT|97|", "TEXT|9x|");
        assert!(matches!(
            EncodedPayload::from_bytes(bad_table.as_bytes()),
            Err(HuffmanError::MalformedTable(_))
        ));

        let bad_bits = text.replace("BITS 11 23\n0", "BITS 11 23\n2");
        assert!(matches!(
            EncodedPayload::from_bytes(bad_bits.as_bytes()),
            Err(HuffmanError::InvalidEncoding { .. })
        ));
    }

    #[test]
    fn test_image_meta_on_text_rejected() {
        let bytes = text_payload("ab").to_bytes().unwrap();
        let text = String::from_utf8(bytes)
            .unwrap()
            .replace("BITS 2 2", "BITS 2 2 IMAGE 1 2 8");
        assert!(matches!(
            EncodedPayload::from_bytes(text.as_bytes()),
            Err(HuffmanError::MalformedContainer(_))
        ));
    }
}

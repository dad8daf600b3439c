//! Header lines of the persisted container.
//!
//! ```text
//! CODE_TABLE_START <table-byte-len>
//! <table text>
//! CODE_DATA_START <BITS|PACKED> <symbol-count> <bit-count>[ IMAGE <width> <height> <bpp>]
//! <payload>
//! ```
//!
//! The table is length-prefixed, so nothing in it is ever scanned for a separator.

use std::io::{BufRead, Read, Write};

use crate::config::BitstreamFormat;
use crate::error::{HuffmanError, Result};

pub const TABLE_MARKER: &str = "CODE_TABLE_START";
pub const DATA_MARKER: &str = "CODE_DATA_START";
pub const IMAGE_MARKER: &str = "IMAGE";

/// Header lines are short; anything longer is not a header.
const MAX_HEADER_LINE: u64 = 256;

/// Raw pixel buffer geometry carried next to an image bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMeta {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    pub format: BitstreamFormat,
    pub symbol_count: u64,
    pub bit_count: u64,
    pub image: Option<ImageMeta>,
}

impl DataHeader {
    /// Bytes of payload that follow the header.
    pub fn payload_len(&self) -> u64 {
        match self.format {
            BitstreamFormat::Readable => self.bit_count,
            BitstreamFormat::Packed => self.bit_count.div_ceil(8),
        }
    }
}

pub fn write_table_section<W: Write>(writer: &mut W, table: &str) -> Result<()> {
    writeln!(writer, "{TABLE_MARKER} {}", table.len())?;
    writer.write_all(table.as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

pub fn read_table_section<R: BufRead>(reader: &mut R) -> Result<String> {
    let line = read_header_line(reader, "table header")?;
    let len = match line.split_once(' ') {
        Some((TABLE_MARKER, len)) => parse_field::<u64>(len, "table length")?,
        _ => {
            return Err(HuffmanError::malformed_container(format!(
                "expected {TABLE_MARKER}, found {line:?}"
            )));
        }
    };

    let mut table = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut table)?;
    if table.len() as u64 != len {
        return Err(HuffmanError::malformed_container(format!(
            "table declared {len} bytes, only {} present",
            table.len()
        )));
    }
    expect_newline(reader, "table")?;

    String::from_utf8(table)
        .map_err(|_| HuffmanError::malformed_container("table is not valid UTF-8"))
}

pub fn write_data_header<W: Write>(writer: &mut W, header: &DataHeader) -> Result<()> {
    write!(
        writer,
        "{DATA_MARKER} {} {} {}",
        header.format.tag(),
        header.symbol_count,
        header.bit_count
    )?;
    if let Some(image) = header.image {
        write!(
            writer,
            " {IMAGE_MARKER} {} {} {}",
            image.width, image.height, image.bits_per_pixel
        )?;
    }
    writer.write_all(b"\n")?;
    Ok(())
}

pub fn read_data_header<R: BufRead>(reader: &mut R) -> Result<DataHeader> {
    let line = read_header_line(reader, "data header")?;
    let fields: Vec<&str> = line.split(' ').collect();

    let (format, symbol_count, bit_count, rest) = match fields.as_slice() {
        [DATA_MARKER, kind, symbols, bits, rest @ ..] => {
            let format = BitstreamFormat::from_tag(kind).ok_or_else(|| {
                HuffmanError::malformed_container(format!("unknown bitstream kind {kind:?}"))
            })?;
            (
                format,
                parse_field::<u64>(symbols, "symbol count")?,
                parse_field::<u64>(bits, "bit count")?,
                rest,
            )
        }
        _ => {
            return Err(HuffmanError::malformed_container(format!(
                "expected {DATA_MARKER}, found {line:?}"
            )));
        }
    };

    let image = match rest {
        [] => None,
        [IMAGE_MARKER, width, height, bpp] => Some(ImageMeta {
            width: parse_field(width, "image width")?,
            height: parse_field(height, "image height")?,
            bits_per_pixel: parse_field(bpp, "bits per pixel")?,
        }),
        _ => {
            return Err(HuffmanError::malformed_container(format!(
                "unexpected trailing fields in {line:?}"
            )));
        }
    };

    Ok(DataHeader {
        format,
        symbol_count,
        bit_count,
        image,
    })
}

fn read_header_line<R: BufRead>(reader: &mut R, what: &str) -> Result<String> {
    let mut line = Vec::new();
    reader.by_ref().take(MAX_HEADER_LINE).read_until(b'\n', &mut line)?;
    if line.pop() != Some(b'\n') {
        return Err(HuffmanError::malformed_container(format!(
            "{what} missing or not terminated"
        )));
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    String::from_utf8(line)
        .map_err(|_| HuffmanError::malformed_container(format!("{what} is not valid UTF-8")))
}

fn expect_newline<R: Read>(reader: &mut R, after: &str) -> Result<()> {
    let mut byte = [0u8; 1];
    let read = reader.read(&mut byte)?;
    if read == 1 && byte[0] == b'\n' {
        Ok(())
    } else {
        Err(HuffmanError::malformed_container(format!(
            "missing line break after {after}"
        )))
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, what: &str) -> Result<T> {
    field
        .parse()
        .map_err(|_| HuffmanError::malformed_container(format!("{what} {field:?} is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_table_section_roundtrip() {
        let mut out = Vec::new();
        write_table_section(&mut out, "TEXT|97|0|98|1|").unwrap();
        assert_eq!(out, b"CODE_TABLE_START 15\nTEXT|97|0|98|1|\n");

        let mut cursor = Cursor::new(out);
        assert_eq!(read_table_section(&mut cursor).unwrap(), "TEXT|97|0|98|1|");
    }

    #[test]
    fn test_table_length_is_authoritative() {
        // a table whose text looks like bits can not swallow the data section
        let mut cursor = Cursor::new(b"CODE_TABLE_START 3\n0|1\n".to_vec());
        assert_eq!(read_table_section(&mut cursor).unwrap(), "0|1");

        let mut short = Cursor::new(b"CODE_TABLE_START 40\nTEXT|97|0|\n".to_vec());
        assert!(matches!(
            read_table_section(&mut short),
            Err(HuffmanError::MalformedContainer(_))
        ));
    }

    #[test]
    fn test_data_header_with_image() {
        let header = DataHeader {
            format: BitstreamFormat::Packed,
            symbol_count: 12,
            bit_count: 30,
            image: Some(ImageMeta {
                width: 2,
                height: 2,
                bits_per_pixel: 24,
            }),
        };
        let mut out = Vec::new();
        write_data_header(&mut out, &header).unwrap();
        assert_eq!(out, b"CODE_DATA_START PACKED 12 30 IMAGE 2 2 24\n");
        assert_eq!(header.payload_len(), 4);

        let parsed = read_data_header(&mut Cursor::new(out)).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_bad_data_headers() {
        let cases: [&[u8]; 6] = [
            b"CODE_DATA_START ZIP 1 1\n",
            b"CODE_DATA_START BITS one 1\n",
            b"CODE_DATA_START BITS 1\n",
            b"CODE_DATA_START BITS 1 1 IMAGE 2 2\n",
            b"DATA BITS 1 1\n",
            b"CODE_DATA_START BITS 1 1",
        ];
        for case in cases {
            assert!(
                matches!(
                    read_data_header(&mut Cursor::new(case.to_vec())),
                    Err(HuffmanError::MalformedContainer(_))
                ),
                "expected {:?} to be rejected",
                String::from_utf8_lossy(case)
            );
        }
    }
}

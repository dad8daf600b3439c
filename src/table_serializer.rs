//! Text form of a code table.
//!
//! ```text
//! TEXT|97|0|98|110|99|100|
//! ```
//!
//! A mode tag, then `ordinal|code|` for every entry in ascending ordinal order. Codes only ever
//! contain '0' and '1', so the `|` separator can not occur inside a field.

use tracing::debug;

use crate::code_table::{Code, CodeTable};
use crate::error::{HuffmanError, Result};
use crate::symbol::{Mode, Symbol};

pub const SEPARATOR: char = '|';

pub fn serialize(table: &CodeTable) -> String {
    let mut out = String::with_capacity(8 + table.len() * 12);
    out.push_str(table.mode().tag());
    out.push(SEPARATOR);
    for (symbol, code) in table.iter() {
        out.push_str(&symbol.ordinal().to_string());
        out.push(SEPARATOR);
        out.push_str(&code.to_string());
        out.push(SEPARATOR);
    }
    out
}

/// Parse the text form back into a table, mode included.
pub fn deserialize(text: &str) -> Result<CodeTable> {
    let (tag, body) = text
        .split_once(SEPARATOR)
        .ok_or_else(|| HuffmanError::malformed_table("missing mode tag"))?;
    let mode = Mode::from_tag(tag)
        .ok_or_else(|| HuffmanError::malformed_table(format!("unknown mode tag {tag:?}")))?;

    let body = body.strip_suffix(SEPARATOR).unwrap_or(body);
    let mut entries = Vec::new();
    if !body.is_empty() {
        let mut fields = body.split(SEPARATOR);
        while let Some(ordinal_field) = fields.next() {
            let ordinal: u32 = ordinal_field.parse().map_err(|_| {
                HuffmanError::malformed_table(format!("ordinal {ordinal_field:?} is not an integer"))
            })?;
            let symbol = Symbol::from_ordinal(mode, ordinal).ok_or_else(|| {
                HuffmanError::malformed_table(format!("ordinal {ordinal} out of range for {mode}"))
            })?;
            let code_field = fields.next().ok_or_else(|| {
                HuffmanError::malformed_table(format!("ordinal {ordinal} has no code"))
            })?;
            let code = Code::parse(code_field).ok_or_else(|| {
                HuffmanError::malformed_table(format!("code {code_field:?} is not a bit string"))
            })?;
            entries.push((symbol, code));
        }
    }

    let table = CodeTable::from_entries(mode, entries)?;
    debug!(mode = %mode, symbols = table.len(), "deserialized code table");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hufftree::HuffmanTree;

    #[test]
    fn test_serialize_abracadabra() {
        let table = CodeTable::generate(&HuffmanTree::from_text("abracadabra").unwrap());
        assert_eq!(serialize(&table), "TEXT|97|0|98|110|99|100|100|101|114|111|");
    }

    #[test]
    fn test_roundtrip_both_modes() {
        let text = CodeTable::generate(&HuffmanTree::from_text("Grüße, 世界!").unwrap());
        assert_eq!(deserialize(&serialize(&text)).unwrap(), text);

        let bytes: Vec<u8> = (0..=255u8).chain([7, 7, 7, 9]).collect();
        let image = CodeTable::generate(&HuffmanTree::from_bytes(&bytes).unwrap());
        let restored = deserialize(&serialize(&image)).unwrap();
        assert_eq!(restored.mode(), Mode::Image);
        assert_eq!(restored, image);
    }

    #[test]
    fn test_single_entry_roundtrip() {
        let table = CodeTable::generate(&HuffmanTree::from_bytes(&[5, 5]).unwrap());
        assert_eq!(serialize(&table), "IMAGE|5|0|");
        assert_eq!(deserialize("IMAGE|5|0|").unwrap(), table);
    }

    #[test]
    fn test_trailing_separator_optional() {
        assert!(deserialize("TEXT|97|0|98|1").is_ok());
    }

    #[test]
    fn test_malformed_inputs() {
        let cases = [
            "",
            "97|0|",
            "BINARY|97|0|",
            "TEXT|",
            "TEXT",
            "TEXT|abc|0|",
            "TEXT|97|",
            "TEXT|97||",
            "TEXT|97|012|",
            "IMAGE|300|0|",
            "TEXT|55296|0|",
            "TEXT|97|0|98|01|",
            "TEXT|97|0|97|1|",
        ];
        for case in cases {
            assert!(
                matches!(deserialize(case), Err(HuffmanError::MalformedTable(_))),
                "expected {case:?} to be rejected"
            );
        }
    }
}

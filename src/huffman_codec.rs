use std::io::{BufRead, Read, Write};

use tracing::{debug, warn};

use crate::bitstream;
use crate::code_table::CodeTable;
use crate::compressed_data::{Bitstream, EncodedPayload};
use crate::config::{BitstreamFormat, EngineConfig};
use crate::error::{HuffmanError, Result};
use crate::frequency;
use crate::hufftree::HuffmanTree;
use crate::metadata::ImageMeta;
use crate::symbol::{Mode, Symbol};

/// Output of a decode, shaped by the mode of the table that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Text(String),
    Bytes(Vec<u8>),
}

impl Decoded {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Decoded::Text(text) => text.into_bytes(),
            Decoded::Bytes(bytes) => bytes,
        }
    }
}

/// A tree with its code table, ready to encode input drawn from the same alphabet.
pub struct HuffmanCodec {
    tree: HuffmanTree,
    table: CodeTable,
    config: EngineConfig,
}

impl HuffmanCodec {
    pub fn new(tree: HuffmanTree) -> Self {
        Self::with_config(tree, EngineConfig::default())
    }

    pub fn with_config(tree: HuffmanTree, config: EngineConfig) -> Self {
        let table = CodeTable::generate(&tree);
        HuffmanCodec {
            tree,
            table,
            config,
        }
    }

    /// Build the codec from the text it will encode.
    pub fn for_text(text: &str, config: EngineConfig) -> Result<Self> {
        let tree = HuffmanTree::build(Mode::Text, &frequency::count_text(text))?;
        Ok(Self::with_config(tree, config))
    }

    pub fn for_bytes(bytes: &[u8], config: EngineConfig) -> Result<Self> {
        let tree = HuffmanTree::build(Mode::Image, &frequency::count_bytes(bytes))?;
        Ok(Self::with_config(tree, config))
    }

    pub fn tree(&self) -> &HuffmanTree {
        &self.tree
    }

    pub fn table(&self) -> &CodeTable {
        &self.table
    }

    pub fn mode(&self) -> Mode {
        self.tree.mode()
    }

    pub fn encode_symbols(&self, symbols: &[Symbol]) -> Result<EncodedPayload> {
        let format = self.config.format_for(self.mode());
        let stream = match format {
            BitstreamFormat::Readable => {
                Bitstream::Readable(bitstream::encode(symbols.iter().copied(), &self.table)?)
            }
            BitstreamFormat::Packed => {
                Bitstream::Packed(bitstream::encode_packed(symbols.iter().copied(), &self.table)?)
            }
        };
        let payload = EncodedPayload::new(self.table.clone(), stream, symbols.len() as u64);
        debug!(
            mode = %self.mode(),
            format = %format,
            symbols = symbols.len(),
            bits = payload.bit_count(),
            "encoded payload"
        );

        if self.config.verify_after_encode {
            let decoded = payload.decode_symbols()?;
            if decoded != symbols {
                warn!("encoded payload failed verification");
                return Err(HuffmanError::invalid_encoding(
                    decoded.len(),
                    "decoded output differs from the input",
                ));
            }
        }
        Ok(payload)
    }

    pub fn encode_text(&self, text: &str) -> Result<EncodedPayload> {
        let symbols: Vec<Symbol> = text.chars().map(Symbol::Char).collect();
        self.encode_symbols(&symbols)
    }

    pub fn encode_bytes(&self, bytes: &[u8]) -> Result<EncodedPayload> {
        let symbols: Vec<Symbol> = bytes.iter().copied().map(Symbol::Byte).collect();
        self.encode_symbols(&symbols)
    }

    /// Decode a payload using only what it carries.
    pub fn decode(payload: &EncodedPayload) -> Result<Decoded> {
        let symbols = payload.decode_symbols()?;
        match payload.mode() {
            Mode::Text => Ok(Decoded::Text(bitstream::symbols_to_string(&symbols)?)),
            Mode::Image => Ok(Decoded::Bytes(bitstream::symbols_to_bytes(&symbols)?)),
        }
    }

    /// Read all of `input`, encode it in `mode` and write the container to `output`.
    pub fn encode_from_reader<R: Read, W: Write>(
        mode: Mode,
        mut input: R,
        mut output: W,
        config: &EngineConfig,
    ) -> Result<EncodedPayload> {
        let payload = match mode {
            Mode::Text => {
                let mut text = String::new();
                input.read_to_string(&mut text)?;
                compress_text(&text, config)?
            }
            Mode::Image => {
                let mut bytes = Vec::new();
                input.read_to_end(&mut bytes)?;
                compress_bytes(&bytes, None, config)?
            }
        };
        payload.write_to(&mut output)?;
        output.flush()?;
        Ok(payload)
    }

    pub fn decode_from_reader<R: BufRead>(mut input: R) -> Result<Decoded> {
        let payload = EncodedPayload::read_from(&mut input)?;
        Self::decode(&payload)
    }
}

/// Count, build, generate and encode in one step.
pub fn compress_text(text: &str, config: &EngineConfig) -> Result<EncodedPayload> {
    HuffmanCodec::for_text(text, config.clone())?.encode_text(text)
}

/// Same as [`compress_text`] for raw bytes, optionally tagged with pixel geometry.
pub fn compress_bytes(
    bytes: &[u8],
    image: Option<ImageMeta>,
    config: &EngineConfig,
) -> Result<EncodedPayload> {
    let payload = HuffmanCodec::for_bytes(bytes, config.clone())?.encode_bytes(bytes)?;
    Ok(match image {
        Some(meta) => payload.with_image(meta),
        None => payload,
    })
}

pub fn decompress(payload: &EncodedPayload) -> Result<Decoded> {
    HuffmanCodec::decode(payload)
}

//! # huffpack
//!
//! Huffman coding for text and raw image bytes: frequency counting, a
//! deterministic tree build, prefix-free code tables, bit-level encode and
//! decode, and a self-describing container that carries the table with the data.
//!
//! ## Quick Start
//!
//! ```rust
//! use huffpack::{Decoded, EncodedPayload, EngineConfig, compress_text, decompress};
//!
//! let payload = compress_text("abracadabra", &EngineConfig::default())?;
//! assert_eq!(payload.bit_count(), 23);
//!
//! let stored = payload.to_bytes()?;
//! let restored = EncodedPayload::from_bytes(&stored)?;
//! assert_eq!(decompress(&restored)?, Decoded::Text("abracadabra".to_string()));
//! # Ok::<(), huffpack::HuffmanError>(())
//! ```
//!
//! The pieces are usable on their own as well:
//!
//! ```rust
//! use huffpack::{CodeTable, HuffmanTree, bitstream, table_serializer};
//!
//! let tree = HuffmanTree::from_text("abracadabra")?;
//! let table = CodeTable::generate(&tree);
//! let text = table_serializer::serialize(&table);
//! assert_eq!(text, "TEXT|97|0|98|110|99|100|100|101|114|111|");
//!
//! let bits = bitstream::encode("cab".chars().map(Into::into), &table)?;
//! assert_eq!(bitstream::bits_to_text(&bits), "1000110");
//! # Ok::<(), huffpack::HuffmanError>(())
//! ```

pub mod bitstream;
pub mod code_table;
pub mod compressed_data;
pub mod config;
pub mod error;
pub mod frequency;
pub mod huffman_codec;
pub mod hufftree;
pub mod metadata;
pub mod runtime;
pub mod symbol;
pub mod table_serializer;

// Internal modules - not part of public API
mod bit_vec;
mod min_heap;

pub use bit_vec::PackedBits;
pub use code_table::{Bits, Code, CodeTable};
pub use compressed_data::{Bitstream, EncodedPayload};
pub use config::{BitstreamFormat, EngineConfig};
pub use error::{HuffmanError, Result};
pub use frequency::{FrequencyEntry, count_bytes, count_frequencies, count_text};
pub use huffman_codec::{Decoded, HuffmanCodec, compress_bytes, compress_text, decompress};
pub use hufftree::{HuffNode, HuffmanTree};
pub use metadata::ImageMeta;
pub use symbol::{Mode, Symbol};

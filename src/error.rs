//! Error types for the Huffman engine.

use thiserror::Error;

use crate::symbol::Symbol;

/// Result type alias for engine operations.
pub type Result<T> = core::result::Result<T, HuffmanError>;

#[derive(Debug, Error)]
pub enum HuffmanError {
    /// A tree was requested from zero frequencies.
    #[error("cannot build a tree from empty input")]
    EmptyInput,

    /// Encode met a symbol that has no code in the table.
    #[error("symbol {symbol} at position {position} has no code in the table")]
    UnmappedSymbol { symbol: Symbol, position: usize },

    /// Decode ended with bits that match no code, or the stream disagrees with its metadata.
    #[error("invalid encoding after {decoded} symbols: {message}")]
    InvalidEncoding { decoded: usize, message: String },

    /// A serialized code table could not be parsed.
    #[error("malformed code table: {0}")]
    MalformedTable(String),

    /// Frequencies handed to the builder break its preconditions.
    #[error("invalid frequencies: {0}")]
    InvalidFrequencies(String),

    /// The persisted envelope around table and bitstream is damaged.
    #[error("malformed container: {0}")]
    MalformedContainer(String),

    /// A background encode finished without delivering its report.
    #[error("encode worker disconnected before reporting")]
    WorkerDisconnected,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl HuffmanError {
    pub fn invalid_encoding(decoded: usize, message: impl Into<String>) -> Self {
        HuffmanError::InvalidEncoding {
            decoded,
            message: message.into(),
        }
    }

    pub fn malformed_table(message: impl Into<String>) -> Self {
        HuffmanError::MalformedTable(message.into())
    }

    pub fn malformed_container(message: impl Into<String>) -> Self {
        HuffmanError::MalformedContainer(message.into())
    }

    pub fn invalid_frequencies(message: impl Into<String>) -> Self {
        HuffmanError::InvalidFrequencies(message.into())
    }

    /// True when the error points at damaged or mismatched data rather than caller misuse.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            HuffmanError::InvalidEncoding { .. }
                | HuffmanError::MalformedTable(_)
                | HuffmanError::MalformedContainer(_)
        )
    }

    /// Short stable name of the error kind, for callers that map errors to messages.
    pub fn kind(&self) -> &'static str {
        match self {
            HuffmanError::EmptyInput => "empty_input",
            HuffmanError::UnmappedSymbol { .. } => "unmapped_symbol",
            HuffmanError::InvalidEncoding { .. } => "invalid_encoding",
            HuffmanError::MalformedTable(_) => "malformed_table",
            HuffmanError::InvalidFrequencies(_) => "invalid_frequencies",
            HuffmanError::MalformedContainer(_) => "malformed_container",
            HuffmanError::WorkerDisconnected => "worker_disconnected",
            HuffmanError::Io(_) => "io",
            HuffmanError::Config(_) => "config",
        }
    }
}

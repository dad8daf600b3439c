use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which alphabet a tree or table works over. The two never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Unicode scalar values.
    Text,
    /// Raw bytes, typically pixel data.
    Image,
}

impl Mode {
    pub fn tag(self) -> &'static str {
        match self {
            Mode::Text => "TEXT",
            Mode::Image => "IMAGE",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Mode> {
        match tag {
            "TEXT" => Some(Mode::Text),
            "IMAGE" => Some(Mode::Image),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Mode::Text),
            "image" => Ok(Mode::Image),
            other => Err(format!("unknown mode '{other}', expected 'text' or 'image'")),
        }
    }
}

/// One unit of input: a character in text mode or a byte in image mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Char(char),
    Byte(u8),
}

impl Symbol {
    pub fn mode(self) -> Mode {
        match self {
            Symbol::Char(_) => Mode::Text,
            Symbol::Byte(_) => Mode::Image,
        }
    }

    /// Natural ordinal: the code point for characters, the value for bytes.
    pub fn ordinal(self) -> u32 {
        match self {
            Symbol::Char(c) => c as u32,
            Symbol::Byte(b) => b as u32,
        }
    }

    /// Inverse of [`Symbol::ordinal`]; `None` when the ordinal is out of range for `mode`.
    pub fn from_ordinal(mode: Mode, ordinal: u32) -> Option<Symbol> {
        match mode {
            Mode::Text => char::from_u32(ordinal).map(Symbol::Char),
            Mode::Image => u8::try_from(ordinal).ok().map(Symbol::Byte),
        }
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal()
            .cmp(&other.ordinal())
            .then_with(|| (self.mode() as u8).cmp(&(other.mode() as u8)))
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Char(c) => write!(f, "{:?} (U+{:04X})", c, *c as u32),
            Symbol::Byte(b) => write!(f, "0x{b:02X}"),
        }
    }
}

impl From<char> for Symbol {
    fn from(c: char) -> Self {
        Symbol::Char(c)
    }
}

impl From<u8> for Symbol {
    fn from(b: u8) -> Self {
        Symbol::Byte(b)
    }
}

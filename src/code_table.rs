use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use bitvec::prelude::*;
use tracing::debug;

use crate::error::{HuffmanError, Result};
use crate::frequency::FrequencyEntry;
use crate::hufftree::{HuffNode, HuffmanTree};
use crate::symbol::{Mode, Symbol};

/// Bit sequence in stream order, most significant bit first when packed.
pub type Bits = BitVec<u8, Msb0>;

/// The bit string assigned to one symbol: its path from the root, left = 0, right = 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Code(Bits);

impl Code {
    pub fn from_bits(bits: Bits) -> Self {
        Code(bits)
    }

    /// Parse a printable code. Only non-empty runs of '0'/'1' are accepted.
    pub fn parse(text: &str) -> Option<Code> {
        if text.is_empty() {
            return None;
        }
        let mut bits = Bits::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '0' => bits.push(false),
                '1' => bits.push(true),
                _ => return None,
            }
        }
        Some(Code(bits))
    }

    pub fn bits(&self) -> &BitSlice<u8, Msb0> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Borrow<BitSlice<u8, Msb0>> for Code {
    fn borrow(&self) -> &BitSlice<u8, Msb0> {
        &self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.0.iter().by_vals() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Bidirectional symbol <-> code mapping for one alphabet.
///
/// Codes always form a prefix-free set, whether generated from a tree or rebuilt from text.
#[derive(Debug, Clone)]
pub struct CodeTable {
    mode: Mode,
    encode: BTreeMap<Symbol, Code>,
    decode: HashMap<Code, Symbol>,
}

impl CodeTable {
    /// Assign every leaf the path leading to it. A lone leaf gets the code "0".
    pub fn generate(tree: &HuffmanTree) -> Self {
        let mut table = CodeTable {
            mode: tree.mode(),
            encode: BTreeMap::new(),
            decode: HashMap::new(),
        };

        match tree.root() {
            HuffNode::Leaf { symbol, .. } => {
                table.insert(*symbol, Code(bitvec![u8, Msb0; 0]));
            }
            root => {
                let mut prefix = Bits::new();
                table.assign(root, &mut prefix);
            }
        }

        debug!(
            mode = %table.mode,
            symbols = table.len(),
            longest = table.longest_code(),
            "generated code table"
        );
        table
    }

    fn assign(&mut self, node: &HuffNode, prefix: &mut Bits) {
        match node {
            HuffNode::Leaf { symbol, .. } => {
                self.insert(*symbol, Code(prefix.clone()));
            }
            HuffNode::Internal { left, right, .. } => {
                prefix.push(false);
                self.assign(left, prefix);
                prefix.pop();

                prefix.push(true);
                self.assign(right, prefix);
                prefix.pop();
            }
        }
    }

    fn insert(&mut self, symbol: Symbol, code: Code) {
        self.decode.insert(code.clone(), symbol);
        self.encode.insert(symbol, code);
    }

    /// Rebuild a table from explicit pairs, checking everything a generated table guarantees.
    pub fn from_entries<I>(mode: Mode, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Symbol, Code)>,
    {
        let mut table = CodeTable {
            mode,
            encode: BTreeMap::new(),
            decode: HashMap::new(),
        };

        for (symbol, code) in entries {
            if symbol.mode() != mode {
                return Err(HuffmanError::malformed_table(format!(
                    "symbol {symbol} in a {mode} table"
                )));
            }
            if code.is_empty() {
                return Err(HuffmanError::malformed_table(format!(
                    "symbol {symbol} has an empty code"
                )));
            }
            if table.encode.contains_key(&symbol) {
                return Err(HuffmanError::malformed_table(format!(
                    "symbol {symbol} appears twice"
                )));
            }
            if let Some(other) = table.decode.get(&code) {
                return Err(HuffmanError::malformed_table(format!(
                    "code {code} assigned to both {other} and {symbol}"
                )));
            }
            table.insert(symbol, code);
        }

        if table.is_empty() {
            return Err(HuffmanError::malformed_table("table has no entries"));
        }
        if !table.is_prefix_free() {
            return Err(HuffmanError::malformed_table("codes are not prefix-free"));
        }
        Ok(table)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.encode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encode.is_empty()
    }

    pub fn code(&self, symbol: Symbol) -> Option<&Code> {
        self.encode.get(&symbol)
    }

    pub fn symbol(&self, bits: &BitSlice<u8, Msb0>) -> Option<Symbol> {
        self.decode.get(bits).copied()
    }

    /// Entries in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &Code)> {
        self.encode.iter().map(|(symbol, code)| (*symbol, code))
    }

    pub fn longest_code(&self) -> usize {
        self.encode.values().map(Code::len).max().unwrap_or(0)
    }

    /// No code is a proper prefix of another.
    pub fn is_prefix_free(&self) -> bool {
        let mut codes: Vec<&Code> = self.decode.keys().collect();
        // in lexicographic order a prefix sorts directly before some code it prefixes
        codes.sort_by(|a, b| a.bits().iter().by_vals().cmp(b.bits().iter().by_vals()));
        codes
            .windows(2)
            .all(|pair| !pair[1].bits().starts_with(pair[0].bits()))
    }

    /// Total number of bits the given frequencies would encode to, if all are mapped.
    pub fn encoded_bit_len(&self, frequencies: &[FrequencyEntry]) -> Option<u64> {
        frequencies.iter().try_fold(0u64, |acc, entry| {
            let code = self.code(entry.symbol)?;
            acc.checked_add(entry.count.checked_mul(code.len() as u64)?)
        })
    }
}

impl PartialEq for CodeTable {
    fn eq(&self, other: &Self) -> bool {
        self.mode == other.mode && self.encode == other.encode
    }
}

impl Eq for CodeTable {}

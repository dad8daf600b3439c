use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::error::{HuffmanError, Result};
use crate::frequency::{self, FrequencyEntry};
use crate::min_heap::MinHeap;
use crate::symbol::{Mode, Symbol};

/// A Huffman tree tagged with the alphabet it was built over.
///
/// The tree owns every node reachable from `root`; rebuilding replaces the whole structure.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    mode: Mode,
    root: HuffNode,
}

impl HuffmanTree {
    /// Build a tree by repeatedly merging the two lowest nodes.
    ///
    /// Ties are broken leaf-before-internal, leaves by symbol ordinal and internal nodes by
    /// creation order, so the same frequencies always give the same tree. The first node
    /// taken becomes the left child.
    pub fn build(mode: Mode, frequencies: &[FrequencyEntry]) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(HuffmanError::EmptyInput);
        }
        Self::validate(mode, frequencies)?;

        let leaves: Vec<HuffNode> = frequencies
            .iter()
            .map(|entry| HuffNode::new(entry.symbol, entry.count))
            .collect();
        let mut heap = MinHeap::build(leaves);

        let mut next_seq = 0u64;
        while heap.heap_size() > 1 {
            let (Some(x), Some(y)) = (heap.extract_min(), heap.extract_min()) else {
                break;
            };
            heap.insert(HuffNode::merge(x, y, next_seq));
            next_seq += 1;
        }
        let root = heap.extract_min().ok_or(HuffmanError::EmptyInput)?;

        let tree = HuffmanTree { mode, root };
        debug!(
            mode = %mode,
            leaves = tree.leaf_count(),
            depth = tree.depth(),
            weight = tree.weight(),
            "built huffman tree"
        );
        Ok(tree)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        Self::build(Mode::Text, &frequency::count_text(text))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::build(Mode::Image, &frequency::count_bytes(bytes))
    }

    fn validate(mode: Mode, frequencies: &[FrequencyEntry]) -> Result<()> {
        let mut seen = HashSet::with_capacity(frequencies.len());
        for entry in frequencies {
            if entry.symbol.mode() != mode {
                return Err(HuffmanError::invalid_frequencies(format!(
                    "symbol {} does not belong to a {} tree",
                    entry.symbol, mode
                )));
            }
            if entry.count == 0 {
                return Err(HuffmanError::invalid_frequencies(format!(
                    "symbol {} has zero weight",
                    entry.symbol
                )));
            }
            if !seen.insert(entry.symbol) {
                return Err(HuffmanError::invalid_frequencies(format!(
                    "symbol {} listed more than once",
                    entry.symbol
                )));
            }
        }
        frequencies
            .iter()
            .try_fold(0u64, |acc, entry| acc.checked_add(entry.count))
            .ok_or_else(|| HuffmanError::invalid_frequencies("total weight overflows u64"))?;
        Ok(())
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn root(&self) -> &HuffNode {
        &self.root
    }

    /// Sum of all leaf weights.
    pub fn weight(&self) -> u64 {
        self.root.weight()
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    /// Longest root-to-leaf path; zero for a single-leaf tree.
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Leaf weights read back out of the tree, in frequency order.
    pub fn frequencies(&self) -> Vec<FrequencyEntry> {
        let mut entries = Vec::with_capacity(self.leaf_count());
        self.root.collect_leaves(&mut entries);
        entries.sort_by(|a, b| a.count.cmp(&b.count).then_with(|| a.symbol.cmp(&b.symbol)));
        entries
    }

    fn fmt_node(
        f: &mut fmt::Formatter<'_>,
        node: &HuffNode,
        depth: usize,
        label: &str,
    ) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match node {
            HuffNode::Leaf { symbol, weight } => {
                writeln!(f, "{indent}{label}-> Leaf: {symbol} [weight: {weight}]")
            }
            HuffNode::Internal {
                weight,
                left,
                right,
                ..
            } => {
                writeln!(f, "{indent}{label}-> Internal [weight: {weight}]")?;
                Self::fmt_node(f, left, depth + 1, "L")?;
                Self::fmt_node(f, right, depth + 1, "R")
            }
        }
    }
}

impl fmt::Display for HuffmanTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Huffman Tree Structure ({}):", self.mode)?;
        Self::fmt_node(f, &self.root, 0, "root")
    }
}

#[derive(Debug, Clone)]
pub enum HuffNode {
    Leaf {
        weight: u64,
        symbol: Symbol,
    },
    Internal {
        weight: u64,
        /// Creation order, the tie-break between internal nodes of equal weight.
        seq: u64,
        left: Box<HuffNode>,
        right: Box<HuffNode>,
    },
}

impl HuffNode {
    pub fn new(symbol: Symbol, weight: u64) -> Self {
        HuffNode::Leaf { weight, symbol }
    }

    pub fn weight(&self) -> u64 {
        match self {
            HuffNode::Leaf { weight, .. } => *weight,
            HuffNode::Internal { weight, .. } => *weight,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, HuffNode::Leaf { .. })
    }

    /// `a` is the smaller node and goes left.
    pub fn merge(a: Self, b: Self, seq: u64) -> Self {
        let weight = a.weight() + b.weight();
        HuffNode::Internal {
            weight,
            seq,
            left: Box::new(a),
            right: Box::new(b),
        }
    }

    fn leaf_count(&self) -> usize {
        match self {
            HuffNode::Leaf { .. } => 1,
            HuffNode::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    fn depth(&self) -> usize {
        match self {
            HuffNode::Leaf { .. } => 0,
            HuffNode::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn collect_leaves(&self, out: &mut Vec<FrequencyEntry>) {
        match self {
            HuffNode::Leaf { symbol, weight } => out.push(FrequencyEntry {
                symbol: *symbol,
                count: *weight,
            }),
            HuffNode::Internal { left, right, .. } => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            }
        }
    }
}

impl PartialEq for HuffNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HuffNode {}

impl PartialOrd for HuffNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HuffNode {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.weight().cmp(&other.weight()) {
            Ordering::Equal => match (self, other) {
                (HuffNode::Leaf { symbol: a, .. }, HuffNode::Leaf { symbol: b, .. }) => a.cmp(b),
                // leaves are taken before internal nodes of the same weight
                (HuffNode::Leaf { .. }, HuffNode::Internal { .. }) => Ordering::Less,
                (HuffNode::Internal { .. }, HuffNode::Leaf { .. }) => Ordering::Greater,
                (HuffNode::Internal { seq: a, .. }, HuffNode::Internal { seq: b, .. }) => {
                    a.cmp(b)
                }
            },
            other => other,
        }
    }
}

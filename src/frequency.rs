use std::collections::HashMap;

use crate::symbol::Symbol;

/// A symbol with the number of times it occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyEntry {
    pub symbol: Symbol,
    pub count: u64,
}

impl FrequencyEntry {
    pub fn new(symbol: impl Into<Symbol>, count: u64) -> Self {
        FrequencyEntry {
            symbol: symbol.into(),
            count,
        }
    }
}

/// Count every symbol once and return the pairs sorted ascending by count, then by ordinal.
///
/// Empty input gives an empty list; building a tree from it is the caller's problem.
pub fn count_frequencies<I>(symbols: I) -> Vec<FrequencyEntry>
where
    I: IntoIterator<Item = Symbol>,
{
    let counts: HashMap<Symbol, u64> = symbols.into_iter().fold(HashMap::new(), |mut acc, symbol| {
        *acc.entry(symbol).or_insert(0) += 1;
        acc
    });

    let mut entries: Vec<FrequencyEntry> = counts
        .into_iter()
        .map(|(symbol, count)| FrequencyEntry { symbol, count })
        .collect();
    entries.sort_by(|a, b| a.count.cmp(&b.count).then_with(|| a.symbol.cmp(&b.symbol)));
    entries
}

pub fn count_text(text: &str) -> Vec<FrequencyEntry> {
    count_frequencies(text.chars().map(Symbol::Char))
}

pub fn count_bytes(bytes: &[u8]) -> Vec<FrequencyEntry> {
    count_frequencies(bytes.iter().copied().map(Symbol::Byte))
}

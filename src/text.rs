use std::cmp::Ordering;

use crate::error::SortError;

/// A fixed-width symbol that can be suffix sorted.
///
/// Byte symbols are consumed two at a time, so every bucketing step looks at a pair.
/// Wide (16-bit) symbols are consumed one at a time; a pair would need 2^32 buckets.
pub trait Symbol: Copy + Ord + Send + Sync + 'static {
    /// Number of distinct symbol values.
    const ALPHABET: usize;

    /// Whether one key covers two symbols.
    const PAIRED: bool;

    fn ordinal(self) -> u32;
}

impl Symbol for u8 {
    const ALPHABET: usize = 1 << 8;
    const PAIRED: bool = true;

    #[inline]
    fn ordinal(self) -> u32 {
        self as u32
    }
}

impl Symbol for u16 {
    const ALPHABET: usize = 1 << 16;
    const PAIRED: bool = false;

    #[inline]
    fn ordinal(self) -> u32 {
        self as u32
    }
}

/// An alternative collation order: a permutation of the alphabet.
///
/// `ordinals[s]` is the position symbol `s` takes in the collation order. The inverse
/// permutation is kept as well so collated values can be mapped back to symbols.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collation {
    ordinals: Box<[u16]>,
    symbols: Box<[u16]>,
}

impl Collation {
    /// Builds a collation from the ordinal of every symbol. The table must have 256 entries
    /// (bytes) or 65536 entries (wide symbols) and be a permutation.
    pub fn new<O>(ordinals: O) -> Result<Self, SortError>
    where
        O: Into<Box<[u16]>>,
    {
        let ordinals = ordinals.into();
        let width = ordinals.len();
        if width != u8::ALPHABET && width != u16::ALPHABET {
            return Err(SortError::InvalidCollation(format!(
                "table has {} entries, expected 256 or 65536",
                width
            )));
        }

        let mut symbols = vec![None; width];
        for (symbol, &ordinal) in ordinals.iter().enumerate() {
            let slot = symbols.get_mut(ordinal as usize).ok_or_else(|| {
                SortError::InvalidCollation(format!(
                    "ordinal {} of symbol {} is outside the alphabet",
                    ordinal, symbol
                ))
            })?;
            if let Some(previous) = slot.replace(symbol as u16) {
                return Err(SortError::InvalidCollation(format!(
                    "symbols {} and {} share ordinal {}",
                    previous, symbol, ordinal
                )));
            }
        }
        // Every slot is filled: `width` distinct ordinals landed in `width` slots.
        let symbols = symbols.into_iter().flatten().collect();

        Ok(Collation { ordinals, symbols })
    }

    /// Builds a collation from the symbols listed in ascending collation order.
    pub fn from_order(order: &[u16]) -> Result<Self, SortError> {
        let mut ordinals = vec![u16::MAX; order.len()];
        let mut seen = vec![false; order.len()];
        for (ordinal, &symbol) in order.iter().enumerate() {
            match seen.get_mut(symbol as usize) {
                Some(flag) if !*flag => *flag = true,
                _ => {
                    return Err(SortError::InvalidCollation(format!(
                        "symbol {} is repeated or outside the alphabet",
                        symbol
                    )))
                }
            }
            ordinals[symbol as usize] = ordinal as u16;
        }
        Collation::new(ordinals)
    }

    /// Number of symbols covered by this collation.
    #[inline]
    pub fn width(&self) -> usize {
        self.ordinals.len()
    }

    /// Collated ordinal of `symbol`.
    #[inline]
    pub fn ordinal(&self, symbol: u32) -> u32 {
        self.ordinals[symbol as usize] as u32
    }

    /// Maps a collated ordinal back to its symbol.
    #[inline]
    pub fn symbol(&self, ordinal: u32) -> u32 {
        self.symbols[ordinal as usize] as u32
    }
}

/// A read-only view of the text being sorted.
///
/// Symbols are read through the collation (if any) and shifted up by one, so code `0` is free
/// for the end of the sequence: shorter suffixes compare smaller.
#[derive(Clone, Copy)]
pub(crate) struct Sequence<'a, S> {
    symbols: &'a [S],
    collation: Option<&'a Collation>,
}

impl<'a, S: Symbol> Sequence<'a, S> {
    /// Codes per key position, terminal code included.
    const RADIX: u32 = S::ALPHABET as u32 + 1;

    pub(crate) fn new(symbols: &'a [S], collation: Option<&'a Collation>) -> Self {
        Sequence { symbols, collation }
    }

    #[inline]
    pub(crate) fn len(&self) -> u32 {
        self.symbols.len() as u32
    }

    /// Symbols advanced by one bucketing step.
    #[inline]
    pub(crate) fn stride(&self) -> u32 {
        if S::PAIRED {
            2
        } else {
            1
        }
    }

    /// Number of distinct keys `peek` can return.
    #[inline]
    pub(crate) fn key_space(&self) -> usize {
        if S::PAIRED {
            (Self::RADIX * Self::RADIX) as usize
        } else {
            Self::RADIX as usize
        }
    }

    /// Collated ordinal of the symbol at `i`.
    #[inline]
    pub(crate) fn symbol(&self, i: u32) -> u32 {
        let raw = self.symbols[i as usize].ordinal();
        match self.collation {
            Some(collation) => collation.ordinal(raw),
            None => raw,
        }
    }

    #[inline]
    fn code(&self, i: u32) -> u32 {
        if i < self.len() {
            self.symbol(i) + 1
        } else {
            0
        }
    }

    /// Combined key of the symbols starting at `i`, with the terminal code past the end.
    #[inline]
    pub(crate) fn peek(&self, i: u32) -> u32 {
        if S::PAIRED {
            self.code(i) * Self::RADIX + self.code(i + 1)
        } else {
            self.code(i)
        }
    }

    /// Splits a paired key into its two codes.
    #[inline]
    pub(crate) fn split_key(&self, key: u32) -> (u32, u32) {
        (key / Self::RADIX, key % Self::RADIX)
    }

    /// Compares the suffixes at `i` and `j` symbol by symbol.
    pub(crate) fn compare(&self, i: u32, j: u32) -> Ordering {
        if i == j {
            return Ordering::Equal;
        }
        let n = self.len();
        let (mut a, mut b) = (i, j);
        while a < n && b < n {
            match self.symbol(a).cmp(&self.symbol(b)) {
                Ordering::Equal => {
                    a += 1;
                    b += 1;
                }
                unequal => return unequal,
            }
        }
        // One suffix ran out; it is a prefix of the other.
        (n - a).cmp(&(n - b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_keys_order_like_text() {
        let text = Sequence::new(b"abba".as_slice(), None);
        assert!(text.peek(0) < text.peek(1));
        assert!(text.peek(3) < text.peek(0));
        assert_eq!(text.split_key(text.peek(3)), ('a' as u32 + 1, 0));
        assert_eq!(text.peek(4), 0);
    }

    #[test]
    fn wide_keys_use_one_symbol() {
        let symbols = [7u16, 3, 65535];
        let text = Sequence::new(symbols.as_slice(), None);
        assert_eq!(text.stride(), 1);
        assert_eq!(text.peek(2), 65536);
        assert_eq!(text.key_space(), 65537);
    }

    #[test]
    fn compare_treats_prefix_as_smaller() {
        let text = Sequence::new(b"abab".as_slice(), None);
        assert_eq!(text.compare(2, 0), Ordering::Less);
        assert_eq!(text.compare(1, 3), Ordering::Greater);
    }

    #[test]
    fn collation_reverses_order() {
        let order: Vec<u16> = (0..256u16).rev().collect();
        let collation = Collation::from_order(&order).unwrap();
        let text = Sequence::new(b"ab".as_slice(), Some(&collation));
        assert!(text.symbol(0) > text.symbol(1));
        assert_eq!(collation.symbol(collation.ordinal(97)), 97);
    }

    #[test]
    fn collation_rejects_duplicates() {
        let mut ordinals: Vec<u16> = (0..256u16).collect();
        ordinals[1] = 0;
        assert!(Collation::new(ordinals).is_err());
        assert!(Collation::new(vec![0u16; 3]).is_err());
    }
}

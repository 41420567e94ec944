use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::SortError;
use crate::text::{Collation, Sequence, Symbol};
use crate::SortConfig;

/// Counters collected while sorting. Introspection only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SortStats {
    pub length: usize,
    pub elapsed: Duration,
    /// Working memory of the sort, in bytes.
    pub memory_bytes: usize,
    /// Chains popped from the work stack, singletons included.
    pub chains: u64,
    pub singletons: u64,
    /// Suffixes ordered by the rank of an already sorted tail.
    pub induced: u64,
    /// Suffixes ranked through the per-pair enhanced induction queues.
    pub enhanced_induced: u64,
    /// Tandem repeat suffixes ranked by walking forward from induced members.
    pub tandem_resolved: u64,
    /// Tandem repeat suffixes ranked after a nested sort.
    pub tandem_deferred: u64,
    pub max_tandem_depth: u32,
}

/// The inverse suffix array of a text: the rank of every suffix in lexicographic order.
pub struct InverseSuffixArray<'t, S> {
    text: &'t [S],
    collation: Option<Arc<Collation>>,
    ranks: Box<[u32]>,
    stats: SortStats,
}

impl<'t, S: Symbol> InverseSuffixArray<'t, S> {
    pub(crate) fn from_parts(
        text: &'t [S],
        collation: Option<Arc<Collation>>,
        ranks: Box<[u32]>,
        stats: SortStats,
    ) -> Self {
        InverseSuffixArray {
            text,
            collation,
            ranks,
            stats,
        }
    }

    /// Builds the inverse suffix array by sorting every suffix with direct comparisons.
    /// Runs in `O(n^2 log n)`; only useful as a reference.
    pub fn naive(text: &'t [S], config: &SortConfig) -> Result<Self, SortError> {
        crate::check_input(text.len(), S::ALPHABET, config)?;
        let start = Instant::now();

        let sequence = Sequence::new(text, config.collation.as_deref());
        let mut table: Vec<u32> = (0..text.len() as u32).collect();
        table.sort_by(|&a, &b| sequence.compare(a, b));

        let mut ranks = vec![0u32; text.len()];
        for (rank, &position) in table.iter().enumerate() {
            ranks[position as usize] = rank as u32;
        }

        let stats = SortStats {
            length: text.len(),
            elapsed: start.elapsed(),
            memory_bytes: table.capacity() * std::mem::size_of::<u32>() * 2,
            ..SortStats::default()
        };
        Ok(Self::from_parts(
            text,
            config.collation.clone(),
            ranks.into(),
            stats,
        ))
    }

    /// Returns the number of suffixes.
    #[inline]
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// Returns `true` iff `self.len() == 0`. Never true for a successful sort.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Rank of the suffix starting at `position`.
    #[inline]
    pub fn rank(&self, position: usize) -> u32 {
        self.ranks[position]
    }

    pub fn ranks(&self) -> &[u32] {
        &self.ranks
    }

    /// Returns the suffix starting at `position`.
    #[inline]
    pub fn suffix(&self, position: usize) -> &'t [S] {
        &self.text[position..]
    }

    pub fn text(&self) -> &'t [S] {
        self.text
    }

    /// The suffix array: positions listed in rank order.
    pub fn suffix_array(&self) -> Vec<u32> {
        let mut table = vec![0u32; self.ranks.len()];
        for (position, &rank) in self.ranks.iter().enumerate() {
            table[rank as usize] = position as u32;
        }
        table
    }

    /// Checks that the ranks form a permutation and that consecutive ranks hold strictly
    /// increasing suffixes, comparing the suffixes symbol by symbol.
    pub fn verify(&self) -> bool {
        let mut table = vec![None; self.ranks.len()];
        for (position, &rank) in self.ranks.iter().enumerate() {
            match table.get_mut(rank as usize) {
                Some(entry) if entry.is_none() => *entry = Some(position as u32),
                _ => return false,
            }
        }
        let table: Vec<u32> = table.into_iter().flatten().collect();

        let sequence = Sequence::new(self.text, self.collation.as_deref());
        table
            .par_windows(2)
            .all(|pair| sequence.compare(pair[0], pair[1]) == Ordering::Less)
    }

    /// Wall time spent sorting.
    pub fn elapsed(&self) -> Duration {
        self.stats.elapsed
    }

    /// Working memory used while sorting, in bytes.
    pub fn memory_usage(&self) -> usize {
        self.stats.memory_bytes
    }

    pub fn stats(&self) -> &SortStats {
        &self.stats
    }

    /// Consumes the table and returns the ranks.
    pub fn into_ranks(self) -> Box<[u32]> {
        self.ranks
    }
}

impl<S: Symbol> PartialEq for InverseSuffixArray<'_, S> {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.ranks == other.ranks
    }
}

impl<S: Symbol + fmt::Debug> fmt::Debug for InverseSuffixArray<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "\n-----------------------------------------")?;
        writeln!(f, "INVERSE SUFFIX ARRAY")?;
        for (position, &rank) in self.ranks.iter().enumerate() {
            writeln!(f, "rank[{}] {}", position, rank)?;
        }
        writeln!(f, "-----------------------------------------")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(text: &str) -> InverseSuffixArray<'_, u8> {
        InverseSuffixArray::naive(text.as_bytes(), &SortConfig::default()).unwrap()
    }

    #[test]
    fn naive_banana() {
        let table = naive("banana");
        assert_eq!(table.suffix_array(), vec![5, 3, 1, 0, 4, 2]);
        assert_eq!(table.rank(0), 3);
        assert!(table.verify());
    }

    #[test]
    fn verify_rejects_swapped_ranks() {
        let table = naive("banana");
        let mut ranks = table.ranks().to_vec();
        ranks.swap(0, 1);
        let broken = InverseSuffixArray::from_parts(
            table.text(),
            None,
            ranks.into(),
            SortStats::default(),
        );
        assert!(!broken.verify());
    }

    #[test]
    fn verify_rejects_duplicate_ranks() {
        let table = naive("abc");
        let broken = InverseSuffixArray::from_parts(
            table.text(),
            None,
            vec![0, 0, 2].into(),
            SortStats::default(),
        );
        assert!(!broken.verify());
    }
}

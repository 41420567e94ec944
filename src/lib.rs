//! Induction-based suffix sorting in the MSufSort family.
//!
//! ```rust
//! use msufsort::{sort, SortConfig};
//!
//! let isa = sort(b"banana", &SortConfig::default()).unwrap();
//! assert_eq!(isa.suffix_array(), vec![5, 3, 1, 0, 4, 2]);
//! assert!(isa.verify());
//! ```

pub mod error;
pub mod introsort;
pub mod loader;
pub mod stack;
pub mod table;
pub mod text;

mod engine;
mod registry;

pub use error::SortError;
pub use table::{InverseSuffixArray, SortStats};
pub use text::{Collation, Symbol};

use log::info;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use crate::engine::Engine;
use crate::text::Sequence;

/// Maximum number of symbols that can be sorted. The two top bits of a rank are kept free.
pub const MAX_LENGTH: usize = 1 << 30;

/// How suffixes are induced from already sorted ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InductionStrategy {
    /// Plain induction plus per-pair induction queues for descending pairs.
    #[default]
    Enhanced,
    /// Plain induction only. Use this when a compacted terminal-node trie shares the output.
    Plain,
}

impl FromStr for InductionStrategy {
    type Err = &'static str;

    fn from_str(strategy: &str) -> Result<Self, Self::Err> {
        match strategy {
            "enhanced" => Ok(Self::Enhanced),
            "plain" => Ok(Self::Plain),
            _ => Err("Invalid induction strategy"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SortConfig {
    pub induction: InductionStrategy,
    /// Alternative symbol order applied before every comparison.
    pub collation: Option<Arc<Collation>>,
    /// Print progress messages.
    pub verbose: bool,
}

impl SortConfig {
    pub fn with_induction(mut self, induction: InductionStrategy) -> Self {
        self.induction = induction;
        self
    }

    pub fn with_collation(mut self, collation: Collation) -> Self {
        self.collation = Some(Arc::new(collation));
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Computes the inverse suffix array of `text`.
///
/// Byte texts advance two symbols per refinement step; `u16` texts advance one.
pub fn sort<'t, S: Symbol>(
    text: &'t [S],
    config: &SortConfig,
) -> Result<InverseSuffixArray<'t, S>, SortError> {
    check_input(text.len(), S::ALPHABET, config)?;

    if config.verbose {
        println!("Sorting {} suffixes...", text.len());
    }
    let start = Instant::now();
    let sequence = Sequence::new(text, config.collation.as_deref());
    let (ranks, mut stats) = Engine::new(sequence, config.induction).run();
    stats.elapsed = start.elapsed();
    if config.verbose {
        println!("Time elapsed: {:?}", stats.elapsed);
    }
    info!(
        "sorted {} suffixes: {} chains, {} induced, {} enhanced, {} tandem",
        stats.length,
        stats.chains,
        stats.induced,
        stats.enhanced_induced,
        stats.tandem_resolved + stats.tandem_deferred
    );

    Ok(InverseSuffixArray::from_parts(
        text,
        config.collation.clone(),
        ranks,
        stats,
    ))
}

pub(crate) fn check_input(
    len: usize,
    alphabet: usize,
    config: &SortConfig,
) -> Result<(), SortError> {
    if len == 0 {
        return Err(SortError::EmptyInput);
    }
    if len > MAX_LENGTH {
        return Err(SortError::TooLong {
            len,
            max: MAX_LENGTH,
        });
    }
    if let Some(collation) = config.collation.as_deref() {
        if collation.width() != alphabet {
            return Err(SortError::CollationWidth {
                expected: alphabet,
                found: collation.width(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_oversized() {
        let config = SortConfig::default();
        assert_eq!(sort::<u8>(&[], &config).unwrap_err(), SortError::EmptyInput);
        assert!(check_input(MAX_LENGTH, 256, &config).is_ok());
        assert_eq!(
            check_input(MAX_LENGTH + 1, 256, &config),
            Err(SortError::TooLong {
                len: MAX_LENGTH + 1,
                max: MAX_LENGTH
            })
        );
    }

    #[test]
    fn rejects_collation_of_wrong_width() {
        let order: Vec<u16> = (0..256).collect();
        let config = SortConfig::default().with_collation(Collation::from_order(&order).unwrap());
        let wide: Vec<u16> = vec![1, 2, 3];
        assert_eq!(
            sort(wide.as_slice(), &config).unwrap_err(),
            SortError::CollationWidth {
                expected: 65536,
                found: 256
            }
        );
    }

    #[test]
    fn parses_strategy() {
        assert_eq!("plain".parse(), Ok(InductionStrategy::Plain));
        assert_eq!("enhanced".parse(), Ok(InductionStrategy::Enhanced));
        assert!("fast".parse::<InductionStrategy>().is_err());
    }
}

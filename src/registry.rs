use crate::introsort::introsort;

/// One slot of the working array. During sorting the array doubles as storage for the
/// chain links of every unsorted suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Unsorted; holds the next member of its chain, `None` at the end of the chain.
    Chained(Option<u32>),
    /// Queued for enhanced induction; holds the next position waiting on the same key.
    Pending(Option<u32>),
    /// Final rank.
    Ranked(u32),
}

impl Slot {
    #[inline]
    pub(crate) fn is_unsorted(&self) -> bool {
        !matches!(self, Slot::Ranked(_))
    }
}

/// A chain drained from the registry, ready to be pushed for processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NewChain {
    pub key: u32,
    pub head: u32,
    pub len: u32,
}

/// Head and tail of the chain under construction for every key.
pub(crate) struct ChainRegistry {
    heads: Vec<Option<u32>>,
    tails: Vec<Option<u32>>,
    counts: Vec<u32>,
    fresh: Vec<u32>,
}

impl ChainRegistry {
    pub(crate) fn new(key_space: usize) -> Self {
        ChainRegistry {
            heads: vec![None; key_space],
            tails: vec![None; key_space],
            counts: vec![0; key_space],
            fresh: Vec::new(),
        }
    }

    /// Appends `position` to the chain of `key`, opening the chain if needed.
    #[inline]
    pub(crate) fn add(&mut self, slots: &mut [Slot], position: u32, key: u32) {
        let k = key as usize;
        match self.tails[k] {
            Some(tail) => slots[tail as usize] = Slot::Chained(Some(position)),
            None => {
                self.heads[k] = Some(position);
                self.fresh.push(key);
            }
        }
        self.tails[k] = Some(position);
        self.counts[k] += 1;
    }

    /// Detaches every chain opened since the last call, in ascending key order.
    pub(crate) fn take_new_chains(&mut self, slots: &mut [Slot]) -> Vec<NewChain> {
        introsort(&mut self.fresh);
        let mut chains = Vec::with_capacity(self.fresh.len());
        for &key in self.fresh.iter() {
            let k = key as usize;
            let (Some(head), Some(tail)) = (self.heads[k].take(), self.tails[k].take()) else {
                unreachable!("fresh key {} has no chain", key);
            };
            slots[tail as usize] = Slot::Chained(None);
            chains.push(NewChain {
                key,
                head,
                len: std::mem::take(&mut self.counts[k]),
            });
        }
        self.fresh.clear();
        chains
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.heads.capacity() * std::mem::size_of::<Option<u32>>() * 2
            + self.counts.capacity() * std::mem::size_of::<u32>()
            + self.fresh.capacity() * std::mem::size_of::<u32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(slots: &[Slot], head: u32) -> Vec<u32> {
        let mut members = vec![head];
        let mut cur = head;
        while let Slot::Chained(Some(next)) = slots[cur as usize] {
            members.push(next);
            cur = next;
        }
        members
    }

    #[test]
    fn chains_drain_sorted_and_terminated() {
        let mut slots = vec![Slot::Chained(Some(99)); 6];
        let mut registry = ChainRegistry::new(16);
        for (position, key) in [(0, 9), (1, 3), (2, 9), (3, 3), (4, 9), (5, 1)] {
            registry.add(&mut slots, position, key);
        }
        let chains = registry.take_new_chains(&mut slots);
        let keys: Vec<u32> = chains.iter().map(|c| c.key).collect();
        assert_eq!(keys, vec![1, 3, 9]);
        assert_eq!(walk(&slots, chains[1].head), vec![1, 3]);
        assert_eq!(walk(&slots, chains[2].head), vec![0, 2, 4]);
        assert_eq!(chains[2].len, 3);
        assert_eq!(slots[5], Slot::Chained(None));

        // A drained registry starts over.
        assert!(registry.take_new_chains(&mut slots).is_empty());
        registry.add(&mut slots, 4, 9);
        let chains = registry.take_new_chains(&mut slots);
        assert_eq!(chains, vec![NewChain { key: 9, head: 4, len: 1 }]);
    }
}

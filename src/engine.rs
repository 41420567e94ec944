//! The chain processor.
//!
//! Every suffix is first bucketed by its leading key. Buckets become chains: intrusive linked
//! lists threaded through the slot array, each holding the suffixes that share their first
//! `match_len` symbols. Chains are popped smallest first and refined by the next key, so final
//! ranks are handed out in ascending order. That ordering is what makes induction work: when a
//! chain is scanned, every ranked suffix is smaller than every unranked one.

use log::debug;

use crate::registry::{ChainRegistry, Slot};
use crate::stack::{InductionKey, InductionStack, OrderedStack};
use crate::table::SortStats;
use crate::text::{Sequence, Symbol};
use crate::InductionStrategy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Frame {
    /// A chain whose members share their first `match_len` symbols.
    Chain { head: u32, match_len: u32 },
    /// An enhanced-induction bucket; its rank range starts at the current next rank.
    Induced { key: u32 },
}

/// Where resolved suffixes go.
enum Output {
    /// Hand out global ranks in ascending order.
    Ranks,
    /// Only record the order. Used to sort deferred tandem repeats without committing ranks.
    Order(Vec<u32>),
}

/// Per-key state of enhanced induction.
struct InducedBuckets {
    /// Next rank to hand out for each key.
    next_rank: Vec<u32>,
    heads: Vec<Option<u32>>,
    tails: Vec<Option<u32>>,
}

impl InducedBuckets {
    fn new(key_space: usize) -> Self {
        InducedBuckets {
            next_rank: vec![0; key_space],
            heads: vec![None; key_space],
            tails: vec![None; key_space],
        }
    }

    fn memory_usage(&self) -> usize {
        self.next_rank.capacity() * std::mem::size_of::<u32>()
            + self.heads.capacity() * std::mem::size_of::<Option<u32>>() * 2
    }
}

pub(crate) struct Engine<'a, S> {
    text: Sequence<'a, S>,
    slots: Vec<Slot>,
    registry: ChainRegistry,
    candidates: InductionStack,
    induced: Option<InducedBuckets>,
    /// Generation stamps identifying the chain being scanned and its tandem members.
    marks: Vec<u32>,
    generation: u32,
    next_rank: u32,
    tandem_depth: u32,
    // Scratch buffers reused across chains.
    members: Vec<u32>,
    rest: Vec<u32>,
    resolved: Vec<u32>,
    stats: SortStats,
}

impl<'a, S: Symbol> Engine<'a, S> {
    pub(crate) fn new(text: Sequence<'a, S>, strategy: InductionStrategy) -> Self {
        let n = text.len() as usize;
        let key_space = text.key_space();
        // Enhanced induction relies on pair keys.
        let induced = match strategy {
            InductionStrategy::Enhanced if S::PAIRED => Some(InducedBuckets::new(key_space)),
            _ => None,
        };

        Engine {
            text,
            slots: vec![Slot::Chained(None); n],
            registry: ChainRegistry::new(key_space),
            candidates: InductionStack::default(),
            induced,
            marks: vec![0; n],
            generation: 0,
            next_rank: 0,
            tandem_depth: 0,
            members: Vec::new(),
            rest: Vec::new(),
            resolved: Vec::new(),
            stats: SortStats {
                length: n,
                ..SortStats::default()
            },
        }
    }

    /// Sorts every suffix and returns the inverse suffix array.
    pub(crate) fn run(mut self) -> (Box<[u32]>, SortStats) {
        let frames = self.bucket();
        self.drive(frames, &mut Output::Ranks);
        debug_assert_eq!(self.next_rank, self.text.len());

        self.stats.memory_bytes = self.memory_usage();
        let ranks = self
            .slots
            .iter()
            .enumerate()
            .map(|(position, slot)| match *slot {
                Slot::Ranked(rank) => rank,
                other => unreachable!("position {} left unsorted as {:?}", position, other),
            })
            .collect();
        (ranks, self.stats)
    }

    /// Groups every suffix by its leading key and lays out the initial work stack.
    fn bucket(&mut self) -> OrderedStack<Frame> {
        for position in 0..self.text.len() {
            let key = self.text.peek(position);
            self.registry.add(&mut self.slots, position, key);
        }
        let chains = self.registry.take_new_chains(&mut self.slots);

        // The rank range of each bucket starts after all smaller buckets.
        let mut first_rank = 0;
        let mut induced_keys = vec![false; chains.len()];
        for (chain, is_induced) in chains.iter().zip(induced_keys.iter_mut()) {
            *is_induced = self.is_induced_key(chain.key);
            if let (true, Some(buckets)) = (*is_induced, self.induced.as_mut()) {
                buckets.next_rank[chain.key as usize] = first_rank;
            }
            first_rank += chain.len;
        }

        let stride = self.text.stride();
        let mut frames = OrderedStack::with_capacity(chains.len());
        for (chain, &is_induced) in chains.iter().zip(induced_keys.iter()).rev() {
            if is_induced {
                frames.push(Frame::Induced { key: chain.key });
            } else {
                frames.push(Frame::Chain {
                    head: chain.head,
                    match_len: stride,
                });
            }
        }
        debug!(
            "bucketed {} suffixes into {} chains",
            self.text.len(),
            chains.len()
        );
        frames
    }

    fn drive(&mut self, mut frames: OrderedStack<Frame>, output: &mut Output) {
        while let Some(frame) = frames.pop() {
            match frame {
                Frame::Chain { head, match_len } => {
                    self.process_chain(head, match_len, &mut frames, output)
                }
                Frame::Induced { key } => self.release_induced(key),
            }
        }
    }

    fn process_chain(
        &mut self,
        head: u32,
        match_len: u32,
        frames: &mut OrderedStack<Frame>,
        output: &mut Output,
    ) {
        self.stats.chains += 1;
        if self.slots[head as usize] == Slot::Chained(None) {
            self.stats.singletons += 1;
            self.emit(head, output);
            return;
        }

        let mut members = std::mem::take(&mut self.members);
        let mut rest = std::mem::take(&mut self.rest);
        let mut resolved = std::mem::take(&mut self.resolved);
        members.clear();
        rest.clear();
        resolved.clear();

        let mut cursor = Some(head);
        while let Some(position) = cursor {
            members.push(position);
            cursor = match self.slots[position as usize] {
                Slot::Chained(next) => next,
                other => unreachable!("chain member {} is {:?}", position, other),
            };
        }

        // Tandem repeats are only tracked when ranks are committed directly.
        let track_tandem = matches!(output, Output::Ranks);
        let (member_mark, tandem_mark) = if track_tandem {
            self.next_marks()
        } else {
            (0, 0)
        };
        if track_tandem {
            for &position in members.iter() {
                self.marks[position as usize] = member_mark;
            }
        }

        let n = self.text.len();
        let mut tandem = 0u32;
        for &position in members.iter() {
            let tail = position + match_len;
            if tail >= n {
                self.candidates.push(InductionKey::empty_tail(position));
                continue;
            }
            match self.slots[tail as usize] {
                Slot::Ranked(rank) => {
                    debug_assert!(rank < self.next_rank);
                    self.candidates
                        .push(InductionKey::ranked_tail(position, rank));
                }
                Slot::Chained(_)
                    if track_tandem
                        && (self.marks[tail as usize] == member_mark
                            || self.marks[tail as usize] == tandem_mark) =>
                {
                    self.marks[position as usize] = tandem_mark;
                    tandem += 1;
                }
                _ => rest.push(position),
            }
        }

        // Members with a ranked tail precede every other member.
        self.stats.induced += self.candidates.len() as u64;
        resolved.extend(self.candidates.drain_sorted());
        for &position in resolved.iter() {
            self.emit(position, output);
        }

        if tandem > 0 {
            self.resolve_tandem(&members, &mut resolved, match_len, tandem_mark, tandem, output);
        }

        let stride = self.text.stride();
        for &position in rest.iter() {
            let key = self.text.peek(position + match_len);
            self.registry.add(&mut self.slots, position, key);
        }
        let chains = self.registry.take_new_chains(&mut self.slots);
        for chain in chains.iter().rev() {
            frames.push(Frame::Chain {
                head: chain.head,
                match_len: match_len + stride,
            });
        }

        self.members = members;
        self.rest = rest;
        self.resolved = resolved;
    }

    /// Ranks the tandem members of the chain being processed.
    ///
    /// A tandem member `p` has `p + match_len` in the same chain, so its run `p, p + m, ...`
    /// ends at a non-tandem member `e`. Runs ending at an induced member are ordered by
    /// walking the already ranked members forward. The remaining runs end at a member that
    /// still needs splitting; they are ordered deepest run first, with ties broken by the
    /// order of `e - m`, which a nested sort at twice the match length computes.
    fn resolve_tandem(
        &mut self,
        members: &[u32],
        resolved: &mut Vec<u32>,
        match_len: u32,
        tandem_mark: u32,
        tandem: u32,
        output: &mut Output,
    ) {
        let mut remaining = tandem;
        let mut i = 0;
        while i < resolved.len() && remaining > 0 {
            if let Some(prev) = resolved[i].checked_sub(match_len) {
                if self.is_open_tandem(prev, tandem_mark) {
                    self.emit(prev, output);
                    resolved.push(prev);
                    remaining -= 1;
                }
            }
            i += 1;
        }
        self.stats.tandem_resolved += (tandem - remaining) as u64;
        if remaining == 0 {
            return;
        }

        // Second-to-last elements of the runs that are still open.
        let pending: Vec<u32> = members
            .iter()
            .copied()
            .filter(|&p| {
                self.is_open_tandem(p, tandem_mark)
                    && self.marks[(p + match_len) as usize] != tandem_mark
            })
            .collect();
        for pair in pending.windows(2) {
            self.slots[pair[0] as usize] = Slot::Chained(Some(pair[1]));
        }
        self.slots[pending[pending.len() - 1] as usize] = Slot::Chained(None);

        self.tandem_depth += 1;
        self.stats.max_tandem_depth = self.stats.max_tandem_depth.max(self.tandem_depth);
        let mut nested = OrderedStack::new();
        nested.push(Frame::Chain {
            head: pending[0],
            match_len: 2 * match_len,
        });
        let mut order = Output::Order(Vec::with_capacity(pending.len()));
        self.drive(nested, &mut order);
        self.tandem_depth -= 1;
        let Output::Order(first_level) = order else {
            unreachable!("nested sort switched output mode");
        };

        let mut levels = vec![first_level];
        loop {
            let next: Vec<u32> = levels[levels.len() - 1]
                .iter()
                .filter_map(|&position| position.checked_sub(match_len))
                .filter(|&prev| self.is_open_tandem(prev, tandem_mark))
                .collect();
            if next.is_empty() {
                break;
            }
            levels.push(next);
        }
        debug!(
            "deferred {} tandem suffixes over {} levels at match length {}",
            remaining,
            levels.len(),
            match_len
        );

        for level in levels.iter().rev() {
            for &position in level.iter() {
                self.emit(position, output);
            }
        }
        self.stats.tandem_deferred += remaining as u64;
    }

    #[inline]
    fn is_open_tandem(&self, position: u32, tandem_mark: u32) -> bool {
        self.marks[position as usize] == tandem_mark
            && matches!(self.slots[position as usize], Slot::Chained(_))
    }

    #[inline]
    fn emit(&mut self, position: u32, output: &mut Output) {
        match output {
            Output::Ranks => self.assign_rank(position),
            Output::Order(order) => order.push(position),
        }
    }

    fn assign_rank(&mut self, position: u32) {
        self.slots[position as usize] = Slot::Ranked(self.next_rank);
        self.next_rank += 1;

        // A predecessor starting a descending pair sorts right after the other suffixes of its
        // bucket whose successors ranked before this one.
        if self.induced.is_some() && position > 0 {
            let prev = position - 1;
            if self.text.symbol(prev) > self.text.symbol(position) {
                self.enqueue_induced(prev);
            }
        }
    }

    fn enqueue_induced(&mut self, position: u32) {
        let key = self.text.peek(position) as usize;
        self.slots[position as usize] = Slot::Pending(None);
        if let Some(buckets) = self.induced.as_mut() {
            match buckets.tails[key] {
                Some(tail) => self.slots[tail as usize] = Slot::Pending(Some(position)),
                None => buckets.heads[key] = Some(position),
            }
            buckets.tails[key] = Some(position);
        }
    }

    /// Ranks the queued members of an enhanced-induction bucket, in queue order.
    fn release_induced(&mut self, key: u32) {
        let mut cursor = match self.induced.as_mut() {
            Some(buckets) => {
                buckets.tails[key as usize] = None;
                buckets.heads[key as usize].take()
            }
            None => unreachable!("induced frame without enhanced induction"),
        };
        while let Some(position) = cursor {
            cursor = match self.slots[position as usize] {
                Slot::Pending(next) => next,
                other => unreachable!("queued position {} is {:?}", position, other),
            };
            if let Some(buckets) = self.induced.as_mut() {
                let rank = &mut buckets.next_rank[key as usize];
                debug_assert_eq!(*rank, self.next_rank);
                *rank += 1;
            }
            self.assign_rank(position);
            self.stats.enhanced_induced += 1;
        }
    }

    /// Whether every suffix under `key` is placed by enhanced induction: a real pair whose
    /// first symbol is larger than the second.
    fn is_induced_key(&self, key: u32) -> bool {
        if self.induced.is_none() {
            return false;
        }
        let (first, second) = self.text.split_key(key);
        second != 0 && first > second
    }

    fn next_marks(&mut self) -> (u32, u32) {
        if self.generation > u32::MAX - 2 {
            self.marks.fill(0);
            self.generation = 0;
        }
        self.generation += 2;
        (self.generation - 1, self.generation)
    }

    fn memory_usage(&self) -> usize {
        self.slots.capacity() * std::mem::size_of::<Slot>()
            + self.marks.capacity() * std::mem::size_of::<u32>()
            + self.registry.memory_usage()
            + self.induced.as_ref().map_or(0, InducedBuckets::memory_usage)
            + (self.members.capacity() + self.rest.capacity() + self.resolved.capacity())
                * std::mem::size_of::<u32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranks(text: &[u8], strategy: InductionStrategy) -> (Vec<u32>, SortStats) {
        let (ranks, stats) = Engine::new(Sequence::new(text, None), strategy).run();
        (ranks.into_vec(), stats)
    }

    fn naive_ranks(text: &[u8]) -> Vec<u32> {
        let mut sa: Vec<usize> = (0..text.len()).collect();
        sa.sort_by(|&a, &b| text[a..].cmp(&text[b..]));
        let mut isa = vec![0u32; text.len()];
        for (rank, &position) in sa.iter().enumerate() {
            isa[position] = rank as u32;
        }
        isa
    }

    #[test]
    fn banana() {
        for strategy in [InductionStrategy::Enhanced, InductionStrategy::Plain] {
            assert_eq!(ranks(b"banana", strategy).0, vec![3, 2, 5, 1, 4, 0]);
        }
    }

    #[test]
    fn single_symbol_run_is_one_tandem_repeat() {
        let (isa, stats) = ranks(b"aaaaaaaa", InductionStrategy::Enhanced);
        assert_eq!(isa, vec![7, 6, 5, 4, 3, 2, 1, 0]);
        assert_eq!(stats.tandem_resolved, 5);
        assert_eq!(stats.tandem_deferred, 0);
    }

    #[test]
    fn periodic_run_before_larger_symbol_defers() {
        let text = b"abababababz";
        let (isa, stats) = ranks(text, InductionStrategy::Plain);
        assert_eq!(isa, naive_ranks(text));
        assert!(stats.tandem_deferred > 0);
        assert_eq!(stats.max_tandem_depth, 1);
    }

    #[test]
    fn descending_pairs_use_enhanced_induction() {
        let text = b"dcbadcbaab";
        let (isa, stats) = ranks(text, InductionStrategy::Enhanced);
        assert_eq!(isa, naive_ranks(text));
        assert!(stats.enhanced_induced > 0);

        let (isa, stats) = ranks(text, InductionStrategy::Plain);
        assert_eq!(isa, naive_ranks(text));
        assert_eq!(stats.enhanced_induced, 0);
    }

    #[test]
    fn wide_symbols_sort() {
        let text: Vec<u16> = "mississippi".encode_utf16().collect();
        let (isa, _) = Engine::new(Sequence::new(text.as_slice(), None), InductionStrategy::Enhanced).run();
        assert_eq!(isa.into_vec(), naive_ranks(b"mississippi"));
    }

    #[test]
    fn mixed_repeats() {
        for text in [
            b"mississippi".as_slice(),
            b"abaababaabaababaababa",
            b"zzzzzaazzzzz",
            b"tgtgtgtgcaccg",
            b"aabaabaabaabaab",
            b"ab",
            b"ba",
            b"a",
        ] {
            for strategy in [InductionStrategy::Enhanced, InductionStrategy::Plain] {
                assert_eq!(ranks(text, strategy).0, naive_ranks(text), "{:?}", text);
            }
        }
    }
}

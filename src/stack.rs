use crate::introsort::introsort;

/// A last-in-first-out stack.
#[derive(Clone, Debug)]
pub struct OrderedStack<T> {
    items: Vec<T>,
}

impl<T> Default for OrderedStack<T> {
    fn default() -> Self {
        OrderedStack { items: Vec::new() }
    }
}

impl<T> OrderedStack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        OrderedStack {
            items: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }
}

/// Sort key of a plain induction candidate: the rank of the suffix `match_len` symbols
/// ahead, shifted by one so an empty tail sorts first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct InductionKey {
    pub tail_rank: u32,
    pub position: u32,
}

impl InductionKey {
    /// Candidate whose tail runs off the end of the text.
    pub fn empty_tail(position: u32) -> Self {
        InductionKey {
            tail_rank: 0,
            position,
        }
    }

    pub fn ranked_tail(position: u32, rank: u32) -> Self {
        InductionKey {
            tail_rank: rank + 1,
            position,
        }
    }
}

/// Induction candidates collected while scanning one chain.
#[derive(Clone, Debug, Default)]
pub struct InductionStack {
    keys: OrderedStack<InductionKey>,
}

impl InductionStack {
    #[inline]
    pub fn push(&mut self, key: InductionKey) {
        self.keys.push(key);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sorts the candidates by tail rank and hands back their positions in that order,
    /// leaving the stack empty.
    pub fn drain_sorted(&mut self) -> impl Iterator<Item = u32> + '_ {
        introsort(&mut self.keys.items);
        self.keys.items.drain(..).map(|key| key.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_is_lifo() {
        let mut stack = OrderedStack::new();
        stack.push(1);
        stack.push(2);
        assert_eq!(stack.peek(), Some(&2));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop(), Some(2));
        assert_eq!(stack.pop(), Some(1));
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn induction_candidates_drain_in_tail_order() {
        let mut stack = InductionStack::default();
        stack.push(InductionKey::ranked_tail(4, 9));
        stack.push(InductionKey::ranked_tail(7, 2));
        stack.push(InductionKey::empty_tail(11));
        let order: Vec<u32> = stack.drain_sorted().collect();
        assert_eq!(order, vec![11, 7, 4]);
        assert!(stack.is_empty());
    }
}

// src/formatting/state.rs
//! Ordered-list numbering with pure transitions.
//!
//! A run of consecutive ordered items at one nesting level is numbered
//! 1, 2, 3...; any other block at that level ends the run.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatContext {
    /// Last number used at each nesting depth; 0 means "not in a list".
    counters: Vec<usize>,
}

impl FormatContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves to a block at `depth`, forgetting numbering of deeper levels.
    fn at_depth(&self, depth: usize) -> Self {
        let mut counters = self.counters.clone();
        counters.resize(depth + 1, 0);
        Self { counters }
    }

    /// Returns the number for an ordered item at `depth`.
    pub fn next_ordered(&self, depth: usize) -> (usize, Self) {
        let mut next = self.at_depth(depth);
        next.counters[depth] += 1;
        (next.counters[depth], next)
    }

    /// Records a non-ordered block at `depth`, ending any run there.
    pub fn other_block(&self, depth: usize) -> Self {
        let mut next = self.at_depth(depth);
        next.counters[depth] = 0;
        next
    }
}

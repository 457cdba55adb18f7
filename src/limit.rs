use std::fmt;

/// Guards recursive descent into a grammar's structure tree.
///
/// The structure tracker and the template/multiline tokenizers all recurse
/// through nested `OneOf`/`Sequence` nodes. Grammars are external data (spec
/// §1), so a pathological or accidentally self-referential tree must not be
/// able to blow the call stack; this tracks how deep a single walk went so
/// that can be reported, and `limited()` lets callers bail out early.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct LimitTracker {
    current: usize,
    /// High water mark reached during the lifetime of this tracker.
    pub high: usize,
    /// Configured limit.
    pub limit: usize,
}

impl Default for LimitTracker {
    fn default() -> Self {
        Self {
            current: 0,
            high: 0,
            limit: 512,
        }
    }
}

impl LimitTracker {
    pub fn new(limit: usize) -> Self {
        Self {
            current: 0,
            high: 0,
            limit,
        }
    }

    pub fn limited(&self) -> bool {
        self.current > self.limit
    }

    pub fn consume(&mut self) {
        self.current += 1;
        if self.current > self.high {
            self.high = self.current;
        }
    }

    pub fn release(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}

impl fmt::Debug for LimitTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recursion limit: {}, high: {}", self.limit, self.high)
    }
}

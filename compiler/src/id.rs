// id.rs — Namespace allocation for tile renaming
//
// Every tile instance that enters a composition is stamped with a fresh
// namespace so identifiers never collide after merging. Namespaces are
// allocated monotonically and are meant to stay unique across all runs of
// one session; only an explicit `reset` restarts the sequence.

use std::fmt;

/// A namespace stamped onto one tile instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(pub u32);

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocator for namespaces. Produces monotonically increasing values in
/// allocation order, ensuring deterministic renaming.
#[derive(Debug, Default)]
pub struct NamespaceAllocator {
    next: u32,
}

impl NamespaceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at `first` instead of 0.
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    pub fn alloc(&mut self) -> Namespace {
        let ns = Namespace(self.next);
        self.next += 1;
        ns
    }

    /// The namespace the next `alloc` will return.
    pub fn peek(&self) -> Namespace {
        Namespace(self.next)
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic() {
        let mut ids = NamespaceAllocator::new();
        assert_eq!(ids.alloc(), Namespace(0));
        assert_eq!(ids.alloc(), Namespace(1));
        assert_eq!(ids.peek(), Namespace(2));
    }

    #[test]
    fn reset_restarts() {
        let mut ids = NamespaceAllocator::starting_at(7);
        assert_eq!(ids.alloc(), Namespace(7));
        ids.reset();
        assert_eq!(ids.alloc(), Namespace(0));
    }
}

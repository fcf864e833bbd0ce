//! # Arena Allocation
//!
//! Typed index arena backing the AST produced by one parse.
//!
//! ## Overview
//!
//! Nodes are pushed into a contiguous `Vec` and addressed by [`Idx`] handles.
//! Handles are `Copy`, cheap to compare, and stay valid for the arena's whole
//! lifetime. Nothing is freed individually: the arena and everything in it is
//! dropped at once together with the builder that owns it.
//!
//! Recovery can discard a fragment simply by no longer referencing its index;
//! the slot stays allocated until the arena goes away.

use std::fmt;
use std::marker::PhantomData;

/// Statistics about arena usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Number of values allocated
    pub values_allocated: usize,
    /// Approximate bytes occupied by allocated values
    pub bytes_allocated: usize,
}

/// Handle to a value stored in an [`Arena`]
pub struct Idx<T> {
    raw: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Idx<T> {
    const fn from_raw(raw: u32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Position of the value in allocation order
    #[must_use]
    pub const fn index(self) -> usize {
        self.raw as usize
    }
}

// Manual impls so `Idx<T>` is `Copy` regardless of `T`.
impl<T> Clone for Idx<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Idx<T> {}

impl<T> PartialEq for Idx<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Idx<T> {}

impl<T> std::hash::Hash for Idx<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Idx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Idx({})", self.raw)
    }
}

/// Append-only storage addressed by [`Idx`]
#[derive(Debug, Clone)]
pub struct Arena<T> {
    data: Vec<T>,
}

impl<T> Arena<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Allocate a value and return its handle
    pub fn alloc(&mut self, value: T) -> Idx<T> {
        let raw = u32::try_from(self.data.len()).unwrap_or(u32::MAX);
        self.data.push(value);
        Idx::from_raw(raw)
    }

    #[must_use]
    pub fn get(&self, idx: Idx<T>) -> Option<&T> {
        self.data.get(idx.index())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Idx<T>, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (Idx::from_raw(u32::try_from(i).unwrap_or(u32::MAX)), v))
    }

    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            values_allocated: self.data.len(),
            bytes_allocated: self.data.len() * std::mem::size_of::<T>(),
        }
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::ops::Index<Idx<T>> for Arena<T> {
    type Output = T;

    fn index(&self, idx: Idx<T>) -> &Self::Output {
        &self.data[idx.index()]
    }
}

impl<T> std::ops::IndexMut<Idx<T>> for Arena<T> {
    fn index_mut(&mut self, idx: Idx<T>) -> &mut Self::Output {
        &mut self.data[idx.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_index() {
        let mut arena = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");
        assert_ne!(a, b);
        assert_eq!(arena[a], "a");
        assert_eq!(arena[b], "b");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_stats() {
        let mut arena: Arena<u64> = Arena::with_capacity(4);
        assert_eq!(arena.stats(), ArenaStats::default());
        arena.alloc(1);
        arena.alloc(2);
        let stats = arena.stats();
        assert_eq!(stats.values_allocated, 2);
        assert_eq!(stats.bytes_allocated, 16);
    }

    #[test]
    fn test_iter_in_allocation_order() {
        let mut arena = Arena::new();
        for i in 0..3 {
            arena.alloc(i * 10);
        }
        let collected: Vec<_> = arena.iter().map(|(idx, v)| (idx.index(), *v)).collect();
        assert_eq!(collected, vec![(0, 0), (1, 10), (2, 20)]);
    }
}

//! Result accumulator shared across a range query traversal.

use fixedbitset::FixedBitSet;

use super::quadtree::Entry;

// Ids below this are tracked in the bitset; larger caller-chosen ids fall back
// to a scan of the results.
const DENSE_ID_LIMIT: usize = 1 << 20;

/// Entries found so far, each id at most once.
///
/// The same record is reachable from several leaves once a node subdivides,
/// so every hit goes through the seen-id check before it is kept.
pub struct RangeQuery<'a, P> {
    found: Vec<&'a Entry<P>>,
    seen: FixedBitSet,
}

impl<'a, P> RangeQuery<'a, P> {
    pub fn new() -> Self {
        Self {
            found: Vec::with_capacity(64),
            seen: FixedBitSet::new(),
        }
    }

    /// Record a hit. Returns false if an entry with this id was already kept.
    pub fn push(&mut self, entry: &'a Entry<P>) -> bool {
        let id = entry.id() as usize;
        if id < DENSE_ID_LIMIT {
            if id >= self.seen.len() {
                self.seen.grow((id + 1).next_power_of_two());
            }
            if self.seen.put(id) {
                return false;
            }
        } else if self.found.iter().any(|e| e.id() == entry.id()) {
            return false;
        }
        self.found.push(entry);
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.found.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }

    pub fn as_slice(&self) -> &[&'a Entry<P>] {
        &self.found
    }

    pub fn into_vec(self) -> Vec<&'a Entry<P>> {
        self.found
    }

    /// Forget all hits so the accumulator can be reused.
    pub fn clear(&mut self) {
        self.found.clear();
        self.seen.clear();
    }
}

impl<P> Default for RangeQuery<'_, P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Shape;
    use glam::Vec2;

    #[test]
    fn test_push_deduplicates_by_id() {
        let a = Entry::<Shape>::new(1, Vec2::ZERO, None);
        let a_again = Entry::<Shape>::new(1, Vec2::new(5.0, 5.0), None);
        let b = Entry::<Shape>::new(70, Vec2::ZERO, None);

        let mut query = RangeQuery::new();
        assert!(query.push(&a));
        assert!(!query.push(&a_again));
        assert!(query.push(&b));
        assert!(!query.push(&b));
        assert_eq!(query.len(), 2);

        query.clear();
        assert!(query.is_empty());
        assert!(query.push(&a));
    }

    #[test]
    fn test_push_large_ids() {
        let big = Entry::<Shape>::new(u32::MAX, Vec2::ZERO, None);
        let mut query = RangeQuery::new();
        assert!(query.push(&big));
        assert!(!query.push(&big));
        assert_eq!(query.as_slice().len(), 1);
    }
}

//! Breadth-first walk over the portal graph.
//!
//! One `SectorVisitor` is one traversal. It owns its "seen" marks, so
//! sectors carry no traversal state and several visitors may exist at once.
//! The root is marked seen up front and can never be queued again; every
//! other sector is queued at most once, which is what makes the walk
//! terminate on cyclic maps.
//!
//! ```text
//! Active ──pop()=None──▶ Drained ──restart()/drop──▶ (marks cleared)
//! ```

use smallvec::SmallVec;

use super::{Map, SectorId};

/// Inline capacity: maps with up to 256 sectors never touch the heap.
type Marks = SmallVec<[u64; 4]>;

pub struct SectorVisitor {
    root: SectorId,
    seen: Marks,
    /// Every sector marked so far, in push order. `order[head..]` is the
    /// FIFO queue, `order[..]` doubles as the seen-list walked on cleanup.
    order: SmallVec<[SectorId; 16]>,
    head: usize,
}

impl SectorVisitor {
    /// Start a traversal rooted at `root` over a map of `num_sectors`.
    pub fn new(num_sectors: usize, root: SectorId) -> Self {
        let mut v = Self {
            root,
            seen: SmallVec::from_elem(0, num_sectors.div_ceil(64)),
            order: SmallVec::new(),
            head: 0,
        };
        v.mark(root);
        v.order.push(root);
        v
    }

    /// Clear the marks of the previous traversal and start over at `root`.
    pub fn restart(&mut self, root: SectorId) {
        for &s in &self.order {
            self.seen[s as usize / 64] &= !(1 << (s % 64));
        }
        self.order.clear();
        self.head = 0;
        self.root = root;
        self.mark(root);
        self.order.push(root);
    }

    #[inline]
    pub fn root(&self) -> SectorId {
        self.root
    }

    /// True when `sector` has not been seen in this traversal.
    #[inline]
    pub fn can_push(&self, sector: SectorId) -> bool {
        sector != self.root && !self.is_seen(sector)
    }

    /// Queue `sector` unless it is the root or already seen.
    /// Returns whether it was queued.
    pub fn push(&mut self, sector: SectorId) -> bool {
        if !self.can_push(sector) {
            return false;
        }
        self.mark(sector);
        self.order.push(sector);
        true
    }

    pub fn pop(&mut self) -> Option<SectorId> {
        let s = self.order.get(self.head).copied()?;
        self.head += 1;
        Some(s)
    }

    #[inline]
    pub fn is_drained(&self) -> bool {
        self.head >= self.order.len()
    }

    /// Sectors marked so far, in the order they were queued.
    pub fn seen(&self) -> &[SectorId] {
        &self.order
    }

    #[inline]
    fn is_seen(&self, s: SectorId) -> bool {
        self.seen
            .get(s as usize / 64)
            .is_some_and(|w| w & (1 << (s % 64)) != 0)
    }

    #[inline]
    fn mark(&mut self, s: SectorId) {
        let word = s as usize / 64;
        if word >= self.seen.len() {
            self.seen.resize(word + 1, 0);
        }
        self.seen[word] |= 1 << (s % 64);
    }
}

impl Map {
    /// Fresh traversal rooted at `root`.
    #[inline]
    pub fn visitor(&self, root: SectorId) -> SectorVisitor {
        SectorVisitor::new(self.sectors.len(), root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::samples;
    use proptest::prelude::*;

    /// Drain a visitor over the portal graph, pushing every neighbor.
    fn flood(map: &Map, root: SectorId) -> Vec<SectorId> {
        let mut v = map.visitor(root);
        let mut out = Vec::new();
        while let Some(s) = v.pop() {
            out.push(s);
            for w in map.walls_of(s) {
                if let Some(n) = w.portal.neighbor() {
                    v.push(n);
                }
            }
        }
        out
    }

    #[test]
    fn three_cycle_visits_each_sector_once() {
        let map = samples::triangle_fan().unwrap();
        for root in 0..3 {
            let mut order = flood(&map, root);
            assert_eq!(order[0], root);
            order.sort();
            assert_eq!(order, vec![0, 1, 2]);
        }
    }

    #[test]
    fn root_is_never_requeued() {
        let mut v = SectorVisitor::new(4, 2);
        assert!(!v.push(2));
        assert!(v.push(1));
        assert!(!v.push(1));
        assert_eq!(v.pop(), Some(2));
        assert_eq!(v.pop(), Some(1));
        assert_eq!(v.pop(), None);
        assert!(v.is_drained());
    }

    #[test]
    fn restart_clears_previous_marks() {
        let mut v = SectorVisitor::new(130, 0);
        assert!(v.push(129));
        while v.pop().is_some() {}
        v.restart(5);
        assert!(v.push(0));
        assert!(v.push(129));
        assert!(!v.push(5));
        assert_eq!(v.seen(), &[5, 0, 129]);
    }

    #[test]
    fn independent_visitors_coexist() {
        let map = samples::courtyard().unwrap();
        let mut a = map.visitor(0);
        let mut b = map.visitor(0);
        assert!(a.push(1));
        assert!(b.push(1));
    }

    #[test]
    fn flood_reaches_whole_courtyard() {
        let map = samples::courtyard().unwrap();
        let mut all = flood(&map, 0);
        all.sort();
        let expected: Vec<SectorId> = (0..map.num_sectors() as SectorId).collect();
        assert_eq!(all, expected);
    }

    proptest! {
        #[test]
        fn pushes_are_unique(pushes in proptest::collection::vec(0u16..300, 0..200)) {
            let mut v = SectorVisitor::new(300, 7);
            let mut accepted = std::collections::HashSet::new();
            for s in pushes {
                let fresh = s != 7 && !accepted.contains(&s);
                prop_assert_eq!(v.push(s), fresh);
                if fresh {
                    accepted.insert(s);
                }
            }
            let mut popped = 0;
            while v.pop().is_some() {
                popped += 1;
            }
            prop_assert_eq!(popped, accepted.len() + 1);
        }
    }
}

//! Block-structured priority queue with O(1) keyed deletion.
//!
//! Holds `(vertex, value)` pairs with values below a fixed upper bound B̂,
//! at most one record per vertex (minimum value wins). Two block sequences:
//!
//! - `d1`, the sorted side: blocks keyed by a strict upper bound, ordered
//!   ascending; every value in a block is ≤ its bound and above the bound
//!   of the previous block. `insert` lands here and splits blocks that
//!   outgrow the batch size M around their median value.
//! - `d0`, the prepend side: blocks of values known to be smaller than
//!   everything currently stored; `batch_prepend` pushes them at the front.
//!
//! `pull` removes and returns up to M smallest pairs together with the
//! smallest value left behind, which the caller uses as the bound for its
//! next recursion step.

use std::collections::{BTreeMap, HashMap, VecDeque};

use ordered_float::OrderedFloat;

use crate::graph::Vertex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Prepend,
    Sorted,
}

#[derive(Debug, Clone, Copy)]
struct Location {
    block: usize,
    slot: usize,
    side: Side,
}

#[derive(Debug, Default)]
struct Block {
    upper_bound: f64,
    entries: Vec<(Vertex, f64)>,
}

/// Result of a [`BatchHeap::pull`]
#[derive(Debug, Clone, PartialEq)]
pub struct Pull {
    /// Up to M keys with the smallest stored values, already removed
    pub vertices: Vec<Vertex>,
    /// Smallest value still stored after removal, B̂ if nothing remains
    pub new_bound: f64,
}

pub struct BatchHeap {
    batch_size: usize,
    upper_bound: f64,
    blocks: Vec<Block>,
    free: Vec<usize>,
    d0: VecDeque<usize>,
    d1: BTreeMap<OrderedFloat<f64>, usize>,
    index: HashMap<Vertex, Location>,
}

impl BatchHeap {
    /// Create a heap with batch size `m` and global upper bound `upper_bound`.
    /// Starts with a single empty sorted block spanning the whole range.
    pub fn new(m: usize, upper_bound: f64) -> Self {
        let mut heap = Self {
            batch_size: m.max(1),
            upper_bound,
            blocks: Vec::new(),
            free: Vec::new(),
            d0: VecDeque::new(),
            d1: BTreeMap::new(),
            index: HashMap::new(),
        };
        let root = heap.alloc_block(upper_bound, Vec::new());
        heap.d1.insert(OrderedFloat(upper_bound), root);
        heap
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Current value stored for `key`, if any.
    pub fn get(&self, key: Vertex) -> Option<f64> {
        let loc = self.index.get(&key)?;
        Some(self.blocks[loc.block].entries[loc.slot].1)
    }

    /// Insert or improve a record. A value for which no sorted block has a
    /// bound ≥ value (possible once the top block has been drained and
    /// dropped) is silently discarded; the driver only ever inserts values
    /// below B̂.
    pub fn insert(&mut self, key: Vertex, value: f64) {
        if let Some(&loc) = self.index.get(&key) {
            let existing = self.blocks[loc.block].entries[loc.slot].1;
            if existing <= value {
                return;
            }
            // Pick the new home before detaching: the old record's block
            // may be the only one whose bound still covers the value, and
            // reaping it first would strand the improvement.
            let Some((_, &block_id)) = self.d1.range(OrderedFloat(value)..).next() else {
                return;
            };
            self.index.remove(&key);
            self.detach_entry(loc);
            if loc.block != block_id {
                self.reap_if_empty(loc.block, loc.side);
            }
            self.place(key, value, block_id);
            return;
        }
        let Some((_, &block_id)) = self.d1.range(OrderedFloat(value)..).next() else {
            return;
        };
        self.place(key, value, block_id);
    }

    /// Bulk-insert pairs that are all smaller than every stored value.
    ///
    /// The batch is deduplicated per key (minimum value, first position)
    /// and records superseded by a smaller incoming value are deleted, so
    /// the one-record-per-key invariant survives callers that rediscover a
    /// queued vertex on a shorter path.
    pub fn batch_prepend(&mut self, items: Vec<(Vertex, f64)>) {
        let mut position: HashMap<Vertex, usize> = HashMap::with_capacity(items.len());
        let mut deduped: Vec<(Vertex, f64)> = Vec::with_capacity(items.len());
        for (key, value) in items {
            match position.get(&key) {
                Some(&at) => {
                    if value < deduped[at].1 {
                        deduped[at].1 = value;
                    }
                }
                None => {
                    position.insert(key, deduped.len());
                    deduped.push((key, value));
                }
            }
        }

        let mut fresh: Vec<(Vertex, f64)> = Vec::with_capacity(deduped.len());
        for (key, value) in deduped {
            if let Some(&loc) = self.index.get(&key) {
                let existing = self.blocks[loc.block].entries[loc.slot].1;
                if existing <= value {
                    continue;
                }
                self.remove(key);
            }
            fresh.push((key, value));
        }
        if fresh.is_empty() {
            return;
        }

        if fresh.len() <= self.batch_size {
            self.push_front_block(fresh);
            return;
        }

        // Chop into chunks of at most ⌈M/2⌉ by repeated median selection.
        // The stack visits the upper half first, so `ready` ends up in
        // descending value ranges and the front-pushes below leave d0 in
        // ascending order: a pull prefix from the front is always the
        // smallest values in the prepend side.
        let cap = self.batch_size.div_ceil(2);
        let mut worklist = vec![fresh];
        let mut ready: Vec<Vec<(Vertex, f64)>> = Vec::new();
        while let Some(mut chunk) = worklist.pop() {
            if chunk.len() <= cap {
                ready.push(chunk);
                continue;
            }
            let mid = chunk.len() / 2;
            chunk.select_nth_unstable_by(mid, |a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            let upper = chunk.split_off(mid);
            worklist.push(chunk);
            worklist.push(upper);
        }
        for chunk in ready {
            self.push_front_block(chunk);
        }
    }

    /// Remove and return up to M smallest pairs and the new lower bound.
    /// An empty heap yields an empty vertex list with `new_bound` = B̂.
    pub fn pull(&mut self) -> Pull {
        let m = self.batch_size;
        let mut prefix0: Vec<(Vertex, f64)> = Vec::new();
        let mut prefix1: Vec<(Vertex, f64)> = Vec::new();
        let mut rest_min: Option<f64> = None;

        // Prefixes are collected block-at-a-time: entries inside a block
        // carry no internal order, so cutting one off mid-walk could keep
        // a large value while a smaller one from the same block escapes
        // into the remainder. Block order itself is safe — later sorted
        // blocks sit above the previous bound, and prepend leaves the
        // front of d0 ascending — so once a side holds m entries, every
        // uncollected value on that side is at least as large.
        for &block_id in &self.d0 {
            let entries = &self.blocks[block_id].entries;
            if prefix0.len() < m {
                prefix0.extend_from_slice(entries);
            } else {
                for &(_, value) in entries {
                    rest_min = Some(rest_min.map_or(value, |r| r.min(value)));
                }
            }
        }
        for &block_id in self.d1.values() {
            let entries = &self.blocks[block_id].entries;
            if prefix1.len() < m {
                prefix1.extend_from_slice(entries);
            } else {
                for &(_, value) in entries {
                    rest_min = Some(rest_min.map_or(value, |r| r.min(value)));
                }
            }
        }

        let total = prefix0.len() + prefix1.len();
        if rest_min.is_none() && total <= m {
            // Everything fits in one batch; the bound resets to B̂.
            let vertices: Vec<Vertex> = prefix0
                .iter()
                .chain(prefix1.iter())
                .map(|&(key, _)| key)
                .collect();
            for &key in &vertices {
                self.remove(key);
            }
            return Pull { vertices, new_bound: self.upper_bound };
        }

        let mut combined = prefix0;
        combined.extend(prefix1);
        let take = m.min(combined.len());
        if take < combined.len() {
            combined.select_nth_unstable_by(take, |a, b| {
                a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
            });
        }
        let mut new_bound = rest_min.unwrap_or(self.upper_bound);
        for &(_, value) in &combined[take..] {
            new_bound = new_bound.min(value);
        }
        let vertices: Vec<Vertex> = combined[..take].iter().map(|&(key, _)| key).collect();
        for &key in &vertices {
            self.remove(key);
        }
        Pull { vertices, new_bound }
    }

    /// O(1) keyed deletion (plus index repair for the entry that takes the
    /// vacated slot). Emptied blocks are released; an emptied sorted block
    /// also leaves the bound map, which narrows the insertable range.
    fn remove(&mut self, key: Vertex) -> bool {
        let Some(loc) = self.index.remove(&key) else {
            return false;
        };
        self.detach_entry(loc);
        self.reap_if_empty(loc.block, loc.side);
        true
    }

    /// Take one entry out of its block and repair the index of whatever
    /// entry was swapped into the vacated slot. May leave the block empty.
    fn detach_entry(&mut self, loc: Location) {
        let moved = {
            let block = &mut self.blocks[loc.block];
            block.entries.swap_remove(loc.slot);
            block.entries.get(loc.slot).map(|&(k, _)| k)
        };
        if let Some(moved_key) = moved {
            if let Some(entry) = self.index.get_mut(&moved_key) {
                entry.slot = loc.slot;
            }
        }
    }

    fn reap_if_empty(&mut self, block_id: usize, side: Side) {
        if !self.blocks[block_id].entries.is_empty() {
            return;
        }
        match side {
            Side::Sorted => {
                self.d1.remove(&OrderedFloat(self.blocks[block_id].upper_bound));
            }
            Side::Prepend => {
                if let Some(at) = self.d0.iter().position(|&b| b == block_id) {
                    self.d0.remove(at);
                }
            }
        }
        self.release_block(block_id);
    }

    fn place(&mut self, key: Vertex, value: f64, block_id: usize) {
        let entries = &mut self.blocks[block_id].entries;
        entries.push((key, value));
        let slot = entries.len() - 1;
        self.index.insert(
            key,
            Location { block: block_id, slot, side: Side::Sorted },
        );
        if self.blocks[block_id].entries.len() > self.batch_size {
            self.split(block_id);
        }
    }

    /// Split an oversized sorted block around its median value. The lower
    /// half keeps the block and takes the median as its new bound; the
    /// upper half moves to a fresh block under the old bound. Every moved
    /// entry gets its location rewritten. When the median equals the block
    /// bound (a run of equal values) the split is skipped: two blocks
    /// cannot share one bound, and correctness only needs the bound order.
    fn split(&mut self, block_id: usize) {
        let bound = self.blocks[block_id].upper_bound;
        let mid = self.blocks[block_id].entries.len() / 2;
        let median = {
            let entries = &mut self.blocks[block_id].entries;
            entries.select_nth_unstable_by(mid, |a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            entries[mid].1
        };
        if median >= bound {
            return;
        }
        let upper_half = self.blocks[block_id].entries.split_off(mid);
        self.blocks[block_id].upper_bound = median;
        self.d1.remove(&OrderedFloat(bound));
        self.d1.insert(OrderedFloat(median), block_id);
        let upper_id = self.alloc_block(bound, upper_half);
        self.d1.insert(OrderedFloat(bound), upper_id);
        self.reindex_block(block_id, Side::Sorted);
        self.reindex_block(upper_id, Side::Sorted);
    }

    fn push_front_block(&mut self, entries: Vec<(Vertex, f64)>) {
        let block_id = self.alloc_block(self.upper_bound, entries);
        self.d0.push_front(block_id);
        self.reindex_block(block_id, Side::Prepend);
    }

    fn reindex_block(&mut self, block_id: usize, side: Side) {
        for slot in 0..self.blocks[block_id].entries.len() {
            let key = self.blocks[block_id].entries[slot].0;
            self.index.insert(key, Location { block: block_id, slot, side });
        }
    }

    fn alloc_block(&mut self, upper_bound: f64, entries: Vec<(Vertex, f64)>) -> usize {
        if let Some(id) = self.free.pop() {
            self.blocks[id].upper_bound = upper_bound;
            self.blocks[id].entries = entries;
            id
        } else {
            self.blocks.push(Block { upper_bound, entries });
            self.blocks.len() - 1
        }
    }

    fn release_block(&mut self, id: usize) {
        self.blocks[id].entries = Vec::new();
        self.free.push(id);
    }

    #[cfg(test)]
    fn live_blocks(&self) -> usize {
        self.d0.len() + self.d1.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<Vertex>) -> Vec<Vertex> {
        v.sort_unstable();
        v
    }

    #[test]
    fn pull_splits_batches_and_reports_bounds() {
        let mut heap = BatchHeap::new(3, 10.0);
        heap.insert(1, 1.0);
        heap.insert(2, 2.0);
        heap.insert(3, 3.0);
        heap.insert(4, 4.0);

        let first = heap.pull();
        assert_eq!(sorted(first.vertices), vec![1, 2, 3]);
        assert_eq!(first.new_bound, 4.0);

        let second = heap.pull();
        assert_eq!(second.vertices, vec![4]);
        assert_eq!(second.new_bound, 10.0);

        let drained = heap.pull();
        assert!(drained.vertices.is_empty());
        assert_eq!(drained.new_bound, 10.0);
    }

    #[test]
    fn insert_keeps_the_minimum_per_key() {
        let mut heap = BatchHeap::new(4, 100.0);
        heap.insert(7, 5.0);
        heap.insert(7, 9.0);
        assert_eq!(heap.get(7), Some(5.0));
        heap.insert(7, 2.0);
        assert_eq!(heap.get(7), Some(2.0));
        assert_eq!(heap.len(), 1);

        let pulled = heap.pull();
        assert_eq!(pulled.vertices, vec![7]);
        assert!(heap.is_empty());
    }

    #[test]
    fn values_beyond_every_block_bound_are_discarded() {
        let mut heap = BatchHeap::new(2, 10.0);
        heap.insert(1, 12.0);
        assert!(heap.is_empty());

        // Drain the only sorted block; its bound leaves the map and later
        // inserts have nowhere to land.
        heap.insert(1, 1.0);
        heap.insert(2, 2.0);
        let _ = heap.pull();
        assert!(heap.is_empty());
        heap.insert(3, 3.0);
        assert!(heap.is_empty());
    }

    #[test]
    fn batch_prepend_dominates_existing_content() {
        let mut heap = BatchHeap::new(3, 50.0);
        heap.insert(10, 20.0);
        heap.insert(11, 30.0);
        heap.batch_prepend(vec![(1, 1.0), (2, 2.0), (3, 3.0)]);

        let pulled = heap.pull();
        assert_eq!(sorted(pulled.vertices), vec![1, 2, 3]);
        assert!(pulled.new_bound <= 20.0);
    }

    #[test]
    fn large_prepend_chunks_stay_pullable() {
        let mut heap = BatchHeap::new(2, 100.0);
        let items: Vec<(Vertex, f64)> = (0..9).map(|i| (i, i as f64)).collect();
        heap.batch_prepend(items);
        assert_eq!(heap.len(), 9);

        let mut seen = Vec::new();
        let mut last_bound = 0.0;
        loop {
            let pulled = heap.pull();
            if pulled.vertices.is_empty() {
                break;
            }
            assert!(pulled.new_bound >= last_bound);
            last_bound = pulled.new_bound;
            seen.extend(pulled.vertices);
        }
        assert_eq!(sorted(seen), (0..9).collect::<Vec<_>>());
        assert!(heap.is_empty());
        assert_eq!(heap.live_blocks(), 0);
    }

    #[test]
    fn prepend_deduplicates_and_improves_existing_records() {
        let mut heap = BatchHeap::new(4, 50.0);
        heap.insert(5, 10.0);
        heap.batch_prepend(vec![(5, 4.0), (5, 3.0), (6, 2.0)]);
        assert_eq!(heap.len(), 2);
        assert_eq!(heap.get(5), Some(3.0));
        assert_eq!(heap.get(6), Some(2.0));
    }

    #[test]
    fn split_with_equal_values_keeps_all_records() {
        let mut heap = BatchHeap::new(2, 10.0);
        heap.insert(1, 5.0);
        heap.insert(2, 5.0);
        heap.insert(3, 5.0);
        heap.insert(4, 5.0);
        assert_eq!(heap.len(), 4);

        let mut seen = Vec::new();
        loop {
            let pulled = heap.pull();
            if pulled.vertices.is_empty() {
                break;
            }
            seen.extend(pulled.vertices);
        }
        assert_eq!(sorted(seen), vec![1, 2, 3, 4]);
    }

    #[test]
    fn pull_bounds_never_decrease() {
        let mut heap = BatchHeap::new(2, 1000.0);
        for i in 0..20u32 {
            heap.insert(i, f64::from(i) * 1.5);
        }
        let mut last = 0.0;
        loop {
            let pulled = heap.pull();
            if pulled.vertices.is_empty() {
                break;
            }
            assert!(pulled.new_bound >= last);
            last = pulled.new_bound;
        }
    }

    #[test]
    fn pull_returns_the_true_smallest_regardless_of_block_order() {
        // Random insertion order leaves blocks internally unsorted and
        // split partitions in arbitrary order; every pull must still hand
        // back exactly the smallest stored pairs, with a bound no pulled
        // value exceeds. A shadow map is the oracle.
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut heap = BatchHeap::new(3, 1000.0);
        let mut model: HashMap<Vertex, f64> = HashMap::new();

        let front = [(100, 0.4), (101, 0.2), (102, 0.3), (103, 0.1)];
        heap.batch_prepend(front.to_vec());
        for (key, value) in front {
            model.insert(key, value);
        }
        let mut rng = StdRng::seed_from_u64(99);
        for key in 0..40u32 {
            let value = rng.gen_range(1.0..900.0);
            heap.insert(key, value);
            model.insert(key, value);
        }

        while !model.is_empty() {
            let pulled = heap.pull();
            assert_eq!(pulled.vertices.len(), model.len().min(3));

            let mut expected: Vec<(Vertex, f64)> =
                model.iter().map(|(&k, &v)| (k, v)).collect();
            expected.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            expected.truncate(pulled.vertices.len());
            let mut want: Vec<Vertex> = expected.into_iter().map(|(k, _)| k).collect();
            want.sort_unstable();
            assert_eq!(sorted(pulled.vertices.clone()), want);

            for &v in &pulled.vertices {
                let value = model.remove(&v).expect("pulled a vertex not in the model");
                assert!(value <= pulled.new_bound);
            }
            if model.is_empty() {
                assert_eq!(pulled.new_bound, 1000.0);
            } else {
                let min_rest = model.values().fold(f64::INFINITY, |a, &b| a.min(b));
                assert_eq!(pulled.new_bound, min_rest);
            }
        }
        assert!(heap.is_empty());
    }

    #[test]
    fn index_and_storage_drain_together() {
        let mut heap = BatchHeap::new(3, 40.0);
        for i in 0..10u32 {
            heap.insert(i, f64::from(i));
        }
        heap.batch_prepend(vec![(20, 0.1), (21, 0.2)]);
        while !heap.pull().vertices.is_empty() {}
        assert_eq!(heap.len(), 0);
        assert_eq!(heap.live_blocks(), 0);
    }
}

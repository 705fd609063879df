//! Ordered map keyed by totally ordered timestamps.
//!
//! This crate provides [`IntervalIndex`], a balanced binary search tree
//! with floor/ceiling/range queries. Nodes live in a flat arena and link
//! to each other by index, so AVL rotations are plain index reassignments
//! and no cyclic ownership is involved.

use std::cmp::Ordering;

const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    left: usize,
    right: usize,
    parent: usize,
    height: u8,
}

/// AVL-balanced ordered map over a node arena.
///
/// Keys are unique; inserting an existing key replaces its value.
/// Lookups never fail: misses yield `None` and out-of-range scans yield
/// empty iterators.
#[derive(Debug)]
pub struct IntervalIndex<K, V> {
    nodes: Vec<Node<K, V>>,
    root: usize,
}

impl<K, V> Default for IntervalIndex<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> IntervalIndex<K, V> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NIL,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drops every entry. The arena allocation is kept for reuse.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = NIL;
    }

    fn height(&self, n: usize) -> i32 {
        if n == NIL { 0 } else { self.nodes[n].height as i32 }
    }

    fn balance(&self, n: usize) -> i32 {
        self.height(self.nodes[n].left) - self.height(self.nodes[n].right)
    }

    fn update_height(&mut self, n: usize) {
        let h = 1 + self.height(self.nodes[n].left).max(self.height(self.nodes[n].right));
        self.nodes[n].height = h as u8;
    }

    /// Redirects the parent of `old` (or the root pointer) to `new`.
    fn replace_child(&mut self, parent: usize, old: usize, new: usize) {
        if parent == NIL {
            self.root = new;
        } else if self.nodes[parent].left == old {
            self.nodes[parent].left = new;
        } else {
            self.nodes[parent].right = new;
        }
    }

    fn rotate_left(&mut self, x: usize) -> usize {
        let y = self.nodes[x].right;
        let t = self.nodes[y].left;

        self.nodes[x].right = t;
        if t != NIL {
            self.nodes[t].parent = x;
        }

        let p = self.nodes[x].parent;
        self.nodes[y].parent = p;
        self.replace_child(p, x, y);

        self.nodes[y].left = x;
        self.nodes[x].parent = y;

        self.update_height(x);
        self.update_height(y);
        y
    }

    fn rotate_right(&mut self, x: usize) -> usize {
        let y = self.nodes[x].left;
        let t = self.nodes[y].right;

        self.nodes[x].left = t;
        if t != NIL {
            self.nodes[t].parent = x;
        }

        let p = self.nodes[x].parent;
        self.nodes[y].parent = p;
        self.replace_child(p, x, y);

        self.nodes[y].right = x;
        self.nodes[x].parent = y;

        self.update_height(x);
        self.update_height(y);
        y
    }

    /// Restores the AVL shape at `n` (whose children are already valid).
    /// Returns the node now occupying `n`'s position.
    fn rebalance(&mut self, n: usize) -> usize {
        let bf = self.balance(n);
        if bf > 1 {
            if self.balance(self.nodes[n].left) < 0 {
                self.rotate_left(self.nodes[n].left);
            }
            self.rotate_right(n)
        } else if bf < -1 {
            if self.balance(self.nodes[n].right) > 0 {
                self.rotate_right(self.nodes[n].right);
            }
            self.rotate_left(n)
        } else {
            n
        }
    }
}

impl<K: Ord + Copy, V> IntervalIndex<K, V> {
    /// Inserts `value` under `key`, replacing any previous value for an
    /// equal key, then restores the AVL invariant along the path to the
    /// root.
    pub fn insert(&mut self, key: K, value: V) {
        let mut parent = NIL;
        let mut cur = self.root;
        let mut went_left = false;

        while cur != NIL {
            parent = cur;
            match key.cmp(&self.nodes[cur].key) {
                Ordering::Less => {
                    went_left = true;
                    cur = self.nodes[cur].left;
                }
                Ordering::Greater => {
                    went_left = false;
                    cur = self.nodes[cur].right;
                }
                Ordering::Equal => {
                    self.nodes[cur].value = value;
                    return;
                }
            }
        }

        let n = self.nodes.len();
        self.nodes.push(Node {
            key,
            value,
            left: NIL,
            right: NIL,
            parent,
            height: 1,
        });

        if parent == NIL {
            self.root = n;
            return;
        }
        if went_left {
            self.nodes[parent].left = n;
        } else {
            self.nodes[parent].right = n;
        }

        self.retrace(parent);
    }

    /// Walks from `at` to the root, recomputing heights and rotating
    /// wherever the balance factor reaches 2.
    fn retrace(&mut self, mut at: usize) {
        while at != NIL {
            self.update_height(at);
            let settled = self.rebalance(at);
            at = self.nodes[settled].parent;
        }
    }

    fn find(&self, key: &K) -> usize {
        let mut cur = self.root;
        while cur != NIL {
            match key.cmp(&self.nodes[cur].key) {
                Ordering::Less => cur = self.nodes[cur].left,
                Ordering::Greater => cur = self.nodes[cur].right,
                Ordering::Equal => return cur,
            }
        }
        NIL
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let n = self.find(key);
        if n == NIL { None } else { Some(&self.nodes[n].value) }
    }

    /// Greatest entry with key ≤ `key`.
    pub fn floor(&self, key: &K) -> Option<(&K, &V)> {
        let mut cur = self.root;
        let mut best = NIL;
        while cur != NIL {
            if self.nodes[cur].key <= *key {
                best = cur;
                cur = self.nodes[cur].right;
            } else {
                cur = self.nodes[cur].left;
            }
        }
        if best == NIL {
            None
        } else {
            Some((&self.nodes[best].key, &self.nodes[best].value))
        }
    }

    /// Least entry with key ≥ `key`.
    pub fn ceil(&self, key: &K) -> Option<(&K, &V)> {
        let mut cur = self.root;
        let mut best = NIL;
        while cur != NIL {
            if self.nodes[cur].key >= *key {
                best = cur;
                cur = self.nodes[cur].left;
            } else {
                cur = self.nodes[cur].right;
            }
        }
        if best == NIL {
            None
        } else {
            Some((&self.nodes[best].key, &self.nodes[best].value))
        }
    }

    /// Ascending values over the half-open key range `[from, to)`.
    pub fn range(&self, from: K, to: K) -> Range<'_, K, V> {
        let mut stack = Vec::new();
        let mut cur = self.root;
        while cur != NIL {
            if self.nodes[cur].key >= from {
                stack.push(cur);
                cur = self.nodes[cur].left;
            } else {
                cur = self.nodes[cur].right;
            }
        }
        Range {
            index: self,
            stack,
            to,
        }
    }

    /// Ascending traversal of every entry.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut stack = Vec::new();
        let mut cur = self.root;
        while cur != NIL {
            stack.push(cur);
            cur = self.nodes[cur].left;
        }
        Iter { index: self, stack }
    }
}

/// Lazy iterator returned by [`IntervalIndex::range`]. Finite, forward
/// only, not restartable once consumed.
pub struct Range<'a, K, V> {
    index: &'a IntervalIndex<K, V>,
    stack: Vec<usize>,
    to: K,
}

impl<'a, K: Ord + Copy, V> Iterator for Range<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.stack.pop()?;
        if self.index.nodes[n].key >= self.to {
            self.stack.clear();
            return None;
        }
        let mut cur = self.index.nodes[n].right;
        while cur != NIL {
            self.stack.push(cur);
            cur = self.index.nodes[cur].left;
        }
        Some(&self.index.nodes[n].value)
    }
}

/// Full in-order iterator returned by [`IntervalIndex::iter`].
pub struct Iter<'a, K, V> {
    index: &'a IntervalIndex<K, V>,
    stack: Vec<usize>,
}

impl<'a, K: Ord + Copy, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.stack.pop()?;
        let mut cur = self.index.nodes[n].right;
        while cur != NIL {
            self.stack.push(cur);
            cur = self.index.nodes[cur].left;
        }
        Some((&self.index.nodes[n].key, &self.index.nodes[n].value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_avl<K: Ord + Copy, V>(index: &IntervalIndex<K, V>) {
        fn check<K, V>(index: &IntervalIndex<K, V>, n: usize) -> i32 {
            if n == NIL {
                return 0;
            }
            let l = check(index, index.nodes[n].left);
            let r = check(index, index.nodes[n].right);
            let bf = l - r;
            assert!(
                (-1..=1).contains(&bf),
                "balance factor {bf} outside AVL bounds"
            );
            let h = 1 + l.max(r);
            assert_eq!(h, index.nodes[n].height as i32, "stale height");
            h
        }
        check(index, index.root);
    }

    fn keys<K: Ord + Copy, V>(index: &IntervalIndex<K, V>) -> Vec<K> {
        index.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_insert_ascending_stays_balanced() {
        let mut index = IntervalIndex::new();
        for i in 0..100 {
            index.insert(i, i * 10);
            assert_avl(&index);
        }
        assert_eq!(index.len(), 100);
        assert_eq!(keys(&index), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_insert_descending_stays_balanced() {
        let mut index = IntervalIndex::new();
        for i in (0..100).rev() {
            index.insert(i, ());
            assert_avl(&index);
        }
        assert_eq!(keys(&index), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_insert_shuffled_stays_balanced() {
        // Fixed pseudo-random order; no RNG dependency needed.
        let mut order: Vec<u64> = (0..256).collect();
        let mut s: u64 = 0x9E3779B97F4A7C15;
        for i in (1..order.len()).rev() {
            s ^= s << 13;
            s ^= s >> 7;
            s ^= s << 17;
            order.swap(i, (s % (i as u64 + 1)) as usize);
        }

        let mut index = IntervalIndex::new();
        for k in order {
            index.insert(k, k);
            assert_avl(&index);
        }
        assert_eq!(keys(&index), (0..256).collect::<Vec<_>>());
    }

    #[test]
    fn test_duplicate_key_replaces_value() {
        let mut index = IntervalIndex::new();
        index.insert(5, "a");
        index.insert(5, "b");
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&5), Some(&"b"));
    }

    #[test]
    fn test_get_miss_is_none() {
        let mut index = IntervalIndex::new();
        index.insert(1, ());
        assert!(index.get(&2).is_none());
        assert!(IntervalIndex::<i32, ()>::new().get(&0).is_none());
    }

    #[test]
    fn test_floor_and_ceil() {
        let mut index = IntervalIndex::new();
        for k in [10, 20, 30] {
            index.insert(k, k * 2);
        }

        assert_eq!(index.floor(&25), Some((&20, &40)));
        assert_eq!(index.floor(&20), Some((&20, &40)));
        assert_eq!(index.floor(&9), None);
        assert_eq!(index.floor(&99), Some((&30, &60)));

        assert_eq!(index.ceil(&25), Some((&30, &60)));
        assert_eq!(index.ceil(&30), Some((&30, &60)));
        assert_eq!(index.ceil(&31), None);
        assert_eq!(index.ceil(&0), Some((&10, &20)));
    }

    #[test]
    fn test_range_half_open() {
        let mut index = IntervalIndex::new();
        for k in [1, 3, 4, 5, 7, 8, 9] {
            index.insert(k, k * 100);
        }

        let got: Vec<i32> = index.range(3, 8).copied().collect();
        assert_eq!(got, vec![300, 400, 500, 700]);

        assert_eq!(index.range(8, 3).count(), 0);
        assert_eq!(index.range(10, 20).count(), 0);
        let all: Vec<i32> = index.range(0, 100).copied().collect();
        assert_eq!(all, vec![100, 300, 400, 500, 700, 800, 900]);
    }

    #[test]
    fn test_clear_then_reuse() {
        let mut index = IntervalIndex::new();
        for k in 0..32 {
            index.insert(k, k);
        }
        index.clear();
        assert!(index.is_empty());
        assert!(index.get(&0).is_none());
        assert_eq!(index.range(0, 100).count(), 0);

        index.insert(7, 70);
        assert_eq!(index.get(&7), Some(&70));
        assert_avl(&index);
    }
}

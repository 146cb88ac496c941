//! Binary min-heap keyed by `f64` priority.

/// A min-heap of `(priority, value)` pairs.
///
/// Priorities are compared with [`f64::total_cmp`], so NaN sorts last
/// instead of corrupting the heap. Equal priorities come out in no
/// particular order.
#[derive(Debug, Clone)]
pub struct BinHeap<T> {
    entries: Vec<(f64, T)>,
}

impl<T> BinHeap<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current capacity; grows as needed.
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub fn insert(&mut self, value: T, priority: f64) {
        self.entries.push((priority, value));
        self.sift_up(self.entries.len() - 1);
    }

    /// Smallest priority in the heap.
    pub fn peek_min_key(&self) -> Option<f64> {
        self.entries.first().map(|(p, _)| *p)
    }

    pub fn peek_min(&self) -> Option<&T> {
        self.entries.first().map(|(_, v)| v)
    }

    /// Remove and return the value with the smallest priority.
    pub fn extract_min(&mut self) -> Option<T> {
        self.extract_min_with_key().map(|(_, v)| v)
    }

    pub fn extract_min_with_key(&mut self) -> Option<(f64, T)> {
        if self.entries.is_empty() {
            return None;
        }
        let min = self.entries.swap_remove(0);
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        Some(min)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.entries[a].0.total_cmp(&self.entries[b].0).is_lt()
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !self.less(i, parent) {
                break;
            }
            self.entries.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut smallest = i;
            if left < len && self.less(left, smallest) {
                smallest = left;
            }
            if right < len && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.entries.swap(i, smallest);
            i = smallest;
        }
    }
}

impl<T> Default for BinHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_priority_order() {
        let mut heap = BinHeap::new();
        heap.insert("c", 3.0);
        heap.insert("a", 1.0);
        heap.insert("d", 4.0);
        heap.insert("b", 2.0);

        assert_eq!(heap.peek_min_key(), Some(1.0));
        assert_eq!(heap.peek_min(), Some(&"a"));
        assert_eq!(heap.extract_min(), Some("a"));
        assert_eq!(heap.extract_min(), Some("b"));
        assert_eq!(heap.extract_min_with_key(), Some((3.0, "c")));
        assert_eq!(heap.extract_min(), Some("d"));
        assert_eq!(heap.extract_min(), None);
        assert!(heap.is_empty());
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut heap = BinHeap::with_capacity(2);
        for i in (0..100).rev() {
            heap.insert(i, f64::from(i));
        }
        assert_eq!(heap.len(), 100);
        assert_eq!(heap.extract_min(), Some(0));
    }

    #[test]
    fn infinity_sorts_last() {
        let mut heap = BinHeap::new();
        heap.insert(1, f64::INFINITY);
        heap.insert(2, 0.0);
        assert_eq!(heap.extract_min(), Some(2));
        assert_eq!(heap.extract_min(), Some(1));
    }
}

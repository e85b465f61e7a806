//! Bounded max-heap for top-k selection over f32 distances.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A candidate with a squared distance and a position.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    pub distance: f32,
    pub position: usize,
}

impl Neighbor {
    pub fn new(position: usize, distance: f32) -> Self {
        Self { distance, position }
    }
}

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Larger distance compares greater; equal distances order by position so the
// earlier-inserted neighbor is kept when the heap evicts.
impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.position.cmp(&other.position))
    }
}

/// Max-heap of neighbors (largest distance on top). Holds the current best `limit`.
#[derive(Debug)]
pub struct MaxHeap {
    heap: BinaryHeap<Neighbor>,
    limit: usize,
}

impl MaxHeap {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(limit + 1),
            limit,
        }
    }

    /// Push and pop the max if size exceeds the limit, keeping only the closest neighbors.
    pub fn push_bounded(&mut self, n: Neighbor) {
        if self.limit == 0 {
            return;
        }
        if self.heap.len() == self.limit {
            match self.heap.peek() {
                Some(worst) if n >= *worst => return,
                _ => {}
            }
        }
        self.heap.push(n);
        if self.heap.len() > self.limit {
            self.heap.pop();
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drain into a sorted Vec (ascending by distance, then position).
    pub fn into_sorted_vec(self) -> Vec<Neighbor> {
        self.heap.into_sorted_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_push() {
        let mut heap = MaxHeap::with_limit(2);
        heap.push_bounded(Neighbor::new(0, 5.0));
        heap.push_bounded(Neighbor::new(1, 1.0));
        heap.push_bounded(Neighbor::new(2, 3.0));

        assert_eq!(heap.len(), 2);
        let sorted = heap.into_sorted_vec();
        assert_eq!(sorted[0].distance, 1.0);
        assert_eq!(sorted[1].distance, 3.0);
    }

    #[test]
    fn test_ties_keep_earlier_position() {
        let mut heap = MaxHeap::with_limit(2);
        for position in [4, 2, 9, 1] {
            heap.push_bounded(Neighbor::new(position, 7.0));
        }

        let positions: Vec<usize> = heap.into_sorted_vec().iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![1, 2]);
    }

    #[test]
    fn test_zero_limit() {
        let mut heap = MaxHeap::with_limit(0);
        heap.push_bounded(Neighbor::new(0, 1.0));
        assert!(heap.is_empty());
    }

    #[test]
    fn test_into_sorted_vec() {
        let mut heap = MaxHeap::with_limit(10);
        for (i, d) in [5.0, 1.0, 3.0, 2.0].into_iter().enumerate() {
            heap.push_bounded(Neighbor::new(i, d));
        }

        let sorted = heap.into_sorted_vec();
        for i in 0..sorted.len() - 1 {
            assert!(sorted[i].distance <= sorted[i + 1].distance);
        }
    }
}

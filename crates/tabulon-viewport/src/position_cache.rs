//! A lazy, growable prefix-sum array over row heights or column widths.

/// Extend in fixed-size chunks so a single `findIndexAt` near the far end
/// of a million-row grid doesn't walk the array one index at a time.
const CHUNK_SIZE: u32 = 100;

/// `positions[i]` is the cumulative size of items `0..=i`, treating hidden
/// items as size 0. Built lazily: nothing is computed until asked for.
#[derive(Debug, Clone)]
pub struct PositionCache {
    positions: Vec<f64>,
    max_index: u32,
    default_size: f64,
    dirty: bool,
}

impl PositionCache {
    pub fn new(max_index: u32, default_size: f64) -> Self {
        Self {
            positions: Vec::new(),
            max_index,
            default_size: default_size.max(1.0),
            dirty: false,
        }
    }

    /// Marks the cache dirty without doing any work; the next extension
    /// rebuilds from index 0.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Clears the cache immediately.
    pub fn reset(&mut self) {
        self.positions.clear();
        self.dirty = false;
    }

    fn ensure_dirty_cleared(&mut self) {
        if self.dirty {
            self.positions.clear();
            self.dirty = false;
        }
    }

    fn extend_to(&mut self, index: u32, sizer: &dyn Fn(u32) -> f64) {
        self.ensure_dirty_cleared();
        if self.max_index == 0 {
            return;
        }
        let target = index.min(self.max_index - 1);
        while (self.positions.len() as u32) <= target {
            let next = self.positions.len() as u32;
            let chunk_end = (next + CHUNK_SIZE).min(self.max_index);
            for i in next..chunk_end {
                let prev = self.positions.last().copied().unwrap_or(0.0);
                self.positions.push(prev + sizer(i));
            }
        }
    }

    /// Screen-space start of item `i`: 0 for `i == 0`, otherwise the
    /// cumulative size of everything before it.
    pub fn position(&mut self, i: u32, sizer: &dyn Fn(u32) -> f64) -> f64 {
        if i == 0 {
            return 0.0;
        }
        self.extend_to(i - 1, sizer);
        self.positions.get((i - 1) as usize).copied().unwrap_or_else(|| self.positions.last().copied().unwrap_or(0.0))
    }

    /// Cumulative size of items `0..=upTo`.
    pub fn total_size(&mut self, up_to: u32, sizer: &dyn Fn(u32) -> f64) -> f64 {
        self.extend_to(up_to, sizer);
        self.positions.get(up_to as usize).copied().unwrap_or_else(|| self.positions.last().copied().unwrap_or(0.0))
    }

    /// Smallest index `i` such that `positions[i] > p`, clamped to the last
    /// valid index. Extends in chunks, estimating an initial walk distance
    /// from the default item size so a large `p` doesn't force a
    /// one-chunk-at-a-time crawl.
    pub fn find_index_at(&mut self, p: f64, sizer: &dyn Fn(u32) -> f64) -> u32 {
        if self.max_index == 0 {
            return 0;
        }
        if p <= 0.0 {
            self.extend_to(0, sizer);
            return 0;
        }

        let mut estimate = ((p / self.default_size) as u32).saturating_add(1);
        loop {
            self.extend_to(estimate, sizer);
            let covers = self
                .positions
                .last()
                .map(|&last| last > p)
                .unwrap_or(false);
            if covers || (self.positions.len() as u32) >= self.max_index {
                break;
            }
            estimate = estimate.saturating_add(CHUNK_SIZE);
        }

        let idx = self.positions.partition_point(|&pos| pos <= p) as u32;
        idx.min(self.max_index - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_zero_is_zero() {
        let mut cache = PositionCache::new(1000, 20.0);
        assert_eq!(cache.position(0, &|_| 20.0), 0.0);
    }

    #[test]
    fn position_accumulates_uniform_sizes() {
        let mut cache = PositionCache::new(1000, 20.0);
        assert_eq!(cache.position(5, &|_| 20.0), 100.0);
    }

    #[test]
    fn hidden_items_contribute_zero() {
        let mut cache = PositionCache::new(1000, 20.0);
        let sizer = |i: u32| if i == 2 { 0.0 } else { 20.0 };
        assert_eq!(cache.position(5, &sizer), 80.0);
    }

    #[test]
    fn find_index_at_inverts_position() {
        let mut cache = PositionCache::new(1000, 20.0);
        let idx = cache.find_index_at(100.0, &|_| 20.0);
        assert_position_brackets_target(&mut cache, idx);
    }

    fn assert_position_brackets_target(cache: &mut PositionCache, idx: u32) {
        // position(idx) <= 100 < position(idx+1)
        let lo = cache.position(idx, &|_| 20.0);
        let hi = cache.position(idx + 1, &|_| 20.0);
        assert!(lo <= 100.0 && 100.0 < hi);
    }

    #[test]
    fn find_index_at_clamps_to_max() {
        let mut cache = PositionCache::new(10, 20.0);
        let idx = cache.find_index_at(1_000_000.0, &|_| 20.0);
        assert_eq!(idx, 9);
    }

    #[test]
    fn invalidate_defers_rebuild_reset_is_immediate() {
        let mut cache = PositionCache::new(1000, 20.0);
        cache.position(5, &|_| 20.0);
        cache.invalidate();
        assert_eq!(cache.positions.len(), 6, "invalidate defers, doesn't clear immediately");
        cache.reset();
        assert!(cache.positions.is_empty());
    }

    #[test]
    fn far_index_does_not_crawl_one_chunk_at_a_time() {
        let mut cache = PositionCache::new(2_000_000, 20.0);
        let idx = cache.find_index_at(1_000_000.0 * 20.0, &|_| 20.0);
        assert_eq!(idx, 1_000_000);
    }
}

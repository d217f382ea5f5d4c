/// Counters collected by a cache built with the `statistics` feature.
///
/// Hits and misses are recorded by [`try_get()`](crate::Cache::try_get),
/// [`get()`](crate::Cache::get) and
/// [`contains_key()`](crate::Cache::contains_key). A lookup that lands on a
/// record whose value was released counts as a miss and as a purge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Statistics {
    /// Lookups that resolved to a live value.
    pub hits: u64,
    /// Lookups that found nothing, or found a released value.
    pub misses: u64,
    /// Dead records removed from the cache, by any path.
    pub purged: u64,
}

impl Statistics {
    pub(crate) fn record_lookup(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    pub(crate) fn record_purged(&mut self, count: usize) {
        self.purged += count as u64;
    }

    /// Fraction of lookups that were hits, or `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Statistics;

    #[test]
    fn test_hit_rate() {
        let mut stats = Statistics::default();
        assert_eq!(stats.hit_rate(), 0.0);

        stats.record_lookup(true);
        stats.record_lookup(true);
        stats.record_lookup(true);
        stats.record_lookup(false);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_record_purged_accumulates() {
        let mut stats = Statistics::default();
        stats.record_purged(2);
        stats.record_purged(0);
        stats.record_purged(5);
        assert_eq!(stats.purged, 7);
    }
}

//! Per-configuration success statistics
//!
//! Counts round-trip confirmations per configuration index for one
//! measurement session. In-memory only; a reset starts a fresh run.

/// Success counters, one per configuration table entry
#[derive(Debug, Clone)]
pub struct StatsTracker {
    counts: Vec<u64>,
}

impl StatsTracker {
    /// Create a tracker sized to the configuration table
    pub fn new(count: usize) -> Self {
        Self {
            counts: vec![0; count],
        }
    }

    /// Record one success for a configuration index
    ///
    /// Out-of-range indices are ignored; the engine only passes indices
    /// it got from the slot clock.
    pub fn record(&mut self, index: usize) {
        if let Some(slot) = self.counts.get_mut(index) {
            *slot += 1;
        }
    }

    /// Zero every counter
    pub fn reset(&mut self) {
        self.counts.fill(0);
    }

    /// Success count for one index
    pub fn get(&self, index: usize) -> u64 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    /// All counters in table order
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Total successes across the table
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_get() {
        let mut stats = StatsTracker::new(4);
        stats.record(0);
        stats.record(2);
        stats.record(2);
        assert_eq!(stats.counts(), &[1, 0, 2, 0]);
        assert_eq!(stats.get(2), 2);
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn test_reset() {
        let mut stats = StatsTracker::new(3);
        stats.record(1);
        stats.reset();
        assert_eq!(stats.counts(), &[0, 0, 0]);
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut stats = StatsTracker::new(2);
        stats.record(7);
        assert_eq!(stats.total(), 0);
        assert_eq!(stats.get(7), 0);
    }
}

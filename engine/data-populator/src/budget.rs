//! API call budget
//!
//! Exact accounting of outbound vendor calls within one population run. The
//! budget is owned by the orchestrator and injected into every collaborator
//! that issues calls; the counter is atomic so it stays correct if
//! concurrency is ever introduced around it.

use std::sync::atomic::{AtomicU32, Ordering};

/// Running count of outbound API calls, compared against the daily ceiling
#[derive(Debug)]
pub struct ApiCallBudget {
    ceiling: u32,
    used: AtomicU32,
}

impl ApiCallBudget {
    pub fn new(ceiling: u32) -> Self {
        Self { ceiling, used: AtomicU32::new(0) }
    }

    /// Reset the counter at the start of a run
    pub fn reset(&self) {
        self.used.store(0, Ordering::SeqCst);
    }

    /// Record `calls` issued calls, returning the new total
    pub fn record(&self, calls: u32) -> u32 {
        self.used.fetch_add(calls, Ordering::SeqCst) + calls
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// True once the full ceiling is consumed; gates new players and
    /// player-level sub-fetches
    pub fn exhausted(&self) -> bool {
        self.used() >= self.ceiling
    }

    /// True once `percent` of the ceiling is consumed; gates new leagues so
    /// in-flight per-player work keeps headroom
    pub fn nearing_ceiling(&self, percent: u32) -> bool {
        u64::from(self.used()) * 100 >= u64::from(self.ceiling) * u64::from(percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates() {
        let budget = ApiCallBudget::new(100);
        assert_eq!(budget.record(1), 1);
        assert_eq!(budget.record(3), 4);
        assert_eq!(budget.used(), 4);
    }

    #[test]
    fn test_reset_clears_counter() {
        let budget = ApiCallBudget::new(100);
        budget.record(42);
        budget.reset();
        assert_eq!(budget.used(), 0);
        assert!(!budget.exhausted());
    }

    #[test]
    fn test_exhaustion_at_ceiling() {
        let budget = ApiCallBudget::new(10);
        budget.record(9);
        assert!(!budget.exhausted());
        budget.record(1);
        assert!(budget.exhausted());
    }

    #[test]
    fn test_league_gate_at_95_percent() {
        let budget = ApiCallBudget::new(100);
        budget.record(94);
        assert!(!budget.nearing_ceiling(95));
        budget.record(1);
        assert!(budget.nearing_ceiling(95));
    }
}

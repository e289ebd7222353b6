//! Run summary
//!
//! Per-record outcomes are collected here instead of being swallowed at the
//! catch site: one bad record must not abort a batch, but it must still be
//! visible in the end-of-run report.

/// One unit of work that failed without aborting the run
#[derive(Debug, Clone)]
pub struct SoftFailure {
    /// What was being processed, e.g. "league 39" or "player 600 transfers"
    pub unit: String,
    pub reason: String,
}

/// Aggregate outcome of one population run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub leagues_processed: u32,
    pub players_processed: u32,
    /// Players skipped because they were already persisted
    pub players_skipped: u32,
    /// Players dropped by the age filter or for lack of profile data
    pub players_filtered: u32,
    pub statistics_written: u32,
    pub transfers_written: u32,
    pub injuries_written: u32,
    pub sidelined_written: u32,
    pub trophies_written: u32,
    pub soft_failures: Vec<SoftFailure>,
    pub calls_used: u32,
    /// Set when the run stopped early on the call budget; the run still
    /// counts as a success with partial progress
    pub halt_reason: Option<String>,
    /// Set when the run failed outright (daily quota)
    pub failure: Option<String>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn soft_failure(&mut self, unit: impl Into<String>, reason: impl Into<String>) {
        self.soft_failures.push(SoftFailure { unit: unit.into(), reason: reason.into() });
    }

    pub fn halt(&mut self, reason: impl Into<String>) {
        if self.halt_reason.is_none() {
            self.halt_reason = Some(reason.into());
        }
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.failure = Some(reason.into());
    }

    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    /// One-line status for the completion callback
    pub fn message(&self) -> String {
        if let Some(failure) = &self.failure {
            return format!(
                "population run failed after {} calls: {} ({} players processed, {} skipped)",
                self.calls_used, failure, self.players_processed, self.players_skipped
            );
        }

        let mut message = format!(
            "population run complete: {} leagues, {} players processed, {} skipped, \
             {} statistics, {} calls used",
            self.leagues_processed,
            self.players_processed,
            self.players_skipped,
            self.statistics_written,
            self.calls_used
        );
        if let Some(halt) = &self.halt_reason {
            message.push_str(&format!(" (partial progress: {halt})"));
        }
        if !self.soft_failures.is_empty() {
            message.push_str(&format!(", {} soft failures", self.soft_failures.len()));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_halt_is_still_success() {
        let mut summary = RunSummary::new();
        summary.halt("call budget exhausted");
        assert!(summary.success());
        assert!(summary.message().contains("partial progress"));
    }

    #[test]
    fn test_failure_message() {
        let mut summary = RunSummary::new();
        summary.fail("daily request limit reached");
        assert!(!summary.success());
        assert!(summary.message().contains("failed"));
    }

    #[test]
    fn test_first_halt_reason_wins() {
        let mut summary = RunSummary::new();
        summary.halt("first");
        summary.halt("second");
        assert_eq!(summary.halt_reason.as_deref(), Some("first"));
    }
}

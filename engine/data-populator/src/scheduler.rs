//! Population scheduling
//!
//! A manual trigger and a daily schedule both funnel into the same entry
//! point. Runs are single-flight: while one is in progress, further
//! triggers no-op instead of queueing, since the call budget and the
//! skip-if-exists idempotency are only safe under single-writer execution.
//! The run itself executes on a spawned task so triggering never blocks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveTime, Utc};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::ScheduleConfig;
use crate::orchestrator::PopulationOrchestrator;

/// Receives the terminal status of a population run, exactly once per run
pub trait CompletionListener: Send + Sync {
    fn on_population_complete(&self, success: bool, message: &str);
}

/// Terminal status of the most recent run
#[derive(Debug, Clone)]
pub struct RunStatus {
    pub success: bool,
    pub message: String,
    pub finished_at: DateTime<Utc>,
}

/// Owns the single-flight gate and the daily run loop
pub struct PopulationScheduler {
    orchestrator: Arc<PopulationOrchestrator>,
    config: ScheduleConfig,
    in_progress: Arc<AtomicBool>,
    last_run: Arc<Mutex<Option<RunStatus>>>,
}

impl PopulationScheduler {
    pub fn new(orchestrator: Arc<PopulationOrchestrator>, config: ScheduleConfig) -> Self {
        Self {
            orchestrator,
            config,
            in_progress: Arc::new(AtomicBool::new(false)),
            last_run: Arc::new(Mutex::new(None)),
        }
    }

    /// Trigger a population run now. Returns false (and does nothing) when a
    /// run is already in progress.
    pub fn trigger(&self) -> bool {
        if !self.try_begin_run() {
            info!("population already in progress, ignoring trigger");
            return false;
        }

        let orchestrator = Arc::clone(&self.orchestrator);
        let listener = GateClearingListener {
            in_progress: Arc::clone(&self.in_progress),
            last_run: Arc::clone(&self.last_run),
        };
        tokio::spawn(async move {
            orchestrator.execute(&listener).await;
        });
        true
    }

    /// Run the daily schedule loop; never returns
    pub async fn start(&self) {
        if !self.config.enabled {
            info!("daily schedule disabled, waiting for manual triggers only");
            std::future::pending::<()>().await;
        }

        info!(run_time = %self.config.daily_run_time, "daily population schedule started");
        loop {
            let next = next_run_time(&self.config.daily_run_time);
            let now = Utc::now();
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next = %next, "next population run scheduled");
            sleep(wait).await;

            if !self.trigger() {
                warn!("scheduled run skipped, previous run still in progress");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Status of the most recent completed run, for the admin surface
    pub fn last_run(&self) -> Option<RunStatus> {
        self.last_run.lock().expect("status mutex poisoned").clone()
    }

    /// Claim the single-flight gate
    fn try_begin_run(&self) -> bool {
        self.in_progress.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_ok()
    }
}

/// Clears the in-progress gate and records the run status when the
/// orchestrator reports completion
struct GateClearingListener {
    in_progress: Arc<AtomicBool>,
    last_run: Arc<Mutex<Option<RunStatus>>>,
}

impl CompletionListener for GateClearingListener {
    fn on_population_complete(&self, success: bool, message: &str) {
        if success {
            info!(message, "population run complete");
        } else {
            error!(message, "population run failed");
        }
        *self.last_run.lock().expect("status mutex poisoned") = Some(RunStatus {
            success,
            message: message.to_string(),
            finished_at: Utc::now(),
        });
        self.in_progress.store(false, Ordering::SeqCst);
    }
}

/// Next occurrence of the configured HH:MM, today or tomorrow
fn next_run_time(run_time: &str) -> DateTime<Utc> {
    let now = Utc::now();
    let run_time = NaiveTime::parse_from_str(run_time, "%H:%M")
        .unwrap_or_else(|_| NaiveTime::from_hms_opt(3, 0, 0).expect("valid fallback time"));

    let today = now.date_naive().and_time(run_time).and_utc();
    if today > now {
        today
    } else {
        (now.date_naive() + chrono::Duration::days(1)).and_time(run_time).and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_run_time_is_in_the_future() {
        let next = next_run_time("03:00");
        assert!(next > Utc::now());
        assert!(next - Utc::now() <= chrono::Duration::days(1));
    }

    #[test]
    fn test_next_run_time_tolerates_bad_input() {
        let next = next_run_time("not-a-time");
        assert!(next > Utc::now());
    }

    #[tokio::test]
    async fn test_single_flight_gate() {
        use crate::config::PopulationConfig;
        use crate::testing::StubApi;
        use talent_store::MemoryStore;

        let orchestrator = Arc::new(PopulationOrchestrator::new(
            Arc::new(StubApi::default()),
            Arc::new(MemoryStore::new()),
            PopulationConfig {
                league_ids: vec![],
                current_season: 2025,
                max_age: 21,
                daily_call_ceiling: 10,
                league_gate_percent: 95,
                page_delay_ms: 0,
            },
        ));
        let scheduler = PopulationScheduler::new(
            orchestrator,
            ScheduleConfig { enabled: false, daily_run_time: "03:00".to_string() },
        );

        // Claim the gate directly: a second claim must no-op
        assert!(scheduler.try_begin_run());
        assert!(scheduler.is_running());
        assert!(!scheduler.try_begin_run());

        // Completion clears the gate and records the status
        let listener = GateClearingListener {
            in_progress: Arc::clone(&scheduler.in_progress),
            last_run: Arc::clone(&scheduler.last_run),
        };
        listener.on_population_complete(true, "done");

        assert!(!scheduler.is_running());
        let status = scheduler.last_run().expect("status recorded");
        assert!(status.success);
        assert_eq!(status.message, "done");
        assert!(scheduler.try_begin_run());
    }
}

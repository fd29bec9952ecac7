//! Per-case periodic sync scheduling.
//!
//! The registry is owned by one `SyncScheduler` instance; start, stop, and
//! stop-all are its only mutators, and no two live timers ever exist for the
//! same process number.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::judicial::sync::SyncOrchestrator;

struct SyncJob {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
    interval_minutes: u64,
}

pub struct SyncScheduler {
    orchestrator: Arc<SyncOrchestrator>,
    jobs: Mutex<HashMap<String, SyncJob>>,
}

impl SyncScheduler {
    pub fn new(orchestrator: Arc<SyncOrchestrator>) -> Self {
        Self {
            orchestrator,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Begin periodic syncing for a process: one immediate run, then one run
    /// every `interval_minutes`. Starting an already-running process number
    /// replaces the existing job with the new interval.
    pub fn start_periodic_sync(&self, process_number: &str, tribunal: &str, interval_minutes: u64) {
        let (cancel, mut cancelled) = watch::channel(false);
        let orchestrator = Arc::clone(&self.orchestrator);
        let process = process_number.to_string();
        let region = tribunal.to_string();
        let period = Duration::from_secs(interval_minutes.max(1) * 60);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                // Cancellation is only observed between runs: an in-flight
                // sync is allowed to complete, its results simply stop being
                // re-scheduled.
                tokio::select! {
                    _ = ticker.tick() => {
                        let results = orchestrator.sync_case(&process, &region).await;
                        let failures = results.iter().filter(|r| !r.success).count();
                        if failures > 0 {
                            tracing::warn!(
                                process_number = %process,
                                failures,
                                total = results.len(),
                                "periodic sync completed with failures"
                            );
                        } else {
                            tracing::debug!(process_number = %process, "periodic sync completed");
                        }
                    }
                    _ = cancelled.changed() => break,
                }
            }
        });

        let job = SyncJob {
            cancel,
            handle,
            interval_minutes,
        };

        let Ok(mut jobs) = self.jobs.lock() else {
            tracing::warn!("scheduler registry lock poisoned; job not registered");
            job.handle.abort();
            return;
        };
        if let Some(previous) = jobs.insert(process_number.to_string(), job) {
            cancel_job(previous);
            tracing::info!(
                process_number,
                interval_minutes,
                "periodic sync replaced with new interval"
            );
        } else {
            tracing::info!(process_number, interval_minutes, "periodic sync started");
        }
    }

    /// Cancel future firings for a process. Returns false if none was running.
    pub fn stop_periodic_sync(&self, process_number: &str) -> bool {
        let Ok(mut jobs) = self.jobs.lock() else {
            return false;
        };
        match jobs.remove(process_number) {
            Some(job) => {
                cancel_job(job);
                tracing::info!(process_number, "periodic sync stopped");
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&self) {
        let Ok(mut jobs) = self.jobs.lock() else {
            return;
        };
        let count = jobs.len();
        for (_, job) in jobs.drain() {
            cancel_job(job);
        }
        if count > 0 {
            tracing::info!(count, "all periodic syncs stopped");
        }
    }

    pub fn is_running(&self, process_number: &str) -> bool {
        self.jobs
            .lock()
            .map(|jobs| jobs.contains_key(process_number))
            .unwrap_or(false)
    }

    pub fn active_interval_minutes(&self, process_number: &str) -> Option<u64> {
        self.jobs
            .lock()
            .ok()
            .and_then(|jobs| jobs.get(process_number).map(|j| j.interval_minutes))
    }

    pub fn active_count(&self) -> usize {
        self.jobs.lock().map(|jobs| jobs.len()).unwrap_or(0)
    }
}

fn cancel_job(job: SyncJob) {
    // Signal, don't abort: the loop exits at its next select point, so an
    // in-flight sync_case call still runs to completion.
    let _ = job.cancel.send(true);
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.stop_all();
    }
}

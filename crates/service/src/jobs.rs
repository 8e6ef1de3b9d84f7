//! Periodic job scheduler.
//!
//! Each job runs in its own task on a fixed interval. A run finishes before
//! the next tick is taken, so a job never overlaps with itself; different
//! jobs run concurrently. Failures are logged and the job simply runs again
//! on the next tick.

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

pub const ASSIGN_ORDERS_JOB: &str = "assign_orders";
pub const MOVE_COURIERS_JOB: &str = "move_couriers";
pub const OUTBOX_JOB: &str = "outbox";

/// Owns the running job tasks until shutdown.
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shutdown,
            handles: Vec::new(),
        }
    }

    /// Starts running `job` every `period`, the first run immediately.
    pub fn spawn<F, Fut, T, E>(&mut self, name: &'static str, period: Duration, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let mut shutdown = self.shutdown.subscribe();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(job = name, period_ms = period.as_millis() as u64, "Job started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        run_once(name, &job).await;
                    }
                    _ = shutdown.changed() => break,
                }
            }

            info!(job = name, "Job stopped");
        });

        self.handles.push(handle);
    }

    /// Number of running jobs.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stops every job and waits for in-flight runs to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Job task panicked");
            }
        }
    }
}

/// Runs `job` once, recording metrics. Returns whether the run succeeded.
pub async fn run_once<F, Fut, T, E>(name: &'static str, job: &F) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    metrics::counter!("job_runs_total", "job" => name).increment(1);
    let start = Instant::now();

    let result = job().await;

    let elapsed = start.elapsed().as_secs_f64();
    metrics::histogram!("job_duration_seconds", "job" => name).record(elapsed);

    match result {
        Ok(_) => {
            debug!(job = name, elapsed, "Job run finished");
            true
        }
        Err(e) => {
            metrics::counter!("job_failures_total", "job" => name).increment(1);
            error!(job = name, error = %e, "Job run failed");
            false
        }
    }
}

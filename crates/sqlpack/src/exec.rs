//! Parallel statement execution.
//!
//! The packer only produces text. Running the statements is up to a
//! [`StatementExecutor`]; [`execute_all`] drives one through a fixed pool of
//! tokio tasks that pull statements off a shared work queue and report each
//! result on a completion channel.
//!
//! Statements may complete in any order. Every submitted statement yields
//! exactly one outcome, including when a worker task panics.
//!
//! # Example
//! ```ignore
//! use sqlpack::exec::{PoolConfig, execute_all};
//! use std::sync::Arc;
//!
//! let report = execute_all(Arc::new(executor), statements, &PoolConfig::new().with_workers(4)).await;
//! if !report.is_success() {
//!     for f in &report.failures {
//!         eprintln!("statement {} failed: {}", f.index, f.error);
//!     }
//! }
//! ```

use crate::error::{ExecError, ExecResult};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// Something that can run one statement against a server.
///
/// Returns the number of rows the server reports as affected (or `0` if the
/// backend does not report it).
pub trait StatementExecutor: Send + Sync {
    fn execute(&self, statement: &str) -> impl Future<Output = ExecResult<u64>> + Send;
}

/// Configuration for [`execute_all`].
#[derive(Debug, Clone, Default)]
pub struct PoolConfig {
    /// Number of worker tasks. `0` means one per available CPU.
    pub workers: usize,
    /// Per-statement timeout. `None` means no timeout (default).
    pub statement_timeout: Option<Duration>,
}

impl PoolConfig {
    /// Create a new configuration with defaults (one worker per CPU, no timeout).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker tasks.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the per-statement timeout.
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    /// Worker count after resolving `0` to the available parallelism.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Result of one statement, as published on the completion channel.
#[derive(Debug)]
pub struct ExecOutcome {
    /// Position of the statement in the submitted list.
    pub index: usize,
    pub result: ExecResult<u64>,
    pub elapsed: Duration,
}

/// A statement that did not succeed.
#[derive(Debug, Clone)]
pub struct ExecFailure {
    pub index: usize,
    pub error: ExecError,
}

/// Summary of an [`execute_all`] run.
#[derive(Debug, Clone, Default)]
pub struct ExecReport {
    /// Number of statements submitted.
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Sum of affected rows over successful statements.
    pub rows_affected: u64,
    /// Wall-clock time for the whole run.
    pub elapsed: Duration,
    /// Index and run time of the statement that took longest, timed-out
    /// ones included.
    pub slowest: Option<(usize, Duration)>,
    /// Failed statements, ordered by index.
    pub failures: Vec<ExecFailure>,
}

impl ExecReport {
    /// `true` if every submitted statement succeeded.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.succeeded == self.submitted
    }

    fn record(&mut self, outcome: ExecOutcome) {
        if outcome.elapsed > self.slowest.map_or(Duration::ZERO, |(_, d)| d) {
            self.slowest = Some((outcome.index, outcome.elapsed));
        }
        match outcome.result {
            Ok(rows) => {
                self.succeeded += 1;
                self.rows_affected += rows;
            }
            Err(error) => {
                self.failed += 1;
                self.failures.push(ExecFailure {
                    index: outcome.index,
                    error,
                });
            }
        }
    }
}

type Job = (usize, String);

/// Run `statements` through `executor` on a fixed pool of worker tasks.
///
/// Must be called from within a tokio runtime.
pub async fn execute_all<E>(
    executor: Arc<E>,
    statements: Vec<String>,
    config: &PoolConfig,
) -> ExecReport
where
    E: StatementExecutor + 'static,
{
    let started = Instant::now();
    let submitted = statements.len();
    let mut report = ExecReport {
        submitted,
        ..ExecReport::default()
    };
    if submitted == 0 {
        return report;
    }

    let workers = config.effective_workers().min(submitted);
    let (job_tx, job_rx) = mpsc::channel::<Job>(submitted);
    let job_rx = Arc::new(Mutex::new(job_rx));
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<ExecOutcome>();

    #[cfg(feature = "tracing")]
    tracing::info!(target: "sqlpack.exec", submitted, workers, "starting statement pool");

    let handles: Vec<JoinHandle<()>> = (0..workers)
        .map(|worker| {
            tokio::spawn(worker_loop(
                worker,
                Arc::clone(&executor),
                Arc::clone(&job_rx),
                done_tx.clone(),
                config.statement_timeout,
            ))
        })
        .collect();
    drop(done_tx);
    drop(job_rx);

    // Capacity equals the number of jobs, so this never waits.
    for job in statements.into_iter().enumerate() {
        if job_tx.send(job).await.is_err() {
            // Every worker is gone; the unreported jobs are accounted for below.
            break;
        }
    }
    drop(job_tx);

    let mut reported = vec![false; submitted];
    while let Some(outcome) = done_rx.recv().await {
        reported[outcome.index] = true;
        report.record(outcome);
    }

    let mut worker_errors = Vec::new();
    for handle in handles {
        if let Err(e) = handle.await {
            worker_errors.push(e.to_string());
        }
    }
    let reason = if worker_errors.is_empty() {
        "worker exited before reporting".to_string()
    } else {
        worker_errors.join("; ")
    };

    for (index, _) in reported.iter().enumerate().filter(|(_, seen)| !**seen) {
        report.record(ExecOutcome {
            index,
            result: Err(ExecError::Worker(reason.clone())),
            elapsed: Duration::ZERO,
        });
    }

    report.failures.sort_by_key(|f| f.index);
    report.elapsed = started.elapsed();

    #[cfg(feature = "tracing")]
    tracing::info!(
        target: "sqlpack.exec",
        succeeded = report.succeeded,
        failed = report.failed,
        rows_affected = report.rows_affected,
        elapsed = ?report.elapsed,
        slowest = ?report.slowest,
        "statement pool finished"
    );

    report
}

async fn worker_loop<E>(
    worker: usize,
    executor: Arc<E>,
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    done: mpsc::UnboundedSender<ExecOutcome>,
    timeout: Option<Duration>,
) where
    E: StatementExecutor + 'static,
{
    loop {
        // Hold the lock only while taking a job.
        let next = jobs.lock().await.recv().await;
        let Some((index, statement)) = next else {
            break;
        };

        let started = Instant::now();
        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, executor.execute(&statement))
                .await
                .unwrap_or(Err(ExecError::Timeout(limit))),
            None => executor.execute(&statement).await,
        };
        let elapsed = started.elapsed();

        #[cfg(feature = "tracing")]
        match &result {
            Ok(rows) => tracing::debug!(
                target: "sqlpack.exec",
                worker,
                statement = index,
                rows,
                bytes = statement.len(),
                elapsed = ?elapsed,
                "statement executed"
            ),
            Err(e) => tracing::warn!(
                target: "sqlpack.exec",
                worker,
                statement = index,
                error = %e,
                "statement failed"
            ),
        }
        #[cfg(not(feature = "tracing"))]
        let _ = worker;

        if done
            .send(ExecOutcome {
                index,
                result,
                elapsed,
            })
            .is_err()
        {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct Recorder {
        seen: StdMutex<Vec<String>>,
    }

    impl StatementExecutor for Recorder {
        fn execute(&self, statement: &str) -> impl Future<Output = ExecResult<u64>> + Send {
            self.seen.lock().unwrap().push(statement.to_string());
            async { Ok(2) }
        }
    }

    #[test]
    fn report_keeps_slowest_statement() {
        let mut report = ExecReport::default();
        for (index, ms) in [(0, 3), (1, 9), (2, 4)] {
            report.record(ExecOutcome {
                index,
                result: Ok(1),
                elapsed: Duration::from_millis(ms),
            });
        }
        // lost jobs carry no run time and never count as slowest
        report.record(ExecOutcome {
            index: 3,
            result: Err(ExecError::Worker("gone".into())),
            elapsed: Duration::ZERO,
        });

        assert_eq!(report.slowest, Some((1, Duration::from_millis(9))));
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn effective_workers_resolves_zero() {
        assert_eq!(PoolConfig::new().with_workers(3).effective_workers(), 3);
        assert!(PoolConfig::new().effective_workers() >= 1);
    }

    #[tokio::test]
    async fn empty_list_reports_nothing() {
        let report = execute_all(Arc::new(Recorder::default()), Vec::new(), &PoolConfig::new()).await;
        assert_eq!(report.submitted, 0);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn runs_every_statement_once() {
        let exec = Arc::new(Recorder::default());
        let stmts: Vec<String> = (0..20).map(|i| format!("stmt {i}")).collect();
        let report = execute_all(Arc::clone(&exec), stmts.clone(), &PoolConfig::new().with_workers(4)).await;

        assert!(report.is_success());
        assert_eq!(report.succeeded, 20);
        assert_eq!(report.rows_affected, 40);

        let mut seen = exec.seen.lock().unwrap().clone();
        seen.sort();
        let mut want = stmts;
        want.sort();
        assert_eq!(seen, want);
    }
}

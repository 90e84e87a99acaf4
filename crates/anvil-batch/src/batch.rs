//! Bounded parallel job orchestration
//!
//! Jobs fan out over a private tokio runtime. A semaphore caps how many run
//! at once; each admitted job executes on the blocking pool under its own
//! wall-clock timeout, which starts only once the job holds a worker slot.
//! A timed-out job is cancelled and reported at once, but its blocking
//! thread keeps the slot until it returns, so at most `workers` executors
//! ever run together. One job's error, panic or timeout never touches its
//! siblings, and the report always lists every submitted job exactly once.

use crate::config::{default_workers, AnvilConfig};
use crate::executor::{CancelToken, JobExecutor};
use crate::job::{BatchReport, ConversionJob, JobFailure, JobOutcome, JobSuccess};
use anvil_core::{AnvilError, FailureKind};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs conversion jobs with bounded concurrency and per-job isolation
pub struct BatchOrchestrator<E: JobExecutor> {
    executor: Arc<E>,
    workers: usize,
    job_timeout: Duration,
}

impl<E: JobExecutor> BatchOrchestrator<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor: Arc::new(executor),
            workers: default_workers(),
            job_timeout: DEFAULT_JOB_TIMEOUT,
        }
    }

    pub fn from_config(executor: E, config: &AnvilConfig) -> Self {
        Self::new(executor)
            .with_workers(config.workers)
            .with_timeout(config.job_timeout())
    }

    /// Maximum jobs in flight. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every job and return once all have settled.
    ///
    /// Malformed jobs are rejected before scheduling and never take a
    /// worker slot. Timed-out jobs are abandoned, not awaited. Safe to call
    /// from inside an async context: the batch then runs on its own thread.
    pub fn run(&self, jobs: Vec<ConversionJob>) -> BatchReport {
        let attempted = jobs.len();
        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(attempted);
        let mut admitted = Vec::new();

        for (seq, job) in jobs.into_iter().enumerate() {
            match job.prevalidate() {
                Ok(()) => admitted.push((seq, job)),
                Err(err) => {
                    tracing::debug!(output = %job.output_name, error = %err, "Job rejected");
                    outcomes.push((seq, JobOutcome::Failed(JobFailure::from_error(&job, &err))));
                }
            }
        }

        tracing::info!(
            attempted,
            admitted = admitted.len(),
            workers = self.workers,
            timeout_secs = self.job_timeout.as_secs_f64(),
            "Starting batch"
        );

        if !admitted.is_empty() {
            outcomes.extend(self.schedule(admitted));
        }

        let report = BatchReport::from_outcomes(attempted, outcomes);
        tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Batch settled");
        report
    }

    fn schedule(&self, admitted: Vec<(usize, ConversionJob)>) -> Vec<(usize, JobOutcome)> {
        if tokio::runtime::Handle::try_current().is_err() {
            return self.drive(admitted);
        }

        // A runtime cannot be started from a thread that is already driving one
        tracing::debug!("Called from inside a runtime; driving batch on a dedicated thread");
        let identities: Vec<(usize, ConversionJob)> = admitted.clone();
        let joined = std::thread::scope(|scope| scope.spawn(move || self.drive(admitted)).join());
        match joined {
            Ok(outcomes) => outcomes,
            Err(_) => {
                tracing::error!("Batch driver thread panicked");
                let err = AnvilError::Scheduling("Batch driver thread panicked".to_string());
                fail_all(identities, &err)
            }
        }
    }

    fn drive(&self, admitted: Vec<(usize, ConversionJob)>) -> Vec<(usize, JobOutcome)> {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.workers)
            .thread_name("anvil-batch")
            .enable_time()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(error = %e, "Could not start worker pool");
                let err = AnvilError::Scheduling(format!("Could not start worker pool: {}", e));
                return fail_all(admitted, &err);
            }
        };

        // Identity of every admitted job, so a lost worker task still gets a record
        let mut pending: BTreeMap<usize, ConversionJob> =
            admitted.iter().map(|(seq, job)| (*seq, job.clone())).collect();
        let mut outcomes = Vec::with_capacity(admitted.len());

        runtime.block_on(async {
            let slots = Arc::new(Semaphore::new(self.workers));
            let mut set = JoinSet::new();

            for (seq, job) in admitted {
                let slots = Arc::clone(&slots);
                let executor = Arc::clone(&self.executor);
                let timeout = self.job_timeout;
                set.spawn(async move { (seq, run_job(slots, executor, job, timeout).await) });
            }

            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((seq, outcome)) => {
                        pending.remove(&seq);
                        outcomes.push((seq, outcome));
                    }
                    Err(e) => tracing::error!(error = %e, "Worker task lost"),
                }
            }
        });

        // Abandoned jobs keep their blocking threads; do not wait for them
        runtime.shutdown_background();

        for (seq, job) in pending {
            let failure = JobFailure::new(
                &job,
                FailureKind::Scheduling,
                "Worker task ended without reporting a result",
            );
            outcomes.push((seq, JobOutcome::Failed(failure)));
        }
        outcomes
    }
}

fn fail_all(jobs: Vec<(usize, ConversionJob)>, err: &AnvilError) -> Vec<(usize, JobOutcome)> {
    jobs.into_iter()
        .map(|(seq, job)| (seq, JobOutcome::Failed(JobFailure::from_error(&job, err))))
        .collect()
}

async fn run_job<E: JobExecutor>(
    slots: Arc<Semaphore>,
    executor: Arc<E>,
    job: ConversionJob,
    timeout: Duration,
) -> JobOutcome {
    let permit = match slots.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            return JobOutcome::Failed(JobFailure::new(
                &job,
                FailureKind::Scheduling,
                "Worker pool closed",
            ))
        }
    };

    let job = Arc::new(job);
    let worker_job = Arc::clone(&job);
    let cancel = CancelToken::new(timeout);
    let worker_cancel = cancel.clone();
    let started = Instant::now();
    // The slot is held by the blocking thread, so an abandoned job keeps it until it returns
    let mut handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        executor.execute(&worker_job, &worker_cancel)
    });

    let joined = match tokio::time::timeout(timeout, &mut handle).await {
        Ok(joined) => joined,
        Err(_) if cancel.cancel() => {
            let err = AnvilError::Timeout(timeout);
            tracing::warn!(output = %job.output_name, error = %err, "Job abandoned");
            return JobOutcome::Failed(JobFailure::from_error(&job, &err));
        }
        // Committed just before the deadline; its writes are already landing
        Err(_) => handle.await,
    };

    match joined {
        Ok(Ok(artifacts)) => {
            tracing::debug!(
                output = %job.output_name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Job succeeded"
            );
            JobOutcome::Succeeded(JobSuccess {
                output_name: job.output_name.clone(),
                source: job.source.clone(),
                artifacts,
            })
        }
        Ok(Err(err)) => {
            tracing::warn!(output = %job.output_name, kind = %err.kind(), error = %err, "Job failed");
            JobOutcome::Failed(JobFailure::from_error(&job, &err))
        }
        Err(join_err) if join_err.is_panic() => {
            let message = panic_message(join_err.into_panic());
            tracing::error!(output = %job.output_name, panic = %message, "Job panicked");
            JobOutcome::Failed(JobFailure::new(&job, FailureKind::Panic, message))
        }
        Err(join_err) => JobOutcome::Failed(JobFailure::new(
            &job,
            FailureKind::Scheduling,
            join_err.to_string(),
        )),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Job panicked".to_string()
    }
}

//! Job Dispatcher
//!
//! Runs planned jobs on a bounded rayon pool. Each worker picks up the next
//! job as soon as its current converter exits; there are no batch barriers
//! and completions arrive in any order. A shared [`CancelToken`] stops
//! dequeuing and kills running converters.

use crate::adapter::{build_invocation, execute};
use crate::error::{Result, TxError};
use crate::job::{JobOutcome, JobStatus, Plan, TextureJob};
use rayon::prelude::*;
use shared_utils::common_utils::file_name_string;
use shared_utils::thread_manager::resolve_worker_count;
use shared_utils::{create_progress_bar, BatchResult, CancelToken};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub struct Dispatcher {
    program: PathBuf,
    ocio: Option<PathBuf>,
    workers: usize,
    cancel: CancelToken,
    dry_run: bool,
}

/// Everything a finished batch produced.
#[derive(Debug)]
pub struct BatchReport {
    pub result: BatchResult,
    /// Completion order, not submission order.
    pub outcomes: Vec<JobOutcome>,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub duration: Duration,
    /// Command lines of a dry run.
    pub commands: Vec<String>,
}

impl Dispatcher {
    pub fn new(program: PathBuf, ocio: Option<PathBuf>) -> Self {
        Self {
            program,
            ocio,
            workers: crate::settings::DEFAULT_WORKERS,
            cancel: CancelToken::new(),
            dry_run: false,
        }
    }

    /// `0` picks from the core budget.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = resolve_worker_count(workers);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn run(&self, plan: Plan) -> Result<BatchReport> {
        let start = Instant::now();
        let mut result = BatchResult::new();
        for _ in &plan.skipped {
            result.skip();
        }

        if self.dry_run {
            let commands = plan
                .jobs
                .iter()
                .map(|job| build_invocation(job, &self.program, self.ocio.as_deref()).command_line())
                .collect();
            let outcomes: Vec<JobOutcome> = plan
                .jobs
                .into_iter()
                .map(|job| JobOutcome::skipped(job, "dry run"))
                .collect();
            for _ in &outcomes {
                result.skip();
            }
            return Ok(BatchReport {
                result,
                outcomes,
                input_bytes: 0,
                output_bytes: 0,
                duration: start.elapsed(),
                commands,
            });
        }

        let outcomes = self.run_jobs(plan.jobs)?;
        let mut input_bytes = 0u64;
        let mut output_bytes = 0u64;

        for outcome in &outcomes {
            match &outcome.status {
                JobStatus::Converted => {
                    result.success();
                    if let Ok(meta) = fs::metadata(&outcome.job.source) {
                        input_bytes += meta.len();
                    }
                    if let Ok(meta) = fs::metadata(&outcome.job.output) {
                        output_bytes += meta.len();
                    }
                }
                JobStatus::Skipped(_) => result.skip(),
                JobStatus::Failed(message) => {
                    result.fail(outcome.job.source.clone(), message.clone())
                }
            }
        }

        Ok(BatchReport {
            result,
            outcomes,
            input_bytes,
            output_bytes,
            duration: start.elapsed(),
            commands: Vec::new(),
        })
    }

    fn run_jobs(&self, jobs: Vec<TextureJob>) -> Result<Vec<JobOutcome>> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers.max(1))
            .thread_name(|i| format!("tx-worker-{}", i))
            .build()
            .map_err(|e| TxError::ThreadPool(e.to_string()))?;

        info!(jobs = jobs.len(), workers = self.workers, "Starting conversion batch");

        let pb = create_progress_bar(jobs.len() as u64, "Converting");
        let outcomes = Mutex::new(Vec::with_capacity(jobs.len()));

        pool.install(|| {
            jobs.into_par_iter().with_max_len(1).for_each(|job| {
                let name = file_name_string(&job.source);

                let outcome = if self.cancel.is_cancelled() {
                    JobOutcome::skipped(job, "cancelled")
                } else {
                    execute(job, &self.program, self.ocio.as_deref(), &self.cancel)
                };

                if let JobStatus::Failed(message) = &outcome.status {
                    warn!(source = %outcome.job.source.display(), error = %message, "Conversion failed");
                }

                if let Ok(mut done) = outcomes.lock() {
                    done.push(outcome);
                }
                pb.inc(1);
                pb.set_message(name);
            });
        });

        if self.cancel.is_cancelled() {
            pb.abandon_with_message("Cancelled");
        } else {
            pb.finish_with_message("Complete!");
        }

        outcomes
            .into_inner()
            .map_err(|e| TxError::ThreadPool(format!("outcome list poisoned: {}", e)))
    }
}

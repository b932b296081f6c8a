//! Bounded worker pool
//!
//! Fans a batch of jobs out to a fixed set of tokio workers and collects one
//! result per job.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Worker count used when the configured value is not positive
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Computes the number of workers for a batch
///
/// A configured value of zero or less falls back to [`DEFAULT_CONCURRENCY`].
/// The result never exceeds the number of jobs.
pub fn effective_concurrency(configured: i64, jobs: usize) -> usize {
    let configured = if configured <= 0 {
        DEFAULT_CONCURRENCY
    } else {
        configured as usize
    };
    configured.min(jobs)
}

/// Runs every job through `worker_fn` with bounded concurrency
///
/// All jobs are queued up front on a channel sized to the batch. A fixed set
/// of workers drains the queue; each job's result is sent to a collector.
/// The function returns once the queue is empty and every worker has exited.
///
/// Results are in completion order, not job order. A job that panics is
/// logged and its result is lost; its worker moves on to the next job.
///
/// # Arguments
///
/// * `jobs` - The batch; its `Display` form labels the job in logs
/// * `worker_fn` - Async processing function, responsible for its own timeouts
/// * `concurrency` - Configured worker count
///
/// # Returns
///
/// One result per completed job
pub async fn run_concurrently<J, R, F, Fut>(jobs: Vec<J>, worker_fn: F, concurrency: i64) -> Vec<R>
where
    J: Display + Send + 'static,
    R: Send + 'static,
    F: Fn(J) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let total = jobs.len();
    if total == 0 {
        return Vec::new();
    }

    let worker_count = effective_concurrency(concurrency, total);
    tracing::debug!("Dispatching {} jobs to {} workers", total, worker_count);

    let (job_tx, job_rx) = mpsc::channel(total);
    for job in jobs {
        if job_tx.send(job).await.is_err() {
            break;
        }
    }
    drop(job_tx);

    let job_rx = Arc::new(Mutex::new(job_rx));
    let (result_tx, mut result_rx) = mpsc::channel(total);
    let worker_fn = Arc::new(worker_fn);

    let mut handles = Vec::with_capacity(worker_count);
    for worker_id in 0..worker_count {
        let job_rx = Arc::clone(&job_rx);
        let result_tx = result_tx.clone();
        let worker_fn = Arc::clone(&worker_fn);

        handles.push(tokio::spawn(async move {
            loop {
                let job = job_rx.lock().await.recv().await;
                let Some(job) = job else {
                    break;
                };

                let label = job.to_string();
                tracing::debug!(worker = worker_id, job = %label, "Job started");

                // Each job runs on its own task so a panic only loses that job
                let result = match tokio::spawn(worker_fn(job)).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!(worker = worker_id, job = %label, "Job aborted: {}", e);
                        continue;
                    }
                };
                tracing::debug!(worker = worker_id, job = %label, "Job finished");

                if result_tx.send(result).await.is_err() {
                    break;
                }
            }
        }));
    }
    drop(result_tx);

    let mut results = Vec::with_capacity(total);
    while let Some(result) = result_rx.recv().await {
        results.push(result);
    }

    for (worker_id, handle) in handles.into_iter().enumerate() {
        if let Err(e) = handle.await {
            tracing::error!("Worker {} terminated abnormally: {}", worker_id, e);
        }
    }

    if results.len() < total {
        tracing::warn!(
            "Batch finished with {} of {} results",
            results.len(),
            total
        );
    }

    results
}

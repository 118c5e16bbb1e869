use crate::job::Job;
use eyre::{Result, eyre};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Bounded-concurrency job executor.
///
/// Jobs are fed through a channel of capacity `workers_count` by a dedicated
/// producer task (`submit`), executed by a fixed set of worker tasks (`run`)
/// and fanned into a single results channel (`results`). The pool never
/// retries a job; retry policy belongs to job logic.
pub struct WorkerPool<T> {
    workers_count: usize,
    jobs_tx: Option<mpsc::Sender<Job<T>>>,
    jobs_rx: Arc<Mutex<mpsc::Receiver<Job<T>>>>,
    results_tx: Option<mpsc::Sender<Result<T>>>,
    results_rx: Option<mpsc::Receiver<Result<T>>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    pub fn new(workers_count: usize) -> Self {
        let workers_count = workers_count.max(1);
        let (jobs_tx, jobs_rx) = mpsc::channel(workers_count);
        let (results_tx, results_rx) = mpsc::channel(workers_count);
        Self {
            workers_count,
            jobs_tx: Some(jobs_tx),
            jobs_rx: Arc::new(Mutex::new(jobs_rx)),
            results_tx: Some(results_tx),
            results_rx: Some(results_rx),
        }
    }

    /// Feeds the jobs into the bounded queue from a dedicated producer task,
    /// closing the queue after the last job. The caller is never blocked
    /// beyond the queue capacity.
    pub fn submit(&mut self, jobs: Vec<Job<T>>) -> JoinHandle<()> {
        let Some(jobs_tx) = self.jobs_tx.take() else {
            return tokio::spawn(async {});
        };

        tokio::spawn(async move {
            for job in jobs {
                if jobs_tx.send(job).await.is_err() {
                    // all workers are gone
                    return;
                }
            }
            // jobs_tx drops here, closing the queue
        })
    }

    /// Spawns the workers. Each worker pulls jobs until the queue is empty
    /// and closed, or until the token is cancelled, in which case it emits
    /// one error result and stops.
    ///
    /// The returned handle completes only once every worker has exited; the
    /// results channel closes at the same point.
    pub fn run(&mut self, token: CancellationToken) -> JoinHandle<()> {
        let Some(results_tx) = self.results_tx.take() else {
            return tokio::spawn(async {});
        };

        let mut handles = Vec::with_capacity(self.workers_count);
        for _ in 0..self.workers_count {
            let jobs_rx = Arc::clone(&self.jobs_rx);
            let results_tx = results_tx.clone();
            let token = token.clone();
            handles.push(tokio::spawn(worker(jobs_rx, results_tx, token)));
        }
        drop(results_tx);

        tokio::spawn(async move {
            for handle in handles {
                if let Err(e) = handle.await {
                    // a panicking job takes its worker down; surface the
                    // cause instead of only under-reporting results
                    tracing::error!("Worker exited abnormally: {e:?}");
                }
            }
        })
    }

    /// Takes the read-only fan-in stream of job results. Yields `None` once
    /// all workers have exited.
    pub fn results(&mut self) -> Option<mpsc::Receiver<Result<T>>> {
        self.results_rx.take()
    }
}

async fn worker<T>(
    jobs_rx: Arc<Mutex<mpsc::Receiver<Job<T>>>>,
    results_tx: mpsc::Sender<Result<T>>,
    token: CancellationToken,
) {
    loop {
        // the lock is held only while waiting for the next job, never across
        // job execution
        let job = {
            let mut jobs_rx = jobs_rx.lock().await;
            // biased so a closed queue wins over a cancelled token and the
            // worker exits without a spurious error
            tokio::select! {
                biased;
                job = jobs_rx.recv() => job,
                _ = token.cancelled() => {
                    tracing::error!("Worker cancelled");
                    let _ = results_tx.send(Err(eyre!("worker cancelled"))).await;
                    return;
                }
            }
        };

        let Some(job) = job else {
            // queue empty and closed
            return;
        };

        let outcome = tokio::select! {
            outcome = job.execute() => outcome,
            _ = token.cancelled() => Err(eyre!("job cancelled")),
        };

        if results_tx.send(outcome).await.is_err() {
            // the receiver dropped
            return;
        }
    }
}

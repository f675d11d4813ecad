//! Bounded worker pool for enrichment tasks
//!
//! This module handles:
//! - Limiting concurrent enrichment to a fixed number of slots
//! - Queuing jobs submitted beyond capacity until a slot frees
//! - Containing panics inside a task so they surface as errors
//! - Best-effort cancellation of abandoned jobs

use crate::protocol::{EnrichmentReport, Job};
use crate::worker::{Enricher, EnrichmentError};
use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// A pool of enrichment slots shared by all dispatcher connections
///
/// Each job runs on its own blocking thread once it holds a slot. The slot is
/// owned by that thread, so a job keeps its slot until the enricher returns,
/// even if nobody is waiting for the result any more.
#[derive(Clone)]
pub struct WorkerPool {
    enricher: Arc<dyn Enricher>,
    slots: Arc<Semaphore>,
    capacity: usize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.capacity)
            .field("available_slots", &self.available_slots())
            .finish()
    }
}

impl WorkerPool {
    /// Creates a pool with `capacity` slots (at least one)
    pub fn new(enricher: Arc<dyn Enricher>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            enricher,
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Returns the configured number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of slots not currently held by a running job
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Submits a job and returns a handle to its eventual result
    ///
    /// The job starts as soon as a slot is free. Awaiting the handle yields
    /// the enricher's result; a panic inside the enricher is returned as
    /// `EnrichmentError::Panicked`.
    pub fn submit(&self, job: Job) -> JobHandle {
        let enricher = Arc::clone(&self.enricher);
        let slots = Arc::clone(&self.slots);
        let abandoned = Arc::new(AtomicBool::new(false));
        let url = job.url.clone();

        let flag = Arc::clone(&abandoned);
        let task = tokio::spawn(async move {
            let permit = slots
                .acquire_owned()
                .await
                .map_err(|_| EnrichmentError::PoolClosed)?;

            let work = tokio::task::spawn_blocking(move || {
                let _slot = permit;
                let started = Instant::now();
                let result = enricher.enrich(&job);

                if flag.load(Ordering::Acquire) {
                    tracing::warn!(
                        "Abandoned job for {} finished after {:?}; releasing its slot",
                        job.url,
                        started.elapsed()
                    );
                } else {
                    tracing::debug!("Job for {} ran for {:?}", job.url, started.elapsed());
                }

                result
            });

            work.await.map_err(|e| {
                if e.is_panic() {
                    EnrichmentError::Panicked(panic_message(e.into_panic()))
                } else {
                    EnrichmentError::Cancelled
                }
            })?
        });

        JobHandle {
            url,
            task,
            abandoned,
        }
    }
}

/// Handle to a submitted job
///
/// Await it for the result. Dropping it does not stop the job.
#[derive(Debug)]
pub struct JobHandle {
    url: String,
    task: JoinHandle<Result<EnrichmentReport, EnrichmentError>>,
    abandoned: Arc<AtomicBool>,
}

impl JobHandle {
    /// URL of the job this handle belongs to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Gives up on the job
    ///
    /// A job still waiting for a slot is removed from the queue. A job that is
    /// already running cannot be interrupted: it runs to completion, keeps its
    /// slot until then, and logs when it finishes.
    pub fn abandon(&self) {
        self.abandoned.store(true, Ordering::Release);
        self.task.abort();
    }
}

impl Future for JobHandle {
    type Output = Result<EnrichmentReport, EnrichmentError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.task).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) if e.is_panic() => {
                Poll::Ready(Err(EnrichmentError::Panicked(panic_message(e.into_panic()))))
            }
            Poll::Ready(Err(_)) => Poll::Ready(Err(EnrichmentError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

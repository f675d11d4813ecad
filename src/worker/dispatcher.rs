//! TCP dispatcher - one connection, one job, one result
//!
//! This module accepts connections from the front-end and, for each one:
//! - Decodes exactly one job frame
//! - Submits the job to the worker pool
//! - Waits for the result under the job deadline
//! - Writes exactly one result frame and closes the connection
//!
//! Each connection is served by its own task, so a slow job never delays
//! accepting the next connection.

use crate::protocol::{EnrichmentResult, FrameCodec, FrameError, Job};
use crate::worker::WorkerPool;
use crate::DispatchError;
use std::future::Future;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

/// Accepts job connections and hands them to the worker pool
#[derive(Debug)]
pub struct Dispatcher {
    listener: TcpListener,
    pool: WorkerPool,
    codec: FrameCodec,
    job_timeout: Duration,
}

impl Dispatcher {
    /// Binds the dispatcher to `addr`
    ///
    /// # Arguments
    ///
    /// * `addr` - Listen address, e.g. `127.0.0.1:8001` or `[::]:8001`
    /// * `pool` - Worker pool shared by all connections
    /// * `codec` - Frame codec (carries the frame size ceiling)
    /// * `job_timeout` - Deadline for each job, measured from submission
    pub async fn bind(
        addr: &str,
        pool: WorkerPool,
        codec: FrameCodec,
        job_timeout: Duration,
    ) -> Result<Self, DispatchError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| DispatchError::Network {
                addr: addr.to_string(),
                source,
            })?;

        Ok(Self {
            listener,
            pool,
            codec,
            job_timeout,
        })
    }

    /// Returns the address the dispatcher is listening on
    pub fn local_addr(&self) -> Result<SocketAddr, DispatchError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves connections until `shutdown` resolves
    ///
    /// Connections already accepted keep running to completion on their own
    /// tasks.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), DispatchError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            "Dispatcher listening on {} (pool size: {}, job timeout: {:?}, max frame: {} bytes)",
            self.local_addr()?,
            self.pool.capacity(),
            self.job_timeout,
            self.codec.max_frame_bytes()
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Dispatcher stopping");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let pool = self.pool.clone();
                            let codec = self.codec;
                            let job_timeout = self.job_timeout;
                            tokio::spawn(async move {
                                handle_connection(stream, peer, pool, codec, job_timeout).await;
                            });
                        }
                        Err(e) => {
                            tracing::warn!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }
    }

    /// Serves connections forever
    pub async fn run(self) -> Result<(), DispatchError> {
        self.run_until(std::future::pending()).await
    }
}

/// Serves one connection: one job in, one result out
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    pool: WorkerPool,
    codec: FrameCodec,
    job_timeout: Duration,
) {
    tracing::info!("Connection received from {}", peer);

    let job: Job = match codec.decode(&mut stream).await {
        Ok(job) => job,
        Err(e) => {
            // No job to answer; the connection is not reused after a bad frame
            tracing::warn!("Protocol/connection error with {}: {}", peer, e);
            return;
        }
    };

    tracing::info!("Received job for {}", job.url);
    let result = run_job(&pool, job, job_timeout).await;

    if let Err(e) = send_result(&mut stream, &codec, &result).await {
        tracing::warn!("Failed to send result to {}: {}", peer, e);
        return;
    }

    if let Err(e) = stream.shutdown().await {
        tracing::debug!("Error closing connection to {}: {}", peer, e);
    }
}

/// Runs a job on the pool and always produces a result
///
/// The deadline is measured from submission, so time spent queued for a
/// slot counts against it. On expiry the job is abandoned and a timeout
/// failure is returned.
pub(crate) async fn run_job(pool: &WorkerPool, job: Job, deadline: Duration) -> EnrichmentResult {
    let url = job.url.clone();
    let started = Instant::now();
    let mut handle = pool.submit(job);

    match tokio::time::timeout(deadline, &mut handle).await {
        Ok(Ok(report)) => {
            tracing::info!("Job completed for {} in {:?}", url, started.elapsed());
            EnrichmentResult::Success(report)
        }
        Ok(Err(e)) => {
            tracing::error!("Job failed for {}: {}", url, e);
            EnrichmentResult::failure(format!("Internal processing error: {}", e))
        }
        Err(_) => {
            handle.abandon();
            tracing::error!("Timeout in job for {} (limit: {:?})", url, deadline);
            EnrichmentResult::failure(format!("Processing job timed out after {:?}", deadline))
        }
    }
}

/// Writes the result frame, substituting a failure if the result cannot be framed
async fn send_result(
    stream: &mut TcpStream,
    codec: &FrameCodec,
    result: &EnrichmentResult,
) -> Result<(), FrameError> {
    let frame = match codec.encode(result) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!("Failed to encode result: {}", e);
            codec.encode(&EnrichmentResult::failure(format!(
                "Failed to encode result: {}",
                e
            )))?
        }
    };

    stream.write_all(&frame).await?;
    stream.flush().await?;
    Ok(())
}

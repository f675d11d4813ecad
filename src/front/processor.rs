//! Front-end leg of the job exchange
//!
//! Opens a fresh TCP connection to the dispatcher for every job, sends the
//! job frame and waits for the result frame. Any failure along the way is
//! turned into a failure result, because by the time this runs the scrape
//! half has already succeeded and must still be returned.

use crate::config::{FrontConfig, ProtocolConfig};
use crate::protocol::{EnrichmentResult, FrameCodec, Job};
use crate::url::host_port;
use crate::DispatchError;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Connection parameters for reaching the dispatcher
#[derive(Debug, Clone)]
pub struct ProcessorLink {
    addr: String,
    connect_timeout: Duration,
    response_timeout: Duration,
    codec: FrameCodec,
}

impl ProcessorLink {
    /// Creates a link to the dispatcher at `host:port`
    ///
    /// `response_timeout` bounds the wait for the result frame once the job
    /// is sent; it should exceed the dispatcher's job deadline.
    pub fn new(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        response_timeout: Duration,
        codec: FrameCodec,
    ) -> Self {
        Self {
            addr: host_port(host, port),
            connect_timeout,
            response_timeout,
            codec,
        }
    }

    /// Creates a link from the front-end and protocol configuration
    pub fn from_config(front: &FrontConfig, protocol: &ProtocolConfig) -> Self {
        Self::new(
            &front.processor_ip,
            front.processor_port,
            Duration::from_secs(front.connect_timeout_secs),
            Duration::from_secs(front.processor_timeout_secs),
            FrameCodec::new(protocol.max_frame_bytes),
        )
    }

    /// Address of the dispatcher, `host:port`
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Sends a job and returns the dispatcher's result
    ///
    /// Never fails: refused connections, connect timeouts, response timeouts
    /// and protocol errors all come back as a failure result.
    pub async fn request_enrichment(&self, job: &Job) -> EnrichmentResult {
        match self.exchange(job).await {
            Ok(result) => {
                tracing::info!("Response received from processing server for {}", job.url);
                result
            }
            Err(e) => {
                tracing::error!("Error talking to processing server: {}", e);
                EnrichmentResult::failure(e.to_string())
            }
        }
    }

    async fn exchange(&self, job: &Job) -> Result<EnrichmentResult, DispatchError> {
        tracing::info!("Connecting to processing server at {}", self.addr);

        let mut stream = timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| DispatchError::Timeout {
                stage: "connecting to processing server",
                limit: self.connect_timeout,
            })?
            .map_err(|source| DispatchError::Network {
                addr: self.addr.clone(),
                source,
            })?;

        self.codec.write(&mut stream, job).await?;
        tracing::info!("Job sent to processing server for {}", job.url);

        let result = timeout(self.response_timeout, self.codec.decode(&mut stream))
            .await
            .map_err(|_| DispatchError::Timeout {
                stage: "waiting for processing server response",
                limit: self.response_timeout,
            })??;

        Ok(result)
    }
}

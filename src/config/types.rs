use serde::Deserialize;

use crate::protocol::DEFAULT_MAX_FRAME_BYTES;

/// Main configuration structure for Scrape-Dispatch
///
/// Every section is optional; missing sections and keys take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub front: FrontConfig,
    pub worker: WorkerConfig,
    pub protocol: ProtocolConfig,
    pub enricher: EnricherConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// Front-end (HTTP scrape service) configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FrontConfig {
    /// Address the HTTP server listens on (IPv4 or IPv6)
    #[serde(rename = "listen-ip")]
    pub listen_ip: String,

    /// Port the HTTP server listens on
    #[serde(rename = "listen-port")]
    pub listen_port: u16,

    /// Host of the worker dispatcher
    #[serde(rename = "processor-ip")]
    pub processor_ip: String,

    /// Port of the worker dispatcher
    #[serde(rename = "processor-port")]
    pub processor_port: u16,

    /// Upper bound on fetching the target page (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// Upper bound on opening the dispatcher connection (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Upper bound on awaiting the dispatcher's result (seconds)
    ///
    /// Must exceed the dispatcher's own job timeout.
    #[serde(rename = "processor-timeout-secs")]
    pub processor_timeout_secs: u64,
}

impl Default for FrontConfig {
    fn default() -> Self {
        Self {
            listen_ip: "127.0.0.1".to_string(),
            listen_port: 8080,
            processor_ip: "127.0.0.1".to_string(),
            processor_port: 8001,
            fetch_timeout_secs: 30,
            connect_timeout_secs: 10,
            processor_timeout_secs: 130,
        }
    }
}

/// Worker dispatcher (processing service) configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Address the dispatcher listens on
    #[serde(rename = "listen-ip")]
    pub listen_ip: String,

    /// Port the dispatcher listens on
    #[serde(rename = "listen-port")]
    pub listen_port: u16,

    /// Size of the worker pool; 0 means one worker per CPU core
    pub processes: usize,

    /// Deadline for a single job, measured from submission (seconds)
    #[serde(rename = "job-timeout-secs")]
    pub job_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            listen_ip: "127.0.0.1".to_string(),
            listen_port: 8001,
            processes: 0,
            job_timeout_secs: 120,
        }
    }
}

impl WorkerConfig {
    /// Returns the effective pool size, resolving 0 to the CPU count
    pub fn pool_size(&self) -> usize {
        if self.processes == 0 {
            num_cpus::get().max(1)
        } else {
            self.processes
        }
    }
}

/// Wire protocol configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Largest accepted frame payload in bytes
    #[serde(rename = "max-frame-bytes")]
    pub max_frame_bytes: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

/// Page enrichment configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnricherConfig {
    /// Headless browser binary used for screenshots
    pub browser: String,

    /// Upper bound on loading the page for screenshot and timing (seconds)
    #[serde(rename = "page-load-timeout-secs")]
    pub page_load_timeout_secs: u64,

    /// Thumbnails fit inside a square of this many pixels
    #[serde(rename = "thumbnail-size")]
    pub thumbnail_size: u32,

    /// Maximum number of thumbnails generated per page
    #[serde(rename = "max-images")]
    pub max_images: usize,

    /// Upper bound on downloading a single image (seconds)
    #[serde(rename = "image-timeout-secs")]
    pub image_timeout_secs: u64,
}

impl Default for EnricherConfig {
    fn default() -> Self {
        Self {
            browser: "chromium".to_string(),
            page_load_timeout_secs: 30,
            thumbnail_size: 150,
            max_images: 5,
            image_timeout_secs: 10,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Product name sent in the User-Agent header
    #[serde(rename = "agent-name")]
    pub agent_name: String,

    /// Product version sent in the User-Agent header
    #[serde(rename = "agent-version")]
    pub agent_version: String,

    /// URL with information about the scraper
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for scraper-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            agent_name: "ScrapeDispatch".to_string(),
            agent_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.agent_name, self.agent_version, self.contact_url, self.contact_email
        )
    }
}

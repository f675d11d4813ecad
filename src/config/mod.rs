//! Configuration module for Scrape-Dispatch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Both services read the same file; each uses its own section plus the shared
//! `[protocol]` and `[user-agent]` sections.
//!
//! # Example
//!
//! ```no_run
//! use scrape_dispatch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("dispatch.toml")).unwrap();
//! println!("Worker pool size: {}", config.worker.pool_size());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, EnricherConfig, FrontConfig, ProtocolConfig, UserAgentConfig, WorkerConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

pub use validation::validate;

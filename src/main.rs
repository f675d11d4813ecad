//! Scrape-Dispatch main entry point
//!
//! This is the command-line interface for both services and the test client.

use anyhow::Context;
use clap::{Parser, Subcommand};
use scrape_dispatch::client::{render_response, request_scrape, DEFAULT_CLIENT_TIMEOUT};
use scrape_dispatch::config::{load_config_with_hash, validate, Config};
use scrape_dispatch::front::{serve, AppState};
use scrape_dispatch::protocol::FrameCodec;
use scrape_dispatch::url::host_port;
use scrape_dispatch::worker::{Dispatcher, PageEnricher, WorkerPool};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Scrape-Dispatch: a two-tier scrape and enrichment service
///
/// The front-end fetches and parses pages over HTTP and hands the expensive
/// enrichment (screenshot, timing, thumbnails) to the worker dispatcher over
/// a length-prefixed JSON TCP protocol.
#[derive(Parser, Debug)]
#[command(name = "scrape-dispatch")]
#[command(version)]
#[command(about = "A two-tier scrape and enrichment service", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP scrape service
    Front {
        /// Address to listen on
        #[arg(short, long)]
        ip: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host of the worker dispatcher
        #[arg(long)]
        processor_ip: Option<String>,

        /// Port of the worker dispatcher
        #[arg(long)]
        processor_port: Option<u16>,
    },

    /// Run the worker dispatcher
    Worker {
        /// Address to listen on
        #[arg(short, long)]
        ip: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Worker pool size (0 = one per CPU core)
        #[arg(short = 'n', long)]
        processes: Option<usize>,
    },

    /// Send one scrape request to a running front-end and print the result
    Request {
        /// Page to scrape
        url: String,

        /// Front-end host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Front-end port
        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// Client timeout in seconds
        #[arg(long, default_value_t = DEFAULT_CLIENT_TIMEOUT.as_secs())]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_configuration(cli.config.as_ref())?;

    match cli.command {
        Command::Front {
            ip,
            port,
            processor_ip,
            processor_port,
        } => {
            if let Some(ip) = ip {
                config.front.listen_ip = ip;
            }
            if let Some(port) = port {
                config.front.listen_port = port;
            }
            if let Some(ip) = processor_ip {
                config.front.processor_ip = ip;
            }
            if let Some(port) = processor_port {
                config.front.processor_port = port;
            }
            validate(&config)?;
            handle_front(config).await
        }
        Command::Worker {
            ip,
            port,
            processes,
        } => {
            if let Some(ip) = ip {
                config.worker.listen_ip = ip;
            }
            if let Some(port) = port {
                config.worker.listen_port = port;
            }
            if let Some(processes) = processes {
                config.worker.processes = processes;
            }
            validate(&config)?;
            handle_worker(config).await
        }
        Command::Request {
            url,
            host,
            port,
            timeout,
        } => handle_request(&url, &host, port, Duration::from_secs(timeout)).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scrape_dispatch=info,warn"),
            1 => EnvFilter::new("scrape_dispatch=debug,tower_http=debug,info"),
            2 => EnvFilter::new("scrape_dispatch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or falls back to defaults
fn load_configuration(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    match load_config_with_hash(path) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}

/// Runs the HTTP scrape service until interrupted
async fn handle_front(config: Config) -> anyhow::Result<()> {
    let addr = host_port(&config.front.listen_ip, config.front.listen_port);
    let state = AppState::from_config(&config)?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind scrape server to {}", addr))?;

    serve(listener, state, shutdown_signal()).await?;
    Ok(())
}

/// Runs the worker dispatcher until interrupted
async fn handle_worker(config: Config) -> anyhow::Result<()> {
    let addr = host_port(&config.worker.listen_ip, config.worker.listen_port);
    let enricher = PageEnricher::new(config.enricher.clone(), &config.user_agent);
    let pool = WorkerPool::new(Arc::new(enricher), config.worker.pool_size());

    let dispatcher = Dispatcher::bind(
        &addr,
        pool,
        FrameCodec::new(config.protocol.max_frame_bytes),
        Duration::from_secs(config.worker.job_timeout_secs),
    )
    .await?;

    dispatcher.run_until(shutdown_signal()).await?;
    Ok(())
}

/// Sends one request to the front-end and prints the rendered response
async fn handle_request(url: &str, host: &str, port: u16, timeout: Duration) -> anyhow::Result<()> {
    match request_scrape(url, host, port, timeout).await {
        Ok(response) => {
            println!("{}", render_response(&response));
            Ok(())
        }
        Err(e) => {
            tracing::error!("Request failed: {}", e);
            Err(e.into())
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl-C, shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}

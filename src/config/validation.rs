use crate::config::types::{
    Config, EnricherConfig, FrontConfig, ProtocolConfig, UserAgentConfig, WorkerConfig,
};
use crate::ConfigError;
use url::Url;

/// Smallest accepted frame ceiling (1 KiB)
const MIN_FRAME_BYTES: usize = 1024;

/// Largest accepted frame ceiling (1 GiB)
const MAX_FRAME_BYTES: usize = 1024 * 1024 * 1024;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_front_config(&config.front)?;
    validate_worker_config(&config.worker)?;
    validate_timeout_ordering(&config.front, &config.worker)?;
    validate_protocol_config(&config.protocol)?;
    validate_enricher_config(&config.enricher)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates front-end configuration
fn validate_front_config(config: &FrontConfig) -> Result<(), ConfigError> {
    validate_host("front.listen-ip", &config.listen_ip)?;
    validate_host("front.processor-ip", &config.processor_ip)?;

    if config.processor_port == 0 {
        return Err(ConfigError::Validation(
            "processor_port must be non-zero".to_string(),
        ));
    }

    validate_timeout("fetch_timeout_secs", config.fetch_timeout_secs)?;
    validate_timeout("connect_timeout_secs", config.connect_timeout_secs)?;
    validate_timeout("processor_timeout_secs", config.processor_timeout_secs)?;

    Ok(())
}

/// Validates worker dispatcher configuration
fn validate_worker_config(config: &WorkerConfig) -> Result<(), ConfigError> {
    validate_host("worker.listen-ip", &config.listen_ip)?;

    if config.processes > 1024 {
        return Err(ConfigError::Validation(format!(
            "processes must be between 0 and 1024, got {}",
            config.processes
        )));
    }

    validate_timeout("job_timeout_secs", config.job_timeout_secs)?;

    Ok(())
}

/// The front-end must outwait the dispatcher, otherwise it gives up on jobs
/// the dispatcher could still have finished or reported as timed out.
fn validate_timeout_ordering(front: &FrontConfig, worker: &WorkerConfig) -> Result<(), ConfigError> {
    if front.processor_timeout_secs <= worker.job_timeout_secs {
        return Err(ConfigError::Validation(format!(
            "processor_timeout_secs ({}s) must be greater than job_timeout_secs ({}s)",
            front.processor_timeout_secs, worker.job_timeout_secs
        )));
    }

    Ok(())
}

/// Validates wire protocol configuration
fn validate_protocol_config(config: &ProtocolConfig) -> Result<(), ConfigError> {
    if config.max_frame_bytes < MIN_FRAME_BYTES || config.max_frame_bytes > MAX_FRAME_BYTES {
        return Err(ConfigError::Validation(format!(
            "max_frame_bytes must be between {} and {}, got {}",
            MIN_FRAME_BYTES, MAX_FRAME_BYTES, config.max_frame_bytes
        )));
    }

    Ok(())
}

/// Validates enricher configuration
fn validate_enricher_config(config: &EnricherConfig) -> Result<(), ConfigError> {
    if config.browser.trim().is_empty() {
        return Err(ConfigError::Validation(
            "browser cannot be empty".to_string(),
        ));
    }

    if config.thumbnail_size == 0 {
        return Err(ConfigError::Validation(
            "thumbnail_size must be >= 1".to_string(),
        ));
    }

    validate_timeout("page_load_timeout_secs", config.page_load_timeout_secs)?;
    validate_timeout("image_timeout_secs", config.image_timeout_secs)?;

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate agent name: non-empty, alphanumeric + hyphens only
    if config.agent_name.is_empty() {
        return Err(ConfigError::Validation(
            "agent_name cannot be empty".to_string(),
        ));
    }

    if !config
        .agent_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "agent_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.agent_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_host(field: &str, host: &str) -> Result<(), ConfigError> {
    if host.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

fn validate_timeout(field: &str, secs: u64) -> Result<(), ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation(format!(
            "{} must be >= 1s, got 0",
            field
        )));
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

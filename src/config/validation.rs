use crate::config::types::{
    Config, CrawlerConfig, FetchConfig, IssueConfig, RankConfig, SessionConfig, UserAgentConfig,
    MAX_PAGES_LIMIT, MIN_PAGES_LIMIT,
};
use crate::issues::LowAuthorityPolicy;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_rank_config(&config.rank)?;
    validate_issue_config(&config.issues)?;
    validate_session_config(&config.session)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < MIN_PAGES_LIMIT || config.max_pages > MAX_PAGES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between {} and {}, got {}",
            MIN_PAGES_LIMIT, MAX_PAGES_LIMIT, config.max_pages
        )));
    }

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 16 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 16, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.politeness_delay_ms > 10_000 {
        return Err(ConfigError::Validation(format!(
            "politeness_delay must be <= 10000ms, got {}ms",
            config.politeness_delay_ms
        )));
    }

    Ok(())
}

/// Validates fetch bounds
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout must be at least 1 second".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 || config.connect_timeout_secs > config.timeout_secs {
        return Err(ConfigError::Validation(format!(
            "connect_timeout must be between 1 and timeout ({}s), got {}s",
            config.timeout_secs, config.connect_timeout_secs
        )));
    }

    if config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be <= 20, got {}",
            config.max_redirects
        )));
    }

    if config.max_body_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "max_body_bytes must be >= 1024, got {}",
            config.max_body_bytes
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::Validation(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates PageRank parameters
fn validate_rank_config(config: &RankConfig) -> Result<(), ConfigError> {
    if !(config.alpha > 0.0 && config.alpha < 1.0) {
        return Err(ConfigError::Validation(format!(
            "alpha must be in (0, 1), got {}",
            config.alpha
        )));
    }

    if !(config.tolerance > 0.0 && config.tolerance.is_finite()) {
        return Err(ConfigError::Validation(format!(
            "tolerance must be a positive number, got {}",
            config.tolerance
        )));
    }

    if config.max_iterations == 0 {
        return Err(ConfigError::Validation(
            "max_iterations must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the low-authority threshold policy
fn validate_issue_config(config: &IssueConfig) -> Result<(), ConfigError> {
    match config.low_authority {
        LowAuthorityPolicy::Relative { fraction } if !(fraction > 0.0 && fraction.is_finite()) => {
            Err(ConfigError::Validation(format!(
                "low-authority fraction must be positive, got {}",
                fraction
            )))
        }
        LowAuthorityPolicy::Percentile { percentile } if !(0.0..=1.0).contains(&percentile) => {
            Err(ConfigError::Validation(format!(
                "low-authority percentile must be in [0, 1], got {}",
                percentile
            )))
        }
        LowAuthorityPolicy::Absolute { cutoff } if !(0.0..=1.0).contains(&cutoff) => {
            Err(ConfigError::Validation(format!(
                "low-authority cutoff must be in [0, 1], got {}",
                cutoff
            )))
        }
        _ => Ok(()),
    }
}

/// Validates session lifecycle settings
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "session ttl must be at least 1 second".to_string(),
        ));
    }

    if config.reap_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "reap_interval must be at least 1 second".to_string(),
        ));
    }

    if config.event_buffer == 0 {
        return Err(ConfigError::Validation(
            "event_buffer must be >= 1".to_string(),
        ));
    }

    Ok(())
}

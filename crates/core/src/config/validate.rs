use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Catalog folder and access token are set
/// - Cache username and password are set
/// - Distributor bot token and group are set
/// - Publisher access token is set
/// - Excerpt window and retry bounds are sane
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let required = [
        ("catalog.folder_id", &config.catalog.folder_id),
        ("catalog.access_token", &config.catalog.access_token),
        ("cache.username", &config.cache.username),
        ("cache.password", &config.cache.password),
        ("distributor.bot_token", &config.distributor.bot_token),
        ("distributor.group_chat_id", &config.distributor.group_chat_id),
        ("publisher.access_token", &config.publisher.access_token),
    ];

    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "missing required settings: {}",
            missing.join(", ")
        )));
    }

    if config.excerpt.duration_secs == 0 {
        return Err(ConfigError::ValidationError(
            "excerpt.duration_secs cannot be 0".to_string(),
        ));
    }

    let retry = &config.publisher.retry;
    if retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "publisher.retry.max_attempts must be at least 1".to_string(),
        ));
    }
    if retry.base_delay_ms > retry.max_delay_ms {
        return Err(ConfigError::ValidationError(
            "publisher.retry.base_delay_ms cannot exceed max_delay_ms".to_string(),
        ));
    }

    if config.catalog.chunk_size_bytes == 0 || config.publisher.upload_chunk_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "chunk sizes cannot be 0".to_string(),
        ));
    }

    Ok(())
}

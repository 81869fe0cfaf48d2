use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Dispatcher base URL is an http(s) URL
/// - Pipeline intervals are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Dispatcher validation
    if !config.dispatcher.api_base.starts_with("http://")
        && !config.dispatcher.api_base.starts_with("https://")
    {
        return Err(ConfigError::ValidationError(format!(
            "dispatcher.api_base must be an http(s) URL, got {}",
            config.dispatcher.api_base
        )));
    }

    // Pipeline validation
    if config.pipeline.worker_poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.worker_poll_interval_ms cannot be 0".to_string(),
        ));
    }
    if config.pipeline.claim_batch == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.claim_batch cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ServerConfig};
    use std::net::IpAddr;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_bad_api_base_fails() {
        let mut config = Config::default();
        config.dispatcher.api_base = "tasks.example.com".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_zero_poll_interval_fails() {
        let mut config = Config::default();
        config.pipeline.worker_poll_interval_ms = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }
}

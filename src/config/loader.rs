//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::BalancerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BalancerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<BalancerConfig, ConfigError> {
    let config: BalancerConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;

    const SAMPLE: &str = r#"
strategy = "WeightedRoundRobin"

[listener]
port = 9000

[health_check]
interval_secs = 2
path = "/health"

[observability]
log_format = "json"

[[services]]
name = "api"
matcher = "/api"

[[services.replicas]]
url = "http://127.0.0.1:8001"
metadata = { weight = "3" }

[[services.replicas]]
url = "http://127.0.0.1:8002"

[[services]]
name = "ui"
matcher = "/"
strategy = "RoundRobin"
health_check = false

[[services.replicas]]
url = "http://127.0.0.1:3000"
"#;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE).unwrap();

        assert_eq!(config.strategy, "WeightedRoundRobin");
        assert_eq!(config.listener.port, 9000);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.health_check.interval_secs, 2);
        assert_eq!(config.health_check.timeout_secs, 5);
        assert_eq!(config.health_check.path.as_deref(), Some("/health"));
        assert_eq!(config.observability.log_format, LogFormat::Json);

        assert_eq!(config.services.len(), 2);
        let api = &config.services[0];
        assert_eq!(api.strategy_name(&config.strategy), "WeightedRoundRobin");
        assert!(api.health_check);
        assert_eq!(api.replicas[0].metadata.get("weight").map(String::as_str), Some("3"));
        assert!(api.replicas[1].metadata.is_empty());

        let ui = &config.services[1];
        assert_eq!(ui.strategy_name(&config.strategy), "RoundRobin");
        assert!(!ui.health_check);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(parse_config("services = 3"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_error() {
        let err = parse_config("[[services]]\nname = \"api\"\nmatcher = \"/api\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("has no replicas"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

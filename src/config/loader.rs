//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
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

/// Parse a TOML document without validating it.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogFormat, StragglerPolicy};

    #[test]
    fn empty_document_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:7433");
        assert_eq!(config.origin.timeout_ms, 500);
        assert_eq!(config.http.json_root, "/json");
        assert_eq!(config.http.allowed_origins, "*");
        assert!(config.origin.proxy_url.is_none());
    }

    #[test]
    fn partial_sections() {
        let config = parse_config(
            r#"
            [origin]
            proxy_url = "http://127.0.0.1:3128"
            timeout_ms = 250
            max_concurrent_fetches = 64
            straggler_policy = "abort"

            [http]
            json_root = "/bundle"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.origin.proxy_url.as_deref(), Some("http://127.0.0.1:3128"));
        assert_eq!(config.origin.timeout().as_millis(), 250);
        assert_eq!(config.origin.max_concurrent_fetches, Some(64));
        assert_eq!(config.origin.straggler_policy, StragglerPolicy::Abort);
        assert_eq!(config.http.json_root, "/bundle");
        assert_eq!(config.http.diagnostics_path, "/debug/vars");
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let err = parse_config("[origin]\nstraggler_policy = \"cancel\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/freeload.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn load_validates() {
        let path = std::env::temp_dir().join(format!("freeload-invalid-{}.toml", std::process::id()));
        fs::write(&path, "[origin]\ntimeout_ms = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        let _ = fs::remove_file(&path);

        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("timeout_ms"));
    }
}

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use eyre::{Context, Result};

use crate::config::{models::HostConfig, validation::HostConfigValidator};

/// Prefix of environment variables overriding file values,
/// e.g. `HOSTWIRE__CORRELATION_ID__HEADER_NAME`.
pub const ENV_PREFIX: &str = "HOSTWIRE";

/// Load and validate configuration from a file layered with `HOSTWIRE__*` environment
/// variables. Supports multiple formats: YAML, JSON, TOML, INI.
pub async fn load_config(config_path: &str) -> Result<HostConfig> {
    let config = load_config_unchecked(config_path)?;
    HostConfigValidator::validate(&config)
        .with_context(|| format!("Invalid configuration in {config_path}"))?;
    Ok(config)
}

/// Load configuration without validation (used by the `validate` command so it can
/// report parse and validation failures separately).
pub fn load_config_unchecked(config_path: &str) -> Result<HostConfig> {
    load_config_with_env(config_path, Environment::with_prefix(ENV_PREFIX).separator("__"))
}

fn file_format(config_path: &Path) -> FileFormat {
    match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Yaml, // Default to YAML
    }
}

fn load_config_with_env(config_path: &str, environment: Environment) -> Result<HostConfig> {
    let config_path = Path::new(config_path);

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            file_format(config_path),
        ))
        .add_source(environment)
        .build()
        .with_context(|| format!("Failed to build config from {}", config_path.display()))?;

    let host_config: HostConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(host_config)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Write};

    use tempfile::NamedTempFile;

    use super::*;
    use crate::config::models::LogFormat;

    fn no_env() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .source(Some(HashMap::new()))
    }

    #[test]
    fn test_load_yaml_config() {
        let yaml_content = r#"
listen_addr: "127.0.0.1:3000"
app_name:
  app_name: "billing-service"
correlation_id:
  header_name: "X-Correlation-ID"
logging:
  level: "debug"
  format: "pretty"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = load_config_with_env(temp_file.path().to_str().unwrap(), no_env()).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.app_name.unwrap().header_name, "App-Name");
        assert_eq!(config.correlation_id.unwrap().header_name, "X-Correlation-ID");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_load_toml_config() {
        let toml_content = r#"
listen_addr = "0.0.0.0:9000"
shutdown_timeout_secs = 5

[correlation_id]
header_name = "Request-Id"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config_with_env(temp_file.path().to_str().unwrap(), no_env()).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.shutdown_timeout_secs, 5);
        assert!(config.app_name.is_none());
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(
            temp_file,
            r#"{{ "correlation_id": {{ "header_name": "X-From-File" }} }}"#
        )
        .unwrap();

        let env = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .source(Some(HashMap::from([(
                "HOSTWIRE__CORRELATION_ID__HEADER_NAME".to_string(),
                "X-From-Env".to_string(),
            )])));

        let config = load_config_with_env(temp_file.path().to_str().unwrap(), env).unwrap();
        assert_eq!(config.correlation_id.unwrap().header_name, "X-From-Env");
    }

    #[tokio::test]
    async fn test_load_config_rejects_invalid_values() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, r#"{{ "correlation_id": {{ "header_name": "" }} }}"#).unwrap();

        let err = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap_err();
        assert!(format!("{err:?}").contains("correlation_id.header_name"));
    }
}

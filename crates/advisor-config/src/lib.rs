//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, DispatchSettings, LoggingConfig, MarketDataSettings, WorkflowSettings,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Environment variable prefix; `ADVISOR__DISPATCH__TIMEOUT_MS` sets
/// `dispatch.timeout_ms`.
pub const ENV_PREFIX: &str = "ADVISOR";

/// Load configuration from file and environment.
///
/// A missing file is an error unless `required` is false, in which case
/// defaults and environment overrides apply.
pub fn load_config(path: &Path, required: bool) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: AppConfig = config.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Render a configuration as TOML.
pub fn to_toml(config: &AppConfig) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::Message(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "advisor-config-{}-{name}.toml",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let path = write_temp(
            "partial",
            r#"
[dispatch]
automation_level = 1
fallback = ["education"]

[dispatch.routes]
trade = ["risk"]

[risk]
lookback = 30
"#,
        );

        let config = load_config(&path, true).unwrap();
        assert_eq!(config.dispatch.automation_level, 1);
        assert_eq!(config.dispatch.routes["trade"], vec!["risk".to_string()]);
        assert_eq!(config.risk.lookback, 30);
        assert_eq!(config.risk.benchmark, "KOSPI");
        assert_eq!(config.workflow.max_commit_retries, 3);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_optional_file() {
        let config = load_config(Path::new("/nonexistent/advisor.toml"), false).unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(load_config(Path::new("/nonexistent/advisor.toml"), true).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let path = write_temp("invalid", "[dispatch]\nautomation_level = 0\ntimeout_ms = 5\n");
        assert!(load_config(&path, true).is_err());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_renders_toml() {
        let rendered = to_toml(&AppConfig::default()).unwrap();
        assert!(rendered.contains("[workflow]"));
        assert!(rendered.contains("automation_level = 2"));
    }
}

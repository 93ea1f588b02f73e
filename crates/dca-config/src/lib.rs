//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, BacktestSettings, DataSettings, LoggingConfig, OptimizationSettings,
    RebalanceSettings,
};

use config::{Config, Environment, File};
use std::path::Path;
use thiserror::Error;

/// Prefix of environment overrides, e.g. `DCA__REBALANCE__THRESHOLD=0.08`.
pub const ENV_PREFIX: &str = "DCA";

/// Failure to produce a usable configuration.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] dca_core::error::ConfigError),
}

/// Load configuration from file and environment, then validate it.
pub fn load_config(path: &Path) -> Result<AppConfig, SettingsError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_file_with_env_override() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[optimization]
preset = "growth"

[rebalance]
threshold = 0.05
min_interval_days = 3
"#
        )
        .unwrap();

        std::env::set_var("DCA__REBALANCE__MAX_INTERVAL_DAYS", "45");
        let config = load_config(file.path());
        std::env::remove_var("DCA__REBALANCE__MAX_INTERVAL_DAYS");

        let config = config.unwrap();
        assert_eq!(config.optimization.preset, "growth");
        assert_eq!(config.rebalance.min_interval_days, 3);
        assert_eq!(config.rebalance.max_interval_days, 45);
        assert_eq!(config.data.lookback_days, 180);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load_config(Path::new("/nonexistent/dca.toml"));
        assert!(matches!(result, Err(SettingsError::Load(_))));
    }
}

//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{MonitorError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with APP__, or OKX_ for credentials)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    );

    builder = apply_okx_env(builder)?;

    let config = builder
        .build()
        .map_err(|e| MonitorError::Configuration(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| MonitorError::Configuration(e.to_string()))?;

    app_config.validate()?;
    Ok(app_config)
}

/// Map the conventional OKX_* credential variables onto the okx section
fn apply_okx_env(
    mut builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
    let vars = [
        ("OKX_API_KEY", "okx.api_key"),
        ("OKX_API_SECRET", "okx.api_secret"),
        ("OKX_API_PASSPHRASE", "okx.api_passphrase"),
        ("OKX_REST_URL", "okx.rest_url"),
    ];

    for (var, key) in vars {
        if let Ok(value) = std::env::var(var) {
            builder = builder
                .set_override(key, value)
                .map_err(|e| MonitorError::Configuration(e.to_string()))?;
        }
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[okx]
quote_currency = "USDC"

[schedule]
balance_interval_seconds = 15

[notifications]
owner_id = "12345"
channel_id = "@portfolio"
"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = load_config(Some(&path)).unwrap();

        assert_eq!(config.okx.quote_currency, "USDC");
        assert_eq!(config.schedule.balance_interval_seconds, 15);
        assert_eq!(config.schedule.alert_interval_seconds, 60);
        assert_eq!(config.notifications.owner_id, "12345");
        assert_eq!(config.notifications.channel_id.as_deref(), Some("@portfolio"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Some("does/not/exist.toml")).unwrap();
        assert_eq!(config.storage.data_dir, "data");
        assert_eq!(config.okx.rest_url, "https://www.okx.com");
    }
}

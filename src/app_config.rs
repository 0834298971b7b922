use config::{Config, ConfigError};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    core: Core,
    device: Device,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::with_prefix("LAMPCTL").separator("__"))
            .build()?;

        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let app_config: AppConfig = config.try_deserialize()?;

        if app_config.core.store_buffer_size == 0 {
            return Err(ConfigError::Message("core.store_buffer_size must be at least 1".to_string()));
        }
        Ok(app_config)
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

#[derive(Debug, Deserialize)]
pub struct Core {
    store_buffer_size: usize,
}

impl Core {
    pub fn store_buffer_size(&self) -> usize {
        self.store_buffer_size
    }
}

#[derive(Debug, Deserialize)]
pub struct Device {
    url: String,
    request_timeout_ms: u64,
}

impl Device {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                core: Core { store_buffer_size: 8 },
                device: Device {
                    url: "http://192.168.4.1".to_string(),
                    request_timeout_ms: 1_000,
                },
            },
        }
    }

    pub fn device_url(mut self, url: String) -> Self {
        self.config.device.url = url;
        self
    }

    pub fn request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.device.request_timeout_ms = timeout_ms;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn deserializes_all_sections() -> Result<(), ConfigError> {
        let toml = r#"
            [core]
            store_buffer_size = 4

            [device]
            url = "http://10.0.0.7:8080"
            request_timeout_ms = 2500
        "#;

        let config = AppConfig::from_config(Config::builder().add_source(config::File::from_str(toml, FileFormat::Toml)).build()?)?;

        assert_eq!(config.core().store_buffer_size(), 4);
        assert_eq!(config.device().url(), "http://10.0.0.7:8080");
        assert_eq!(config.device().request_timeout(), Duration::from_millis(2500));
        Ok(())
    }

    #[test]
    fn missing_device_section_is_an_error() {
        let result = Config::builder()
            .add_source(config::File::from_str("[core]\nstore_buffer_size = 4", FileFormat::Toml))
            .build()
            .and_then(AppConfig::from_config);

        assert!(result.is_err());
    }

    #[test]
    fn rejects_an_empty_store_buffer() -> Result<(), ConfigError> {
        let toml = r#"
            [core]
            store_buffer_size = 0

            [device]
            url = "http://192.168.4.1"
            request_timeout_ms = 60000
        "#;

        let result = AppConfig::from_config(Config::builder().add_source(config::File::from_str(toml, FileFormat::Toml)).build()?);

        assert!(matches!(result, Err(ConfigError::Message(message)) if message.contains("store_buffer_size")));
        Ok(())
    }
}

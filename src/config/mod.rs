mod app_config;

pub use app_config::{AccountConfig, AppConfig, JwtSettings, LogFormat, LoggingConfig, ServerConfig};

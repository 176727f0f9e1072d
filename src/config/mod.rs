// Configuration management module
// Handles TOML settings and the interactive setup wizard

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{Config, ConfigError, DB_PASSWORD_ENV, DatabaseConfig, OllamaConfig};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("SQLPILOT_CONFIG_DIR") {
        return Ok(std::path::PathBuf::from(dir));
    }

    dirs::config_dir()
        .map(|dir| dir.join("sqlpilot"))
        .ok_or(ConfigError::DirectoryError)
}

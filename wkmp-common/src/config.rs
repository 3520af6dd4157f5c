//! Bootstrap configuration loading
//!
//! Every WKMP tool reads a small TOML bootstrap file. The file is located in
//! the following priority order:
//! 1. Explicit path given on the command line (must exist)
//! 2. `<user config dir>/wkmp/<module>.toml`
//! 3. `/etc/wkmp/<module>.toml` (Linux only)
//! 4. Built-in defaults (no file at all)
//!
//! A missing default file never terminates the tool; the caller is told that
//! built-in defaults are in use so it can log a warning once logging is up.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Log levels accepted in `[logging] level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Logging configuration shared by all WKMP tools
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Reject log levels the subscriber filter would not understand
    pub fn validate(&self) -> Result<()> {
        let level = self.level.to_ascii_lowercase();
        if LOG_LEVELS.contains(&level.as_str()) {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "Invalid log level '{}' (expected one of: {})",
                self.level,
                LOG_LEVELS.join(", ")
            )))
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this TOML file
    File(PathBuf),
    /// No file found; built-in defaults
    Defaults,
}

/// A configuration value together with its origin
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub config: T,
    pub source: ConfigSource,
}

/// Candidate config file locations for a module, highest priority first
pub fn default_config_paths(module_name: &str) -> Vec<PathBuf> {
    let file_name = format!("{}.toml", module_name);
    let mut paths = Vec::new();

    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("wkmp").join(&file_name));
    }

    if cfg!(target_os = "linux") {
        paths.push(PathBuf::from("/etc/wkmp").join(&file_name));
    }

    paths
}

/// First existing default config file for a module, if any
pub fn find_config_file(module_name: &str) -> Option<PathBuf> {
    default_config_paths(module_name)
        .into_iter()
        .find(|path| path.is_file())
}

/// Parse TOML text into a configuration struct
///
/// `origin` is only used to make the error message point at the file.
pub fn parse_toml_config<T: DeserializeOwned>(content: &str, origin: &Path) -> Result<T> {
    toml::from_str(content).map_err(|e| {
        Error::Config(format!("Failed to parse TOML {}: {}", origin.display(), e))
    })
}

/// Load a module's bootstrap configuration
///
/// # Errors
/// - `explicit` was given but cannot be read
/// - the selected file is not valid TOML for `T`
pub fn load_toml_config<T>(explicit: Option<&Path>, module_name: &str) -> Result<Loaded<T>>
where
    T: DeserializeOwned + Default,
{
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match find_config_file(module_name) {
            Some(path) => path,
            None => {
                return Ok(Loaded {
                    config: T::default(),
                    source: ConfigSource::Defaults,
                })
            }
        },
    };

    let content = std::fs::read_to_string(&path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    let config = parse_toml_config(&content, &path)?;
    tracing::debug!("Loaded TOML configuration from {}", path.display());

    Ok(Loaded {
        config,
        source: ConfigSource::File(path),
    })
}

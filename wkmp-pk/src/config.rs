//! Configuration for wkmp-pk
//!
//! Resolution order, highest priority first:
//! 1. Command line / environment (already merged by clap)
//! 2. TOML bootstrap file (see [`wkmp_common::config`])
//! 3. Built-in defaults

use crate::error::{Error, Result};
use crate::packetizer::DEFAULT_FRAMES_PER_PACKET;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use wkmp_common::config::{load_toml_config, ConfigSource, LoggingConfig};

/// Module name used to locate `wkmp-pk.toml`
pub const MODULE_NAME: &str = "wkmp-pk";

/// Input file used when none is configured
pub const DEFAULT_INPUT: &str = "audio_file.wav";

/// TOML bootstrap file contents
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Audio file to packetize
    #[serde(default)]
    pub input: Option<PathBuf>,

    /// PCM frames per packet
    #[serde(default = "default_frames_per_packet")]
    pub frames_per_packet: u32,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            input: None,
            frames_per_packet: default_frames_per_packet(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_frames_per_packet() -> u32 {
    DEFAULT_FRAMES_PER_PACKET
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input: Option<PathBuf>,
    pub frames_per_packet: Option<u32>,
    pub log_level: Option<String>,
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub frames_per_packet: NonZeroU32,
    pub logging: LoggingConfig,
    /// Where the TOML layer came from
    pub source: ConfigSource,
}

impl Config {
    /// Load the bootstrap file and apply overrides.
    ///
    /// # Errors
    /// - `Common`: explicit config file missing or not valid TOML
    /// - `Config`: `frames_per_packet` is 0 or the log level is unknown
    pub fn load(explicit: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let loaded = load_toml_config::<TomlConfig>(explicit, MODULE_NAME)?;
        Self::from_toml(loaded.config, loaded.source, overrides)
    }

    /// Merge an already parsed TOML config with overrides
    pub fn from_toml(
        toml: TomlConfig,
        source: ConfigSource,
        overrides: ConfigOverrides,
    ) -> Result<Self> {
        let input = overrides
            .input
            .or(toml.input)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));

        let frames = overrides.frames_per_packet.unwrap_or(toml.frames_per_packet);
        let frames_per_packet = NonZeroU32::new(frames).ok_or_else(|| {
            Error::Config("frames_per_packet must be greater than 0".to_string())
        })?;

        let mut logging = toml.logging;
        if let Some(level) = overrides.log_level {
            logging.level = level;
        }
        logging.validate()?;

        Ok(Self {
            input,
            frames_per_packet,
            logging,
            source,
        })
    }
}

//! # WKMP Common Library
//!
//! Shared code for WKMP tools:
//! - Error types
//! - Bootstrap configuration loading (TOML file discovery, logging settings)

pub mod config;
pub mod error;

pub use error::{Error, Result};

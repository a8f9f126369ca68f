//! Configuration management for chatrec.
//!
//! This module handles loading application configuration from a TOML file in
//! the user's config directory. The file is optional; built-in defaults keep
//! the application usable with zero configuration.

pub mod file;

pub use file::{AudioConfig, ChatrecConfig};

//! Shared utilities for finlens
//!
//! This crate provides common functionality used across the finlens workspace:
//! logging setup and configuration loaded from the environment.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigError};
pub use logging::{LogFormat, init_tracing};

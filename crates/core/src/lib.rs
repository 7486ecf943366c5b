//! logitkit_core - Configuration for logitkit
//!
//! This crate provides:
//! - The user config file (~/.config/logitkit/config.toml)
//! - Sampling profiles and named presets
//! - Conversion of a profile into a validated sampling pipeline

pub mod config;

pub use config::{Config, SamplingConfig};

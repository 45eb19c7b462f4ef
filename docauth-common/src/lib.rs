//! # docauth Common Library
//!
//! Shared code for the docauth crates:
//! - Common error type
//! - TOML bootstrap configuration and config-file discovery
//! - Logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};

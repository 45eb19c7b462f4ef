//! Test Helper Utilities
//!
//! Shared utilities for testing docauth-ai

#![allow(dead_code)]

pub mod log_capture;
pub mod mock_services;

pub use log_capture::{capture_logs, LogCapture};
pub use mock_services::{
    certificate_bundle, signal_json, MockGenerative, MockVision, CERTIFICATE_TEXT,
};
